// src/task/output_log.rs

use tokio::sync::mpsc;

use crate::engine::RunEvent;
use crate::result::OutputLine;

/// Append-only log of typed lines produced by one task run.
///
/// When an event sender is attached, every appended line is also published
/// as [`RunEvent::OutputLine`] so a UI can follow along while the task runs.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    task_index: usize,
    lines: Vec<OutputLine>,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl OutputLog {
    pub fn new(task_index: usize) -> Self {
        Self {
            task_index,
            lines: Vec::new(),
            events: None,
        }
    }

    pub fn attach(&mut self, events: Option<mpsc::UnboundedSender<RunEvent>>) {
        self.events = events;
    }

    pub fn push(&mut self, line: OutputLine) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(RunEvent::OutputLine {
                index: self.task_index,
                line: line.clone(),
            });
        }
        self.lines.push(line);
    }

    pub fn message(&mut self, text: impl Into<String>) {
        self.push(OutputLine::message(text));
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(OutputLine::success(text));
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(OutputLine::warning(text));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(OutputLine::error(text));
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
