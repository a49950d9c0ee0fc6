// src/classify/gdcc.rs

//! GDCC tools (gdcc-acc, gdcc-cc, gdcc-ld, gdcc-makelib) tag each diagnostic
//! line on stderr with `WARNING: ` or `ERROR: ` (case-insensitive).
//!
//! gdcc-cc additionally prints `warning: <file>:<line>:<col>: <message>`
//! style diagnostics, which are rewritten into
//! `File "<relative path>", line <L>, char <C>: <message>`.
//!
//! Lines are fed in one at a time while the process runs; anything that is
//! neither a warning nor an error is dropped (and logged).

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::classify::{launch_failure, unknown_failure};
use crate::result::{OutputLine, ProcessInvocationResult, TaskInvocationResult};

const WARNING_PREFIX: &str = "WARNING: ";
const ERROR_PREFIX: &str = "ERROR: ";

static STRUCTURED_DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(warning|error): (.+?):(\d+):(\d+): (.*)$")
        .expect("valid diagnostic regex")
});

/// Classification of one stderr line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GdccLine {
    Warning(String),
    Error(String),
    Dropped,
}

#[derive(Debug, Clone)]
pub struct GdccClassifier {
    tool: &'static str,
    structured: bool,
    base_dir: Option<PathBuf>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl GdccClassifier {
    /// Prefix-only classifier.
    pub fn new(tool: &'static str) -> Self {
        Self {
            tool,
            structured: false,
            base_dir: None,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Also accept gdcc-cc structured diagnostics. File paths are shown
    /// relative to `base_dir` when they live below it.
    pub fn with_structured_diagnostics(mut self, base_dir: Option<&Path>) -> Self {
        self.structured = true;
        self.base_dir = base_dir.map(Path::to_path_buf);
        self
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Classify one line without recording it.
    pub fn parse_line(&self, line: &str) -> GdccLine {
        if self.structured {
            if let Some(parsed) = parse_structured(line, self.base_dir.as_deref()) {
                return parsed;
            }
        }

        if let Some(rest) = strip_prefix_ignore_case(line, WARNING_PREFIX) {
            return GdccLine::Warning(rest.to_string());
        }
        if let Some(rest) = strip_prefix_ignore_case(line, ERROR_PREFIX) {
            return GdccLine::Error(rest.to_string());
        }
        GdccLine::Dropped
    }

    /// Classify and record one stderr line. Returns the matching output-log
    /// line, or `None` if the line was dropped.
    pub fn push_line(&mut self, line: &str) -> Option<OutputLine> {
        match self.parse_line(line) {
            GdccLine::Warning(text) => {
                self.warnings.push(text.clone());
                Some(OutputLine::warning(text))
            }
            GdccLine::Error(text) => {
                self.errors.push(text.clone());
                Some(OutputLine::error(text))
            }
            GdccLine::Dropped => {
                if !line.trim().is_empty() {
                    warn!(tool = self.tool, line, "dropping unrecognised line");
                }
                None
            }
        }
    }

    /// Build the task result once the process has exited.
    ///
    /// Success iff the exit code is zero; warnings are kept either way.
    pub fn finish(self, result: &ProcessInvocationResult) -> TaskInvocationResult {
        if let Some(failed) = launch_failure(self.tool, result) {
            return failed.with_warnings(self.warnings);
        }

        if !result.has_compiler_error() {
            let message = if self.warnings.is_empty() {
                format!("{} finished successfully", self.tool)
            } else {
                format!(
                    "{} finished successfully with {} warning(s)",
                    self.tool,
                    self.warnings.len()
                )
            };
            return TaskInvocationResult::success(message).with_warnings(self.warnings);
        }

        let message = if self.errors.is_empty() {
            unknown_failure(self.tool)
        } else {
            format!("{} failed with {} error(s)", self.tool, self.errors.len())
        };
        TaskInvocationResult::failure_with(message, self.errors).with_warnings(self.warnings)
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

fn parse_structured(line: &str, base: Option<&Path>) -> Option<GdccLine> {
    let caps = STRUCTURED_DIAGNOSTIC.captures(line)?;
    let severity = caps.get(1)?.as_str();
    let file = Path::new(caps.get(2)?.as_str());
    let line_no = caps.get(3)?.as_str();
    let column = caps.get(4)?.as_str();
    let message = caps.get(5)?.as_str();

    let shown = base
        .and_then(|b| file.strip_prefix(b).ok())
        .unwrap_or(file);

    let text = format!(
        "File \"{}\", line {}, char {}: {}",
        shown.display(),
        line_no,
        column,
        message
    );

    if severity.eq_ignore_ascii_case("error") {
        Some(GdccLine::Error(text))
    } else {
        Some(GdccLine::Warning(text))
    }
}
