// src/task/validate.rs

//! Static pre-run checks for every task kind.
//!
//! Only reads the file system (through the context's [`FileSystem`]), so
//! validating the same unchanged task twice yields the same findings.
//!
//! [`FileSystem`]: crate::fs::FileSystem

use std::path::Path;

use globset::Glob;

use crate::context::{keys, InvocationContext};
use crate::result::ValidateResult;
use crate::task::TaskKind;

pub fn validate_kind(kind: &TaskKind, ctx: &InvocationContext) -> Vec<ValidateResult> {
    let mut checks = Checks::new(ctx);

    match kind {
        TaskKind::AccCompile(t) => {
            checks
                .tool(keys::ACC_COMPILER, "ACC compiler")
                .input_file("Input file", &t.input, &["acs"])
                .output_path("Output file", &t.output, &["o"])
                .include_dirs(&t.include_dirs);
        }
        TaskKind::BccCompile(t) => {
            checks
                .tool(keys::BCC_COMPILER, "BCC compiler")
                .input_file("Input file", &t.input, &["acs", "bcs"])
                .output_path("Output file", &t.output, &["o"])
                .include_dirs(&t.include_dirs);
        }
        TaskKind::GdccAccCompile(t) => {
            checks
                .tool(keys::GDCC_ACC_COMPILER, "GDCC-ACC compiler")
                .input_file("Input file", &t.input, &["acs"])
                .output_path("Output file", &t.output, &["ir", "o"])
                .include_dirs(&t.include_dirs);
        }
        TaskKind::GdccCcCompile(t) => {
            checks
                .tool(keys::GDCC_CC_COMPILER, "GDCC-CC compiler")
                .input_file("Input file", &t.input, &["c"])
                .output_path("Output file", &t.output, &["ir", "o"])
                .include_dirs(&t.include_dirs);
        }
        TaskKind::GdccLink(t) => {
            checks.tool(keys::GDCC_LINKER, "GDCC linker");
            if t.inputs.is_empty() {
                checks.error("No input files to link");
            }
            for input in &t.inputs {
                checks.input_file("Linker input", input, &["ir", "o"]);
            }
            checks.output_path("Output file", &t.output, &["o"]);
        }
        TaskKind::GdccMakeLib(t) => {
            checks
                .tool(keys::GDCC_MAKELIB, "GDCC makelib")
                .output_path("Output file", &t.output, &["ir", "o"]);
        }
        TaskKind::GdccBuild(t) => {
            checks
                .tool(keys::GDCC_CC_COMPILER, "GDCC-CC compiler")
                .tool(keys::GDCC_LINKER, "GDCC linker");
            if t.sources.is_empty() {
                checks.error("No source files to build");
            }
            for source in &t.sources {
                checks.input_file("Source file", source, &["c"]);
            }
            checks
                .output_path("Output file", &t.output, &["o"])
                .include_dirs(&t.include_dirs);
        }
        TaskKind::RunInVm(t) => {
            checks
                .tool(keys::ACS_VM, "ACS VM")
                .input_file("Object file", &t.input, &["o"]);
        }
        TaskKind::CopyFile(t) | TaskKind::MoveFile(t) => {
            checks
                .input_file("Source file", &t.source, &[])
                .output_path("Target file", &t.target, &[]);
            if !t.overwrite && !t.target.as_os_str().is_empty() {
                let target = ctx.resolve(&t.target);
                if ctx.fs().exists(&target) {
                    checks.warning(format!(
                        "Target file '{}' already exists and overwrite is disabled",
                        t.target.display()
                    ));
                }
            }
        }
        TaskKind::DeleteFile(t) => {
            if t.path.as_os_str().is_empty() {
                checks.error("File to delete is not set");
            } else if !ctx.fs().is_file(&ctx.resolve(&t.path)) {
                checks.warning(format!(
                    "File to delete '{}' does not exist",
                    t.path.display()
                ));
            }
        }
        TaskKind::CopyProject(t) => {
            match ctx.project_directory() {
                None => {
                    checks.error("Project directory is not set");
                }
                Some(dir) if !ctx.fs().is_dir(dir) => {
                    checks.error(format!(
                        "Project directory '{}' does not exist",
                        dir.display()
                    ));
                }
                Some(_) => {}
            }
            checks
                .output_path("Target directory", &t.target, &[])
                .globs(&t.exclude);
        }
        TaskKind::ZipFolder(t) => {
            checks
                .directory("Folder to zip", &t.folder)
                .output_path("Archive", &t.output, &["zip", "pk3", "pk7"])
                .globs(&t.exclude);
        }
    }

    checks.finish()
}

struct Checks<'a> {
    ctx: &'a InvocationContext,
    results: Vec<ValidateResult>,
}

impl<'a> Checks<'a> {
    fn new(ctx: &'a InvocationContext) -> Self {
        Self {
            ctx,
            results: Vec::new(),
        }
    }

    fn finish(self) -> Vec<ValidateResult> {
        self.results
    }

    fn error(&mut self, message: impl Into<String>) -> &mut Self {
        self.results.push(ValidateResult::error(message));
        self
    }

    fn warning(&mut self, message: impl Into<String>) -> &mut Self {
        self.results.push(ValidateResult::warning(message));
        self
    }

    fn tool(&mut self, key: &str, label: &str) -> &mut Self {
        if let Err(err) = self.ctx.bag().get_path(key) {
            self.results.push(
                ValidateResult::error(format!("{label} is not configured ({key})"))
                    .with_exception(err.into()),
            );
        }
        self
    }

    fn input_file(&mut self, label: &str, path: &Path, extensions: &[&str]) -> &mut Self {
        if path.as_os_str().is_empty() {
            return self.error(format!("{label} is not set"));
        }

        let resolved = self.ctx.resolve(path);
        let fs = self.ctx.fs();
        if !fs.exists(&resolved) {
            self.error(format!("{label} '{}' does not exist", path.display()));
        } else if !fs.is_file(&resolved) {
            self.error(format!("{label} '{}' is not a file", path.display()));
        }

        self.extension(label, path, extensions)
    }

    fn output_path(&mut self, label: &str, path: &Path, extensions: &[&str]) -> &mut Self {
        if path.as_os_str().is_empty() {
            return self.error(format!("{label} is not set"));
        }
        self.extension(label, path, extensions)
    }

    fn directory(&mut self, label: &str, path: &Path) -> &mut Self {
        if path.as_os_str().is_empty() {
            return self.error(format!("{label} is not set"));
        }
        if !self.ctx.fs().is_dir(&self.ctx.resolve(path)) {
            self.error(format!("{label} '{}' does not exist", path.display()));
        }
        self
    }

    fn include_dirs(&mut self, dirs: &[std::path::PathBuf]) -> &mut Self {
        for dir in dirs {
            if !self.ctx.fs().is_dir(&self.ctx.resolve(dir)) {
                self.warning(format!(
                    "Include directory '{}' does not exist",
                    dir.display()
                ));
            }
        }
        self
    }

    fn globs(&mut self, patterns: &[String]) -> &mut Self {
        for pattern in patterns {
            if let Err(err) = Glob::new(pattern) {
                self.results.push(
                    ValidateResult::error(format!("Invalid exclude pattern '{pattern}'"))
                        .with_exception(err.into()),
                );
            }
        }
        self
    }

    fn extension(&mut self, label: &str, path: &Path, expected: &[&str]) -> &mut Self {
        if expected.is_empty() {
            return self;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let matches = ext
            .as_deref()
            .is_some_and(|e| expected.iter().any(|x| x.eq_ignore_ascii_case(e)));

        if !matches {
            let wanted: Vec<String> = expected.iter().map(|e| format!(".{e}")).collect();
            self.warning(format!(
                "{label} '{}' has an unexpected extension (expected {})",
                path.display(),
                wanted.join(", ")
            ));
        }
        self
    }
}
