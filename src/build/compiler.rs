// src/build/compiler.rs

//! External document compiler invocation
//!
//! The compiler runs non-interactively inside the build's scratch directory
//! with stdin closed and a hard timeout. Its combined output goes to a log
//! file in that directory; it is never returned to callers.

use crate::error::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Name of the compiler log inside the scratch directory
pub const COMPILE_LOG: &str = "compile.log";

/// How a compiler run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    /// Exited with this code (`None` if killed by a signal)
    Exited(Option<i32>),
    /// Killed after exceeding the timeout
    TimedOut,
}

/// Result of a compiler run
///
/// Success is judged by the caller from the presence of the artifact, not
/// from the exit status: LaTeX often exits non-zero after writing a usable
/// document.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub status: CompileStatus,
    /// Compiler log, if one was written
    pub log: Option<PathBuf>,
}

/// Turns a source file into a document in the same directory
pub trait Compiler: Send + Sync {
    /// Compile `source`, writing outputs into `workdir`
    ///
    /// Returns an error only if the compiler could not be run at all.
    fn compile(&self, workdir: &Path, source: &Path, timeout: Duration) -> Result<CompileOutput>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// `latexmk` driving LuaLaTeX
#[derive(Debug, Clone)]
pub struct Latexmk {
    program: PathBuf,
}

impl Latexmk {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command line arguments for one run
    pub fn args(workdir: &Path, source: &Path) -> Vec<String> {
        vec![
            "-pdf".to_string(),
            "-lualatex".to_string(),
            "-interaction=nonstopmode".to_string(),
            format!("-output-directory={}", workdir.display()),
            source.display().to_string(),
        ]
    }
}

impl Default for Latexmk {
    fn default() -> Self {
        Self::new("latexmk")
    }
}

impl Compiler for Latexmk {
    fn compile(&self, workdir: &Path, source: &Path, timeout: Duration) -> Result<CompileOutput> {
        let log_path = workdir.join(COMPILE_LOG);
        let log = File::create(&log_path).map_err(|e| Error::fs(&log_path, e))?;
        let log_err = log.try_clone().map_err(|e| Error::fs(&log_path, e))?;

        let args = Self::args(workdir, source);
        debug!("Running {} {:?}", self.program.display(), args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(workdir)
            .env("LC_ALL", "C.UTF-8")
            .env("LANG", "C.UTF-8")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .spawn()
            .map_err(|e| {
                Error::CompilerError(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let status = match child.wait_timeout(timeout)? {
            Some(status) => CompileStatus::Exited(status.code()),
            None => {
                warn!(
                    "{} exceeded {}s, killing it",
                    self.program.display(),
                    timeout.as_secs()
                );
                let _ = child.kill();
                let _ = child.wait();
                CompileStatus::TimedOut
            }
        };

        Ok(CompileOutput {
            status,
            log: Some(log_path),
        })
    }

    fn name(&self) -> &str {
        "latexmk"
    }
}
