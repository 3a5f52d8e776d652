//! External archiver adapter (secondary/driven adapter)
//!
//! Runs the archiver as a child process:
//!
//! ```text
//! <program> compress <output> <input>...
//! <program> decompress <archive> <output-dir>
//! ```
//!
//! ## Design Decisions
//!
//! - **Opaque results**: compress yields the exit code (`-1` when the process
//!   could not be spawned or was killed by a signal); decompress yields the
//!   last non-empty stdout line on success. Stderr is logged, never returned.
//! - **No timeout**: a run lasts as long as the archiver does.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use kittypress_core::ports::ICompressionEngine;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Exit code reported when the archiver did not exit normally
pub const ABNORMAL_EXIT: i32 = -1;

/// Compression engine backed by an external program
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: OsString,
}

impl CommandEngine {
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }
}

fn log_stderr(stderr: &[u8]) {
    let text = String::from_utf8_lossy(stderr);
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        debug!(line, "archiver stderr");
    }
}

/// Last non-empty line of the archiver's stdout
fn last_line(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl ICompressionEngine for CommandEngine {
    #[instrument(skip(self, inputs), fields(program = ?self.program, inputs = inputs.len()))]
    async fn compress(&self, inputs: &[PathBuf], output: &Path) -> i32 {
        let mut cmd = self.command();
        cmd.arg("compress").arg(output).args(inputs);
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());

        let result = match cmd.output().await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Failed to launch archiver");
                return ABNORMAL_EXIT;
            }
        };
        log_stderr(&result.stderr);

        let code = result.status.code().unwrap_or(ABNORMAL_EXIT);
        debug!(code, "Archiver compress finished");
        code
    }

    #[instrument(skip(self), fields(program = ?self.program))]
    async fn decompress(&self, archive: &Path, output_dir: &Path) -> Option<String> {
        let mut cmd = self.command();
        cmd.arg("decompress").arg(archive).arg(output_dir);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let result = match cmd.output().await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Failed to launch archiver");
                return None;
            }
        };
        log_stderr(&result.stderr);

        if !result.status.success() {
            warn!(status = %result.status, "Archiver decompress failed");
            return None;
        }
        let root = last_line(&result.stdout);
        debug!(root = ?root, "Archiver decompress finished");
        root
    }
}
