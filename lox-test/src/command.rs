use crate::error::{HarnessError, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::runtime::Runtime;
use tokio::time::timeout;

/// Everything observed from one interpreter invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// -1 when the process was killed by a signal or timed out
    pub exit_code: i32,
    /// Spawn to observed exit, including pipe draining
    pub wall_time: Duration,
    pub timed_out: bool,
}

/// Runs the interpreter against one source file.
///
/// A non-zero exit or stderr output is data, not an error; only failing to
/// start or observe the process is.
pub trait ProcessRunner {
    fn run(&self, source: &Path) -> Result<ExecutionOutcome>;
}

/// Runs an external interpreter executable as `<program> <source>`
pub struct InterpreterRunner {
    program: PathBuf,
    timeout: Option<Duration>,
    runtime: Runtime,
}

impl InterpreterRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(HarnessError::Runtime)?;

        Ok(Self {
            program: program.into(),
            timeout,
            runtime,
        })
    }

    async fn run_async(&self, source: &Path) -> Result<ExecutionOutcome> {
        debug!("running {} {}", self.program.display(), source.display());

        let start = Instant::now();
        let child = Command::new(&self.program)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let waited = match self.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    // Dropping the future drops the child, which kills it
                    warn!(
                        "{} timed out after {:.1}s",
                        source.display(),
                        limit.as_secs_f64()
                    );
                    return Ok(ExecutionOutcome {
                        stdout: Vec::new(),
                        stderr: Vec::new(),
                        exit_code: -1,
                        wall_time: start.elapsed(),
                        timed_out: true,
                    });
                }
            },
            None => child.wait_with_output().await,
        };
        let wall_time = start.elapsed();

        let output = waited.map_err(|source| HarnessError::Capture {
            program: self.program.clone(),
            source,
        })?;

        Ok(ExecutionOutcome {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code().unwrap_or(-1),
            wall_time,
            timed_out: false,
        })
    }
}

impl ProcessRunner for InterpreterRunner {
    fn run(&self, source: &Path) -> Result<ExecutionOutcome> {
        self.runtime.block_on(self.run_async(source))
    }
}
