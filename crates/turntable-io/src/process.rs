// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Runs an external program with a deadline and a cancel flag.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::ProcessError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished program.
#[derive(Debug)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,
    /// Everything written to standard output.
    pub stdout: String,
    /// Everything written to standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// The last `lines` lines of standard error, for error messages.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        all[all.len().saturating_sub(lines)..].join("\n")
    }
}

/// An external program invocation.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<OsString>,
    timeout: Option<Duration>,
    cancel: Option<Arc<AtomicBool>>,
}

impl ExternalCommand {
    /// Creates an invocation of `program`, looked up on `PATH` unless it is a path.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
            cancel: None,
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kills the program if it has not exited after `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kills the program as soon as `flag` is raised.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The program as given.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Locates the program on `PATH`.
    pub fn resolve_program(&self) -> Result<PathBuf, ProcessError> {
        which::which(&self.program).map_err(|_| ProcessError::NotFound {
            program: self.program.clone(),
        })
    }

    /// Runs the program to completion, the deadline, or cancellation.
    ///
    /// A non-zero exit is not an error here; inspect [`ProcessOutput::status`].
    pub fn run(&self) -> Result<ProcessOutput, ProcessError> {
        let path = self.resolve_program()?;
        log::debug!("Running '{}' with {} argument(s)", path.display(), self.args.len());

        let mut child = Command::new(&path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Pipes are drained concurrently; a full pipe would stall the child.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.supervise(&mut child);
        let output = ProcessOutput {
            status: status?,
            stdout: join(stdout),
            stderr: join(stderr),
        };
        Ok(output)
    }

    fn supervise(&self, child: &mut Child) -> Result<ExitStatus, ProcessError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(source) => {
                    kill(child);
                    return Err(ProcessError::Wait {
                        program: self.program.clone(),
                        source,
                    });
                }
            }

            if self
                .cancel
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                kill(child);
                return Err(ProcessError::Cancelled {
                    program: self.program.clone(),
                });
            }

            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    log::warn!("'{}' exceeded {:?}, killing it", self.program, limit);
                    kill(child);
                    return Err(ProcessError::Timeout {
                        program: self.program.clone(),
                        seconds: limit.as_secs(),
                    });
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = pipe.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_not_found() {
        let err = ExternalCommand::new("definitely-not-a-real-renderer-binary")
            .run()
            .unwrap_err();
        assert!(matches!(err, ProcessError::NotFound { .. }));
    }

    #[test]
    fn test_stderr_tail() {
        #[cfg(unix)]
        let status = {
            use std::os::unix::process::ExitStatusExt;
            ExitStatus::from_raw(0)
        };
        #[cfg(windows)]
        let status = {
            use std::os::windows::process::ExitStatusExt;
            ExitStatus::from_raw(0)
        };
        let output = ProcessOutput {
            status,
            stdout: String::new(),
            stderr: "a\nb\nc\n".to_owned(),
        };
        assert_eq!(output.stderr_tail(2), "b\nc");
        assert_eq!(output.stderr_tail(10), "a\nb\nc");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_program() {
        let started = Instant::now();
        let err = ExternalCommand::new("sleep")
            .arg("5")
            .timeout(Some(Duration::from_millis(200)))
            .run()
            .unwrap_err();
        assert!(matches!(err, ProcessError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancel_kills_program() {
        let flag = Arc::new(AtomicBool::new(true));
        let err = ExternalCommand::new("sleep")
            .arg("5")
            .cancel_flag(flag)
            .run()
            .unwrap_err();
        assert!(matches!(err, ProcessError::Cancelled { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_is_captured() {
        let output = ExternalCommand::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .run()
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
    }
}
