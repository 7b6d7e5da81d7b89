// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Runs the external tools the scan depends on (`file`, `ldd`, `nix-locate`, `patchelf`).
//!
//! Every tool sits behind a narrow capability trait so the pipeline can be driven by fakes.

mod classifier;
mod linkage;
mod patcher;
mod provider;

pub use classifier::{is_binary_marker, is_binary_or_library, ClassifiesFiles, FileCommand};
pub use linkage::{InspectsLinkage, Ldd, LinkageReport, LinkedDependency};
pub use patcher::{patch_binary, PatchError, Patchelf, PatchesBinaries};
pub use provider::{CachedLookup, LookupError, LooksUpProviders, NixLocate};

use std::ffi::OsStr;
use std::io::{self, Read};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use wait_timeout::ChildExt;

/// Default timeout for a single tool invocation (30 seconds).
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for tool invocations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Errors that can occur while running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Command not found: {command} (target: {target})")]
    CommandNotFound { command: String, target: String },
    #[error("Command failed: {command} (target: {target})")]
    CommandFailed {
        command: String,
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("Command timed out after {timeout:?}: {command} (target: {target})")]
    CommandTimeout {
        command: String,
        target: String,
        timeout: Duration,
    },
    #[error("Command exited with non-zero status {code}: {command} (target: {target}): {stderr}")]
    NonZeroExit {
        command: String,
        target: String,
        code: i32,
        stderr: String,
    },
}

type PipeReader = Receiver<io::Result<Vec<u8>>>;

/// A program plus the timeout applied to each of its invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    timeout: Option<Duration>,
}

impl ToolCommand {
    /// Create a command. A `timeout` of `None` waits for the tool indefinitely.
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Get the per-invocation timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run the tool with `args` and return its standard output.
    ///
    /// `target` names what the tool is run against and only appears in errors.
    /// The timeout covers both the tool's exit and the end of its output, so a
    /// background process still holding the pipes open counts as a timeout.
    ///
    /// # Errors
    /// Returns an error if the tool cannot be spawned, times out, is killed by a signal,
    /// or exits with a non-zero status.
    pub fn output<I, S>(&self, args: I, target: &str) -> ToolResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = match Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    return Err(ToolError::CommandNotFound {
                        command: self.program.clone(),
                        target: target.to_string(),
                    });
                }
                return Err(self.failed(target, e));
            }
        };

        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);

        // Drain both pipes while waiting, a full pipe would otherwise stall the child.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait(&mut child, target)?;
        let stdout = self.collect(stdout, deadline, target)?;
        let stderr = self.collect(stderr, deadline, target)?;

        if status.success() {
            Ok(String::from_utf8_lossy(&stdout).into_owned())
        } else {
            Err(ToolError::NonZeroExit {
                command: self.program.clone(),
                target: target.to_string(),
                code: status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            })
        }
    }

    /// Wait for the child, killing it once the timeout is reached.
    fn wait(&self, child: &mut Child, target: &str) -> ToolResult<ExitStatus> {
        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    reap(child);
                    return Err(self.timed_out(target, timeout));
                }
                Err(e) => {
                    reap(child);
                    return Err(self.failed(target, e));
                }
            },
            None => child.wait().map_err(|e| self.failed(target, e))?,
        };

        // Check if the process completed or was terminated by a signal.
        if status.code().is_some() {
            Ok(status)
        } else if let Some(signal) = status.signal() {
            Err(self.failed(
                target,
                io::Error::other(format!("Process terminated by signal: {signal}")),
            ))
        } else {
            Err(self.failed(target, io::Error::other("Unknown process termination")))
        }
    }

    /// Wait for a drained pipe until `deadline`.
    fn collect(
        &self,
        reader: Option<PipeReader>,
        deadline: Option<Instant>,
        target: &str,
    ) -> ToolResult<Vec<u8>> {
        let Some(reader) = reader else {
            return Ok(Vec::new());
        };
        let received = match (deadline, self.timeout) {
            (Some(deadline), Some(timeout)) => {
                match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(received) => received,
                    Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(target, timeout)),
                    Err(RecvTimeoutError::Disconnected) => {
                        return Err(self.failed(target, reader_gone()))
                    }
                }
            }
            _ => reader.recv().map_err(|_| self.failed(target, reader_gone()))?,
        };
        received.map_err(|e| self.failed(target, e))
    }

    fn timed_out(&self, target: &str, timeout: Duration) -> ToolError {
        ToolError::CommandTimeout {
            command: self.program.clone(),
            target: target.to_string(),
            timeout,
        }
    }

    fn failed(&self, target: &str, source: io::Error) -> ToolError {
        ToolError::CommandFailed {
            command: self.program.clone(),
            target: target.to_string(),
            source,
        }
    }
}

/// Kill the child and collect its exit status. Errors are ignored, the child may be gone already.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> PipeReader {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buffer = Vec::new();
        // The receiver is dropped once the deadline passed.
        let _ = sender.send(pipe.read_to_end(&mut buffer).map(|_| buffer));
    });
    receiver
}

fn reader_gone() -> io::Error {
    io::Error::other("Pipe reader thread exited without output")
}
