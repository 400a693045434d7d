//! External process execution.
//!
//! Every stage that touches the outside world (probing, installing, scanning)
//! goes through [`CommandRunner`], so the pipeline can be driven by a scripted
//! runner in tests without spawning anything.

use std::ffi::{OsStr, OsString};
use std::fmt::Debug;
use std::io;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Environment handed to child processes.
///
/// Only `PATH` is tracked: an environment refresh may discover directories the
/// current process did not inherit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    path: Option<OsString>,
}

impl Environment {
    /// Whatever this process inherited.
    pub fn inherited() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<OsString>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The refreshed `PATH`, if a refresh produced one.
    pub fn path_override(&self) -> Option<&OsStr> {
        self.path.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub path: Option<OsString>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            path: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env(mut self, env: &Environment) -> Self {
        self.path = env.path_override().map(OsStr::to_os_string);
        self
    }

    /// Human-readable command line, for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and captured streams of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// "status 1" / "a signal", for error messages.
    pub fn describe_exit(&self) -> String {
        match self.code {
            Some(code) => format!("status {code}"),
            None => "a signal".to_string(),
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync + Debug {
    /// Runs the command to completion.
    ///
    /// `Err` means the process could not be started at all; a process that ran
    /// and failed is an `Ok` with `success == false`.
    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;
}

/// Spawns real processes on the tokio runtime.
///
/// Children are killed when the returned future is dropped, so wrapping a call
/// in `tokio::time::timeout` also stops the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        debug!(command = %invocation.display(), "spawning");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(path) = &invocation.path {
            command.env("PATH", path);
        }

        let output = command.output().await?;
        debug!(
            command = %invocation.display(),
            code = ?output.status.code(),
            "finished"
        );
        Ok(output.into())
    }
}
