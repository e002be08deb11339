//! Child process invocation.
//!
//! The provisioner never spawns processes directly; it describes them as
//! [`Invocation`]s and hands them to a [`ProcessRunner`].

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// A program with arguments and per-process environment changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub envs: Vec<(OsString, OsString)>,
    pub env_remove: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            envs: Vec::new(),
            env_remove: Vec::new(),
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

    pub fn envs(mut self, envs: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        self.envs.extend(envs);
        self
    }

    pub fn env_remove(mut self, key: impl AsRef<OsStr>) -> Self {
        self.env_remove.push(key.as_ref().to_os_string());
        self
    }

    /// Program and arguments as a single display string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl RunOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

impl From<ExitStatus> for RunOutcome {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Runs invocations to completion. Blocks until the child exits; no timeout.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RunOutcome>;
}

/// Spawns real processes. stdin is closed; stderr is inherited so pip and venv
/// diagnostics reach the operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    /// Send child stdout to our stderr, keeping stdout for machine-readable output.
    pub stdout_to_stderr: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<RunOutcome> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        for key in &invocation.env_remove {
            cmd.env_remove(key);
        }
        for (key, value) in &invocation.envs {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        if self.stdout_to_stderr {
            cmd.stdout(Stdio::from(io::stderr()));
        }
        tracing::debug!(command = %invocation.command_line(), "spawning");
        let status = cmd.status()?;
        Ok(RunOutcome::from(status))
    }
}
