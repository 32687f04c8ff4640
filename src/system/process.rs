// src/system/process.rs

//! Process execution boundary: takes a fully resolved [`ExecutionContext`]
//! and runs it synchronously, blocking until the child exits. No timeout,
//! cancellation or retry logic lives here; one invocation is one
//! subprocess lifetime.

use crate::core::resolver;
use std::io;
use std::path::PathBuf;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Executable '{0}' was not found on the system PATH.")]
    NotOnPath(String),
    #[error("Command '{command}' could not be executed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Command '{command}' exited with code {code}.")]
    NonZeroExit { command: String, code: i32 },
}

/// A fully resolved process invocation: the argument vector plus the
/// execution metadata consumed by the process boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// The argument vector. Element 0 is the program name, and is what gets
    /// spawned unless `executable` overrides it.
    pub arguments: Vec<String>,
    /// Binary to spawn instead of argument 0.
    pub executable: Option<PathBuf>,
    /// Working directory for the child; the caller's is inherited when unset.
    pub current_path: Option<PathBuf>,
    /// Look the executable up on the system `PATH` before spawning.
    pub use_path: bool,
}

impl ExecutionContext {
    pub fn new(arguments: Vec<String>) -> Self {
        Self {
            arguments,
            ..Self::default()
        }
    }

    /// Single-line rendering for error messages and logs.
    pub fn display_command(&self) -> String {
        self.arguments.join(" ")
    }
}

/// The seam between command templates and the operating system. Facades and
/// tests substitute their own implementation; production code uses
/// [`SystemProcess`].
pub trait ProcessRunner {
    /// Spawns the context's command, waits for it, and returns the exit code.
    fn sync_execute(&self, context: &ExecutionContext) -> Result<i32, ProcessError>;

    /// Like [`ProcessRunner::sync_execute`], but a nonzero exit code becomes
    /// a [`ProcessError::NonZeroExit`] carrying that code.
    fn check_sync_execute(&self, context: &ExecutionContext) -> Result<(), ProcessError> {
        match self.sync_execute(context)? {
            0 => Ok(()),
            code => Err(ProcessError::NonZeroExit {
                command: context.display_command(),
                code,
            }),
        }
    }
}

/// Production process boundary on top of `std::process::Command`. Stdio is
/// inherited from the caller; the call blocks until the child exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ProcessRunner for SystemProcess {
    fn sync_execute(&self, context: &ExecutionContext) -> Result<i32, ProcessError> {
        let program = match (&context.executable, context.arguments.first()) {
            (Some(exe), _) => exe.clone(),
            (None, Some(first)) => PathBuf::from(first),
            (None, None) => return Err(ProcessError::EmptyCommand),
        };
        let program = if context.use_path {
            resolver::search_path(&program)
                .ok_or_else(|| ProcessError::NotOnPath(program.display().to_string()))?
        } else {
            program
        };
        log::debug!(
            "Spawning '{}' for command '{}'",
            program.display(),
            context.display_command()
        );

        let mut command = StdCommand::new(&program);
        command
            .args(context.arguments.iter().skip(1))
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &context.current_path {
            command.current_dir(dunce::simplified(cwd));
        }
        set_argv0(&mut command, context);

        let status = command.status().map_err(|e| ProcessError::CommandFailed {
            command: context.display_command(),
            source: e,
        })?;
        Ok(exit_code(status))
    }
}

/// Free-function convenience over [`SystemProcess`].
pub fn sync_execute(context: &ExecutionContext) -> Result<i32, ProcessError> {
    SystemProcess.sync_execute(context)
}

/// Free-function convenience over [`SystemProcess`].
pub fn check_sync_execute(context: &ExecutionContext) -> Result<(), ProcessError> {
    SystemProcess.check_sync_execute(context)
}

// When an executable override diverges from argument 0, the child still
// sees argument 0 as its argv[0] where the platform allows it.
#[cfg(unix)]
fn set_argv0(command: &mut StdCommand, context: &ExecutionContext) {
    use std::os::unix::process::CommandExt;
    if context.executable.is_some() {
        if let Some(first) = context.arguments.first() {
            command.arg0(first);
        }
    }
}

#[cfg(not(unix))]
fn set_argv0(_command: &mut StdCommand, _context: &ExecutionContext) {}

/// Signal-terminated children map to the `128 + signal` shell convention.
#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

// MARK: --- UNIT TESTS ---
