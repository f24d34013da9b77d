//! External tool execution
//!
//! Every configure, build, test and install step is a single process
//! invocation. Failures are returned as [`ToolFailure`] with the tool's own
//! exit code and, when output was captured, its stderr.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::ToolFailure;

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; the current directory when `None`
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, cwd: PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    /// Shell-like rendering for logs and error messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{part}\"")
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs external tools
pub trait ToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolFailure>;
}

/// Runs tools as child processes of this one
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// Capture output instead of streaming it (quiet mode)
    capture: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture tool output; stderr is attached to failures
    #[must_use]
    pub fn captured(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<(), ToolFailure> {
        let command_line = invocation.command_line();
        let program = which::which(&invocation.program)
            .map_err(|e| ToolFailure {
                command: command_line.clone(),
                code: None,
                stderr: format!("'{}' not found: {e}", invocation.program),
            })?;

        tracing::debug!("Running: {command_line}");

        let mut command = Command::new(program);
        command.args(&invocation.args);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        if self.capture {
            let output = command
                .stdin(Stdio::null())
                .output()
                .map_err(|e| ToolFailure::spawn(&command_line, &e))?;
            if output.status.success() {
                return Ok(());
            }
            return Err(ToolFailure {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let status = command
            .status()
            .map_err(|e| ToolFailure::spawn(&command_line, &e))?;
        if status.success() {
            Ok(())
        } else {
            Err(ToolFailure {
                command: command_line,
                code: status.code(),
                stderr: String::new(),
            })
        }
    }
}
