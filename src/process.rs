//! Synchronous execution of external commands.
//!
//! Commands are run through the host shell so that `2>&1` folds stderr into the
//! captured text. The calling thread blocks until the process exits; there is
//! no timeout.

use std::path::{Path, PathBuf};
use std::process::Command;

use itertools::Itertools;
use log::debug;

use crate::build_options::HostPlatform;
use crate::error::DriverError;

/// Combined output and exit code of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub output: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn new(output: impl Into<String>, exit_code: i32) -> Self {
        ExecResult {
            output: output.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A program invocation assembled argument by argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
    merge_stderr: bool,
    env_script: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLine {
            program: program.into(),
            args: Vec::new(),
            merge_stderr: false,
            env_script: None,
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(&mut self, path: &Path) -> &mut Self {
        self.arg(normalized_path(path))
    }

    /// Fold stderr into stdout with a shell redirect.
    pub fn merge_stderr(&mut self) -> &mut Self {
        self.merge_stderr = true;
        self
    }

    /// Run the command after a batch script that sets up its environment.
    pub fn within_environment(&mut self, script: impl Into<PathBuf>) -> &mut Self {
        self.env_script = Some(script.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Position of the first argument equal to `arg`.
    pub fn position(&self, arg: &str) -> Option<usize> {
        self.args.iter().position(|a| a == arg)
    }

    /// Shell text for `host`.
    pub fn render(&self, host: HostPlatform) -> String {
        let quote = match host {
            HostPlatform::Posix => quote_posix,
            HostPlatform::Windows => quote_windows,
        };
        let mut line = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .join(" ");
        if self.merge_stderr {
            line.push_str(" 2>&1");
        }
        match &self.env_script {
            Some(script) => format!(
                "cmd.exe /c \"call \"{}\" >nul 2>&1 && {}\"",
                script.display(),
                line
            ),
            None => line,
        }
    }
}

/// Forward-slash form of `path`, understood by every supported toolchain.
pub fn normalized_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn quote_posix(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn quote_windows(arg: &str) -> String {
    let safe = !arg.is_empty() && !arg.chars().any(|c| c.is_whitespace() || "\"&|<>^()".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("\"{}\"", arg.replace('"', "\\\""))
    }
}

/// Executes command lines and captures their combined output.
pub trait ProcessRunner {
    /// Run `command` to completion.
    ///
    /// A non-zero exit is a normal result; only a failure to start the process
    /// is an error.
    fn run(&self, command: &CommandLine) -> Result<ExecResult, DriverError>;

    /// Host the rendered command lines are meant for.
    fn host(&self) -> HostPlatform;
}

/// Runs commands through `sh -c` or `cmd /C`.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    host: HostPlatform,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(HostPlatform::current())
    }
}

impl SystemRunner {
    pub fn new(host: HostPlatform) -> Self {
        SystemRunner { host }
    }

    fn shell(&self, line: &str) -> Command {
        match self.host {
            HostPlatform::Posix => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(line);
                command
            }
            HostPlatform::Windows => windows_shell(line),
        }
    }
}

#[cfg(windows)]
fn windows_shell(line: &str) -> Command {
    use std::os::windows::process::CommandExt;
    let mut command = Command::new("cmd");
    command.arg("/C").raw_arg(line);
    command
}

#[cfg(not(windows))]
fn windows_shell(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandLine) -> Result<ExecResult, DriverError> {
        let line = command.render(self.host);
        debug!("exec: {}", line);
        let output = self.shell(&line).output().map_err(|source| DriverError::ProcessSpawn {
            command: line.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        // killed by a signal
        let exit_code = output.status.code().unwrap_or(-1);
        Ok(ExecResult::new(text, exit_code))
    }

    fn host(&self) -> HostPlatform {
        self.host
    }
}
