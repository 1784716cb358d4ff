//! Test doubles and fixtures shared by unit and integration tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::action::ActionRequest;
use crate::build_options::{BuildOptions, HostPlatform};
use crate::error::DriverError;
use crate::process::{CommandLine, ExecResult, ProcessRunner};
use crate::source::{SourceLineMap, SourceLocation};

/// Test configuration constants
pub mod config {
    /// Version banner of a Clang driver
    pub const CLANG_VERSION: &str = "clang version 17.0.6\nTarget: x86_64-pc-linux-gnu\n";
    /// Version banner of a GCC driver
    pub const GCC_VERSION: &str = "g++ (GCC) 13.2.1 20230801\nCopyright (C) 2023 Free Software Foundation, Inc.\n";
    /// Version banner of a driver no family matches
    pub const UNKNOWN_VERSION: &str = "tcc version 0.9.27 (x86_64 Linux)\n";
}

#[derive(Debug)]
enum Outcome {
    Exit(ExecResult),
    SpawnFailure,
}

#[derive(Debug)]
struct Response {
    needle: String,
    outcome: Outcome,
    once: bool,
}

/// One call seen by a [`ScriptedRunner`].
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandLine,
    pub rendered: String,
    /// Whether the watched path existed when the call was made
    pub watched_existed: Option<bool>,
}

/// A [`ProcessRunner`] that answers from a script instead of spawning processes.
///
/// A call is answered by the first response whose needle occurs in the
/// rendered command line. Unscripted calls behave like a shell that cannot
/// find the program.
#[derive(Debug)]
pub struct ScriptedRunner {
    host: HostPlatform,
    responses: RefCell<Vec<Response>>,
    invocations: RefCell<Vec<Invocation>>,
    watched: RefCell<Option<PathBuf>>,
}

impl ScriptedRunner {
    pub fn new(host: HostPlatform) -> Self {
        ScriptedRunner {
            host,
            responses: RefCell::new(Vec::new()),
            invocations: RefCell::new(Vec::new()),
            watched: RefCell::new(None),
        }
    }

    fn push(&self, needle: &str, outcome: Outcome, once: bool) {
        self.responses.borrow_mut().push(Response {
            needle: needle.to_string(),
            outcome,
            once,
        });
    }

    /// Answer every matching call with `output` and `exit_code`.
    pub fn respond(&self, needle: &str, output: impl Into<String>, exit_code: i32) {
        self.push(needle, Outcome::Exit(ExecResult::new(output, exit_code)), false);
    }

    /// Answer only the next matching call.
    pub fn respond_once(&self, needle: &str, output: impl Into<String>, exit_code: i32) {
        self.push(needle, Outcome::Exit(ExecResult::new(output, exit_code)), true);
    }

    /// Fail to start matching processes.
    pub fn fail_spawn(&self, needle: &str) {
        self.push(needle, Outcome::SpawnFailure, false);
    }

    /// Record, for every call, whether `path` exists at that moment.
    pub fn watch(&self, path: impl Into<PathBuf>) {
        *self.watched.borrow_mut() = Some(path.into());
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Number of calls whose command line contains `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.invocations.borrow().iter().filter(|i| i.rendered.contains(needle)).count()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, command: &CommandLine) -> Result<ExecResult, DriverError> {
        let rendered = command.render(self.host);
        let watched_existed = self.watched.borrow().as_deref().map(Path::exists);
        self.invocations.borrow_mut().push(Invocation {
            command: command.clone(),
            rendered: rendered.clone(),
            watched_existed,
        });

        let mut responses = self.responses.borrow_mut();
        let Some(index) = responses.iter().position(|r| rendered.contains(&r.needle)) else {
            return Ok(ExecResult::new(format!("sh: 1: {}: not found\n", command.program()), 127));
        };
        let outcome = if responses[index].once {
            responses.remove(index).outcome
        } else {
            match &responses[index].outcome {
                Outcome::Exit(result) => Outcome::Exit(result.clone()),
                Outcome::SpawnFailure => Outcome::SpawnFailure,
            }
        };

        match outcome {
            Outcome::Exit(result) => Ok(result),
            Outcome::SpawnFailure => Err(DriverError::ProcessSpawn {
                command: rendered,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
        }
    }

    fn host(&self) -> HostPlatform {
        self.host
    }
}

/// Build options for `host` with a core header at `core_header`.
pub fn options_for(host: HostPlatform, core_header: &Path) -> BuildOptions {
    let mut options = BuildOptions::new(core_header);
    options.host = host;
    options
}

/// Request for a unit whose generated line 5 maps to `main.hlx` 12:3 (span 4).
pub fn sample_request(working_dir: &Path, original: &str) -> ActionRequest {
    let mut request = ActionRequest::new("int main() {\n  return 0;\n}\n", original);
    request.working_dir = working_dir.to_path_buf();
    request.output = working_dir.join("a.out");
    request.line_map = [(5, SourceLocation::new(12, 3, 4))].into_iter().collect::<SourceLineMap>();
    request
}

/// Write an empty core runtime header into `dir`.
pub fn write_core_header(dir: &Path) -> PathBuf {
    let path = dir.join("core.hh");
    std::fs::write(&path, "#pragma once\n").unwrap_or_else(|e| panic!("writing {}: {}", path.display(), e));
    path
}
