//! Compiler driver: turns generated sources into a binary with the host toolchain.
//!
//! - `cli` parses the command line into a [`cli::BuildConfig`]
//! - `command` assembles toolchain command lines
//! - `compiler` runs the compile pipeline over a [`crate::session::BuildSession`]
//! - `artifact` holds pipeline phases and results
//! - `output` prints diagnostics and raw toolchain output

pub mod artifact;
pub mod cli;
pub mod command;
pub mod compiler;
pub mod output;

#[cfg(test)]
mod tests_compiler;

pub use artifact::{BuildStatus, CompilePhase, CompileReport};
pub use cli::{BuildConfig, Cli};
pub use compiler::CompileOrchestrator;
