//! Terminal output of a build: diagnostics and raw toolchain output.

use std::io::IsTerminal;

use log::{error, info};

use crate::diagnostic::{ErrorFormatter, NormalizedDiagnostic};

pub const RAW_OUTPUT_OPEN: &str = "output ------------>";
pub const RAW_OUTPUT_CLOSE: &str = "<------------ output";

/// Handler for diagnostic and raw output
pub struct OutputHandler {
    formatter: ErrorFormatter,
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler {
    pub fn new() -> Self {
        OutputHandler {
            formatter: ErrorFormatter::new(true, std::io::stderr().is_terminal()),
        }
    }

    pub fn with_formatter(formatter: ErrorFormatter) -> Self {
        OutputHandler { formatter }
    }

    pub fn print_diagnostics(&self, diagnostics: &[NormalizedDiagnostic]) {
        self.formatter.print_diagnostics(diagnostics);
    }

    /// Show toolchain output that could not be interpreted, between delimiters.
    pub fn dump_raw_output(&self, output: &str) {
        error!("unknown C++ compiler, raw output shown");
        info!("{}", RAW_OUTPUT_OPEN);
        for line in output.lines() {
            info!("{}", line);
        }
        info!("{}", RAW_OUTPUT_CLOSE);
    }

    /// Surface the output of a failed run that yielded no error diagnostic.
    pub fn dump_unexplained_failure(&self, exit_code: i32, output: &str) {
        error!("compiler exited with {} without reporting an error", exit_code);
        for line in output.lines() {
            error!("{}", line);
        }
    }
}
