use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::error::DriverError;
use crate::toolchain::ToolchainFamily;

/// Phases of one compile, in execution order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CompilePhase {
    #[default]
    Detect,
    Assemble,
    Execute,
    Parse,
    Remap,
    Report,
    Cleanup,
}

impl Display for CompilePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompilePhase::Detect => "detect",
            CompilePhase::Assemble => "assemble",
            CompilePhase::Execute => "execute",
            CompilePhase::Parse => "parse",
            CompilePhase::Remap => "remap",
            CompilePhase::Report => "report",
            CompilePhase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    Success,
    Error,
}

/// Outcome of one toolchain invocation
#[derive(Debug, Clone)]
pub struct CompileReport {
    pub status: BuildStatus,
    pub family: ToolchainFamily,
    pub exit_code: i32,
    /// Error-severity diagnostics reported for this invocation
    pub errors: usize,
    pub output: PathBuf,
    pub raw_output: String,
}

impl CompileReport {
    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }

    /// `Err(DriverError::Diagnostics)` unless the build succeeded.
    pub fn into_result(self) -> Result<CompileReport, DriverError> {
        match self.status {
            BuildStatus::Success => Ok(self),
            BuildStatus::Error => Err(DriverError::Diagnostics { errors: self.errors }),
        }
    }
}
