use std::path::PathBuf;

use thiserror::Error;

use crate::action::ActionId;
use crate::toolchain::ToolchainFamily;

/// Faults that abort a compile action.
///
/// A rejected program is not a fault of the driver itself: it surfaces as
/// [`DriverError::Diagnostics`] only once every diagnostic of the invocation has
/// been reported.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no usable C++ toolchain found ({compiler}): {reason}")]
    ToolchainNotFound { compiler: String, reason: String },

    #[error("core runtime header not found: {}", .0.display())]
    MissingRuntime(PathBuf),

    #[error("failed to spawn `{command}`: {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compilation failed with {errors} error(s)")]
    Diagnostics { errors: usize },

    #[error(transparent)]
    Config(#[from] ConfigFault),

    #[error("invalid line map {}: {message}", path.display())]
    LineMap { path: PathBuf, message: String },
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(compiler: &str, reason: impl Into<String>) -> Self {
        DriverError::ToolchainNotFound {
            compiler: if compiler.is_empty() {
                "<unspecified>".to_string()
            } else {
                compiler.to_string()
            },
            reason: reason.into(),
        }
    }
}

/// Flag-table lookups that have no answer for the requested family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigFault {
    #[error("no flag spellings are known for the {0} toolchain family")]
    UnsupportedFamily(ToolchainFamily),

    #[error("compile action {0:?} is not registered in this build")]
    UnknownAction(ActionId),
}
