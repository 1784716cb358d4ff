//! Back end of the CX-IR toolchain: compiles generated C++ sources with the
//! host toolchain and reports its diagnostics against the original program.

pub mod action;
pub mod build_options;
/// Diagnostic model, toolchain output parsers and remapping.
pub mod diagnostic;
/// Command-line front end and compile orchestration.
pub mod driver;
/// Contains the error types for the application.
pub mod error;
/// Contains the logger.
pub mod logger;
pub mod process;
pub mod runtime;
pub mod session;
pub mod source;
pub mod toolchain;

pub mod test_utils;

pub use error::DriverError;
