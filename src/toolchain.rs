//! Toolchain families and their per-family behaviour.
//!
//! Every family-dependent decision (flag dialect, diagnostic grammar, command
//! wrapping) is an exhaustive `match` on [`ToolchainFamily`], so adding a family
//! is a compile-time checked change.

pub mod flags;
pub mod msvc;

use std::fmt::{Display, Formatter};


use crate::diagnostic::parse::DiagnosticSyntax;

/// Generic C++ driver used on POSIX hosts and as the Windows fallback.
pub const GENERIC_DRIVER: &str = "c++";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolchainFamily {
    Gcc,
    Clang,
    Msvc,
    MinGw,
    Unknown,
}

impl ToolchainFamily {
    /// Classify the output of `<compiler> --version`.
    ///
    /// MinGW builds of GCC mention `gcc` as well, so `mingw` is checked first.
    pub fn detect(version_output: &str) -> Self {
        let text = version_output.to_ascii_lowercase();
        if text.contains("clang") {
            ToolchainFamily::Clang
        } else if text.contains("mingw") {
            ToolchainFamily::MinGw
        } else if text.contains("gcc") || text.contains("g++") || text.contains("free software foundation") {
            ToolchainFamily::Gcc
        } else if text.contains("msvc") || text.contains("microsoft") {
            ToolchainFamily::Msvc
        } else {
            ToolchainFamily::Unknown
        }
    }

    /// Grammar of the diagnostics this family prints; `None` means the output
    /// cannot be interpreted and is shown verbatim.
    pub fn diagnostic_syntax(self) -> Option<DiagnosticSyntax> {
        match self {
            ToolchainFamily::Gcc | ToolchainFamily::Clang | ToolchainFamily::MinGw => Some(DiagnosticSyntax::Gnu),
            ToolchainFamily::Msvc => Some(DiagnosticSyntax::Msvc),
            ToolchainFamily::Unknown => None,
        }
    }

    /// Family whose flag spellings are used to build the command line.
    ///
    /// An unknown driver is addressed with GCC spellings, the lowest common
    /// denominator of C-family drivers.
    pub fn flag_dialect(self) -> ToolchainFamily {
        match self {
            ToolchainFamily::Unknown => ToolchainFamily::Gcc,
            known => known,
        }
    }

    /// Whether the diagnostics-formatting battery should be passed.
    pub fn formats_diagnostics(self) -> bool {
        match self {
            ToolchainFamily::Gcc | ToolchainFamily::Clang | ToolchainFamily::MinGw | ToolchainFamily::Msvc => true,
            ToolchainFamily::Unknown => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "gcc",
            ToolchainFamily::Clang => "clang",
            ToolchainFamily::Msvc => "msvc",
            ToolchainFamily::MinGw => "mingw",
            ToolchainFamily::Unknown => "unknown",
        }
    }
}

impl Display for ToolchainFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
