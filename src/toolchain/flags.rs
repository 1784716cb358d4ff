//! Spellings of every compiler option the driver passes, per toolchain family.
//!
//! An empty spelling means the family has no equivalent; the command builder
//! skips it.

use crate::error::ConfigFault;

use super::ToolchainFamily;

/// One logical compiler option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag {
    pub gcc: &'static str,
    pub clang: &'static str,
    pub msvc: &'static str,
    pub mingw: &'static str,
}

impl Flag {
    const fn new(gcc: &'static str, clang: &'static str, msvc: &'static str, mingw: &'static str) -> Self {
        Flag { gcc, clang, msvc, mingw }
    }
}

pub const DEBUG_INFO: Flag = Flag::new("-g -g3", "-g -g3", "/Zi", "-g -g3");
pub const OPTIMIZE_MAX: Flag = Flag::new("-O3", "-O3", "/O2", "-O3");
pub const FORCE_CXX: Flag = Flag::new("-xc++", "-xc++", "/TP", "-xc++");
pub const STD_CXX23: Flag = Flag::new("-std=c++23", "-std=c++23", "/std:c++latest", "-std=c++23");
pub const EXCEPTIONS: Flag = Flag::new("-fexceptions", "-fexceptions", "/EHsc", "-fexceptions");
pub const INCLUDE_HEADER: Flag = Flag::new("-include", "-include", "/FI", "-include");
pub const WARN_ALL: Flag = Flag::new("-Wall", "-Wall", "/W4", "-Wall");
pub const OUTPUT: Flag = Flag::new("-o", "-o", "/Fe:", "-o");
pub const SYNTAX_ONLY: Flag = Flag::new("-fsyntax-only", "-fsyntax-only", "/Zs", "-fsyntax-only");
pub const RUNTIME_LIBRARY_PATH: Flag = Flag::new(
    "-Wl,-w,-rpath,/usr/local/lib",
    "-Wl,-w,-rpath,/usr/local/lib",
    "",
    "-Wl,-w,-rpath,/usr/local/lib",
);

pub const NO_COLOR: Flag = Flag::new(
    "-fdiagnostics-color=never",
    "-fno-color-diagnostics",
    "",
    "-fdiagnostics-color=never",
);
pub const NO_FIXIT: Flag = Flag::new(
    "-fno-diagnostics-show-caret",
    "-fno-diagnostics-fixit-info",
    "",
    "-fno-diagnostics-show-caret",
);
pub const ABSOLUTE_PATHS: Flag = Flag::new("", "-fdiagnostics-absolute-paths", "/FC", "");
pub const NO_LINE_NUMBERS: Flag = Flag::new(
    "-fno-diagnostics-show-line-numbers",
    "-fno-diagnostics-show-line-numbers",
    "",
    "-fno-diagnostics-show-line-numbers",
);
pub const NO_OPTION_NAMES: Flag = Flag::new(
    "-fno-diagnostics-show-option",
    "-fno-diagnostics-show-option",
    "",
    "-fno-diagnostics-show-option",
);
pub const CARET_MAX_LINES: Flag = Flag::new("", "-fcaret-diagnostics-max-lines=0", "/diagnostics:classic", "");
pub const NO_ELIDE_TYPE: Flag = Flag::new("-fno-elide-type", "-fno-elide-type", "", "-fno-elide-type");
pub const LINK_TIME_OPTIMIZATION: Flag = Flag::new("-flto", "-flto", "", "-flto");

/// Flags that keep diagnostics in the one-line-per-message shape the parsers expect.
pub const DIAGNOSTICS_BATTERY: [Flag; 8] = [
    NO_COLOR,
    NO_FIXIT,
    ABSOLUTE_PATHS,
    NO_LINE_NUMBERS,
    NO_OPTION_NAMES,
    CARET_MAX_LINES,
    NO_ELIDE_TYPE,
    LINK_TIME_OPTIMIZATION,
];

/// Spelling of `flag` for `family`.
pub fn resolve(flag: &Flag, family: ToolchainFamily) -> Result<&'static str, ConfigFault> {
    match family {
        ToolchainFamily::Gcc => Ok(flag.gcc),
        ToolchainFamily::Clang => Ok(flag.clang),
        ToolchainFamily::Msvc => Ok(flag.msvc),
        ToolchainFamily::MinGw => Ok(flag.mingw),
        ToolchainFamily::Unknown => Err(ConfigFault::UnsupportedFamily(family)),
    }
}

/// Resolved spelling split into command-line arguments.
pub fn resolve_args(flag: &Flag, family: ToolchainFamily) -> Result<Vec<String>, ConfigFault> {
    Ok(resolve(flag, family)?.split_whitespace().map(str::to_string).collect())
}
