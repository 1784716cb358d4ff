use std::path::PathBuf;

use bitflags::bitflags;
use target_lexicon::{OperatingSystem, Triple};

bitflags! {
    /// Build flags handed over by the front end
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CompileFlags: u8 {
        const DEBUG   = 1 << 0;
        const VERBOSE = 1 << 1;
    }
}

impl CompileFlags {
    pub fn from_switches(debug: bool, verbose: bool) -> Self {
        let mut flags = CompileFlags::empty();
        flags.set(CompileFlags::DEBUG, debug);
        flags.set(CompileFlags::VERBOSE, verbose);
        flags
    }

    pub fn is_debug(self) -> bool {
        self.contains(CompileFlags::DEBUG)
    }

    pub fn is_verbose(self) -> bool {
        self.contains(CompileFlags::VERBOSE)
    }
}

/// Operating-system family of the machine running the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Posix,
    Windows,
}

impl HostPlatform {
    pub fn current() -> Self {
        Self::from_triple(&Triple::host())
    }

    pub fn from_triple(triple: &Triple) -> Self {
        match triple.operating_system {
            OperatingSystem::Windows => HostPlatform::Windows,
            _ => HostPlatform::Posix,
        }
    }

    pub fn is_windows(self) -> bool {
        self == HostPlatform::Windows
    }

    /// Extension appended to produced executables
    pub fn exe_suffix(self) -> &'static str {
        match self {
            HostPlatform::Posix => "",
            HostPlatform::Windows => ".exe",
        }
    }
}

/// How a generated line with no table entry is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RemapPolicy {
    /// Only exact line matches are remapped
    #[default]
    Exact,
    /// Fall back to the nearest mapped line
    Nearest,
}

/// Options shared by every action of one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Pre-specified compiler; `None` lets the orchestrator pick per host
    pub compiler: Option<String>,
    /// Header injected in front of every generated source
    pub core_header: PathBuf,
    /// Check syntax only instead of producing a binary
    pub dry_run: bool,
    pub remap_policy: RemapPolicy,
    pub host: HostPlatform,
}

impl BuildOptions {
    pub fn new(core_header: impl Into<PathBuf>) -> Self {
        BuildOptions {
            compiler: None,
            core_header: core_header.into(),
            dry_run: false,
            remap_policy: RemapPolicy::default(),
            host: HostPlatform::current(),
        }
    }
}
