//! Location of the core runtime header injected into every generated source.

use std::path::{Path, PathBuf};

/// File name of the core runtime header.
pub const CORE_HEADER_NAME: &str = "core.hh";

/// Directories searched for the core header, most specific first.
///
/// Relative to the directory holding the driver executable:
/// 1. `core/`
/// 2. `../lib/cxir/core/`
/// 3. `../share/cxir/core/`
pub fn search_paths(exe_dir: &Path) -> Vec<PathBuf> {
    vec![
        exe_dir.join("core"),
        exe_dir.join("..").join("lib").join("cxir").join("core"),
        exe_dir.join("..").join("share").join("cxir").join("core"),
    ]
}

/// Finds a file in a list of directories.
pub fn find_file(filename: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    search_paths.iter().map(|dir| dir.join(filename)).find(|p| p.is_file())
}

/// Core header next to the running executable, if installed there.
pub fn locate_core_header() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let exe_dir = exe.parent()?;
    find_file(CORE_HEADER_NAME, &search_paths(exe_dir))
}
