//! Shared fixtures for the binary tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Generated source of the entry unit; line 5 carries user code.
pub const GENERATED: &str = "int main() {\n  int x = 1;\n  int y = 2;\n  int z = 3;\n  return x + y\n}\n";

/// Line map sending generated line 5 to `main.hlx` 12:3.
pub const LINE_MAP: &str = r#"{"5": {"line": 12, "column": 3, "span": 4}}"#;

/// A fake C++ driver that identifies as Clang and reports one error against
/// line 5 of its last argument, or succeeds silently when `succeed` is set.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path, succeed: bool) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let body = if succeed {
        "exit 0\n"
    } else {
        "for last; do :; done\necho \"$last:5:3: error: expected ';' after expression\"\nexit 1\n"
    };
    let script = format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  echo \"clang version 17.0.6\"\n  exit 0\nfi\n{}",
        body
    );
    let path = dir.join("fake-cxx");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Writes the generated source, its line map and a core header into `dir`.
pub struct Workspace {
    pub generated: PathBuf,
    pub line_map: PathBuf,
    pub core_header: PathBuf,
    pub output: PathBuf,
}

pub fn workspace(dir: &Path) -> Workspace {
    let generated = dir.join("main.cxir");
    let line_map = dir.join("main.json");
    let core_header = dir.join("core.hh");
    std::fs::write(&generated, GENERATED).unwrap();
    std::fs::write(&line_map, LINE_MAP).unwrap();
    std::fs::write(&core_header, "#pragma once\n").unwrap();
    Workspace {
        generated,
        line_map,
        core_header,
        output: dir.join("main"),
    }
}
