//! Translation of raw toolchain diagnostics into original-program coordinates.

use std::path::Path;

use log::debug;

use crate::build_options::RemapPolicy;
use crate::process::normalized_path;
use crate::source::{SourceLineMap, SourceLocation};

use super::parse::RawDiagnostic;
use super::{NormalizedDiagnostic, OriginFile, Position};

/// One generated source and the program it was lowered from.
#[derive(Debug, Clone, Copy)]
pub struct RemapUnit<'a> {
    pub generated: &'a Path,
    pub original: &'a Path,
    pub line_map: &'a SourceLineMap,
}

pub struct SourceRemapper<'a> {
    units: Vec<RemapUnit<'a>>,
    core_header: &'a Path,
    policy: RemapPolicy,
}

impl<'a> SourceRemapper<'a> {
    pub fn new(core_header: &'a Path, policy: RemapPolicy) -> Self {
        SourceRemapper {
            units: Vec::new(),
            core_header,
            policy,
        }
    }

    pub fn add_unit(&mut self, unit: RemapUnit<'a>) {
        self.units.push(unit);
    }

    /// Rewrite `raw` against the registered units.
    ///
    /// Returns `None` when the diagnostic is suppressed: anything but an error
    /// raised inside the core runtime header, and non-errors in files that do
    /// not exist.
    pub fn translate(&self, raw: RawDiagnostic) -> Option<NormalizedDiagnostic> {
        let reported = SourceLocation::new(raw.line, raw.column, 1);

        let (file, position) = if same_path(&raw.file, self.core_header) {
            if !raw.severity.is_error() {
                debug!("suppressed core-library {}: {}", raw.severity.label(), raw.message);
                return None;
            }
            (OriginFile::CoreLibrary(raw.file), Position::Native(reported))
        } else if let Some(unit) = self.units.iter().find(|u| same_path(&raw.file, u.generated)) {
            let position = match unit.line_map.lookup(raw.line, self.policy) {
                Some(original) => Position::Mapped(original),
                None => Position::Other(reported),
            };
            (OriginFile::User(unit.original.to_path_buf()), position)
        } else if raw.file.exists() {
            (OriginFile::External(raw.file), Position::Native(reported))
        } else if raw.severity.is_error() {
            (OriginFile::External(raw.file), Position::Other(reported))
        } else {
            debug!(
                "dropped {} in missing file {}: {}",
                raw.severity.label(),
                raw.file.display(),
                raw.message
            );
            return None;
        };

        Some(NormalizedDiagnostic {
            severity: raw.severity,
            message: raw.message,
            code: raw.code,
            file,
            position,
        })
    }
}

/// Paths compare equal when their forward-slash forms match or both resolve to the same file.
fn same_path(a: &Path, b: &Path) -> bool {
    if normalized_path(a) == normalized_path(b) {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
