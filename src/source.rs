use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::build_options::RemapPolicy;
use crate::error::DriverError;

/// A position in the original program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    #[serde(default = "default_span")]
    pub span: u32,
}

fn default_span() -> u32 {
    1
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, span: u32) -> Self {
        Self { line, column, span }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Generated-source line number to original position, filled in by the IR emitter.
///
/// Lines without an entry are legal: the emitter only records lines that carry
/// user code, so a lookup miss must never be treated as a fault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceLineMap {
    entries: BTreeMap<u32, SourceLocation>,
}

impl SourceLineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, generated_line: u32, location: SourceLocation) {
        self.entries.insert(generated_line, location);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact lookup.
    pub fn remap(&self, generated_line: u32) -> Option<SourceLocation> {
        self.entries.get(&generated_line).copied()
    }

    /// Closest mapped line; on a tie the later line wins.
    pub fn nearest(&self, generated_line: u32) -> Option<SourceLocation> {
        if let Some(exact) = self.remap(generated_line) {
            return Some(exact);
        }
        let below = self.entries.range(..generated_line).next_back();
        let above = self.entries.range(generated_line..).next();
        match (below, above) {
            (Some((&lo, lo_loc)), Some((&hi, hi_loc))) => {
                if generated_line - lo < hi - generated_line {
                    Some(*lo_loc)
                } else {
                    Some(*hi_loc)
                }
            }
            (Some((_, loc)), None) | (None, Some((_, loc))) => Some(*loc),
            (None, None) => None,
        }
    }

    pub fn lookup(&self, generated_line: u32, policy: RemapPolicy) -> Option<SourceLocation> {
        match policy {
            RemapPolicy::Exact => self.remap(generated_line),
            RemapPolicy::Nearest => self.nearest(generated_line),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Load a JSON line map written by the emitter.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let text = std::fs::read_to_string(path).map_err(|e| DriverError::io(path, e))?;
        Self::from_json(&text).map_err(|e| DriverError::LineMap {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl FromIterator<(u32, SourceLocation)> for SourceLineMap {
    fn from_iter<T: IntoIterator<Item = (u32, SourceLocation)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
