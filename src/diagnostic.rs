pub mod parse;
pub mod remap;

use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use hashbrown::HashMap;

use crate::source::SourceLocation;

/// Marker shown for positions that could not be traced back to the original program
pub const OTHER_ORIGIN: &str = "<other>";

/// Marker prefixed to files that belong to the injected core runtime
pub const CORE_LIBRARY: &str = "core-library";

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Note,
    /// Anything the toolchain did not classify as error, warning or note
    Fatal,
}

impl Severity {
    /// Map a toolchain category word. Matching is case-sensitive.
    pub fn from_category(category: &str) -> Self {
        match category {
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            "note" => Severity::Note,
            _ => Severity::Fatal,
        }
    }

    /// Whether this severity fails the build.
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Fatal => "fatal",
        }
    }
}

/// Where a diagnostic points, after remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Original-program coordinates from the line map
    Mapped(SourceLocation),
    /// Coordinates inside a real file the toolchain read (system headers, the core runtime)
    Native(SourceLocation),
    /// Generated-source coordinates with no line-map entry
    Other(SourceLocation),
}

impl Position {
    pub fn is_mapped(&self) -> bool {
        matches!(self, Position::Mapped(_))
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Mapped(loc) | Position::Native(loc) => write!(f, "{}", loc),
            Position::Other(loc) => write!(f, "{} {}", loc, OTHER_ORIGIN),
        }
    }
}

/// File a diagnostic is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginFile {
    /// The user's original source
    User(PathBuf),
    /// The injected core runtime header
    CoreLibrary(PathBuf),
    /// Any other file reported by the toolchain
    External(PathBuf),
}

impl Display for OriginFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginFile::CoreLibrary(p) => write!(f, "[{}] {}", CORE_LIBRARY, p.display()),
            OriginFile::User(p) | OriginFile::External(p) => write!(f, "{}", p.display()),
        }
    }
}

/// A toolchain diagnostic expressed in terms of the original program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDiagnostic {
    pub severity: Severity,
    pub message: String,
    /// Vendor code such as `C2143`
    pub code: Option<String>,
    pub file: OriginFile,
    pub position: Position,
}

/// Collects the diagnostics of one build.
///
/// Doubles as the build's "has errored" state: a single error-severity
/// diagnostic fails the build no matter what the toolchain's exit code says.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<NormalizedDiagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: NormalizedDiagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity.is_error()).count()
    }

    pub fn diagnostics(&self) -> &[NormalizedDiagnostic] {
        &self.diagnostics
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
    }
}

/// Renders diagnostics for the terminal.
pub struct ErrorFormatter {
    pub show_source: bool,
    pub use_colors: bool,
    source_cache: RefCell<HashMap<PathBuf, Option<Vec<String>>>>,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ErrorFormatter {
    pub fn new(show_source: bool, use_colors: bool) -> Self {
        ErrorFormatter {
            show_source,
            use_colors,
            source_cache: RefCell::new(HashMap::new()),
        }
    }

    /// No colors and no source excerpts
    pub fn plain() -> Self {
        Self::new(false, false)
    }

    fn label(&self, severity: Severity) -> String {
        if !self.use_colors {
            return severity.label().to_string();
        }
        let color = match severity {
            Severity::Error | Severity::Fatal => "31",
            Severity::Warning => "33",
            Severity::Note => "36",
        };
        format!("\x1b[{}m{}\x1b[0m", color, severity.label())
    }

    /// Format a single diagnostic
    pub fn format_diagnostic(&self, diag: &NormalizedDiagnostic) -> String {
        let indent = if diag.severity == Severity::Note { "  " } else { "" };
        let code = diag.code.as_ref().map(|c| format!("[{}]", c)).unwrap_or_default();
        let mut result = format!(
            "{}{}{}: {} at {}:{}",
            indent,
            self.label(diag.severity),
            code,
            diag.message,
            diag.file,
            diag.position
        );

        if self.show_source
            && let (OriginFile::User(path), Position::Mapped(loc)) = (&diag.file, &diag.position)
            && let Some(text) = self.source_line(path, loc.line)
        {
            let pad = " ".repeat(loc.column.saturating_sub(1) as usize);
            let marker = format!("^{}", "~".repeat(loc.span.saturating_sub(1) as usize));
            result.push_str(&format!("\n{0}  |\n{0}  | {1}\n{0}  | {2}{3}", indent, text, pad, marker));
        }

        result
    }

    fn source_line(&self, path: &Path, line: u32) -> Option<String> {
        let mut cache = self.source_cache.borrow_mut();
        let lines = cache
            .entry(path.to_path_buf())
            .or_insert_with(|| std::fs::read_to_string(path).ok().map(|s| s.lines().map(str::to_string).collect()));
        let index = (line as usize).checked_sub(1)?;
        lines.as_ref()?.get(index).cloned()
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self, diagnostics: &[NormalizedDiagnostic]) {
        for diag in diagnostics {
            eprintln!("{}", self.format_diagnostic(diag));
        }
    }
}
