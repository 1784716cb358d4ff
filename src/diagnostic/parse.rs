//! Line-oriented parsers for toolchain diagnostic output.
//!
//! Both grammars are single-line: the diagnostics battery passed to the
//! compiler turns off carets, fix-its and source excerpts, so every line is
//! either a complete diagnostic or noise to be skipped.

use std::path::PathBuf;

use super::Severity;

/// Diagnostic grammar of a toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSyntax {
    /// `<path>:<line>[:<column>]: <category>: <message>` (GCC, Clang, MinGW)
    Gnu,
    /// `<path>(<line>[,<column>]): <category>[ C<digits>]: <message>`
    Msvc,
}

impl DiagnosticSyntax {
    pub fn parse_line(self, line: &str) -> Option<RawDiagnostic> {
        match self {
            DiagnosticSyntax::Gnu => parse_gnu_line(line),
            DiagnosticSyntax::Msvc => parse_msvc_line(line),
        }
    }

    /// Every diagnostic found in the combined output of one invocation, in order.
    pub fn parse_output(self, output: &str) -> Vec<RawDiagnostic> {
        output.lines().filter_map(|line| self.parse_line(line)).collect()
    }
}

/// A diagnostic as the toolchain printed it, in generated-source coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDiagnostic {
    pub file: PathBuf,
    pub line: u32,
    /// 0 when the toolchain printed no column
    pub column: u32,
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
}

/// Leading digits of `text` and the rest.
fn split_number(text: &str) -> Option<(u32, &str)> {
    let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    Some((text[..end].parse().ok()?, &text[end..]))
}

/// Length of a path's root prefix whose colon must not be read as a field separator.
fn gnu_root_len(line: &str) -> Option<usize> {
    match line.as_bytes() {
        [b'/' | b'\\', ..] => Some(0),
        [drive, b':', b'/' | b'\\', ..] if drive.is_ascii_alphabetic() => Some(2),
        _ => None,
    }
}

/// Category words the GNU-style drivers print in front of a message.
const GNU_CATEGORIES: [&str; 4] = ["error", "warning", "note", "fatal error"];

pub fn parse_gnu_line(line: &str) -> Option<RawDiagnostic> {
    let line = line.trim_end();
    let root = gnu_root_len(line)?;
    let path_end = root + line[root..].find(':')?;
    let file = &line[..path_end];

    let (line_no, rest) = split_number(&line[path_end + 1..])?;
    let rest = rest.strip_prefix(':')?;
    let (column, rest) = match split_number(rest) {
        Some((column, tail)) => (column, tail.strip_prefix(':')?),
        None => (0, rest),
    };

    // context lines such as `required from ...` carry no category
    let (category, message) = rest.split_once(':')?;
    let category = category.trim();
    if !GNU_CATEGORIES.contains(&category) {
        return None;
    }
    Some(RawDiagnostic {
        file: PathBuf::from(file),
        line: line_no,
        column,
        severity: Severity::from_category(category),
        code: None,
        message: message.trim().to_string(),
    })
}

/// `12` or `12,5`
fn parse_msvc_coords(inner: &str) -> Option<(u32, u32)> {
    let (line, column) = match inner.split_once(',') {
        Some((line, column)) => (line, Some(column)),
        None => (inner, None),
    };
    let line = line.trim().parse().ok()?;
    let column = match column {
        Some(column) => column.trim().parse().ok()?,
        None => 0,
    };
    Some((line, column))
}

/// Byte range of a `C<digits>` vendor code inside the category part of `text`.
///
/// The code must start a word and be the last token before the colon.
fn find_vendor_code(text: &str) -> Option<(usize, usize)> {
    let head = &text[..text.find(':')?];
    head.match_indices('C').find_map(|(start, _)| {
        let digits = head[start + 1..].bytes().take_while(u8::is_ascii_digit).count();
        let word_start = start == 0 || head.as_bytes()[start - 1] == b' ';
        let end = start + 1 + digits;
        (digits > 0 && word_start && head[end..].trim().is_empty()).then_some((start, end))
    })
}

fn split_msvc_category(rest: &str) -> Option<(Severity, Option<String>, String)> {
    let rest = rest.trim_start();
    if let Some((start, end)) = find_vendor_code(rest) {
        let category = rest[..start].trim();
        let after = rest[end..].trim_start();
        let message = after.strip_prefix(':').unwrap_or(after).trim();
        return Some((
            Severity::from_category(category),
            Some(rest[start..end].to_string()),
            message.to_string(),
        ));
    }
    let (category, message) = rest.split_once(':')?;
    Some((Severity::from_category(category.trim()), None, message.trim().to_string()))
}

pub fn parse_msvc_line(line: &str) -> Option<RawDiagnostic> {
    let line = line.trim();
    // paths such as `Program Files (x86)` contain parentheses too
    for (close, _) in line.match_indices("):") {
        let Some(open) = line[..close].rfind('(') else {
            continue;
        };
        let Some((line_no, column)) = parse_msvc_coords(&line[open + 1..close]) else {
            continue;
        };
        let file = line[..open].trim();
        if file.is_empty() {
            return None;
        }
        let (severity, code, message) = split_msvc_category(&line[close + 2..])?;
        return Some(RawDiagnostic {
            file: PathBuf::from(file),
            line: line_no,
            column,
            severity,
            code,
            message,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gnu_line_with_column() {
        let d = parse_gnu_line("/tmp/__a1b2c3.cxir:5:3: error: expected ';' after expression").unwrap();
        assert_eq!(d.file, PathBuf::from("/tmp/__a1b2c3.cxir"));
        assert_eq!((d.line, d.column), (5, 3));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "expected ';' after expression");
        assert_eq!(d.code, None);
    }

    #[test]
    fn gnu_line_without_column_and_with_fatal_category() {
        let d = parse_gnu_line("/tmp/x.cxir:14: fatal error: core.hh: No such file or directory").unwrap();
        assert_eq!((d.line, d.column), (14, 0));
        assert_eq!(d.severity, Severity::Fatal);
        assert_eq!(d.message, "core.hh: No such file or directory");
    }

    #[test]
    fn gnu_windows_drive_prefix() {
        let d = parse_gnu_line("C:/work/__x.cxir:7:1: warning: unused variable 'y'").unwrap();
        assert_eq!(d.file, PathBuf::from("C:/work/__x.cxir"));
        assert_eq!(d.severity, Severity::Warning);
    }

    #[test]
    fn gnu_skips_non_diagnostic_lines() {
        assert_eq!(parse_gnu_line("In file included from /a/b.h:3:"), None);
        assert_eq!(parse_gnu_line("/tmp/x.cxir: In function 'int main()':"), None);
        assert_eq!(parse_gnu_line("/usr/bin/ld: cannot find -lfoo"), None);
        assert_eq!(parse_gnu_line("1 error generated."), None);
        assert_eq!(parse_gnu_line(""), None);
    }

    #[test]
    fn gnu_template_context_lines_are_not_diagnostics() {
        assert_eq!(
            parse_gnu_line("/x.cxir:7:6:   required from 'void helix::run() [with T = int]'"),
            None
        );
        assert_eq!(parse_gnu_line("/x.cxir:9:12:   in 'constexpr' expansion of 'ns::f()'"), None);
        assert_eq!(parse_gnu_line("/x.cxir:3:1:   required from here"), None);
        assert_eq!(parse_gnu_line("/x.cxir:2:8: sorry, unimplemented: ns::g"), None);
    }

    #[test]
    fn gnu_message_may_contain_scope_operators() {
        let d = parse_gnu_line("/x.cxir:4:2: error: no member named 'f' in 'helix::io::File'").unwrap();
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "no member named 'f' in 'helix::io::File'");

        let d = parse_gnu_line("/x.cxir:4:2: note: candidate: 'void helix::run()'").unwrap();
        assert_eq!(d.severity, Severity::Note);
        assert_eq!(d.message, "candidate: 'void helix::run()'");
    }

    #[test]
    fn msvc_vendor_code_is_split_from_category() {
        let d = parse_msvc_line("foo.cc(3): error C2143: syntax error").unwrap();
        assert_eq!(d.file, PathBuf::from("foo.cc"));
        assert_eq!((d.line, d.column), (3, 0));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.code.as_deref(), Some("C2143"));
        assert_eq!(d.message, "syntax error");
    }

    #[test]
    fn msvc_without_code_splits_on_first_colon() {
        let d = parse_msvc_line("foo.cc(3): note: something").unwrap();
        assert_eq!(d.severity, Severity::Note);
        assert_eq!(d.code, None);
        assert_eq!(d.message, "something");
    }

    #[test]
    fn msvc_message_keeps_its_own_colons() {
        let d = parse_msvc_line(
            r"C:\Program Files (x86)\proj\__k.cxir(10,4): fatal error C1083: Cannot open include file: 'x.h': No such file",
        )
        .unwrap();
        assert_eq!(d.file, PathBuf::from(r"C:\Program Files (x86)\proj\__k.cxir"));
        assert_eq!((d.line, d.column), (10, 4));
        assert_eq!(d.severity, Severity::Fatal);
        assert_eq!(d.code.as_deref(), Some("C1083"));
        assert_eq!(d.message, "Cannot open include file: 'x.h': No such file");
    }

    #[test]
    fn msvc_category_word_starting_with_c_is_not_a_code() {
        let d = parse_msvc_line("foo.cc(8): warning Check: suspicious cast").unwrap();
        assert_eq!(d.code, None);
        assert_eq!(d.severity, Severity::Fatal);
        assert_eq!(d.message, "suspicious cast");
    }

    #[test]
    fn msvc_skips_banner_and_echo_lines() {
        assert_eq!(parse_msvc_line("Microsoft (R) C/C++ Optimizing Compiler Version 19.38"), None);
        assert_eq!(parse_msvc_line("__k.cxir"), None);
        assert_eq!(parse_msvc_line("(3): error C2143: syntax error"), None);
    }

    #[test]
    fn parse_output_keeps_order() {
        let output = "/t/a.cxir:1:1: warning: first\nnoise\n/t/a.cxir:2:1: error: second\n";
        let parsed = DiagnosticSyntax::Gnu.parse_output(output);
        let messages: Vec<_> = parsed.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }
}
