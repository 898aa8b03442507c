//! Parsing of captured `mandoc -T lint` reports.
//!
//! Each report line has the shape
//! `mandoc: <file>:<line>:<col>: <severity>: <message...>`, e.g.
//!
//! ```text
//! mandoc: ls.1:187:2: STYLE: whitespace at end of input line
//! ```
//!
//! The message tail is what drives fix selection, so it is kept verbatim
//! apart from whitespace normalization.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One line of a report that does not parse, with the first thing wrong
/// about it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} in {content:?}")]
pub struct MalformedLine {
    pub reason: &'static str,
    pub content: String,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read lint report {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed lint report line {number}")]
    Malformed { number: usize, source: MalformedLine },
}

/// A single mandoc complaint, located to a line and column of the input
/// file as it existed when the report was captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    /// 1-based line number in the original file.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// Severity tag with its trailing colon removed (`STYLE`, `WARNING`,
    /// `ERROR`, ...). Informational only; it never affects dispatch.
    pub severity: String,
    /// Message tail, internal whitespace runs collapsed to single spaces.
    pub message: String,
}

impl Diagnostic {
    /// Parse one report line.
    pub fn from_report_line(line: &str) -> Result<Self, MalformedLine> {
        let malformed = |reason| MalformedLine {
            reason,
            content: line.to_string(),
        };

        let mut tokens = line.split_whitespace();
        let _tool = tokens.next().ok_or_else(|| malformed("empty line"))?;
        let location = tokens
            .next()
            .ok_or_else(|| malformed("missing file:line:column field"))?;
        let severity = tokens
            .next()
            .ok_or_else(|| malformed("missing severity field"))?;
        let message = tokens.collect::<Vec<_>>().join(" ");

        let mut parts = location.split(':');
        let file = parts
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| malformed("missing file name"))?
            .to_string();
        let line_number = parts
            .next()
            .ok_or_else(|| malformed("missing line number"))?
            .parse::<usize>()
            .map_err(|_| malformed("line number is not an integer"))?;
        let column = parts
            .next()
            .ok_or_else(|| malformed("missing column number"))?
            .parse::<usize>()
            .map_err(|_| malformed("column number is not an integer"))?;

        let severity = severity.strip_suffix(':').unwrap_or(severity).to_string();

        Ok(Self {
            file,
            line: line_number,
            column,
            severity,
            message,
        })
    }
}

/// Parse a whole report. Blank lines are ignored; anything else that does
/// not parse fails the whole report with its line number.
pub fn parse_from_str(input: &str) -> Result<Vec<Diagnostic>, ReportError> {
    let mut diagnostics = Vec::new();
    for (i, raw) in input.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let diagnostic = Diagnostic::from_report_line(raw)
            .map_err(|source| ReportError::Malformed { number: i + 1, source })?;
        diagnostics.push(diagnostic);
    }
    Ok(diagnostics)
}

pub fn parse_from_path(path: impl AsRef<Path>) -> Result<Vec<Diagnostic>, ReportError> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_from_str(&input)
}

/// The distinct files named by a report, in order of first appearance.
pub fn files_in_report(diagnostics: &[Diagnostic]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for diagnostic in diagnostics {
        if seen.insert(diagnostic.file.as_str()) {
            files.push(diagnostic.file.clone());
        }
    }
    files
}
