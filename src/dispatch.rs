//! Applies registered rules to one document, in the two modes the tool
//! supports: every public rule unconditionally, or exactly the rules a
//! lint report's diagnostics ask for.

use crate::document::{Document, DocumentError};
use crate::registry::Registry;
use crate::report::Diagnostic;
use crate::runner::RunOptions;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// A fix that could not run to completion. Fatal for the file being
/// processed: the buffer can no longer be trusted to agree with the
/// diagnostics, so nothing gets saved.
#[derive(Error, Debug)]
pub enum FixError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(
        "drift at {file}:{line}: expected {expected:?} at resolved index {index}, found {found:?}"
    )]
    Drift {
        file: std::path::PathBuf,
        line: usize,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("rule {rule} requires a diagnostic but was invoked without one")]
    MissingDiagnostic { rule: &'static str },
}

impl FixError {
    /// The resolved line does not hold what the diagnostic promised.
    pub fn drift(
        path: &Path,
        diagnostic: &Diagnostic,
        index: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        FixError::Drift {
            file: path.to_path_buf(),
            line: diagnostic.line,
            index,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Run every public registry entry against the document, in registration
/// order. Returns the names of rules that either flagged a problem or
/// left the document modified.
///
/// Internal entries are skipped: they exist to route extra mandoc
/// messages at rules this pass already runs under another entry, or to
/// hold line-targeted rules that need a diagnostic to mean anything.
pub fn apply_unconditional(
    doc: &mut Document,
    registry: &Registry,
    opts: &RunOptions,
) -> Result<BTreeSet<&'static str>, FixError> {
    let mut touched = BTreeSet::new();
    for entry in registry.entries() {
        if entry.internal {
            continue;
        }
        let flagged = entry.invoke(doc, None, opts)?;
        if flagged || doc.is_modified() {
            touched.insert(entry.name);
        }
        // A rule that scanned but never replaced leaves the section cursor
        // claimed; release it before the next rule runs.
        doc.clear_section();
    }
    Ok(touched)
}

/// Apply the rules selected by a report's diagnostics for this document.
///
/// Diagnostics carry line numbers from the original file, but every edit
/// shifts the lines below it. Sorting by ascending original line keeps
/// the delta correction in [`Document::resolve_original_line`] valid:
/// each diagnostic is resolved only after edits strictly above it.
pub fn apply_targeted(
    doc: &mut Document,
    diagnostics: &[Diagnostic],
    registry: &Registry,
    opts: &RunOptions,
) -> Result<BTreeSet<&'static str>, FixError> {
    let mut ordered: Vec<&Diagnostic> = diagnostics.iter().collect();
    ordered.sort_by_key(|diagnostic| diagnostic.line);

    let mut touched = BTreeSet::new();
    for diagnostic in ordered {
        let Some(entry) = registry.match_message(&diagnostic.message) else {
            if opts.debug {
                let hint = registry
                    .nearest_key(&diagnostic.message)
                    .map(|near| format!(" (nearest key: {:?})", near.key))
                    .unwrap_or_default();
                eprintln!(
                    "{}",
                    format!(
                        "{}:{}: no rule for {:?}{}",
                        doc.path().display(),
                        diagnostic.line,
                        diagnostic.message,
                        hint
                    )
                    .dimmed()
                );
            }
            continue;
        };
        let flagged = entry.invoke(doc, Some(diagnostic), opts)?;
        if flagged || doc.is_modified() {
            touched.insert(entry.name);
        }
        doc.clear_section();
    }
    Ok(touched)
}
