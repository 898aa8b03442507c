//! The rule registry: which fixes and checks exist, which mandoc message
//! each one answers to, and which of them run unconditionally.
//!
//! Matching is by message prefix because mandoc appends detail after a
//! stable stem (`skipping paragraph macro: Pp before Sh`). The first entry
//! whose key is a prefix of the message wins, so more specific keys must
//! be registered before shorter ones that would shadow them.

use crate::checks;
use crate::dispatch::FixError;
use crate::document::Document;
use crate::fixes;
use crate::report::Diagnostic;
use crate::runner::RunOptions;
use std::cmp::Ordering;
use strsim::jaro_winkler;

/// A rule that operates on the whole document, no diagnostic needed.
pub type DocumentRule = fn(&mut Document, &RunOptions) -> Result<bool, FixError>;

/// A rule targeted at the line a specific diagnostic points to.
pub type DiagnosticRule = fn(&mut Document, &Diagnostic, &RunOptions) -> Result<bool, FixError>;

#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    Document(DocumentRule),
    Diagnostic(DiagnosticRule),
}

/// One registry entry.
///
/// `internal` entries are reachable only through a diagnostic whose
/// message matches `key`; the unconditional pass skips them. That is how a
/// rule registered under several mandoc messages still runs exactly once
/// per unconditional pass, and how line-targeted rules (meaningless
/// without a diagnostic) stay out of it entirely.
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// Rule name as reported in summaries.
    pub name: &'static str,
    /// Message prefix this entry answers to.
    pub key: &'static str,
    pub internal: bool,
    pub kind: RuleKind,
}

impl RuleEntry {
    /// Run the rule. Document-shaped rules ignore the diagnostic;
    /// diagnostic-shaped rules require one.
    pub fn invoke(
        &self,
        doc: &mut Document,
        diagnostic: Option<&Diagnostic>,
        opts: &RunOptions,
    ) -> Result<bool, FixError> {
        match (self.kind, diagnostic) {
            (RuleKind::Document(rule), _) => rule(doc, opts),
            (RuleKind::Diagnostic(rule), Some(diagnostic)) => rule(doc, diagnostic, opts),
            (RuleKind::Diagnostic(_), None) => {
                Err(FixError::MissingDiagnostic { rule: self.name })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<RuleEntry>,
}

impl Registry {
    /// The fix rules, in unconditional-pass order.
    #[must_use]
    pub fn fixes() -> Self {
        Self {
            entries: vec![
                RuleEntry {
                    name: "sort_xrefs",
                    key: "unusual Xr order",
                    internal: false,
                    kind: RuleKind::Document(fixes::sort_xrefs),
                },
                // Second registration of the same rule: mandoc reports the
                // same underlying problem under two messages, but the
                // unconditional pass must run it once.
                RuleEntry {
                    name: "sort_xrefs",
                    key: "unusual Xr punctuation",
                    internal: true,
                    kind: RuleKind::Document(fixes::sort_xrefs),
                },
                RuleEntry {
                    name: "remove_stray_pp",
                    key: "skipping paragraph macro",
                    internal: true,
                    kind: RuleKind::Diagnostic(fixes::remove_stray_pp),
                },
                RuleEntry {
                    name: "strip_eol_whitespace",
                    key: "whitespace at end of input line",
                    internal: true,
                    kind: RuleKind::Diagnostic(fixes::strip_eol_whitespace),
                },
                RuleEntry {
                    name: "normalize_backslashes",
                    key: "undefined escape",
                    internal: true,
                    kind: RuleKind::Diagnostic(fixes::normalize_backslashes),
                },
                RuleEntry {
                    name: "rewrap_license",
                    key: "rewrap_license",
                    internal: false,
                    kind: RuleKind::Document(fixes::rewrap_license),
                },
            ],
        }
    }

    /// The check rules: report problems, change nothing.
    #[must_use]
    pub fn checks() -> Self {
        Self {
            entries: vec![RuleEntry {
                name: "check_spdx",
                key: "check_spdx",
                internal: false,
                kind: RuleKind::Document(checks::check_spdx),
            }],
        }
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// First entry whose key is a prefix of `message`, if any.
    pub fn match_message(&self, message: &str) -> Option<&RuleEntry> {
        self.entries.iter().find(|entry| message.starts_with(entry.key))
    }

    /// Entry whose key is most similar to `message`; used only to make
    /// "no rule for this message" debug output actionable.
    pub fn nearest_key(&self, message: &str) -> Option<&RuleEntry> {
        self.entries.iter().max_by(|a, b| {
            jaro_winkler(a.key, message)
                .partial_cmp(&jaro_winkler(b.key, message))
                .unwrap_or(Ordering::Equal)
        })
    }

    /// Distinct rule names in registration order, for summary breakdowns.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Vec::new();
        for entry in &self.entries {
            if !names.contains(&entry.name) {
                names.push(entry.name);
            }
        }
        names
    }
}
