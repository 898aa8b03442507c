//! Per-file orchestration: load, dispatch, save, tally.
//!
//! One failing file never stops the batch. A contract violation or drift
//! abandons that file unsaved (the buffer can no longer be trusted), gets
//! recorded as a failure, and the run moves on.

use crate::dispatch::{apply_targeted, apply_unconditional};
use crate::document::Document;
use crate::registry::Registry;
use crate::report::Diagnostic;
use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Apply fixes in memory but never write to disk.
    pub dry_run: bool,
    /// Stop once this many files needed fixes; 0 means unlimited.
    pub max_files: usize,
    /// Print skipped fixes and unmatched diagnostics.
    pub debug: bool,
    /// Print a unified diff for every modified file.
    pub diff: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// What a run did, in aggregate.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    /// Files the run attempted, including ones that failed to load.
    pub files_processed: usize,
    /// Files where at least one rule flagged or fixed something.
    pub files_with_problems: usize,
    /// How many files each rule touched. A rule counts at most once per
    /// file, however many diagnostics routed to it.
    pub rule_counts: BTreeMap<String, usize>,
    pub failures: Vec<FileFailure>,
}

/// Process `files` in order.
///
/// With `diagnostics` the run is report-driven: each file sees exactly the
/// rules its own diagnostics select. Without, every public rule in the
/// registry runs against every file.
pub fn run(
    files: &[String],
    diagnostics: Option<&[Diagnostic]>,
    registry: &Registry,
    opts: &RunOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for file in files {
        if opts.max_files > 0 && summary.files_with_problems >= opts.max_files {
            break;
        }
        summary.files_processed += 1;

        let mut doc = match Document::load(file) {
            Ok(doc) => doc,
            Err(error) => {
                summary.failures.push(FileFailure {
                    file: file.clone(),
                    error: error.to_string(),
                });
                continue;
            }
        };

        let outcome = match diagnostics {
            Some(all) => {
                let mine: Vec<Diagnostic> = all
                    .iter()
                    .filter(|diagnostic| diagnostic.file == *file)
                    .cloned()
                    .collect();
                apply_targeted(&mut doc, &mine, registry, opts)
            }
            None => apply_unconditional(&mut doc, registry, opts),
        };

        let touched = match outcome {
            Ok(touched) => touched,
            Err(error) => {
                summary.failures.push(FileFailure {
                    file: file.clone(),
                    error: error.to_string(),
                });
                continue;
            }
        };

        if !touched.is_empty() {
            summary.files_with_problems += 1;
            for name in &touched {
                *summary.rule_counts.entry((*name).to_string()).or_insert(0) += 1;
            }
        }

        if opts.diff && doc.is_modified() {
            print_diff(&doc);
        }

        if !opts.dry_run {
            if let Err(error) = doc.save() {
                summary.failures.push(FileFailure {
                    file: file.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    summary
}

/// Unified diff between the file on disk (not yet saved over) and the
/// buffer.
fn print_diff(doc: &Document) {
    let Ok(before) = std::fs::read_to_string(doc.path()) else {
        return;
    };
    let after = doc.lines().join("\n") + "\n";

    println!(
        "\n{}",
        format!("--- {} (original)", doc.path().display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", doc.path().display()).dimmed());

    let diff = TextDiff::from_lines(before.as_str(), after.as_str());
    for change in diff.iter_all_changes() {
        let rendered = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{rendered}");
    }
}
