//! The fix rules: small, idempotent rewrites of mdoc man pages.
//!
//! Rules never keep state between invocations. Document-shaped rules find
//! their own target through a section or preamble scan; diagnostic-shaped
//! rules resolve the reported line through the running delta and verify
//! the content they find there before touching it. A verification failure
//! is drift and aborts the file.

use crate::dispatch::FixError;
use crate::document::Document;
use crate::report::Diagnostic;
use crate::runner::RunOptions;
use colored::Colorize;
use std::ops::Range;

/// Maximum width of a rewrapped license comment line, `.\"` prefix
/// included. FreeBSD mdoc sources keep their preambles within 80 columns.
const LICENSE_WIDTH: usize = 78;

/// Sort the cross references in the SEE ALSO section: ascending by manual
/// section number, then by page name, case-insensitive. Duplicates are
/// dropped and the ` ,` separators re-attached to every entry but the
/// last.
///
/// Answers `unusual Xr order` and `unusual Xr punctuation`.
pub fn sort_xrefs(doc: &mut Document, opts: &RunOptions) -> Result<bool, FixError> {
    let Some(section) = doc.section("SEE ALSO")? else {
        return Ok(false);
    };

    // Only the contiguous block of .Xr lines is rewritten; intro text
    // before it and trailing macros after it stay where they are.
    let Some(run) = contiguous_run(&section, |line| line.starts_with(".Xr")) else {
        if opts.debug {
            eprintln!(
                "{}",
                format!(
                    "{}: skipping, SEE ALSO contains no .Xr lines",
                    doc.path().display()
                )
                .dimmed()
            );
        }
        return Ok(false);
    };

    let mut xrs: Vec<String> = section[run.clone()]
        .iter()
        .map(|xr| strip_xr_separator(xr))
        .collect();
    xrs.sort();
    xrs.dedup();
    xrs.sort_by_cached_key(|xr| xr_sort_key(xr));

    let last = xrs.len() - 1;
    for xr in &mut xrs[..last] {
        xr.push_str(" ,");
    }

    let mut replacement = section[..run.start].to_vec();
    replacement.extend(xrs);
    replacement.extend_from_slice(&section[run.end..]);
    doc.replace_section("SEE ALSO", replacement)?;
    Ok(false)
}

fn strip_xr_separator(xr: &str) -> String {
    let xr = xr.strip_suffix(" ,").unwrap_or(xr);
    let xr = xr.strip_suffix(" .").unwrap_or(xr);
    xr.to_string()
}

/// Sort key for a `.Xr name section` line: section number first, then the
/// lowercased page name.
fn xr_sort_key(xr: &str) -> (String, String) {
    let token = |index: usize| {
        xr.split_whitespace()
            .nth(index)
            .unwrap_or("")
            .to_string()
    };
    (token(2), token(1).to_lowercase())
}

/// First contiguous run of lines matching `is_match`: starts at the first
/// match, ends before the first non-match after it.
fn contiguous_run<F>(lines: &[String], is_match: F) -> Option<Range<usize>>
where
    F: Fn(&str) -> bool,
{
    let start = lines.iter().position(|line| is_match(line))?;
    let end = lines[start..]
        .iter()
        .position(|line| !is_match(line))
        .map_or(lines.len(), |offset| start + offset);
    Some(start..end)
}

/// Remove a paragraph macro mandoc skipped, e.g. the `.Pp` behind
/// `skipping paragraph macro: Pp before Sh`.
pub fn remove_stray_pp(
    doc: &mut Document,
    diagnostic: &Diagnostic,
    _opts: &RunOptions,
) -> Result<bool, FixError> {
    let index = doc.resolve_original_line(diagnostic.line)?;
    let expected = format!(".{}", skipped_macro(&diagnostic.message));
    let line = doc.line(index).unwrap_or_default().to_string();
    if !line.starts_with(&expected) {
        return Err(FixError::drift(doc.path(), diagnostic, index, expected, line));
    }
    doc.remove_line(index)?;
    Ok(false)
}

/// Macro name in the message tail. mandoc always names the macro it
/// skipped (`Pp`, `Lp`, `sp`, ...).
fn skipped_macro(message: &str) -> &str {
    message
        .split(": ")
        .nth(1)
        .and_then(|tail| tail.split_whitespace().next())
        .unwrap_or("Pp")
}

/// Trim trailing whitespace from the reported line.
///
/// Answers `whitespace at end of input line`.
pub fn strip_eol_whitespace(
    doc: &mut Document,
    diagnostic: &Diagnostic,
    _opts: &RunOptions,
) -> Result<bool, FixError> {
    let index = doc.resolve_original_line(diagnostic.line)?;
    let line = doc.line(index).unwrap_or_default().to_string();
    let trimmed = line.trim_end();
    if trimmed.len() == line.len() {
        return Err(FixError::drift(
            doc.path(),
            diagnostic,
            index,
            "a line with trailing whitespace",
            line,
        ));
    }
    doc.replace_line(index, trimmed.to_string())?;
    Ok(false)
}

/// Rewrite the error-prone `\\` escape to the portable `\e`.
///
/// `\\` only renders as a backslash by accident of copy mode, which is why
/// mandoc flags it as undefined. Escapes this rule does not recognize are
/// left alone with a debug notice.
pub fn normalize_backslashes(
    doc: &mut Document,
    diagnostic: &Diagnostic,
    opts: &RunOptions,
) -> Result<bool, FixError> {
    let index = doc.resolve_original_line(diagnostic.line)?;
    let line = doc.line(index).unwrap_or_default().to_string();
    if !line.contains('\\') {
        return Err(FixError::drift(
            doc.path(),
            diagnostic,
            index,
            "a line containing an escape",
            line,
        ));
    }

    let normalized = line.replace("\\\\", "\\e");
    if normalized == line {
        if opts.debug {
            eprintln!(
                "{}",
                format!(
                    "{}: skipping unrecognized escape on line {}",
                    doc.path().display(),
                    diagnostic.line
                )
                .dimmed()
            );
        }
        return Ok(false);
    }
    doc.replace_line(index, normalized)?;
    Ok(false)
}

/// Reflow the BSD license block in the preamble to the conventional
/// width.
///
/// Paragraphs are separated by bare `.\"` lines; numbered clauses keep a
/// hanging indent on their continuation lines. The single-line edit
/// vocabulary can shrink the block but not grow it, so a reflow that
/// would need more lines is skipped.
pub fn rewrap_license(doc: &mut Document, opts: &RunOptions) -> Result<bool, FixError> {
    let preamble = doc.preamble();
    let Some(block) = license_block(&preamble) else {
        return Ok(false);
    };
    let original = &preamble[block.clone()];
    let wrapped = rewrap_comment_block(original, LICENSE_WIDTH);

    if wrapped.as_slice() == original {
        return Ok(false);
    }
    if wrapped.len() > original.len() {
        if opts.debug {
            eprintln!(
                "{}",
                format!(
                    "{}: skipping, license rewrap would grow the block",
                    doc.path().display()
                )
                .dimmed()
            );
        }
        return Ok(false);
    }

    for (offset, line) in wrapped.iter().enumerate() {
        if original[offset] != *line {
            doc.replace_line(block.start + offset, line.clone())?;
        }
    }
    // Surplus tail, removed bottom-up so the remaining indices stay valid.
    for offset in (wrapped.len()..original.len()).rev() {
        doc.remove_line(block.start + offset)?;
    }
    Ok(false)
}

/// The license text proper: from the "Redistribution and use" line through
/// the "SUCH DAMAGE" line, inclusive. Preamble indices equal buffer
/// indices, the preamble being a prefix of the file.
fn license_block(preamble: &[String]) -> Option<Range<usize>> {
    let start = preamble
        .iter()
        .position(|line| line.contains("Redistribution and use"))?;
    let end = preamble[start..]
        .iter()
        .position(|line| line.contains("SUCH DAMAGE"))
        .map(|offset| start + offset)?;
    Some(start..end + 1)
}

enum Block {
    Blank,
    Para { hang: bool, words: Vec<String> },
}

fn rewrap_comment_block(lines: &[String], width: usize) -> Vec<String> {
    let mut blocks: Vec<Block> = Vec::new();
    for line in lines {
        let content = line.strip_prefix(".\\\"").unwrap_or(line).trim_start();
        if content.is_empty() {
            blocks.push(Block::Blank);
        } else if is_clause_start(content) {
            blocks.push(Block::Para {
                hang: true,
                words: words_of(content),
            });
        } else if let Some(Block::Para { words, .. }) = blocks.last_mut() {
            words.extend(words_of(content));
        } else {
            blocks.push(Block::Para {
                hang: false,
                words: words_of(content),
            });
        }
    }

    let mut out = Vec::new();
    for block in &blocks {
        match block {
            Block::Blank => out.push(".\\\"".to_string()),
            Block::Para { hang, words } => fill_paragraph(words, *hang, width, &mut out),
        }
    }
    out
}

/// A numbered license clause like `1. Redistributions of source code ...`.
fn is_clause_start(content: &str) -> bool {
    let digits = content.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && content[digits..].starts_with(". ")
}

fn words_of(content: &str) -> Vec<String> {
    content.split_whitespace().map(str::to_owned).collect()
}

/// Greedy fill. A word that alone exceeds the width gets its own overlong
/// line rather than being broken.
fn fill_paragraph(words: &[String], hang: bool, width: usize, out: &mut Vec<String>) {
    let cont_prefix = if hang { ".\\\"    " } else { ".\\\" " };
    let mut line = String::from(".\\\" ");
    let mut has_words = false;
    for word in words {
        if has_words && line.len() + 1 + word.len() > width {
            out.push(std::mem::replace(&mut line, String::from(cont_prefix)));
            has_words = false;
        }
        if has_words {
            line.push(' ');
        }
        line.push_str(word);
        has_words = true;
    }
    if has_words {
        out.push(line);
    }
}
