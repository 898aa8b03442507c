//! Runs driven by a captured `mandoc -T lint` report: only the reported
//! files are touched, and only with the fixes their diagnostics select.

use manfix::{report, run, Registry, RunOptions};
use std::fs;
use tempfile::TempDir;

fn write_page(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_report_drives_fixes_across_files() {
    let dir = TempDir::new().unwrap();
    let first = write_page(
        &dir,
        "first.1",
        ".Dd January 1, 2024\n.Pp\n.Sh NAME\n.Nm first \n.Sh DESCRIPTION\nText.\n",
    );
    let second = write_page(
        &dir,
        "second.8",
        ".Dd January 1, 2024\n.Sh SEE ALSO\n.Xr ps 1 ,\n.Xr ls 1\n",
    );

    // Diagnostics deliberately out of order within first.1; dispatch must
    // sort them before applying.
    let report_text = format!(
        "\
mandoc: {first}:4:10: STYLE: whitespace at end of input line
mandoc: {second}:3:1: STYLE: unusual Xr order: ls after ps
mandoc: {first}:2:1: WARNING: skipping paragraph macro: Pp before Sh
"
    );
    let diagnostics = report::parse_from_str(&report_text).unwrap();
    let files = report::files_in_report(&diagnostics);
    assert_eq!(files, vec![first.clone(), second.clone()]);

    let summary = run(
        &files,
        Some(&diagnostics),
        &Registry::fixes(),
        &RunOptions::default(),
    );

    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.files_with_problems, 2);
    assert_eq!(summary.rule_counts.get("remove_stray_pp"), Some(&1));
    assert_eq!(summary.rule_counts.get("sort_xrefs"), Some(&1));
    assert!(summary.failures.is_empty());

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        ".Dd January 1, 2024\n.Sh NAME\n.Nm first\n.Sh DESCRIPTION\nText.\n"
    );
    assert_eq!(
        fs::read_to_string(&second).unwrap(),
        ".Dd January 1, 2024\n.Sh SEE ALSO\n.Xr ls 1 ,\n.Xr ps 1\n"
    );
}

#[test]
fn test_line_numbers_stay_valid_as_earlier_fixes_remove_lines() {
    let dir = TempDir::new().unwrap();
    // Three stray .Pp macros; each removal shifts everything below it.
    let page = write_page(
        &dir,
        "shift.1",
        ".Dd January 1, 2024\n.Pp\none\n.Pp\ntwo\n.Pp\n.Sh NAME\n",
    );

    let report_text = format!(
        "\
mandoc: {page}:6:1: WARNING: skipping paragraph macro: Pp before Sh
mandoc: {page}:2:1: WARNING: skipping paragraph macro: Pp before Sh
mandoc: {page}:4:1: WARNING: skipping paragraph macro: Pp before Sh
"
    );
    let diagnostics = report::parse_from_str(&report_text).unwrap();

    let summary = run(
        &[page.clone()],
        Some(&diagnostics),
        &Registry::fixes(),
        &RunOptions::default(),
    );

    assert!(summary.failures.is_empty());
    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        ".Dd January 1, 2024\none\ntwo\n.Sh NAME\n"
    );
}

#[test]
fn test_stale_report_aborts_only_the_drifted_file() {
    let dir = TempDir::new().unwrap();
    // The report claims a .Pp on line 2, but the page has since changed.
    let stale_content = ".Dd January 1, 2024\ntext\n.Sh NAME\n";
    let stale = write_page(&dir, "stale.1", stale_content);
    let good = write_page(&dir, "good.1", ".Dd January 1, 2024\n.Nm good \n");

    let report_text = format!(
        "\
mandoc: {stale}:2:1: WARNING: skipping paragraph macro: Pp before Sh
mandoc: {good}:2:9: STYLE: whitespace at end of input line
"
    );
    let diagnostics = report::parse_from_str(&report_text).unwrap();

    let summary = run(
        &report::files_in_report(&diagnostics),
        Some(&diagnostics),
        &Registry::fixes(),
        &RunOptions::default(),
    );

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].file, stale);
    assert!(summary.failures[0].error.contains("drift"));

    // The drifted file is left exactly as it was; the healthy one is fixed.
    assert_eq!(fs::read_to_string(&stale).unwrap(), stale_content);
    assert_eq!(
        fs::read_to_string(&good).unwrap(),
        ".Dd January 1, 2024\n.Nm good\n"
    );
}

#[test]
fn test_messages_without_a_rule_are_ignored() {
    let dir = TempDir::new().unwrap();
    let content = ".Dd January 1, 2024\n.Sh NAME\n";
    let page = write_page(&dir, "quiet.1", content);

    let report_text = format!(
        "\
mandoc: {page}:1:1: STYLE: new sentence, new line
mandoc: {page}:2:1: STYLE: referenced manual not found
"
    );
    let diagnostics = report::parse_from_str(&report_text).unwrap();

    let summary = run(
        &[page.clone()],
        Some(&diagnostics),
        &Registry::fixes(),
        &RunOptions::default(),
    );

    assert_eq!(summary.files_with_problems, 0);
    assert!(summary.rule_counts.is_empty());
    assert_eq!(fs::read_to_string(&page).unwrap(), content);
}

#[test]
fn test_punctuation_message_reaches_the_sort_through_its_second_key() {
    let dir = TempDir::new().unwrap();
    let page = write_page(
        &dir,
        "punct.1",
        ".Dd January 1, 2024\n.Sh SEE ALSO\n.Xr ls 1 .\n.Xr ps 1 ,\n",
    );

    let report_text =
        format!("mandoc: {page}:3:1: STYLE: unusual Xr punctuation: want comma\n");
    let diagnostics = report::parse_from_str(&report_text).unwrap();

    let summary = run(
        &[page.clone()],
        Some(&diagnostics),
        &Registry::fixes(),
        &RunOptions::default(),
    );

    assert_eq!(summary.rule_counts.get("sort_xrefs"), Some(&1));
    assert_eq!(
        fs::read_to_string(&page).unwrap(),
        ".Dd January 1, 2024\n.Sh SEE ALSO\n.Xr ls 1 ,\n.Xr ps 1\n"
    );
}
