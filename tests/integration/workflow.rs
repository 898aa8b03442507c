//! Unconditional-mode workflows: every public fix against every file,
//! no lint report involved.

use manfix::{run, Registry, RunOptions};
use std::fs;
use tempfile::TempDir;

/// A small but structurally complete page in the FreeBSD layout, with an
/// unsorted SEE ALSO section.
const UNSORTED_PAGE: &str = "\
.\\\" Copyright (c) 2002 The FreeBSD Project
.\\\"
.\\\" SPDX-License-Identifier: BSD-2-Clause
.\\\"
.Dd January 1, 2024
.Dt LOOKUP 1
.Os
.Sh NAME
.Nm lookup
.Nd query the name tables
.Sh SYNOPSIS
.Nm
.Op Fl v
.Sh DESCRIPTION
The
.Nm
utility queries the name tables.
.Sh SEE ALSO
.Xr services 5 ,
.Xr getent 1 ,
.Xr nsswitch.conf 5
.Sh HISTORY
A
.Nm
utility first appeared in
.Fx 5.0 .
";

const SORTED_PAGE: &str = "\
.\\\" Copyright (c) 2002 The FreeBSD Project
.\\\"
.\\\" SPDX-License-Identifier: BSD-2-Clause
.\\\"
.Dd January 1, 2024
.Dt LOOKUP 1
.Os
.Sh NAME
.Nm lookup
.Nd query the name tables
.Sh SYNOPSIS
.Nm
.Op Fl v
.Sh DESCRIPTION
The
.Nm
utility queries the name tables.
.Sh SEE ALSO
.Xr getent 1 ,
.Xr nsswitch.conf 5 ,
.Xr services 5
.Sh HISTORY
A
.Nm
utility first appeared in
.Fx 5.0 .
";

fn write_page(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_unconditional_run_fixes_a_realistic_page() {
    let dir = TempDir::new().unwrap();
    let page = write_page(&dir, "lookup.1", UNSORTED_PAGE);

    let summary = run(
        &[page.clone()],
        None,
        &Registry::fixes(),
        &RunOptions::default(),
    );

    assert_eq!(summary.files_processed, 1);
    assert_eq!(summary.files_with_problems, 1);
    assert_eq!(summary.rule_counts.get("sort_xrefs"), Some(&1));
    assert!(summary.failures.is_empty());
    assert_eq!(fs::read_to_string(&page).unwrap(), SORTED_PAGE);
}

#[test]
fn test_fixed_tree_is_stable_under_reruns() {
    let dir = TempDir::new().unwrap();
    let pages = vec![
        write_page(&dir, "lookup.1", UNSORTED_PAGE),
        write_page(&dir, "clean.8", SORTED_PAGE),
    ];

    let first = run(&pages, None, &Registry::fixes(), &RunOptions::default());
    assert_eq!(first.files_with_problems, 1);

    let after_first: Vec<String> = pages
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();

    let second = run(&pages, None, &Registry::fixes(), &RunOptions::default());
    assert_eq!(second.files_processed, 2);
    assert_eq!(second.files_with_problems, 0);
    assert!(second.rule_counts.is_empty());

    let after_second: Vec<String> = pages
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    assert_eq!(after_first, after_second);
}

#[test]
fn test_license_preamble_is_rewrapped_end_to_end() {
    // Hand-wrapped license with ragged short lines; the rewrap refills it.
    let page_text = "\
.\\\" Copyright (c) 2002 The FreeBSD Project
.\\\"
.\\\" Redistribution and use in source and
.\\\" binary forms, with or without modification,
.\\\" are permitted provided that
.\\\" the following conditions are met.
.\\\"
.\\\" THIS SOFTWARE IS PROVIDED BY THE PROJECT AS IS AND IN
.\\\" NO EVENT SHALL THE PROJECT BE LIABLE
.\\\" FOR ANY DIRECT DAMAGES EVEN IF ADVISED
.\\\" OF THE POSSIBILITY OF SUCH DAMAGE.
.Dd January 1, 2024
.Dt RAG 1
.Os
";
    let dir = TempDir::new().unwrap();
    let page = write_page(&dir, "rag.1", page_text);

    let summary = run(
        &[page.clone()],
        None,
        &Registry::fixes(),
        &RunOptions::default(),
    );
    assert_eq!(summary.rule_counts.get("rewrap_license"), Some(&1));

    let fixed = fs::read_to_string(&page).unwrap();
    assert!(fixed.lines().all(|line| line.len() <= 78));
    assert!(fixed.contains("SUCH DAMAGE."));
    assert!(fixed.lines().count() < page_text.lines().count());
    // Everything below the preamble survives in place.
    assert!(fixed.ends_with(".Dd January 1, 2024\n.Dt RAG 1\n.Os\n"));

    // The refilled form is a fixpoint.
    let second = run(&[page.clone()], None, &Registry::fixes(), &RunOptions::default());
    assert_eq!(second.files_with_problems, 0);
    assert_eq!(fs::read_to_string(&page).unwrap(), fixed);
}

#[test]
fn test_lint_mode_reports_without_modifying() {
    let misplaced_spdx = "\
.\\\" SPDX-License-Identifier: BSD-2-Clause
.\\\" Copyright (c) 2002 The FreeBSD Project
.Dd January 1, 2024
.Dt SPDX 1
.Os
";
    let dir = TempDir::new().unwrap();
    let page = write_page(&dir, "spdx.1", misplaced_spdx);

    let summary = run(
        &[page.clone()],
        None,
        &Registry::checks(),
        &RunOptions::default(),
    );

    assert_eq!(summary.files_with_problems, 1);
    assert_eq!(summary.rule_counts.get("check_spdx"), Some(&1));
    assert_eq!(fs::read_to_string(&page).unwrap(), misplaced_spdx);
}

#[test]
fn test_dry_run_reports_but_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let page = write_page(&dir, "lookup.1", UNSORTED_PAGE);

    let opts = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let summary = run(&[page.clone()], None, &Registry::fixes(), &opts);

    assert_eq!(summary.files_with_problems, 1);
    assert_eq!(fs::read_to_string(&page).unwrap(), UNSORTED_PAGE);
}
