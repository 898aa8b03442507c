use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use manfix::registry::Registry;
use manfix::report;
use manfix::runner::{run, RunOptions, RunSummary};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "manfix")]
#[command(about = "Batch fixer for mdoc man page lint problems", long_about = None)]
#[command(version)]
struct Cli {
    /// Man pages to fix; directories are searched recursively for pages
    filenames: Vec<String>,

    /// File with a list of man pages to fix, one per line
    #[arg(short = 'f', long, value_name = "FILE")]
    filenames_list: Option<PathBuf>,

    /// Captured `mandoc -T lint` output; its diagnostics select both the
    /// files and the fixes to apply
    #[arg(long, value_name = "FILE")]
    mandoc_lint: Option<PathBuf>,

    /// Run the checks instead of the fixes; report, change nothing
    #[arg(long)]
    lint: bool,

    /// Apply fixes in memory but write nothing to disk
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Stop after this many files needed fixes (0 = unlimited)
    #[arg(long, default_value_t = 0, value_name = "N")]
    max_files: usize,

    /// Print skipped fixes and unmatched diagnostics
    #[arg(long)]
    debug: bool,

    /// Show a unified diff for every modified file
    #[arg(short, long)]
    diff: bool,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Exactly one source of work: positional files, a list file, or a
    //    lint report.
    let sources = usize::from(!cli.filenames.is_empty())
        + usize::from(cli.filenames_list.is_some())
        + usize::from(cli.mandoc_lint.is_some());
    if sources > 1 {
        eprintln!("Cannot combine filenames, --filenames-list and --mandoc-lint");
        std::process::exit(1);
    }
    if sources == 0 {
        eprintln!("Must specify filenames, --filenames-list or --mandoc-lint");
        std::process::exit(1);
    }

    // 2. Resolve the file list, and the diagnostics when report-driven.
    let mut diagnostics = None;
    let files: Vec<String> = if let Some(report_path) = &cli.mandoc_lint {
        let parsed = report::parse_from_path(report_path)?;
        let files = report::files_in_report(&parsed);
        diagnostics = Some(parsed);
        files
    } else if let Some(list) = &cli.filenames_list {
        read_filenames_list(list)?
    } else {
        expand_filenames(&cli.filenames)?
    };

    // 3. Run the fixes, or the checks under --lint.
    let registry = if cli.lint {
        Registry::checks()
    } else {
        Registry::fixes()
    };
    let opts = RunOptions {
        dry_run: cli.dry_run,
        max_files: cli.max_files,
        debug: cli.debug,
        diff: cli.diff,
    };
    let summary = run(&files, diagnostics.as_deref(), &registry, &opts);

    // 4. Report.
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &registry);
    }

    if !summary.failures.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

/// Expand positional arguments: plain files pass through untouched,
/// directories are searched recursively for man pages (numbered-section
/// suffixes `.1` through `.9`).
fn expand_filenames(filenames: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for name in filenames {
        let path = Path::new(name);
        if path.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(path) {
                let entry = entry?;
                if entry.file_type().is_file() && is_man_page(entry.path()) {
                    found.push(entry.path().display().to_string());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(name.clone());
        }
    }
    Ok(files)
}

fn is_man_page(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.len() == 1 && ext.chars().all(|c| ('1'..='9').contains(&c)))
}

fn read_filenames_list(list: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(list)
        .with_context(|| format!("failed to read file list {}", list.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

fn print_summary(summary: &RunSummary, registry: &Registry) {
    for failure in &summary.failures {
        eprintln!("{} {}: {}", "✗".red(), failure.file, failure.error);
    }

    let problems = if summary.files_with_problems > 0 {
        summary.files_with_problems.to_string().yellow()
    } else {
        summary.files_with_problems.to_string().green()
    };
    println!(
        "Processed {} files, problems in {}",
        summary.files_processed, problems
    );

    // Per-rule breakdown, in registry order rather than alphabetical.
    for name in registry.names() {
        if let Some(count) = summary.rule_counts.get(name) {
            println!("\t{name}:\t{count}");
        }
    }
}
