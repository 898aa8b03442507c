//! Checks report problems a human has to fix; they never modify anything.
//! `--lint` swaps this registry in for the fixes.

use crate::dispatch::FixError;
use crate::document::Document;
use crate::runner::RunOptions;
use colored::Colorize;

/// Verify the SPDX tag sits where FreeBSD convention puts it: after the
/// copyright notice, before the license text.
///
/// Pages without an SPDX tag pass; a missing tag is a different cleanup
/// effort with its own tooling.
pub fn check_spdx(doc: &mut Document, _opts: &RunOptions) -> Result<bool, FixError> {
    let preamble = doc.preamble();
    let Some(spdx) = line_containing(&preamble, "SPDX-License") else {
        return Ok(false);
    };

    match line_containing(&preamble, "Redistribution and use") {
        Some(license) => {
            if spdx > license {
                println!(
                    "{}: {}",
                    doc.path().display(),
                    "SPDX line is after the license".yellow()
                );
                return Ok(true);
            }
        }
        None => {
            let Some(copyright) = line_containing(&preamble, "Copyright") else {
                return Ok(false);
            };
            if spdx < copyright {
                println!(
                    "{}: {}",
                    doc.path().display(),
                    "SPDX line is before the copyright".yellow()
                );
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn line_containing(lines: &[String], needle: &str) -> Option<usize> {
    lines.iter().position(|line| line.contains(needle))
}
