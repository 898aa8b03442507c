//! manfix: batch fixer for mdoc manual pages.
//!
//! Fixes the mechanical problems `mandoc -T lint` complains about:
//! unsorted cross references, stray paragraph macros, trailing whitespace,
//! nonportable escapes, ragged license blocks. Fixes run either
//! unconditionally over a set of pages or driven by a captured lint
//! report, in which case each diagnostic's original line number is
//! translated through the running line-count delta so edits applied
//! earlier in the same pass cannot invalidate it.
//!
//! # Architecture
//!
//! Every rewrite compiles down to two primitives on the line buffer: a
//! section-scoped splice bounded by a two-predicate scan, and guarded
//! single-line edits. The intelligence lives in the fix rules; the buffer
//! enforces the exclusivity and delta bookkeeping that keep batched edits
//! sound.
//!
//! # Safety
//!
//! - A section scan and a single-line edit never interleave
//! - Replacing a span with identical content never dirties a document
//! - Diagnostics apply in ascending line order, with drift detection
//! - Writes are atomic (temp file + fsync + rename), modified files only
//!
//! # Example
//!
//! ```no_run
//! use manfix::{Registry, RunOptions};
//!
//! let files = vec!["ls.1".to_string()];
//! let summary = manfix::run(&files, None, &Registry::fixes(), &RunOptions::default());
//! println!(
//!     "fixed {} of {} files",
//!     summary.files_with_problems, summary.files_processed
//! );
//! ```

pub mod checks;
pub mod dispatch;
pub mod document;
pub mod fixes;
pub mod lines;
pub mod registry;
pub mod report;
pub mod runner;

pub use dispatch::{apply_targeted, apply_unconditional, FixError};
pub use document::{Document, DocumentError};
pub use lines::{ContractError, LineBuffer};
pub use registry::{Registry, RuleEntry, RuleKind};
pub use report::{Diagnostic, ReportError};
pub use runner::{run, FileFailure, RunOptions, RunSummary};
