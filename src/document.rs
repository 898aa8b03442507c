//! A man page held in memory: a [`LineBuffer`] bound to a path, with the
//! mdoc-aware operations the fix rules are written against.

use crate::lines::{ContractError, LineBuffer};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("replace_section {given:?} does not match the scanned section {scanned:?}")]
    SectionMismatch { given: String, scanned: String },
}

/// A man page document.
///
/// Section scans follow the mdoc convention: a section starts at its
/// `.Sh NAME` header and runs until the next `.Sh` header or EOF. The
/// header lines themselves are never part of the section content handed
/// to (or accepted from) a fix rule.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    lines: LineBuffer,
    // Name passed to the last section() scan, cleared on replace or reset.
    section_name: Option<String>,
}

impl Document {
    /// Read a man page from disk. Trailing-newline presence is not
    /// preserved; [`save`](Self::save) always writes a final newline.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| DocumentError::Io {
            path: path.clone(),
            source,
        })?;
        let lines = text.lines().map(str::to_owned).collect();
        Ok(Self {
            path,
            lines: LineBuffer::new(lines),
            section_name: None,
        })
    }

    /// Build a document from lines already in memory. The path is only
    /// used for messages (and for [`save`](Self::save), if called).
    pub fn from_lines(path: impl Into<PathBuf>, lines: Vec<String>) -> Self {
        Self {
            path: path.into(),
            lines: LineBuffer::new(lines),
            section_name: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        self.lines.lines()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.line(index)
    }

    pub fn is_modified(&self) -> bool {
        self.lines.is_modified()
    }

    pub fn line_delta(&self) -> i64 {
        self.lines.delta()
    }

    /// The comment block at the top of the file: every leading line that
    /// starts with `.\` (in practice `.\"` comments), ending at the first
    /// line that does not.
    pub fn preamble(&self) -> Vec<String> {
        self.lines
            .lines()
            .iter()
            .take_while(|line| line.starts_with(".\\"))
            .cloned()
            .collect()
    }

    /// Scan for the named section and return its content lines, or `None`
    /// when the page has no such section.
    ///
    /// Either way the scan claims the buffer's section cursor; follow up
    /// with [`replace_section`](Self::replace_section) or
    /// [`clear_section`](Self::clear_section).
    pub fn section(&mut self, name: &str) -> Result<Option<Vec<String>>, DocumentError> {
        self.section_name = Some(name.to_string());
        let header = format!(".Sh {name}");
        let middle = self
            .lines
            .split(move |line| line.starts_with(&header), |line| line.starts_with(".Sh "))?;
        Ok(middle)
    }

    /// Replace the content of the section scanned by the matching
    /// [`section`](Self::section) call. Handing back identical lines is a
    /// no-op that leaves the document clean.
    pub fn replace_section(&mut self, name: &str, lines: Vec<String>) -> Result<(), DocumentError> {
        match self.section_name.as_deref() {
            Some(scanned) if scanned == name => {}
            Some(scanned) => {
                return Err(DocumentError::SectionMismatch {
                    given: name.to_string(),
                    scanned: scanned.to_string(),
                })
            }
            None => return Err(ContractError::NoSectionScan.into()),
        }
        self.lines.replace_middle(lines)?;
        self.section_name = None;
        Ok(())
    }

    /// Drop any in-progress section scan.
    pub fn clear_section(&mut self) {
        self.lines.clear_section();
        self.section_name = None;
    }

    pub fn remove_line(&mut self, index: usize) -> Result<(), DocumentError> {
        self.lines.remove_line(index)?;
        Ok(())
    }

    pub fn replace_line(&mut self, index: usize, line: String) -> Result<(), DocumentError> {
        self.lines.replace_line(index, line)?;
        Ok(())
    }

    /// See [`LineBuffer::resolve_original_line`].
    pub fn resolve_original_line(&self, line_number: usize) -> Result<usize, DocumentError> {
        Ok(self.lines.resolve_original_line(line_number)?)
    }

    /// Write the document back to its path if (and only if) it was
    /// modified. Returns whether a write happened.
    ///
    /// The write is atomic: content goes to a temp file in the same
    /// directory, is synced, then renamed over the original. An unmodified
    /// document never touches the filesystem, so batch runs over clean
    /// trees leave no churn behind.
    pub fn save(&self) -> Result<bool, DocumentError> {
        if !self.lines.is_modified() {
            return Ok(false);
        }

        let text = self.lines.lines().join("\n") + "\n";
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let io_err = |source| DocumentError::Io {
            path: self.path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(true)
    }
}
