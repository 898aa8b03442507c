//! The fundamental editing primitive: an in-memory buffer of text lines.
//!
//! All higher-level operations (section rewrites, diagnostic-driven line
//! fixes) compile down to two things here: a section-scoped splice bounded
//! by a two-predicate scan, and guarded single-line edits. The buffer
//! tracks a monotonic modified flag and the signed line-count delta that
//! makes line numbers from a pre-edit lint report usable after earlier
//! edits in the same pass have shifted the file.

use thiserror::Error;

/// A violation of the buffer's editing protocol.
///
/// These are programming errors or diagnostic drift, not conditions to
/// retry: the caller invoked operations out of order, or the buffer no
/// longer agrees with the line numbers driving it. Processing of the
/// affected file must stop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("section scan started while another section is in use")]
    SectionInUse,

    #[error("section replacement without a preceding section scan")]
    NoSectionScan,

    #[error("section replacement after a scan that matched no section")]
    SectionNotFound,

    #[error("line edit at index {index} while a section is in use")]
    LineEditDuringSection { index: usize },

    #[error("line index {index} out of bounds for buffer of {len} lines")]
    LineOutOfBounds { index: usize, len: usize },

    #[error("original line {line} resolves outside the buffer (delta {delta}, {len} lines)")]
    UnresolvableLine { line: usize, delta: i64, len: usize },
}

/// Scan state bounding the middle span of a three-way split.
///
/// At most one cursor is ever active on a buffer; single-line edits are
/// forbidden while it is. A scan activates it even when nothing matched,
/// so a caller that bails early leaves it for [`LineBuffer::clear_section`].
#[derive(Debug, Clone, Default)]
struct SectionCursor {
    active: bool,
    middle_start: Option<usize>,
    middle_end: Option<usize>,
}

impl SectionCursor {
    fn reset(&mut self) {
        self.active = false;
        self.middle_start = None;
        self.middle_end = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Before,
    Middle,
    After,
}

/// An ordered, mutable sequence of text lines.
///
/// `modified` is monotonic: once an edit changes content it stays set for
/// the buffer's lifetime. `delta` always equals the current line count
/// minus the original line count.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    lines: Vec<String>,
    modified: bool,
    delta: i64,
    cursor: SectionCursor,
}

impl LineBuffer {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            modified: false,
            delta: 0,
            cursor: SectionCursor::default(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Net change in line count from all edits applied so far.
    pub fn delta(&self) -> i64 {
        self.delta
    }

    pub fn section_in_use(&self) -> bool {
        self.cursor.active
    }

    /// Split the buffer three ways and return the middle span.
    ///
    /// Scanning starts in BEFORE. The first line satisfying
    /// `is_middle_start` ends BEFORE; the middle span begins at the line
    /// after it. The first subsequent line satisfying `is_after_start`
    /// begins AFTER and ends the span; if no such line exists the span runs
    /// to the end of the buffer. Both boundary lines stay outside the span,
    /// so a later [`replace_middle`](Self::replace_middle) leaves them
    /// untouched.
    ///
    /// Returns `Ok(None)` when `is_middle_start` never matched. The cursor
    /// is activated either way; a caller that does not go on to replace the
    /// span must be followed by [`clear_section`](Self::clear_section).
    pub fn split<F, G>(
        &mut self,
        is_middle_start: F,
        is_after_start: G,
    ) -> Result<Option<Vec<String>>, ContractError>
    where
        F: Fn(&str) -> bool,
        G: Fn(&str) -> bool,
    {
        if self.cursor.active {
            return Err(ContractError::SectionInUse);
        }
        self.cursor.active = true;

        let mut state = ScanState::Before;
        for (i, line) in self.lines.iter().enumerate() {
            match state {
                ScanState::Before => {
                    if is_middle_start(line) {
                        state = ScanState::Middle;
                        self.cursor.middle_start = Some(i + 1);
                    }
                }
                ScanState::Middle => {
                    if is_after_start(line) {
                        state = ScanState::After;
                        self.cursor.middle_end = Some(i);
                    }
                }
                ScanState::After => {}
            }
        }

        // The buffer ended while still in the middle: the span runs to EOF.
        if state == ScanState::Middle {
            self.cursor.middle_end = Some(self.lines.len());
        }

        Ok(self.middle_lines())
    }

    fn middle_bounds(&self) -> Option<(usize, usize)> {
        match (self.cursor.middle_start, self.cursor.middle_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    fn middle_lines(&self) -> Option<Vec<String>> {
        self.middle_bounds()
            .map(|(start, end)| self.lines[start..end].to_vec())
    }

    /// Replace the span bounded by the active cursor.
    ///
    /// Identical content is a no-op: the cursor resets but `modified` and
    /// `delta` are untouched, so re-applying a fix that changed nothing
    /// never dirties the buffer. A cursor whose scan matched no section
    /// cannot be replaced through.
    pub fn replace_middle(&mut self, new_lines: Vec<String>) -> Result<(), ContractError> {
        if !self.cursor.active {
            return Err(ContractError::NoSectionScan);
        }
        let Some((start, end)) = self.middle_bounds() else {
            return Err(ContractError::SectionNotFound);
        };

        if new_lines[..] == self.lines[start..end] {
            self.cursor.reset();
            return Ok(());
        }

        let removed = end - start;
        let added = new_lines.len();
        self.lines.splice(start..end, new_lines);
        self.modified = true;
        self.delta += added as i64 - removed as i64;
        self.cursor.reset();
        Ok(())
    }

    /// Delete the line at `index`. Forbidden while a section is in use.
    pub fn remove_line(&mut self, index: usize) -> Result<(), ContractError> {
        if self.cursor.active {
            return Err(ContractError::LineEditDuringSection { index });
        }
        if index >= self.lines.len() {
            return Err(ContractError::LineOutOfBounds {
                index,
                len: self.lines.len(),
            });
        }
        self.lines.remove(index);
        self.modified = true;
        self.delta -= 1;
        Ok(())
    }

    /// Overwrite the line at `index`. Forbidden while a section is in use.
    ///
    /// Unlike [`replace_middle`](Self::replace_middle) this always marks the
    /// buffer modified, identical content or not.
    pub fn replace_line(&mut self, index: usize, line: String) -> Result<(), ContractError> {
        if self.cursor.active {
            return Err(ContractError::LineEditDuringSection { index });
        }
        if index >= self.lines.len() {
            return Err(ContractError::LineOutOfBounds {
                index,
                len: self.lines.len(),
            });
        }
        self.lines[index] = line;
        self.modified = true;
        Ok(())
    }

    /// Translate a 1-based line number from the original file into a
    /// 0-based index into the current buffer.
    ///
    /// Only sound when every edit applied so far lies strictly before
    /// original line `line_number`; diagnostic dispatch guarantees that by
    /// processing diagnostics in ascending line order. A result outside the
    /// buffer means the bookkeeping and the report have drifted apart.
    pub fn resolve_original_line(&self, line_number: usize) -> Result<usize, ContractError> {
        let index = line_number as i64 - 1 + self.delta;
        if index < 0 || index >= self.lines.len() as i64 {
            return Err(ContractError::UnresolvableLine {
                line: line_number,
                delta: self.delta,
                len: self.lines.len(),
            });
        }
        Ok(index as usize)
    }

    /// Reset any in-use section cursor. Safe to call at any time.
    pub fn clear_section(&mut self) {
        self.cursor.reset();
    }
}
