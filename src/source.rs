use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::span::TextRange;

/// Main source file of a translation unit, loaded once per run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as recorded in the fact file.
    pub recorded_path: PathBuf,

    /// Absolute (or caller-relative) path on disk.
    pub disk_path: PathBuf,

    text: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// Resolve `recorded` against the directory holding the fact file and read it.
    pub fn load(facts_dir: &Path, recorded: &Path) -> Result<Self> {
        let disk_path = if recorded.is_absolute() {
            recorded.to_path_buf()
        } else {
            facts_dir.join(recorded)
        };

        let text = fs::read_to_string(&disk_path)
            .with_context(|| format!("failed to read source file {:?}", disk_path))?;

        Ok(Self::from_text(recorded.to_path_buf(), disk_path, text))
    }

    pub fn from_text(recorded_path: PathBuf, disk_path: PathBuf, text: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );

        Self {
            recorded_path,
            disk_path,
            text,
            line_starts,
        }
    }

    /// Path relative to the fact file, used for spans.
    pub fn relative_path(&self) -> &Path {
        &self.recorded_path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> u32 {
        self.text.len() as u32
    }

    /// Source text covered by `range`; empty when the range is out of bounds.
    pub fn slice(&self, range: TextRange) -> &str {
        self.text.get(range.as_usize()).unwrap_or("")
    }

    /// 1-based line number of `offset`.
    pub fn line_of(&self, offset: u32) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx as u32 + 1,
            Err(idx) => idx as u32,
        }
    }

    /// 1-based (line, column) of `offset`; column counts Unicode scalar values.
    pub fn line_col(&self, offset: u32) -> Option<(u32, u32)> {
        if offset > self.len() {
            return None;
        }

        let line = self.line_of(offset);
        let line_start = self.line_starts[(line - 1) as usize] as usize;
        let col = self.text.get(line_start..offset as usize)?.chars().count() as u32 + 1;

        Some((line, col))
    }

    /// Byte offset of a 1-based (line, column) position, clamped to the line end.
    pub fn offset_of(&self, line: u32, col: u32) -> Option<u32> {
        let line_start = *self.line_starts.get(line.checked_sub(1)? as usize)? as usize;
        let line_end = self.text[line_start..]
            .find('\n')
            .map(|p| line_start + p)
            .unwrap_or(self.text.len());

        let rest = &self.text[line_start..line_end];
        let byte_col = rest
            .char_indices()
            .nth(col.saturating_sub(1) as usize)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        Some((line_start + byte_col) as u32)
    }

    /// Offset just past the `;` terminating a statement that ends at `end`.
    ///
    /// Returns `end` unchanged when the next non-blank character is not `;`.
    pub fn end_after_semicolon(&self, end: u32) -> u32 {
        let tail = self.text.get(end as usize..).unwrap_or("");
        let skipped = tail.len() - tail.trim_start().len();

        if tail[skipped..].starts_with(';') {
            end + skipped as u32 + 1
        } else {
            end
        }
    }
}
