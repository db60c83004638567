use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Half-open byte range `[start, end)` inside the main source file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "inverted range [{start}, {end})");
        Self { start, end }
    }

    /// Empty range anchored at `offset`, used for insertions.
    pub fn at(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// True if `offset` lies inside the range (start inclusive, end exclusive).
    pub fn contains_offset(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }

    /// True if `other` lies completely inside `self`.
    pub fn contains(&self, other: &TextRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn as_usize(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Byte span inside a C/C++ source file.
///
/// Offsets are byte indices into the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSpan {
    /// Path to the source file (as recorded in the fact file).
    pub file: PathBuf,

    /// Start byte offset (inclusive).
    pub start: u32,

    /// End byte offset (exclusive).
    pub end: u32,
}

impl SourceSpan {
    pub fn new(file: PathBuf, range: TextRange) -> Self {
        Self {
            file,
            start: range.start,
            end: range.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containment_is_half_open() {
        let r = TextRange::new(4, 8);
        assert!(r.contains_offset(4));
        assert!(r.contains_offset(7));
        assert!(!r.contains_offset(8));
        assert!(r.contains(&TextRange::new(4, 8)));
        assert!(r.contains(&TextRange::new(5, 6)));
        assert!(!r.contains(&TextRange::new(3, 6)));
        assert_eq!(TextRange::at(3), TextRange::new(3, 3));
    }
}
