//! Sink collecting mutant records during traversal.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::trace;

use crate::mutant::{ExtraEdit, Mutant, MutationOperator, OperatorCategory};
use crate::span::{SourceSpan, TextRange};

/// One legal transformation as reported by an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutantEntry {
    pub operator: &'static str,
    pub category: OperatorCategory,
    pub range: TextRange,
    pub original: String,
    pub replacement: String,
    pub line: u32,
    pub tag: Option<String>,
    pub extra_edits: Vec<ExtraEdit>,
}

impl MutantEntry {
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_extra_edit(mut self, edit: ExtraEdit) -> Self {
        self.extra_edits.push(edit);
        self
    }
}

/// Receiver of finished mutant records. Fire-and-forget.
pub trait MutantSink {
    fn add_mutant_entry(&mut self, entry: MutantEntry);
}

impl MutantSink for Vec<MutantEntry> {
    fn add_mutant_entry(&mut self, entry: MutantEntry) {
        self.push(entry);
    }
}

/// Accumulates the records of one run, dropping exact duplicates.
#[derive(Debug)]
pub struct MutantDatabase {
    file: PathBuf,
    entries: Vec<MutantEntry>,
    seen: HashSet<(&'static str, TextRange, String)>,
    duplicates: usize,
}

impl MutantDatabase {
    pub fn new(file: PathBuf) -> Self {
        Self {
            file,
            entries: Vec::new(),
            seen: HashSet::new(),
            duplicates: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records ignored because an identical one was already stored.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Ordered mutants with 1-based ids.
    pub fn into_mutants(self) -> Vec<Mutant> {
        let file = self.file;
        let mut entries: Vec<(usize, MutantEntry)> = self.entries.into_iter().enumerate().collect();

        // 1) Sort by start offset, then operator, then insertion order
        entries.sort_by(|(ia, a), (ib, b)| {
            (a.range.start, a.operator, *ia).cmp(&(b.range.start, b.operator, *ib))
        });

        // 2) Assign IDs to match sorted order (1-based)
        entries
            .into_iter()
            .enumerate()
            .map(|(idx, (_, e))| Mutant {
                id: idx as u64 + 1,
                operator: MutationOperator {
                    category: e.category,
                    name: e.operator.to_string(),
                },
                span: SourceSpan::new(file.clone(), e.range),
                line: e.line,
                original_snippet: e.original,
                mutated_snippet: e.replacement,
                tag: e.tag,
                extra_edits: e.extra_edits,
            })
            .collect()
    }
}

impl MutantSink for MutantDatabase {
    fn add_mutant_entry(&mut self, entry: MutantEntry) {
        let key = (entry.operator, entry.range, entry.replacement.clone());
        if !self.seen.insert(key) {
            trace!(
                operator = entry.operator,
                start = entry.range.start,
                "duplicate mutant ignored"
            );
            self.duplicates += 1;
            return;
        }
        self.entries.push(entry);
    }
}
