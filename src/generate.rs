//! One generation pass: load the fact base, visit every node with every
//! operator and collect the ordered mutant list.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::ast::TranslationUnit;
use crate::context::MutationRange;
use crate::database::MutantDatabase;
use crate::mutant::Mutant;
use crate::operators::{MutationContext, Operator};
use crate::options::LineCol;
use crate::source::SourceFile;
use crate::symbols::SymbolTable;

/// A loaded fact file together with the source it describes.
#[derive(Debug)]
pub struct Facts {
    pub path: PathBuf,
    pub tu: TranslationUnit,
    pub source: SourceFile,
}

impl Facts {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read fact file {:?}", path))?;
        let tu = TranslationUnit::from_json(&json)
            .with_context(|| format!("failed to load fact file {:?}", path))?;

        let facts_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let source = SourceFile::load(facts_dir, &tu.file)?;
        tu.check_offsets(source.text())
            .with_context(|| format!("fact file {:?} does not match its source", path))?;

        info!(
            facts = %path.display(),
            source = %source.disk_path.display(),
            nodes = tu.nodes.len(),
            functions = tu.functions.len(),
            "fact base loaded"
        );

        Ok(Self {
            path: path.to_path_buf(),
            tu,
            source,
        })
    }

    /// Translate user `L:C` positions into a byte window over the source.
    pub fn region(&self, start: Option<LineCol>, end: Option<LineCol>) -> Result<MutationRange> {
        let resolve = |pos: Option<LineCol>| -> Result<Option<u32>> {
            pos.map(|p| {
                self.source
                    .offset_of(p.line, p.col)
                    .with_context(|| format!("position {p} is outside {:?}", self.source.disk_path))
            })
            .transpose()
        };

        Ok(MutationRange {
            start: resolve(start)?,
            end: resolve(end)?,
        })
    }
}

/// Result of one pass.
#[derive(Debug)]
pub struct Generation {
    /// Ordered, numbered mutants.
    pub mutants: Vec<Mutant>,

    /// Mutants per operator name, zero for operators that found nothing.
    pub counts: BTreeMap<String, usize>,

    /// Records dropped as exact duplicates.
    pub duplicates: usize,
}

/// Run every operator over every node of `tu`.
pub fn generate_mutants(
    tu: &TranslationUnit,
    source: &SourceFile,
    operators: &[Operator],
    region: MutationRange,
) -> Generation {
    let symbols = SymbolTable::build(tu);
    let mut cx = MutationContext::new(tu, source, &symbols, region);
    let mut db = MutantDatabase::new(source.relative_path().to_path_buf());

    for node in tu.preorder() {
        let kind = tu.kind(node);
        for op in operators {
            if op.visits(kind) && op.is_mutation_target(node, &mut cx) {
                op.mutate(node, &cx, &mut db);
            }
        }
    }

    let duplicates = db.duplicates();
    debug!(records = db.len(), duplicates, "traversal finished");

    let mutants = db.into_mutants();

    let mut counts: BTreeMap<String, usize> = operators
        .iter()
        .map(|op| (op.name().to_string(), 0))
        .collect();
    for m in &mutants {
        *counts.entry(m.operator.name.clone()).or_insert(0) += 1;
    }

    info!(
        mutants = mutants.len(),
        operators = operators.len(),
        "generation finished"
    );

    Generation {
        mutants,
        counts,
        duplicates,
    }
}
