use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::mutant::Mutant;

/// Machine-readable report for one generation run.
///
/// In `--json` mode we print this to stdout as pretty JSON.
#[derive(Debug, Serialize)]
pub struct GenerationReport {
    /// Tool name, stable across versions.
    pub tool: &'static str,

    /// Current crate version.
    pub version: &'static str,

    /// Fact file the run read.
    pub facts: PathBuf,

    /// Source file the mutants refer to.
    pub source: PathBuf,

    /// Number of mutants generated before applying `--limit`.
    pub generated: usize,

    /// Records dropped as exact duplicates.
    pub duplicates: usize,

    /// Generated mutants per operator.
    pub operators: BTreeMap<String, usize>,

    /// Mutants kept after `--limit`.
    pub mutants: Vec<Mutant>,

    /// Optional high-level error message (for example a configuration error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationReport {
    pub fn success(
        facts: PathBuf,
        source: PathBuf,
        generated: usize,
        duplicates: usize,
        operators: BTreeMap<String, usize>,
        mutants: Vec<Mutant>,
    ) -> Self {
        Self {
            tool: "cxx-mutant",
            version: env!("CARGO_PKG_VERSION"),
            facts,
            source,
            generated,
            duplicates,
            operators,
            mutants,
            error: None,
        }
    }

    pub fn failure(facts: PathBuf, error: String) -> Self {
        Self {
            tool: "cxx-mutant",
            version: env!("CARGO_PKG_VERSION"),
            facts,
            source: PathBuf::new(),
            generated: 0,
            duplicates: 0,
            operators: BTreeMap::new(),
            mutants: Vec::new(),
            error: Some(error),
        }
    }
}
