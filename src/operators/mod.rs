//! Mutation operator engine.
//!
//! Every operator is described by a static [`OperatorSpec`]: its mnemonic,
//! the default trigger and replacement sets, how user overrides are
//! validated, and the two functions that decide applicability and produce
//! mutants. [`CATALOG`] lists them all; [`Operator`] pairs a descriptor
//! with the effective domain/range of one run.

pub mod argdel;
pub mod binary;
pub mod funcaldel;
pub mod scalar_replace;
pub mod sign_fault;
pub mod smvb;
pub mod srsr;
pub mod twiddle;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::ast::{DeclId, NodeId, NodeKind, TranslationUnit};
use crate::context::{MutationRange, StmtContext};
use crate::database::{MutantEntry, MutantSink};
use crate::mutant::{ExtraEdit, OperatorCategory};
use crate::source::SourceFile;
use crate::span::{SourceSpan, TextRange};
use crate::symbols::SymbolTable;

/// Node shape an operator is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Expr,
    Stmt,
}

/// Validation applied to a user-supplied domain or range.
#[derive(Debug, Clone, Copy)]
pub enum SymbolRule {
    /// Any set is accepted.
    Any,

    /// Every entry must be one of these symbols.
    Symbols(&'static [&'static str]),

    /// Every entry must be a valid C identifier.
    Identifiers,

    /// Empty, or exactly one of these keywords.
    OneOf(&'static [&'static str]),
}

impl SymbolRule {
    pub fn accepts(&self, set: &BTreeSet<String>) -> bool {
        match self {
            Self::Any => true,
            Self::Symbols(allowed) => set.iter().all(|s| allowed.contains(&s.as_str())),
            Self::Identifiers => set.iter().all(|s| is_identifier(s)),
            Self::OneOf(allowed) => {
                set.is_empty()
                    || (set.len() == 1 && set.iter().all(|s| allowed.contains(&s.as_str())))
            }
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

pub type TargetFn = fn(&Operator, NodeId, &mut MutationContext<'_>) -> bool;
pub type MutateFn = fn(&Operator, NodeId, &MutationContext<'_>, &mut dyn MutantSink);

/// Static description of one mutation operator.
#[derive(Debug)]
pub struct OperatorSpec {
    pub name: &'static str,
    pub category: OperatorCategory,
    pub target: Target,
    pub summary: &'static str,
    pub default_domain: &'static [&'static str],
    pub default_range: &'static [&'static str],
    pub domain_rule: SymbolRule,
    pub range_rule: SymbolRule,

    /// Range entries of the form `part N M ...` select candidate deciles.
    pub partitioned: bool,

    pub is_target: TargetFn,
    pub mutate: MutateFn,
}

/// Every operator the engine knows about, in listing order.
pub static CATALOG: &[&OperatorSpec] = &[
    &binary::OAAN,
    &binary::OARN,
    &binary::OALN,
    &binary::ORAN,
    &binary::ORLN,
    &binary::OLAN,
    &binary::OLRN,
    &binary::OLSN,
    &argdel::ARGDEL,
    &funcaldel::FUNCALDEL,
    &scalar_replace::VLSR,
    &scalar_replace::VLTR,
    &scalar_replace::CLSR,
    &twiddle::VTWD,
    &sign_fault::VDTR,
    &smvb::SMVB,
    &srsr::SRSR,
];

/// Look up a catalog entry by name, ignoring case.
pub fn find_spec(name: &str) -> Option<&'static OperatorSpec> {
    CATALOG
        .iter()
        .copied()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
}

fn to_set(symbols: &[&str]) -> BTreeSet<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

/// A catalog operator together with its effective configuration.
#[derive(Debug, Clone)]
pub struct Operator {
    spec: &'static OperatorSpec,
    domain: BTreeSet<String>,
    range: BTreeSet<String>,
    partitions: BTreeSet<u32>,
}

impl Operator {
    /// Operator with its default domain and range.
    pub fn new(spec: &'static OperatorSpec) -> Self {
        Self {
            spec,
            domain: to_set(spec.default_domain),
            range: to_set(spec.default_range),
            partitions: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn category(&self) -> OperatorCategory {
        self.spec.category
    }

    pub fn domain(&self) -> &BTreeSet<String> {
        &self.domain
    }

    pub fn range(&self) -> &BTreeSet<String> {
        &self.range
    }

    /// Requested deciles (1..=10); empty means keep every candidate.
    pub fn partitions(&self) -> &BTreeSet<u32> {
        &self.partitions
    }

    pub fn validate_domain(&self, domain: &BTreeSet<String>) -> bool {
        self.spec.domain_rule.accepts(domain)
    }

    pub fn validate_range(&self, range: &BTreeSet<String>) -> bool {
        self.spec.range_rule.accepts(range)
    }

    /// Replace the domain; an empty set restores the default.
    pub fn set_domain(&mut self, domain: BTreeSet<String>) {
        self.domain = if domain.is_empty() {
            to_set(self.spec.default_domain)
        } else {
            domain
        };
    }

    /// Replace the range; an empty set restores the default.
    pub fn set_range(&mut self, range: BTreeSet<String>) {
        let mut range = range;
        if self.spec.partitioned {
            range.retain(|entry| match scalar_replace::parse_partition(entry) {
                Some(parts) => {
                    self.partitions.extend(parts);
                    false
                }
                None => true,
            });
        }

        self.range = if range.is_empty() {
            to_set(self.spec.default_range)
        } else {
            range
        };
    }

    /// True if `token` may trigger this operator. An empty domain accepts everything.
    pub fn in_domain(&self, token: &str) -> bool {
        self.domain.is_empty() || self.domain.contains(token)
    }

    /// True if the node has the shape this operator visits.
    pub fn visits(&self, kind: &NodeKind) -> bool {
        match self.spec.target {
            Target::Expr => kind.is_expr(),
            Target::Stmt => true,
        }
    }

    pub fn is_mutation_target(&self, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
        (self.spec.is_target)(self, node, cx)
    }

    pub fn mutate(&self, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
        (self.spec.mutate)(self, node, cx, sink)
    }
}

/// Multiset of reference names, each entry suppressing exactly one occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyList {
    counts: BTreeMap<String, usize>,
}

impl DenyList {
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        let mut counts = BTreeMap::new();
        for name in names {
            *counts.entry(name.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Use up one entry for `name`; true if one was available.
    pub fn consume(&mut self, name: &str) -> bool {
        let Some(count) = self.counts.get_mut(name) else {
            return false;
        };

        *count -= 1;
        if *count == 0 {
            self.counts.remove(name);
        }
        true
    }
}

/// Shared, read-mostly state handed to every operator during traversal.
#[derive(Debug)]
pub struct MutationContext<'a> {
    pub tu: &'a TranslationUnit,
    pub source: &'a SourceFile,
    pub stmt: StmtContext<'a>,
    pub symbols: &'a SymbolTable,
    pub region: MutationRange,
    deny_list: DenyList,
}

impl<'a> MutationContext<'a> {
    pub fn new(
        tu: &'a TranslationUnit,
        source: &'a SourceFile,
        symbols: &'a SymbolTable,
        region: MutationRange,
    ) -> Self {
        Self {
            tu,
            source,
            stmt: StmtContext::new(tu),
            symbols,
            region,
            deny_list: DenyList::from_names(&tu.non_mutatable_scalar_refs),
        }
    }

    /// Source text of a node.
    pub fn text(&self, node: NodeId) -> &'a str {
        self.source.slice(self.tu.range(node))
    }

    pub fn in_region(&self, range: TextRange) -> bool {
        self.region.contains(range)
    }

    /// Proteus-style line number of a node.
    pub fn line(&self, node: NodeId) -> u32 {
        self.stmt.proteus_line(node, self.source)
    }

    /// One-shot suppression from the off-by-one deny-list.
    pub fn consume_denied(&mut self, name: &str) -> bool {
        let denied = self.deny_list.consume(name);
        if denied {
            debug!(name, "reference suppressed by deny-list");
        }
        denied
    }

    /// Record replacing `range` with `replacement`, numbered on `node`'s line.
    pub fn entry(
        &self,
        op: &Operator,
        node: NodeId,
        range: TextRange,
        replacement: impl Into<String>,
    ) -> MutantEntry {
        MutantEntry {
            operator: op.name(),
            category: op.category(),
            range,
            original: self.source.slice(range).to_string(),
            replacement: replacement.into(),
            line: self.line(node),
            tag: None,
            extra_edits: Vec::new(),
        }
    }

    /// Insertion of `text` at `offset`.
    pub fn insertion(&self, offset: u32, text: &str) -> ExtraEdit {
        ExtraEdit {
            span: SourceSpan::new(
                self.source.relative_path().to_path_buf(),
                TextRange::at(offset),
            ),
            original: String::new(),
            replacement: text.to_string(),
        }
    }
}

/// What a scalar reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarRef {
    /// Plain variable name.
    Named(DeclId),

    /// Member access, array element or dereference.
    AccessPath,
}

/// Classify `node` as a read of a scalar (or enum class) l-value.
pub fn scalar_ref(tu: &TranslationUnit, node: NodeId) -> Option<ScalarRef> {
    let ty = tu.ty(node)?;
    if !(ty.is_scalar() || ty.is_enum_class()) {
        return None;
    }

    match tu.kind(node) {
        NodeKind::DeclRef { decl: Some(d), .. } => Some(ScalarRef::Named(*d)),
        NodeKind::Member { .. } | NodeKind::ArraySubscript { .. } => Some(ScalarRef::AccessPath),
        NodeKind::UnaryOperator { opcode, .. } if opcode == "*" => Some(ScalarRef::AccessPath),
        _ => None,
    }
}
