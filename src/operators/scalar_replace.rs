//! Scalar replacement: `VLSR` for plain names, `VLTR` for access paths and
//! `CLSR` for constants.
//!
//! `VLSR` and `VLTR` replace a read of a scalar with another local scalar of
//! the enclosing function. Their candidate pool only keeps names that are
//! declared before the site, visible from it, and usable in the site's
//! context. `CLSR` draws its candidates from the literals of the function.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{MutationContext, Operator, OperatorSpec, ScalarRef, SymbolRule, Target, scalar_ref};
use crate::ast::{ConstValue, NodeId, TranslationUnit, Type};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::source::SourceFile;
use crate::span::TextRange;
use crate::symbols::{FunctionSymbols, case_labels, enclosing_switch};

pub static VLSR: OperatorSpec = OperatorSpec {
    name: "VLSR",
    category: OperatorCategory::VariableReplacement,
    target: Target::Expr,
    summary: "replace a scalar variable with another local scalar",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Identifiers,
    range_rule: SymbolRule::Any,
    partitioned: true,
    is_target: is_named_target,
    mutate,
};

pub static VLTR: OperatorSpec = OperatorSpec {
    name: "VLTR",
    category: OperatorCategory::VariableReplacement,
    target: Target::Expr,
    summary: "replace a scalar member, element or dereference with a local scalar",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Any,
    range_rule: SymbolRule::Any,
    partitioned: true,
    is_target: is_access_target,
    mutate,
};

pub static CLSR: OperatorSpec = OperatorSpec {
    name: "CLSR",
    category: OperatorCategory::VariableReplacement,
    target: Target::Expr,
    summary: "replace a scalar reference with a constant used in the same function",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Identifiers,
    range_rule: SymbolRule::Any,
    partitioned: true,
    is_target: is_constant_target,
    mutate: mutate_constant,
};

/// Parse a `part N M ...` range entry into decile numbers.
///
/// Returns `None` when the entry is not a partition request at all.
pub fn parse_partition(entry: &str) -> Option<Vec<u32>> {
    let mut words = entry.split_whitespace();
    if words.next() != Some("part") {
        return None;
    }

    let numbers: Vec<&str> = words.collect();
    if numbers.is_empty() {
        return None;
    }

    let parts = numbers
        .into_iter()
        .filter_map(|word| match word.parse::<u32>() {
            Ok(n) if (1..=10).contains(&n) => Some(n),
            _ => {
                warn!(partition = word, "partition must be a number from 1 to 10, ignoring");
                None
            }
        })
        .collect();
    Some(parts)
}

/// Keep only the requested deciles of the alphabetically sorted `names`.
///
/// Pools with fewer than ten names are indexed directly: decile `p` is the
/// `p`-th name. The last decile absorbs the remainder of larger pools.
pub fn apply_partitions(mut names: Vec<String>, partitions: &BTreeSet<u32>) -> Vec<String> {
    names.sort();
    let len = names.len();
    let mut kept = Vec::new();

    for &part in partitions {
        let p = part as usize;
        if p == 0 || p > len {
            warn!(partition = part, candidates = len, "partition exceeds candidate pool, ignoring");
            continue;
        }

        if len < 10 {
            kept.push(names[p - 1].clone());
            continue;
        }

        let size = len / 10;
        let start = size * (p - 1);
        let end = if p == 10 { len } else { size * p };
        kept.extend_from_slice(&names[start..end]);
    }

    kept
}

/// Where a candidate site sits, as far as the replacement's legality goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteContext {
    /// Switch condition or case value, array index or integer-only operator operand.
    pub integral_only: bool,
}

impl SiteContext {
    pub fn of(cx: &MutationContext<'_>, node: NodeId) -> Self {
        Self {
            integral_only: cx.stmt.is_in_switch_condition(node)
                || cx.stmt.is_in_switch_case(node)
                || cx.stmt.is_in_array_subscript(node)
                || cx.stmt.is_in_non_floating_expr(node),
        }
    }
}

/// Names of the locals of `func` that may replace the expression at `site`.
///
/// The result is sorted and free of duplicates. An empty `allow` list keeps
/// every name.
pub fn candidate_pool(
    tu: &TranslationUnit,
    source: &SourceFile,
    func: &FunctionSymbols,
    site: TextRange,
    site_text: &str,
    context: SiteContext,
    allow: &BTreeSet<String>,
) -> Vec<String> {
    let site_line = source.line_of(site.start);

    let names: BTreeSet<String> = func
        .local_scalars
        .iter()
        .map(|d| tu.decl(*d))
        .take_while(|decl| decl.begin < site.start && source.line_of(decl.begin) != site_line)
        .filter(|decl| !(context.integral_only && decl.ty.is_floating()))
        .filter(|decl| decl.name != site_text)
        .filter(|decl| allow.is_empty() || allow.contains(&decl.name))
        .filter(|decl| {
            !tu.scopes
                .iter()
                .any(|s| s.contains_offset(decl.begin) && !s.contains_offset(site.start))
        })
        .map(|decl| decl.name.clone())
        .collect();

    names.into_iter().collect()
}

/// C++ spelling of a folded value; `None` for values without one.
pub fn constant_literal(value: ConstValue) -> Option<String> {
    match value {
        ConstValue::Int { value } => Some(value.to_string()),
        ConstValue::Float { value } => value.is_finite().then(|| format!("{value:?}")),
    }
}

/// Distinct literal values of `func`, sorted by spelling.
///
/// An empty `allow` list keeps every value.
pub fn constant_pool(
    tu: &TranslationUnit,
    func: &FunctionSymbols,
    context: SiteContext,
    allow: &BTreeSet<String>,
) -> Vec<String> {
    let values: BTreeSet<String> = func
        .constants
        .iter()
        .filter_map(|id| tu.node(*id).constant)
        .filter(|value| !(context.integral_only && matches!(value, ConstValue::Float { .. })))
        .filter_map(constant_literal)
        .filter(|literal| allow.is_empty() || allow.contains(literal))
        .collect();

    values.into_iter().collect()
}

fn is_named_target(op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    matches!(scalar_ref(cx.tu, node), Some(ScalarRef::Named(_))) && is_replaceable_site(op, node, cx)
}

fn is_access_target(op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    matches!(scalar_ref(cx.tu, node), Some(ScalarRef::AccessPath)) && is_replaceable_site(op, node, cx)
}

fn is_constant_target(op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    scalar_ref(cx.tu, node).is_some() && is_read_site(op, node, cx)
}

/// A read of the value that no other construct pins down.
fn is_read_site(op: &Operator, node: NodeId, cx: &MutationContext<'_>) -> bool {
    let range = cx.tu.range(node);

    !cx.symbols.is_lvalue_arg(range)
        && cx.in_region(range)
        && !cx.stmt.is_in_array_decl_size(node)
        && !cx.stmt.is_in_enum_decl(node)
        && !cx.stmt.is_in_lhs_of_assignment(node)
        && !cx.stmt.is_in_unary_inc_dec(node)
        && !cx.stmt.is_in_address_op(node)
        && cx.stmt.is_in_currently_parsed_function(node)
        && op.in_domain(cx.text(node))
}

/// `VLSR` and `VLTR` leave case values alone.
fn is_replaceable_site(op: &Operator, node: NodeId, cx: &MutationContext<'_>) -> bool {
    is_read_site(op, node, cx) && !cx.stmt.is_in_switch_case(node)
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let Some(func) = cx.symbols.function_of(cx.tu, node) else {
        return;
    };

    let range = cx.tu.range(node);
    let text = cx.text(node);
    let context = SiteContext::of(cx, node);

    let mut names = candidate_pool(cx.tu, cx.source, func, range, text, context, op.range());
    if !op.partitions().is_empty() {
        names = apply_partitions(names, op.partitions());
    }

    if names.is_empty() {
        debug!(operator = op.name(), site = text, "no replacement candidates");
        return;
    }

    let enum_site = cx.tu.ty(node).filter(|t| t.is_enum()).map(Type::cast_spelling);

    for name in names {
        let replacement = match &enum_site {
            Some(ty) => format!("static_cast<{ty}>({name})"),
            None => name,
        };
        sink.add_mutant_entry(cx.entry(op, node, range, replacement));
    }
}

fn mutate_constant(
    op: &Operator,
    node: NodeId,
    cx: &MutationContext<'_>,
    sink: &mut dyn MutantSink,
) {
    let Some(func) = cx.symbols.function_of(cx.tu, node) else {
        return;
    };

    let range = cx.tu.range(node);
    let text = cx.text(node);
    let own = cx.tu.node(node).constant.and_then(constant_literal);

    let mut values = constant_pool(cx.tu, func, SiteContext::of(cx, node), op.range());
    values.retain(|v| Some(v) != own.as_ref());
    if !op.partitions().is_empty() {
        values = apply_partitions(values, op.partitions());
    }

    if values.is_empty() {
        debug!(operator = op.name(), site = text, "no constant candidates");
        return;
    }

    let labels = if cx.stmt.is_in_switch_case(node) {
        enclosing_switch(cx.tu, node)
            .map(|s| case_labels(cx.tu, cx.source, s))
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let enum_site = cx
        .tu
        .ty(node)
        .filter(|t| t.is_enum() || t.is_enum_class())
        .map(Type::cast_spelling);

    for value in values {
        if labels.contains(&value) {
            debug!(label = value.as_str(), "constant would duplicate a case label");
            continue;
        }

        let replacement = match &enum_site {
            Some(ty) => format!("static_cast<{ty}>({value})"),
            None => value,
        };
        sink.add_mutant_entry(cx.entry(op, node, range, replacement));
    }
}
