//! `VTWD`: nudge a scalar reference by one in either direction.

use tracing::debug;

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target, scalar_ref};
use crate::ast::{BuiltinKind, ConstValue, NodeId};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::symbols::{case_labels, enclosing_switch};

pub const PLUS_ONE: &str = "plusone";
pub const MINUS_ONE: &str = "minusone";

pub static VTWD: OperatorSpec = OperatorSpec {
    name: "VTWD",
    category: OperatorCategory::Twiddle,
    target: Target::Expr,
    summary: "replace a scalar reference x by x+1 or x-1",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Any,
    range_rule: SymbolRule::OneOf(&[PLUS_ONE, MINUS_ONE]),
    partitioned: false,
    is_target,
    mutate,
};

fn is_target(op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    if scalar_ref(cx.tu, node).is_none() {
        return false;
    }

    let range = cx.tu.range(node);
    let text = cx.text(node);

    let eligible = !cx.symbols.is_lvalue_arg(range)
        && cx.in_region(range)
        && !cx.stmt.is_in_enum_decl(node)
        && !cx.stmt.is_in_lhs_of_assignment(node)
        && !cx.stmt.is_in_address_op(node)
        && !cx.stmt.is_in_unary_inc_dec(node)
        && op.in_domain(text);

    // The deny-list is only charged for sites that would otherwise be mutated.
    eligible && !cx.consume_denied(text)
}

/// Literal for a folded constant moved by `delta`; `None` when the result
/// has no C++ literal spelling.
fn shifted_constant(value: ConstValue, delta: i64) -> Option<String> {
    match value {
        ConstValue::Int { value } => Some(value.saturating_add(delta).to_string()),
        ConstValue::Float { value } => {
            let shifted = value + delta as f64;
            shifted.is_finite().then(|| format!("{shifted:?}"))
        }
    }
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let range = cx.tu.range(node);
    let text = cx.text(node);
    let ty = cx.tu.ty(node);
    let constant = cx.tu.node(node).constant;

    let labels = if cx.stmt.is_in_switch_case(node) {
        enclosing_switch(cx.tu, node)
            .map(|s| case_labels(cx.tu, cx.source, s))
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let operand = if ty.is_some_and(|t| t.is_enum_class()) {
        format!("static_cast<int>({text})")
    } else {
        text.to_string()
    };

    // Anything but plain `int` is cast back to the expression's own type.
    let cast_back = ty
        .filter(|t| {
            t.is_enum()
                || t.is_enum_class()
                || t.builtin_kind().is_some_and(|k| k != BuiltinKind::Int)
        })
        .map(|t| t.cast_spelling());

    for (keyword, tag, sign, delta) in [(PLUS_ONE, "plus", '+', 1), (MINUS_ONE, "minus", '-', -1)] {
        if !op.range().is_empty() && !op.range().contains(keyword) {
            continue;
        }

        let replacement = match constant {
            Some(value) => {
                let Some(literal) = shifted_constant(value, delta) else {
                    debug!(site = text, "folded value is not finite");
                    continue;
                };
                // Floating literals already carry a floating type.
                if matches!(value, ConstValue::Float { .. }) {
                    literal
                } else {
                    match &cast_back {
                        Some(target) => format!("static_cast<{target}>({literal})"),
                        None => literal,
                    }
                }
            }
            None => {
                let shifted = format!("({operand}{sign}1)");
                match &cast_back {
                    Some(target) => format!("static_cast<{target}>({shifted})"),
                    None => shifted,
                }
            }
        };

        if labels.contains(&replacement) {
            debug!(label = replacement.as_str(), "variant would duplicate a case label");
            continue;
        }

        sink.add_mutant_entry(cx.entry(op, node, range, replacement).with_tag(tag));
    }
}
