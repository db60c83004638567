//! `FunCalDel`: delete a call, or replace its value with a constant.

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target};
use crate::ast::{BuiltinKind, NodeId, NodeKind};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::span::TextRange;

pub static FUNCALDEL: OperatorSpec = OperatorSpec {
    name: "FunCalDel",
    category: OperatorCategory::CallMutation,
    target: Target::Expr,
    summary: "remove a call statement or replace a call value with a constant",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Any,
    range_rule: SymbolRule::Any,
    partitioned: false,
    is_target,
    mutate,
};

fn is_target(_op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    let NodeKind::Call {
        callee: Some(callee),
        rparen,
        ..
    } = cx.tu.kind(node)
    else {
        return false;
    };

    // Stream insertions return the stream itself; dropping them only breaks chaining.
    if callee.return_type.is_void() || callee.function_type.contains("basic_ostream") {
        return false;
    }

    let range = TextRange::new(cx.tu.range(node).start, rparen + 1);
    cx.in_region(range)
        && !cx.stmt.is_in_enum_decl(node)
        && !cx.tu.ty(node).is_some_and(|t| t.is_record())
}

/// Largest and smallest value of an arithmetic builtin, as C++ literals.
pub fn extreme_literals(kind: BuiltinKind) -> Option<(&'static str, &'static str)> {
    use BuiltinKind::*;

    let pair = match kind {
        Bool => ("true", "false"),
        Char | SChar => ("127", "-128"),
        UChar => ("255", "0"),
        Short => ("32767", "-32768"),
        UShort => ("65535", "0"),
        Int => ("2147483647", "(-2147483647 - 1)"),
        UInt => ("4294967295U", "0U"),
        Long => ("9223372036854775807L", "(-9223372036854775807L - 1)"),
        ULong => ("18446744073709551615UL", "0UL"),
        LongLong => ("9223372036854775807LL", "(-9223372036854775807LL - 1)"),
        ULongLong => ("18446744073709551615ULL", "0ULL"),
        Float => ("3.40282347e+38F", "-3.40282347e+38F"),
        Double => ("1.7976931348623157e+308", "-1.7976931348623157e+308"),
        LongDouble => (
            "1.18973149535723176502e+4932L",
            "-1.18973149535723176502e+4932L",
        ),
        WChar | Other => return None,
    };
    Some(pair)
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let NodeKind::Call {
        callee: Some(callee),
        rparen,
        ..
    } = cx.tu.kind(node)
    else {
        return;
    };

    let range = TextRange::new(cx.tu.range(node).start, rparen + 1);

    // A call used as a statement is simply removed.
    if cx
        .tu
        .parent(node)
        .is_some_and(|p| matches!(cx.tu.kind(p), NodeKind::Compound { .. }))
    {
        sink.add_mutant_entry(cx.entry(op, node, range, ""));
        return;
    }

    let ty = cx.tu.ty(node).unwrap_or(&callee.return_type);
    let kind = ty.builtin_kind();

    let basics: [&str; 3] = if ty.is_floating() {
        ["1.0", "-1.0", "0.0"]
    } else {
        ["1", "-1", "0"]
    };

    let extremes = kind.and_then(extreme_literals);
    let replacements = basics
        .into_iter()
        .chain(extremes.into_iter().flat_map(|(max, min)| [max, min]));

    for replacement in replacements {
        sink.add_mutant_entry(cx.entry(op, node, range, replacement));
    }
}
