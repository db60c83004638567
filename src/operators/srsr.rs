//! `SRSR`: replace a statement with one of the function's return statements.

use tracing::trace;

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target};
use crate::ast::{NodeId, NodeKind};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::span::TextRange;
use crate::symbols::collect_decl_refs;

pub static SRSR: OperatorSpec = OperatorSpec {
    name: "SRSR",
    category: OperatorCategory::StatementMutation,
    target: Target::Stmt,
    summary: "replace a statement by a return statement of the same function",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Any,
    range_rule: SymbolRule::Any,
    partitioned: false,
    is_target,
    mutate,
};

const STR_CALL: &str = ".str()";

/// Statement plus its terminating `;`, if any.
fn statement_range(cx: &MutationContext<'_>, stmt: NodeId) -> TextRange {
    let range = cx.tu.range(stmt);
    TextRange::new(range.start, cx.source.end_after_semicolon(range.end))
}

fn is_target(_op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    if matches!(
        cx.tu.kind(node),
        NodeKind::DeclStmt { .. } | NodeKind::Null
    ) {
        return false;
    }

    let in_block = cx
        .tu
        .parent(node)
        .is_some_and(|p| matches!(cx.tu.kind(p), NodeKind::Compound { .. }));

    in_block && cx.in_region(statement_range(cx, node))
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let Some(func) = cx.symbols.function_of(cx.tu, node) else {
        return;
    };

    let range = statement_range(cx, node);
    let own_text = cx.text(node);
    let start = cx.tu.range(node).start;

    if let Some(&ret) = func
        .returns
        .iter()
        .find(|r| cx.text(**r).contains(STR_CALL))
    {
        trace!(ret = cx.text(ret), "string materialization in return value");
        return;
    }

    for &ret in &func.returns {
        let text = cx.text(ret);
        if text == own_text {
            continue;
        }

        let NodeKind::Return { value } = cx.tu.kind(ret) else {
            continue;
        };

        // Locals declared after this statement are not in scope here.
        let dangling = value.is_some_and(|v| {
            collect_decl_refs(cx.tu, cx.tu.ignore_imp_casts(v))
                .iter()
                .any(|d| func.locals.contains(d) && cx.tu.decl(*d).begin > start)
        });
        if dangling {
            trace!(ret = text, "return value uses a later declaration");
            continue;
        }

        sink.add_mutant_entry(cx.entry(op, node, range, format!("{text};")));
    }
}
