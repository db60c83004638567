//! `SMVB`: move the closing brace of a block one statement up or down.
//!
//! Moving up pushes the block's last statement out of the block. Moving down
//! pulls the statement that follows the block's owner into the block.

use tracing::trace;

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target};
use crate::ast::{NodeId, NodeKind};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::span::TextRange;
use crate::symbols::collect_decl_refs;

pub static SMVB: OperatorSpec = OperatorSpec {
    name: "SMVB",
    category: OperatorCategory::StatementMutation,
    target: Target::Stmt,
    summary: "move the end of a block one statement up or down",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Any,
    range_rule: SymbolRule::Any,
    partitioned: false,
    is_target,
    mutate,
};

/// String materialization; the temporary does not survive being moved.
const STR_CALL: &str = ".str()";

fn is_target(_op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    let NodeKind::Compound { lbrace, rbrace, .. } = cx.tu.kind(node) else {
        return false;
    };
    let Some(parent) = cx.tu.parent(node) else {
        return false;
    };

    match cx.tu.kind(parent) {
        NodeKind::StmtExpr { .. } | NodeKind::Try { .. } => return false,
        NodeKind::If {
            then,
            else_branch: Some(_),
            ..
        } if *then == node => return false,
        _ => {}
    }

    cx.in_region(TextRange::new(*lbrace, rbrace + 1))
}

/// Statement text as it has to appear when re-emitted on its own. Statement
/// ranges may stop short of their `;`, so the terminator is taken from the
/// source when it follows the range.
fn terminated(cx: &MutationContext<'_>, stmt: NodeId) -> String {
    let text = cx.text(stmt);
    let end = cx.tu.range(stmt).end;

    if text.ends_with(';') {
        text.to_string()
    } else if cx.source.end_after_semicolon(end) > end || !text.ends_with('}') {
        format!("{text};")
    } else {
        text.to_string()
    }
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let NodeKind::Compound {
        body,
        lbrace,
        rbrace,
    } = cx.tu.kind(node)
    else {
        return;
    };
    let Some(parent) = cx.tu.parent(node) else {
        return;
    };

    let block = TextRange::new(*lbrace, rbrace + 1);

    if let Some(replacement) = brace_up(cx, node, parent, body, *lbrace) {
        let entry = cx.entry(op, node, block, replacement).with_tag("UP");
        sink.add_mutant_entry(entry);
    }

    if let Some((range, replacement)) = brace_down(cx, node, parent, block) {
        let entry = cx.entry(op, node, range, replacement).with_tag("DOWN");
        sink.add_mutant_entry(entry);
    }
}

fn brace_up(
    cx: &MutationContext<'_>,
    node: NodeId,
    parent: NodeId,
    body: &[NodeId],
    lbrace: u32,
) -> Option<String> {
    let (&last, kept) = body.split_last()?;

    if matches!(
        cx.tu.kind(last),
        NodeKind::Case { .. } | NodeKind::Default { .. } | NodeKind::Label { .. } | NodeKind::Break
    ) {
        trace!("last statement cannot leave its block");
        return None;
    }
    if cx.text(last).contains(STR_CALL) {
        return None;
    }

    let refs = collect_decl_refs(cx.tu, last);
    let last_range = cx.tu.range(last);

    // Locals declared inside the block go out of scope for the moved statement.
    if let Some(func) = cx.symbols.function_of(cx.tu, node) {
        let dangling = refs.iter().any(|d| {
            let begin = cx.tu.decl(*d).begin;
            func.locals.contains(d) && begin > lbrace && !last_range.contains_offset(begin)
        });
        if dangling {
            trace!("moved statement would lose a declaration");
            return None;
        }
    }

    if let NodeKind::For {
        init: Some(init), ..
    } = cx.tu.kind(parent)
    {
        if let NodeKind::DeclStmt { decls, .. } = cx.tu.kind(*init) {
            if decls.iter().any(|d| refs.contains(d)) {
                trace!("moved statement uses the loop variable");
                return None;
            }
        }
    }

    let mut text = String::from("{\n");
    for stmt in kept {
        text.push_str(&terminated(cx, *stmt));
        text.push('\n');
    }
    text.push_str("}\n");
    text.push_str(&terminated(cx, last));
    text.push('\n');
    Some(text)
}

fn brace_down(
    cx: &MutationContext<'_>,
    node: NodeId,
    parent: NodeId,
    block: TextRange,
) -> Option<(TextRange, String)> {
    // The block must close its owner, otherwise a `do ... while` tail or a
    // following sibling block sits between the brace and the next statement.
    if cx.tu.range(parent).end != block.end {
        return None;
    }

    let grandparent = cx.tu.parent(parent)?;
    let NodeKind::Compound { body: siblings, .. } = cx.tu.kind(grandparent) else {
        return None;
    };

    let position = siblings.iter().position(|s| *s == parent)?;
    let next = *siblings.get(position + 1)?;

    if cx.tu.kind(next).is_switch_case() && matches!(cx.tu.kind(parent), NodeKind::Case { .. }) {
        trace!("absorbing the next case label would merge switch arms");
        return None;
    }

    let text = cx.text(node);
    let open = text.rfind('}').map_or(text, |idx| &text[..idx]);

    let mut replacement = open.to_string();
    replacement.push_str(&terminated(cx, next));
    replacement.push_str("\n}\n");

    let end = cx.source.end_after_semicolon(cx.tu.range(next).end);
    Some((TextRange::new(block.start, end), replacement))
}
