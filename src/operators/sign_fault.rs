//! `VDTR`: kill the process when a scalar reference is negative, zero or positive.
//!
//! Every record needs `kill` and `getpid`, so each one carries the same
//! header insertion at the start of the file. Applying a mutant de-duplicates
//! identical insertions.

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target, scalar_ref};
use crate::ast::{BuiltinKind, NodeId};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;

pub const SIGNAL_HEADERS: &str = "#include <sys/types.h>\n#include <signal.h>\n#include <unistd.h>\n";

const TRAP: &str = "kill(getpid(), 9)";

pub static VDTR: OperatorSpec = OperatorSpec {
    name: "VDTR",
    category: OperatorCategory::Twiddle,
    target: Target::Expr,
    summary: "terminate the process when a scalar is negative, zero or positive",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Identifiers,
    range_rule: SymbolRule::Any,
    partitioned: false,
    is_target,
    mutate,
};

fn is_target(op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    if scalar_ref(cx.tu, node).is_none() {
        return false;
    }

    let range = cx.tu.range(node);

    !cx.symbols.is_lvalue_arg(range)
        && cx.in_region(range)
        && !cx.stmt.is_in_enum_decl(node)
        && !cx.stmt.is_in_array_decl_size(node)
        && !cx.stmt.is_in_lhs_of_assignment(node)
        && !cx.stmt.is_in_unary_inc_dec(node)
        && !cx.stmt.is_in_address_op(node)
        && !cx.stmt.is_in_switch_case(node)
        && cx.stmt.is_in_currently_parsed_function(node)
        && op.in_domain(cx.text(node))
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let range = cx.tu.range(node);
    let text = cx.text(node);
    let ty = cx.tu.ty(node);

    let tested = if ty.is_some_and(|t| t.is_enum_class()) {
        format!("static_cast<int>({text})")
    } else {
        text.to_string()
    };

    let trap = match ty.filter(|t| {
        t.is_enum() || t.is_enum_class() || t.builtin_kind().is_some_and(|k| k != BuiltinKind::Int)
    }) {
        Some(t) => format!("static_cast<{}>({TRAP})", t.cast_spelling()),
        None => TRAP.to_string(),
    };

    for (tag, comparison) in [("NEG", "< 0"), ("ZERO", "== 0"), ("POS", "> 0")] {
        let replacement = format!("(({tested}) {comparison} ? {trap} : ({text}))");
        let entry = cx
            .entry(op, node, range, replacement)
            .with_tag(tag)
            .with_extra_edit(cx.insertion(0, SIGNAL_HEADERS));
        sink.add_mutant_entry(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{TuBuilder, enum_ty, int_ty, run};

    fn single_ref(ty: crate::ast::Type) -> TuBuilder {
        let mut b = TuBuilder::new("int f(T n) {\n  return n;\n}\n");
        let n = b.param("n", "T n", ty);
        // "int", "T n" and "return" come first
        let rn = b.var_ref(n, "n", 3);
        let ret = b.ret(Some(rn), "return n", 0);
        let body = b.block(0, 0, vec![ret]);
        b.function("f", body, &[n], &[]);
        b
    }

    #[test]
    fn three_guarded_records_with_one_header_edit_each() {
        let out = run(&VDTR, single_ref(int_ty()));

        let tags: Vec<_> = out.iter().filter_map(|e| e.tag.as_deref()).collect();
        assert_eq!(tags, vec!["NEG", "ZERO", "POS"]);
        assert_eq!(out[0].replacement, "((n) < 0 ? kill(getpid(), 9) : (n))");
        assert_eq!(out[2].replacement, "((n) > 0 ? kill(getpid(), 9) : (n))");

        for entry in &out {
            assert_eq!(entry.extra_edits.len(), 1);
            assert_eq!(entry.extra_edits[0].span.start, 0);
            assert_eq!(entry.extra_edits[0].span.end, 0);
            assert_eq!(entry.extra_edits[0].replacement, SIGNAL_HEADERS);
        }
    }

    #[test]
    fn enum_class_is_compared_as_int_and_trap_cast_back() {
        let out = run(&VDTR, single_ref(enum_ty("Mode", true)));
        assert_eq!(
            out[1].replacement,
            "((static_cast<int>(n)) == 0 ? static_cast<Mode>(kill(getpid(), 9)) : (n))"
        );
    }

    #[test]
    fn assignment_targets_are_skipped() {
        let mut b = TuBuilder::new("void f(int n) {\n  n = 1;\n}\n");
        let n = b.int_var("n", "int n");
        let rn = b.var_ref(n, "n", 2);
        let one = b.int_lit("1", 0);
        let assign = b.binary("=", rn, one);
        let body = b.block(0, 0, vec![assign]);
        b.function("f", body, &[n], &[]);

        assert!(run(&VDTR, b).is_empty());
    }
}
