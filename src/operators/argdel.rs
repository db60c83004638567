//! `ArgDel`: drop one argument from a call.

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target};
use crate::ast::{Callee, CalleeKind, NodeId, NodeKind};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::span::TextRange;

pub static ARGDEL: OperatorSpec = OperatorSpec {
    name: "ArgDel",
    category: OperatorCategory::CallMutation,
    target: Target::Expr,
    summary: "delete one argument of a function call",
    default_domain: &[],
    default_range: &[],
    domain_rule: SymbolRule::Any,
    range_rule: SymbolRule::Any,
    partitioned: false,
    is_target,
    mutate,
};

/// `[call start, closing paren]` inclusive.
fn call_range(cx: &MutationContext<'_>, node: NodeId, rparen: u32) -> TextRange {
    TextRange::new(cx.tu.range(node).start, rparen + 1)
}

fn is_target(_op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    let NodeKind::Call {
        callee: Some(callee),
        args,
        rparen,
        ..
    } = cx.tu.kind(node)
    else {
        return false;
    };

    !callee.is_overloaded_operator()
        && !args.is_empty()
        && cx.in_region(call_range(cx, node, *rparen))
        && !cx.stmt.is_in_enum_decl(node)
}

/// Callee as it has to be spelled in front of the argument list.
fn callee_spelling(
    cx: &MutationContext<'_>,
    callee: &Callee,
    object: Option<NodeId>,
    arrow: bool,
) -> String {
    let name = match &callee.kind {
        CalleeKind::Function => callee.name.clone(),
        CalleeKind::TemplateSpecialization { template_args } if !template_args.is_empty() => {
            let qualified = if callee.qualified_name.is_empty() {
                &callee.name
            } else {
                &callee.qualified_name
            };
            format!("{qualified}<{}>", template_args.join(", "))
        }
        CalleeKind::TemplateSpecialization { .. } => callee.name.clone(),
        CalleeKind::OverloadedOperator { spelling } => format!("operator{spelling}"),
    };

    match object {
        Some(obj) => {
            let access = if arrow { "->" } else { "." };
            format!("{}{access}{name}", cx.text(obj))
        }
        None => name,
    }
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let NodeKind::Call {
        callee: Some(callee),
        args,
        rparen,
        object,
        arrow,
        ..
    } = cx.tu.kind(node)
    else {
        return;
    };

    let head = callee_spelling(cx, callee, *object, *arrow);
    let arg_texts: Vec<&str> = args
        .iter()
        .map(|a| cx.text(cx.tu.ignore_imp_casts(*a)))
        .collect();
    let range = call_range(cx, node, *rparen);

    for dropped in &arg_texts {
        // Arguments are matched by text: identical arguments go away together.
        let kept: Vec<&str> = arg_texts
            .iter()
            .copied()
            .filter(|t| t != dropped)
            .collect();

        let replacement = format!("{head}({})", kept.join(", "));
        sink.add_mutant_entry(cx.entry(op, node, range, replacement));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MutantEntry;
    use crate::testkit::{TuBuilder, callee, int_ty, record_ty, run};

    fn replacements(entries: &[MutantEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.replacement.as_str()).collect()
    }

    #[test]
    fn each_argument_is_dropped_in_turn() {
        let mut b = TuBuilder::new("void g(int x, int y) {\n  foo(x, y);\n}\n");
        let x = b.int_var("x", "int x");
        let y = b.int_var("y", "int y");
        let rx = b.var_ref(x, "x", 1);
        let ry = b.var_ref(y, "y", 1);
        let call = b.call(callee("foo", int_ty()), 0, vec![rx, ry]);
        let body = b.block(0, 0, vec![call]);
        b.function("g", body, &[x, y], &[]);

        let out = run(&ARGDEL, b);
        assert_eq!(replacements(&out), vec!["foo(y)", "foo(x)"]);
        assert!(out.iter().all(|e| e.original == "foo(x, y)"));
    }

    #[test]
    fn identical_arguments_are_dropped_together() {
        let mut b = TuBuilder::new("void g(int x) {\n  max3(x, x, 1);\n}\n");
        let x = b.int_var("x", "int x");
        let r1 = b.var_ref(x, "x", 1);
        let r2 = b.var_ref(x, "x", 2);
        let one = b.int_lit("1", 0);
        let call = b.call(callee("max3", int_ty()), 0, vec![r1, r2, one]);
        let body = b.block(0, 0, vec![call]);
        b.function("g", body, &[x], &[]);

        let out = run(&ARGDEL, b);
        assert_eq!(replacements(&out), vec!["max3(1)", "max3(1)", "max3(x, x)"]);
    }

    #[test]
    fn member_calls_keep_their_object() {
        let mut b = TuBuilder::new("void g(Acc *acc, int v) {\n  acc->add(v, 2);\n}\n");
        let acc = b.var("acc", "Acc *acc", record_ty("Acc"));
        let v = b.int_var("v", "int v");
        let obj = b.var_ref(acc, "acc", 1);
        let rv = b.var_ref(v, "v", 2);
        let two = b.int_lit("2", 0);
        let call = b.member_call(obj, callee("add", int_ty()), vec![rv, two]);
        let body = b.block(0, 0, vec![call]);
        b.function("g", body, &[v], &[acc]);

        let out = run(&ARGDEL, b);
        assert_eq!(replacements(&out), vec!["acc->add(2)", "acc->add(v)"]);
        assert_eq!(out[0].original, "acc->add(v, 2)");
    }

    #[test]
    fn template_callees_keep_their_arguments() {
        let mut b = TuBuilder::new("void g(int v) {\n  conv(v, 3);\n}\n");
        let v = b.int_var("v", "int v");
        // "void" and "conv" come first
        let rv = b.var_ref(v, "v", 3);
        let three = b.int_lit("3", 0);
        let mut templ = callee("conv", int_ty());
        templ.qualified_name = "util::conv".to_string();
        templ.kind = CalleeKind::TemplateSpecialization {
            template_args: vec!["int".to_string(), "long".to_string()],
        };
        let call = b.call(templ, 0, vec![rv, three]);
        let body = b.block(0, 0, vec![call]);
        b.function("g", body, &[v], &[]);

        let out = run(&ARGDEL, b);
        assert_eq!(
            replacements(&out),
            vec!["util::conv<int, long>(3)", "util::conv<int, long>(v)"]
        );
    }

    #[test]
    fn calls_without_arguments_are_ignored() {
        let mut b = TuBuilder::new("void g() {\n  tick();\n}\n");
        let call = b.call(callee("tick", int_ty()), 0, vec![]);
        let body = b.block(0, 0, vec![call]);
        b.function("g", body, &[], &[]);

        assert!(run(&ARGDEL, b).is_empty());
    }
}
