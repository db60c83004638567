//! Binary operator class rewrites (`OAAN`, `ORLN`, `OLSN`, ...).
//!
//! All eight operators share one applicability test and one mutation
//! function; they differ only in the symbol sets in their descriptors.

use tracing::{debug, trace};

use super::{MutationContext, Operator, OperatorSpec, SymbolRule, Target};
use crate::ast::{NodeId, NodeKind, Type};
use crate::database::MutantSink;
use crate::mutant::OperatorCategory;
use crate::span::TextRange;

pub const ARITHMETIC: &[&str] = &["+", "-", "*", "/", "%"];
pub const RELATIONAL: &[&str] = &["<", ">", "<=", ">=", "==", "!="];
pub const LOGICAL: &[&str] = &["&&", "||"];
pub const SHIFT: &[&str] = &["<<", ">>"];

const fn rewrite(
    name: &'static str,
    summary: &'static str,
    domain: &'static [&'static str],
    range: &'static [&'static str],
) -> OperatorSpec {
    OperatorSpec {
        name,
        category: OperatorCategory::OperatorReplacement,
        target: Target::Expr,
        summary,
        default_domain: domain,
        default_range: range,
        domain_rule: SymbolRule::Symbols(domain),
        range_rule: SymbolRule::Symbols(range),
        partitioned: false,
        is_target,
        mutate,
    }
}

pub static OAAN: OperatorSpec = rewrite(
    "OAAN",
    "arithmetic operator to arithmetic operator",
    ARITHMETIC,
    ARITHMETIC,
);
pub static OARN: OperatorSpec = rewrite(
    "OARN",
    "arithmetic operator to relational operator",
    ARITHMETIC,
    RELATIONAL,
);
pub static OALN: OperatorSpec = rewrite(
    "OALN",
    "arithmetic operator to logical operator",
    ARITHMETIC,
    LOGICAL,
);
pub static ORAN: OperatorSpec = rewrite(
    "ORAN",
    "relational operator to arithmetic operator",
    RELATIONAL,
    ARITHMETIC,
);
pub static ORLN: OperatorSpec = rewrite(
    "ORLN",
    "relational operator to logical operator",
    RELATIONAL,
    LOGICAL,
);
pub static OLAN: OperatorSpec = rewrite(
    "OLAN",
    "logical operator to arithmetic operator",
    LOGICAL,
    ARITHMETIC,
);
pub static OLRN: OperatorSpec = rewrite(
    "OLRN",
    "logical operator to relational operator",
    LOGICAL,
    RELATIONAL,
);
pub static OLSN: OperatorSpec = rewrite(
    "OLSN",
    "logical operator to shift operator",
    LOGICAL,
    SHIFT,
);

/// Range of the operator token itself.
fn token_range(opcode: &str, operator_offset: u32) -> TextRange {
    TextRange::new(operator_offset, operator_offset + opcode.len() as u32)
}

fn is_target(op: &Operator, node: NodeId, cx: &mut MutationContext<'_>) -> bool {
    let NodeKind::BinaryOperator {
        opcode,
        operator_offset,
        ..
    } = cx.tu.kind(node)
    else {
        return false;
    };

    cx.in_region(token_range(opcode, *operator_offset))
        && !cx.stmt.is_in_array_decl_size(node)
        && !cx.stmt.is_in_enum_decl(node)
        && !cx.stmt.is_in_typedef(node)
        && op.domain().contains(opcode.as_str())
}

/// Operands that must be converted before the replacement can apply to them.
fn needs_conversion(ty: Option<&Type>) -> bool {
    ty.is_some_and(|t| t.is_enum_class() || t.is_dependent())
}

/// Conversion target for an enum class or dependent operand under `replacement`.
fn conversion_for(replacement: &str) -> Option<&'static str> {
    if LOGICAL.contains(&replacement) {
        Some("bool")
    } else if replacement == "==" || replacement == "!=" {
        None
    } else {
        Some("int")
    }
}

/// Integral once converted (enum class and dependent operands get `static_cast<int>`).
fn integral_operand(ty: Option<&Type>) -> bool {
    ty.is_some_and(|t| t.is_integral()) || needs_conversion(ty)
}

fn scalar_operand(ty: Option<&Type>) -> bool {
    ty.is_some_and(|t| t.is_scalar()) || needs_conversion(ty)
}

fn pointer_like(ty: Option<&Type>) -> Option<&str> {
    ty.filter(|t| t.is_pointer() || t.is_array())
        .and_then(Type::pointee)
}

/// Whether `lhs <replacement> rhs` is well-typed for the given operand types.
pub fn operands_accept(replacement: &str, lhs: Option<&Type>, rhs: Option<&Type>) -> bool {
    match replacement {
        "*" | "/" => scalar_operand(lhs) && scalar_operand(rhs),
        "%" | "<<" | ">>" => integral_operand(lhs) && integral_operand(rhs),
        "+" | "-" => match (pointer_like(lhs), pointer_like(rhs)) {
            (Some(l), Some(r)) => l == r && replacement == "-",
            (Some(_), None) => integral_operand(rhs),
            (None, Some(_)) => integral_operand(lhs) && replacement == "+",
            (None, None) => true,
        },
        _ => true,
    }
}

fn mutate(op: &Operator, node: NodeId, cx: &MutationContext<'_>, sink: &mut dyn MutantSink) {
    let NodeKind::BinaryOperator {
        opcode,
        lhs,
        rhs,
        operator_offset,
    } = cx.tu.kind(node)
    else {
        return;
    };

    let lhs = cx.tu.ignore_imp_casts(*lhs);
    let rhs = cx.tu.ignore_imp_casts(*rhs);
    let (lhs_ty, rhs_ty) = (cx.tu.ty(lhs), cx.tu.ty(rhs));

    if lhs_ty.is_some_and(Type::is_iterator) || rhs_ty.is_some_and(Type::is_iterator) {
        debug!(operator = op.name(), "iterator operand, skipping");
        return;
    }

    let token = token_range(opcode, *operator_offset);

    for replacement in op.range().iter().filter(|r| *r != opcode) {
        if !operands_accept(replacement, lhs_ty, rhs_ty) {
            trace!(
                operator = op.name(),
                from = opcode.as_str(),
                to = replacement.as_str(),
                "operand types reject replacement"
            );
            continue;
        }

        let left = wrapped_operand(cx, lhs, replacement);
        let right = wrapped_operand(cx, rhs, replacement);

        let mut range = token;
        let mut text = String::new();

        if let Some(l) = &left {
            range.start = cx.tu.range(lhs).start;
            text.push_str(l);
            text.push_str(cx.source.slice(TextRange::new(cx.tu.range(lhs).end, token.start)));
        }

        text.push_str(replacement);

        if let Some(r) = &right {
            range.end = cx.tu.range(rhs).end;
            text.push_str(cx.source.slice(TextRange::new(token.end, cx.tu.range(rhs).start)));
            text.push_str(r);
        }

        let entry = cx
            .entry(op, node, range, text)
            .with_tag(format!("{opcode}{replacement}"));
        sink.add_mutant_entry(entry);
    }
}

/// Operand text when it has to be rewritten, `None` when it stays untouched.
fn wrapped_operand(cx: &MutationContext<'_>, operand: NodeId, replacement: &str) -> Option<String> {
    let text = cx.text(operand);

    if needs_conversion(cx.tu.ty(operand)) {
        if let Some(target) = conversion_for(replacement) {
            return Some(format!("static_cast<{target}>({text})"));
        }
    }

    match cx.tu.kind(operand) {
        NodeKind::BinaryOperator { .. } | NodeKind::OperatorCall { .. } => Some(format!("({text})")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeClass;
    use crate::database::MutantEntry;
    use crate::testkit::{TuBuilder, double_ty, enum_ty, int_ty, pointer_ty, run};

    fn replacements(entries: &[MutantEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.replacement.as_str()).collect()
    }

    #[test]
    fn equality_becomes_each_logical_operator() {
        let mut b = TuBuilder::new("void f(int a, int b) {\n  a == b;\n}\n");
        let a = b.int_var("a", "int a");
        let bv = b.int_var("b", "int b");
        let ra = b.var_ref(a, "a", 1);
        let rb = b.var_ref(bv, "b", 1);
        let eq = b.binary("==", ra, rb);
        let body = b.block(0, 0, vec![eq]);
        b.function("f", body, &[a, bv], &[]);

        let out = run(&ORLN, b);
        assert_eq!(replacements(&out), vec!["&&", "||"]);
        assert!(out.iter().all(|e| e.original == "=="));
        assert_eq!(out[0].tag.as_deref(), Some("==&&"));
        assert_eq!(out[0].line, 2);
    }

    #[test]
    fn pointer_plus_integer_only_keeps_additive_replacements() {
        let mut b = TuBuilder::new("void f(int *ptr) {\n  ptr + 5;\n}\n");
        let ptr = b.param("ptr", "int *ptr", pointer_ty("int"));
        let rp = b.var_ref(ptr, "ptr", 1);
        let five = b.int_lit("5", 0);
        let sum = b.binary("+", rp, five);
        let body = b.block(0, 0, vec![sum]);
        b.function("f", body, &[ptr], &[]);

        let out = run(&OAAN, b);
        assert_eq!(replacements(&out), vec!["-"]);
        assert_eq!(out[0].original, "+");
    }

    #[test]
    fn floating_operands_drop_the_remainder() {
        let mut b = TuBuilder::new("void f(double x) {\n  x * 2.5;\n}\n");
        let x = b.param("x", "double x", double_ty());
        let rx = b.var_ref(x, "x", 1);
        let k = b.float_lit("2.5", 0);
        let product = b.binary("*", rx, k);
        let body = b.block(0, 0, vec![product]);
        b.function("f", body, &[x], &[]);

        assert_eq!(replacements(&run(&OAAN, b)), vec!["+", "-", "/"]);
    }

    #[test]
    fn declaration_regions_are_not_mutated() {
        let mut b = TuBuilder::new("enum E { A = 1 + 2 };\nint buf[3 * 4];\nint k = 5 - 6;\n");
        b.enum_decl("{ A = 1 + 2 }");
        b.array_decl_size("3 * 4");

        for (op, l, r) in [("+", "1", "2"), ("*", "3", "4"), ("-", "5", "6")] {
            let lhs = b.int_lit(l, 0);
            let rhs = b.int_lit(r, 0);
            b.binary(op, lhs, rhs);
        }

        let out = run(&OAAN, b);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|e| e.original == "-"));
    }

    #[test]
    fn pointer_difference_requires_matching_pointee() {
        let int_ptr = pointer_ty("int");
        let char_ptr = pointer_ty("char");
        assert!(operands_accept("-", Some(&int_ptr), Some(&int_ptr)));
        assert!(!operands_accept("+", Some(&int_ptr), Some(&int_ptr)));
        assert!(!operands_accept("-", Some(&int_ptr), Some(&char_ptr)));
        assert!(!operands_accept("*", Some(&int_ptr), Some(&int_ty())));
        assert!(operands_accept("+", Some(&int_ty()), Some(&int_ptr)));
        assert!(!operands_accept("-", Some(&int_ty()), Some(&int_ptr)));
        assert!(!operands_accept("%", Some(&double_ty()), Some(&int_ty())));
    }

    #[test]
    fn nested_operands_are_parenthesized_and_widen_the_span() {
        let mut b = TuBuilder::new("int f(int a, int b) {\n  return a + b < b;\n}\n");
        let a = b.int_var("a", "int a");
        let bv = b.int_var("b", "int b");
        let ra = b.var_ref(a, "a", 1);
        let rb = b.var_ref(bv, "b", 1);
        let sum = b.binary("+", ra, rb);
        let rb2 = b.var_ref(bv, "b", 2);
        let lt = b.binary("<", sum, rb2);
        let ret = b.ret(Some(lt), "return a + b < b", 0);
        let body = b.block(0, 0, vec![ret]);
        b.function("f", body, &[a, bv], &[]);

        let out = run(&ORLN, b);
        assert_eq!(replacements(&out), vec!["(a + b) &&", "(a + b) ||"]);
        assert!(out.iter().all(|e| e.original == "a + b <"));
    }

    #[test]
    fn enum_class_operands_are_converted_except_for_equality() {
        let mut b = TuBuilder::new("bool f(Color c, Color d) {\n  return c < d;\n}\n");
        let color = enum_ty("Color", true);
        let c = b.param("c", "Color c", color.clone());
        let d = b.param("d", "Color d", color);
        let rc = b.var_ref(c, "c", 1);
        let rd = b.var_ref(d, "d", 1);
        let lt = b.binary("<", rc, rd);
        let ret = b.ret(Some(lt), "return c < d", 0);
        let body = b.block(0, 0, vec![ret]);
        b.function("f", body, &[c, d], &[]);

        let out = run(&ORAN, b);
        let texts = replacements(&out);
        assert!(texts.contains(&"static_cast<int>(c) + static_cast<int>(d)"));
        assert!(texts.contains(&"static_cast<int>(c) % static_cast<int>(d)"));
        assert_eq!(out[0].original, "c < d");
    }

    #[test]
    fn iterator_operands_are_never_rewritten() {
        let iter = Type {
            spelling: "std::vector<int>::iterator".to_string(),
            desugared: None,
            class: TypeClass::Record { is_class: true },
        };
        let mut b = TuBuilder::new("void f(It i, It j) {\n  i == j;\n}\n");
        let i = b.param("i", "It i", iter.clone());
        let j = b.param("j", "It j", iter);
        let ri = b.var_ref(i, "i", 2);
        let rj = b.var_ref(j, "j", 1);
        let eq = b.binary("==", ri, rj);
        let body = b.block(0, 0, vec![eq]);
        b.function("f", body, &[i, j], &[]);

        assert!(run(&ORLN, b).is_empty());
    }
}
