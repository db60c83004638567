//! Per-function symbol lists derived from the fact base.

use std::collections::BTreeSet;

use crate::ast::{DeclId, NodeId, NodeKind, TranslationUnit};
use crate::source::SourceFile;
use crate::span::TextRange;

/// Symbols of one function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSymbols {
    pub name: String,

    /// Range of the function body.
    pub body: TextRange,

    pub params: Vec<DeclId>,
    pub locals: Vec<DeclId>,

    /// Scalar parameters and locals, ordered by where they are declared.
    pub local_scalars: Vec<DeclId>,

    pub returns: Vec<NodeId>,

    /// Integer and floating literals of the body with a known value.
    pub constants: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    functions: Vec<FunctionSymbols>,
    lvalue_args: BTreeSet<TextRange>,
}

impl SymbolTable {
    pub fn build(tu: &TranslationUnit) -> Self {
        let functions = tu
            .functions
            .iter()
            .map(|f| {
                let mut local_scalars: Vec<DeclId> = f
                    .params
                    .iter()
                    .chain(f.locals.iter())
                    .copied()
                    .filter(|d| tu.decl(*d).ty.is_scalar())
                    .collect();
                local_scalars.sort_by_key(|d| (tu.decl(*d).begin, d.0));
                local_scalars.dedup();

                let constants = tu
                    .subtree(f.body)
                    .into_iter()
                    .filter(|id| {
                        matches!(
                            tu.kind(*id),
                            NodeKind::IntegerLiteral | NodeKind::FloatingLiteral
                        ) && tu.node(*id).constant.is_some()
                    })
                    .collect();

                FunctionSymbols {
                    name: f.name.clone(),
                    body: tu.range(f.body),
                    params: f.params.clone(),
                    locals: f.locals.clone(),
                    local_scalars,
                    returns: f.returns.clone(),
                    constants,
                }
            })
            .collect();

        let lvalue_args = tu
            .nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Call {
                    lvalue_ref_args, ..
                } => Some(lvalue_ref_args),
                _ => None,
            })
            .flatten()
            .map(|arg| tu.range(*arg))
            .collect();

        Self {
            functions,
            lvalue_args,
        }
    }

    /// Symbols of the function whose body contains `node`.
    pub fn function_of(&self, tu: &TranslationUnit, node: NodeId) -> Option<&FunctionSymbols> {
        tu.enclosing_function(node)
            .and_then(|idx| self.functions.get(idx))
    }

    /// True if an argument bound to a non-const lvalue reference covers exactly `range`.
    pub fn is_lvalue_arg(&self, range: TextRange) -> bool {
        self.lvalue_args.contains(&range)
    }
}

/// Declarations referenced anywhere under `node`, including `node` itself.
pub fn collect_decl_refs(tu: &TranslationUnit, node: NodeId) -> BTreeSet<DeclId> {
    tu.subtree(node)
        .into_iter()
        .filter_map(|id| match tu.kind(id) {
            NodeKind::DeclRef { decl, .. } => *decl,
            _ => None,
        })
        .collect()
}

/// Innermost `switch` enclosing `node`.
pub fn enclosing_switch(tu: &TranslationUnit, node: NodeId) -> Option<NodeId> {
    tu.ancestors(node)
        .find(|a| matches!(tu.kind(*a), NodeKind::Switch { .. }))
}

/// Source texts of the `case` values that belong to `switch` (nested switches excluded).
pub fn case_labels(tu: &TranslationUnit, source: &SourceFile, switch: NodeId) -> Vec<String> {
    tu.subtree(switch)
        .into_iter()
        .filter_map(|id| match tu.kind(id) {
            NodeKind::Case { value, .. } if enclosing_switch(tu, id) == Some(switch) => {
                Some(source.slice(tu.range(*value)).to_string())
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{TuBuilder, double_ty, record_ty};

    #[test]
    fn local_scalars_are_sorted_and_filtered() {
        let src = "int f(double d) {\n  S s;\n  int a = 0;\n  return a;\n}\n";
        let mut b = TuBuilder::new(src);
        let d = b.param("d", "double d", double_ty());
        let s = b.var("s", "S s", record_ty("S"));
        let a = b.int_var("a", "int a");

        let a_ref = b.var_ref(a, "a", 1);
        let ret = b.ret(Some(a_ref), "return a", 0);
        let ds_s = b.decl_stmt(&[s], "S s;");
        let ds_a = b.decl_stmt(&[a], "int a = 0;");
        let body = b.block(0, 0, vec![ds_s, ds_a, ret]);
        b.function("f", body, &[d], &[a, s]);
        let (tu, _) = b.finish();

        let table = SymbolTable::build(&tu);
        let f = table.function_of(&tu, a_ref).expect("reference lies inside f");
        assert_eq!(f.name, "f");
        assert_eq!(f.local_scalars, vec![d, a]);
        assert_eq!(f.returns, vec![ret]);
        assert_eq!(collect_decl_refs(&tu, ret), BTreeSet::from([a]));
    }

    #[test]
    fn decl_refs_are_fresh_per_query() {
        let src = "void f() {\n  int a = 1, b = 2;\n  a + b;\n  b;\n}\n";
        let mut b = TuBuilder::new(src);
        let a = b.int_var("a", "a = 1");
        let bv = b.int_var("b", "b = 2");
        let a_ref = b.var_ref(a, "a", 1);
        let b_ref = b.var_ref(bv, "b", 1);
        let sum = b.binary("+", a_ref, b_ref);
        let lone_b = b.var_ref(bv, "b", 2);
        let body = b.block(0, 0, vec![sum, lone_b]);
        b.function("f", body, &[], &[a, bv]);
        let (tu, _) = b.finish();

        let outer = collect_decl_refs(&tu, sum);
        let inner = collect_decl_refs(&tu, lone_b);
        assert_eq!(outer, BTreeSet::from([a, bv]));
        assert_eq!(inner, BTreeSet::from([bv]));
        assert_eq!(collect_decl_refs(&tu, sum), outer);
    }
}
