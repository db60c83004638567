//! Builder for hand-written fact bases over a literal source string.
//!
//! Ranges are located by searching for needles in the source, so tests read
//! like the C++ they describe instead of like offset tables.

use std::path::PathBuf;

use crate::ast::{
    BuiltinKind, Callee, CalleeKind, ConstValue, DeclId, Function, Node, NodeId, NodeKind,
    StorageClass, TranslationUnit, Type, TypeClass, VarDecl,
};
use crate::context::MutationRange;
use crate::database::MutantEntry;
use crate::operators::{MutationContext, Operator, OperatorSpec};
use crate::source::SourceFile;
use crate::span::TextRange;
use crate::symbols::SymbolTable;

pub fn builtin_ty(spelling: &str, kind: BuiltinKind) -> Type {
    Type {
        spelling: spelling.to_string(),
        desugared: None,
        class: TypeClass::Builtin { kind },
    }
}

pub fn int_ty() -> Type {
    builtin_ty("int", BuiltinKind::Int)
}

pub fn bool_ty() -> Type {
    builtin_ty("bool", BuiltinKind::Bool)
}

pub fn double_ty() -> Type {
    builtin_ty("double", BuiltinKind::Double)
}

pub fn pointer_ty(pointee: &str) -> Type {
    Type {
        spelling: format!("{pointee} *"),
        desugared: None,
        class: TypeClass::Pointer {
            pointee: pointee.to_string(),
        },
    }
}

pub fn enum_ty(name: &str, scoped: bool) -> Type {
    Type {
        spelling: name.to_string(),
        desugared: None,
        class: TypeClass::Enum { scoped },
    }
}

pub fn record_ty(name: &str) -> Type {
    Type {
        spelling: name.to_string(),
        desugared: None,
        class: TypeClass::Record { is_class: false },
    }
}

pub fn void_ty() -> Type {
    Type {
        spelling: "void".to_string(),
        desugared: None,
        class: TypeClass::Void,
    }
}

pub fn callee(name: &str, return_type: Type) -> Callee {
    Callee {
        name: name.to_string(),
        qualified_name: name.to_string(),
        kind: CalleeKind::Function,
        return_type,
        function_type: String::new(),
    }
}

pub struct TuBuilder {
    src: String,
    tu: TranslationUnit,
    pending_functions: Vec<(String, NodeId, Vec<DeclId>, Vec<DeclId>)>,
}

impl TuBuilder {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
            tu: TranslationUnit {
                file: PathBuf::from("test.cpp"),
                ..TranslationUnit::default()
            },
            pending_functions: Vec::new(),
        }
    }

    /// Range of the `nth` (0-based) occurrence of `needle`.
    pub fn find(&self, needle: &str, nth: usize) -> TextRange {
        let start = self
            .src
            .match_indices(needle)
            .nth(nth)
            .map(|(i, _)| i)
            .unwrap_or_else(|| panic!("occurrence {nth} of {needle:?} not found"));
        TextRange::new(start as u32, (start + needle.len()) as u32)
    }

    fn find_from(&self, needle: &str, from: u32) -> u32 {
        self.src[from as usize..]
            .find(needle)
            .map(|i| from + i as u32)
            .unwrap_or_else(|| panic!("{needle:?} not found after offset {from}"))
    }

    pub fn node(&mut self, kind: NodeKind, range: TextRange, ty: Option<Type>) -> NodeId {
        self.tu.nodes.push(Node {
            kind,
            range,
            ty,
            constant: None,
        });
        NodeId(self.tu.nodes.len() as u32 - 1)
    }

    pub fn set_constant(&mut self, id: NodeId, value: ConstValue) {
        self.tu.nodes[id.0 as usize].constant = Some(value);
    }

    pub fn range_of(&self, id: NodeId) -> TextRange {
        self.tu.nodes[id.0 as usize].range
    }

    pub fn var(&mut self, name: &str, decl_needle: &str, ty: Type) -> DeclId {
        let begin = self.find(decl_needle, 0).start;
        self.tu.decls.push(VarDecl {
            name: name.to_string(),
            ty,
            begin,
            is_const: false,
            storage: StorageClass::None,
            is_param: false,
        });
        DeclId(self.tu.decls.len() as u32 - 1)
    }

    pub fn int_var(&mut self, name: &str, decl_needle: &str) -> DeclId {
        self.var(name, decl_needle, int_ty())
    }

    pub fn param(&mut self, name: &str, decl_needle: &str, ty: Type) -> DeclId {
        let id = self.var(name, decl_needle, ty);
        self.tu.decls[id.0 as usize].is_param = true;
        id
    }

    pub fn set_const(&mut self, decl: DeclId) {
        self.tu.decls[decl.0 as usize].is_const = true;
    }

    pub fn var_ref(&mut self, decl: DeclId, needle: &str, nth: usize) -> NodeId {
        let range = self.find(needle, nth);
        let d = &self.tu.decls[decl.0 as usize];
        let kind = NodeKind::DeclRef {
            name: d.name.clone(),
            decl: Some(decl),
        };
        let ty = Some(d.ty.clone());
        self.node(kind, range, ty)
    }

    pub fn int_lit(&mut self, text: &str, nth: usize) -> NodeId {
        let range = self.find(text, nth);
        let id = self.node(NodeKind::IntegerLiteral, range, Some(int_ty()));
        if let Ok(value) = text.parse() {
            self.set_constant(id, ConstValue::Int { value });
        }
        id
    }

    pub fn float_lit(&mut self, text: &str, nth: usize) -> NodeId {
        let range = self.find(text, nth);
        let id = self.node(NodeKind::FloatingLiteral, range, Some(double_ty()));
        if let Ok(value) = text.parse() {
            self.set_constant(id, ConstValue::Float { value });
        }
        id
    }

    /// Binary operator spanning both operands; relational and logical results are `bool`.
    pub fn binary(&mut self, opcode: &str, lhs: NodeId, rhs: NodeId) -> NodeId {
        let ty = if ["<", ">", "<=", ">=", "==", "!=", "&&", "||"].contains(&opcode) {
            Some(bool_ty())
        } else {
            self.tu.nodes[lhs.0 as usize].ty.clone()
        };
        self.binary_typed(opcode, lhs, rhs, ty)
    }

    pub fn binary_typed(
        &mut self,
        opcode: &str,
        lhs: NodeId,
        rhs: NodeId,
        ty: Option<Type>,
    ) -> NodeId {
        let (l, r) = (self.range_of(lhs), self.range_of(rhs));
        let operator_offset = self.find_from(opcode, l.end);
        let kind = NodeKind::BinaryOperator {
            opcode: opcode.to_string(),
            lhs,
            rhs,
            operator_offset,
        };
        self.node(kind, TextRange::new(l.start, r.end), ty)
    }

    pub fn unary_prefix(&mut self, opcode: &str, operand: NodeId) -> NodeId {
        let r = self.range_of(operand);
        let start = self.src[..r.start as usize]
            .rfind(opcode)
            .unwrap_or_else(|| panic!("prefix {opcode:?} not found")) as u32;
        let ty = self.tu.nodes[operand.0 as usize].ty.clone();
        let kind = NodeKind::UnaryOperator {
            opcode: opcode.to_string(),
            operand,
            postfix: false,
        };
        self.node(kind, TextRange::new(start, r.end), ty)
    }

    pub fn member(&mut self, base: NodeId, member: &str, ty: Type) -> NodeId {
        let b = self.range_of(base);
        let end = self.find_from(member, b.end) + member.len() as u32;
        let arrow = self.src[b.end as usize..].starts_with("->");
        let kind = NodeKind::Member {
            base,
            member: member.to_string(),
            arrow,
        };
        self.node(kind, TextRange::new(b.start, end), Some(ty))
    }

    /// Free-function call whose name is the `nth` occurrence of `name`.
    pub fn call(&mut self, callee: Callee, nth: usize, args: Vec<NodeId>) -> NodeId {
        let start = self.find(&callee.name, nth).start;
        self.finish_call(start, Some(callee), None, args)
    }

    pub fn member_call(&mut self, object: NodeId, callee: Callee, args: Vec<NodeId>) -> NodeId {
        let start = self.range_of(object).start;
        self.finish_call(start, Some(callee), Some(object), args)
    }

    fn finish_call(
        &mut self,
        start: u32,
        callee: Option<Callee>,
        object: Option<NodeId>,
        args: Vec<NodeId>,
    ) -> NodeId {
        let open = self.find_from("(", start);
        let after = args
            .last()
            .map(|a| self.range_of(*a).end)
            .unwrap_or(open);
        let rparen = self.find_from(")", after);
        let ty = callee.as_ref().map(|c| c.return_type.clone());
        let arrow = object.is_some_and(|o| self.src[self.range_of(o).end as usize..].starts_with("->"));
        let kind = NodeKind::Call {
            callee,
            args,
            rparen,
            object,
            arrow,
            lvalue_ref_args: Vec::new(),
        };
        self.node(kind, TextRange::new(start, rparen + 1), ty)
    }

    pub fn mark_lvalue_ref_arg(&mut self, call: NodeId, arg: NodeId) {
        if let NodeKind::Call {
            lvalue_ref_args, ..
        } = &mut self.tu.nodes[call.0 as usize].kind
        {
            lvalue_ref_args.push(arg);
        }
    }

    /// Declaration statement covering `needle` (which should include the `;`).
    pub fn decl_stmt(&mut self, decls: &[DeclId], needle: &str) -> NodeId {
        let range = self.find(needle, 0);
        let kind = NodeKind::DeclStmt {
            decls: decls.to_vec(),
            inits: Vec::new(),
        };
        self.node(kind, range, None)
    }

    /// Return statement covering `needle` (without the `;`).
    pub fn ret(&mut self, value: Option<NodeId>, needle: &str, nth: usize) -> NodeId {
        let range = self.find(needle, nth);
        self.node(NodeKind::Return { value }, range, None)
    }

    pub fn brk(&mut self, nth: usize) -> NodeId {
        let range = self.find("break", nth);
        self.node(NodeKind::Break, range, None)
    }

    /// Block between the `open_nth` `{` and the `close_nth` `}`.
    pub fn block(&mut self, open_nth: usize, close_nth: usize, body: Vec<NodeId>) -> NodeId {
        let lbrace = self.find("{", open_nth).start;
        let rbrace = self.find("}", close_nth).start;
        let kind = NodeKind::Compound {
            body,
            lbrace,
            rbrace,
        };
        self.node(kind, TextRange::new(lbrace, rbrace + 1), None)
    }

    /// Statement starting at the `nth` occurrence of `keyword` and ending where `last` ends.
    pub fn stmt(&mut self, kind: NodeKind, keyword: &str, nth: usize, last: NodeId) -> NodeId {
        let start = self.find(keyword, nth).start;
        let end = self.range_of(last).end;
        self.node(kind, TextRange::new(start, end), None)
    }

    pub fn function(&mut self, name: &str, body: NodeId, params: &[DeclId], locals: &[DeclId]) {
        self.pending_functions
            .push((name.to_string(), body, params.to_vec(), locals.to_vec()));
    }

    pub fn enum_decl(&mut self, needle: &str) {
        let range = self.find(needle, 0);
        self.tu.enum_decls.push(range);
    }

    pub fn array_decl_size(&mut self, needle: &str) {
        let range = self.find(needle, 0);
        self.tu.array_decl_sizes.push(range);
    }

    pub fn deny_scalar_ref(&mut self, name: &str) {
        self.tu.non_mutatable_scalar_refs.push(name.to_string());
    }

    /// Link parents, collect scopes and return statements.
    pub fn finish(mut self) -> (TranslationUnit, SourceFile) {
        self.tu.link().expect("test fact base should link");

        let mut scopes: Vec<TextRange> = self
            .tu
            .nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Compound { .. } | NodeKind::For { .. }))
            .map(|n| n.range)
            .collect();
        scopes.sort();
        self.tu.scopes = scopes;

        for (name, body, params, locals) in std::mem::take(&mut self.pending_functions) {
            let body_range = self.tu.range(body);
            let returns = self
                .tu
                .node_ids()
                .filter(|id| {
                    matches!(self.tu.kind(*id), NodeKind::Return { .. })
                        && self.tu.subtree(body).contains(id)
                })
                .collect();
            self.tu.functions.push(Function {
                name,
                range: body_range,
                body,
                params,
                locals,
                returns,
            });
        }

        let source = SourceFile::from_text(
            PathBuf::from("test.cpp"),
            PathBuf::from("test.cpp"),
            self.src,
        );
        (self.tu, source)
    }
}

/// Run `op` over every node of the fact base, the way the generator does.
pub fn mutate_all(op: &Operator, tu: &TranslationUnit, source: &SourceFile) -> Vec<MutantEntry> {
    let symbols = SymbolTable::build(tu);
    let mut cx = MutationContext::new(tu, source, &symbols, MutationRange::whole_file());

    let mut out = Vec::new();
    for node in tu.preorder() {
        if op.visits(tu.kind(node)) && op.is_mutation_target(node, &mut cx) {
            op.mutate(node, &cx, &mut out);
        }
    }
    out
}

/// Finish `b` and run the operator described by `spec` with its defaults.
pub fn run(spec: &'static OperatorSpec, b: TuBuilder) -> Vec<MutantEntry> {
    let (tu, source) = b.finish();
    mutate_all(&Operator::new(spec), &tu, &source)
}
