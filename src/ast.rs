//! Read-only fact base describing one translation unit.
//!
//! The host front end dumps its AST as JSON; this module models that dump as
//! an arena of nodes addressed by [`NodeId`] with a closed set of node kinds.
//! Parent links are derived on load.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::span::TextRange;

/// Index of a node in [`TranslationUnit::nodes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Index of a variable declaration in [`TranslationUnit::decls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub u32);

/// Errors detected while loading a fact file.
#[derive(Debug, Error)]
pub enum FactError {
    #[error("malformed fact file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {referrer} refers to missing node {target}")]
    DanglingNode { referrer: u32, target: u32 },

    #[error("{referrer} refers to missing declaration {target}")]
    DanglingDecl { referrer: String, target: u32 },

    #[error("node {node} has more than one parent")]
    MultipleParents { node: u32 },

    #[error("{what} offset {offset} is outside the {len}-byte source or splits a character")]
    OutOfSource { what: String, offset: u32, len: u32 },

    #[error("{what} range [{start}, {end}) is inverted")]
    InvertedRange { what: String, start: u32, end: u32 },
}

/// Builtin arithmetic types the host compiler distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinKind {
    Bool,
    Char,
    SChar,
    UChar,
    WChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    Other,
}

impl BuiltinKind {
    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            Self::Float | Self::Double | Self::LongDouble | Self::Other
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double | Self::LongDouble)
    }
}

/// Canonical shape of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypeClass {
    Builtin { kind: BuiltinKind },
    Pointer { pointee: String },
    Array { element: String },
    Enum { scoped: bool },
    Record { is_class: bool },
    Dependent,
    Void,
    Other,
}

/// Static type of an expression or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Type as spelled in the source (may be a typedef name).
    pub spelling: String,

    /// Fully desugared spelling, when it differs from `spelling`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desugared: Option<String>,

    pub class: TypeClass,
}

impl Type {
    pub fn builtin_kind(&self) -> Option<BuiltinKind> {
        match self.class {
            TypeClass::Builtin { kind } => Some(kind),
            _ => None,
        }
    }

    /// Integer types, including `bool`, character types and unscoped enums.
    pub fn is_integral(&self) -> bool {
        match &self.class {
            TypeClass::Builtin { kind } => kind.is_integral(),
            TypeClass::Enum { scoped } => !scoped,
            _ => false,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.builtin_kind().is_some_and(BuiltinKind::is_floating)
    }

    /// Integral or floating.
    pub fn is_scalar(&self) -> bool {
        self.is_integral() || self.is_floating()
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.class, TypeClass::Pointer { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.class, TypeClass::Array { .. })
    }

    /// Pointee of a pointer or element of an array.
    pub fn pointee(&self) -> Option<&str> {
        match &self.class {
            TypeClass::Pointer { pointee } => Some(pointee),
            TypeClass::Array { element } => Some(element),
            _ => None,
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.class, TypeClass::Enum { scoped: false })
    }

    pub fn is_enum_class(&self) -> bool {
        matches!(self.class, TypeClass::Enum { scoped: true })
    }

    pub fn is_dependent(&self) -> bool {
        matches!(self.class, TypeClass::Dependent)
    }

    pub fn is_record(&self) -> bool {
        matches!(self.class, TypeClass::Record { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self.class, TypeClass::Void)
    }

    /// Iterator-like types are matched on their spelling, case-insensitively.
    pub fn is_iterator(&self) -> bool {
        self.spelling.to_lowercase().contains("iterator")
    }

    /// Spelling usable inside a `static_cast<...>`.
    pub fn cast_spelling(&self) -> String {
        let raw = self.desugared.as_deref().unwrap_or(&self.spelling);
        raw.replace("_Bool", "bool")
    }
}

/// Value of a constant-foldable expression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConstValue {
    Int { value: i64 },
    Float { value: f64 },
}

/// How the callee of a call expression is spelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalleeKind {
    #[default]
    Function,
    TemplateSpecialization {
        template_args: Vec<String>,
    },
    OverloadedOperator {
        spelling: String,
    },
}

/// Directly resolved callee of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callee {
    pub name: String,

    #[serde(default)]
    pub qualified_name: String,

    #[serde(default)]
    pub kind: CalleeKind,

    pub return_type: Type,

    /// Spelling of the function type, e.g. `int (int, char)`.
    #[serde(default)]
    pub function_type: String,
}

impl Callee {
    pub fn is_overloaded_operator(&self) -> bool {
        matches!(self.kind, CalleeKind::OverloadedOperator { .. })
    }
}

/// Closed set of node kinds the operators look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    BinaryOperator {
        opcode: String,
        lhs: NodeId,
        rhs: NodeId,
        /// Offset of the operator token.
        operator_offset: u32,
    },
    UnaryOperator {
        opcode: String,
        operand: NodeId,
        #[serde(default)]
        postfix: bool,
    },
    /// Call to an overloaded operator written with operator syntax (`a + b`).
    OperatorCall {
        operator: String,
        args: Vec<NodeId>,
    },
    Call {
        callee: Option<Callee>,
        args: Vec<NodeId>,
        /// Offset of the closing parenthesis.
        rparen: u32,
        /// Implicit object of a member call.
        #[serde(default)]
        object: Option<NodeId>,
        #[serde(default)]
        arrow: bool,
        /// Arguments bound to non-const lvalue reference parameters.
        #[serde(default)]
        lvalue_ref_args: Vec<NodeId>,
    },
    DeclRef {
        name: String,
        /// `None` for references to functions and enumerators.
        #[serde(default)]
        decl: Option<DeclId>,
    },
    Member {
        base: NodeId,
        member: String,
        #[serde(default)]
        arrow: bool,
    },
    ArraySubscript {
        base: NodeId,
        index: NodeId,
    },
    IntegerLiteral,
    FloatingLiteral,
    Literal,
    Paren {
        inner: NodeId,
    },
    ImplicitCast {
        inner: NodeId,
    },
    Cast {
        inner: NodeId,
    },
    Compound {
        body: Vec<NodeId>,
        lbrace: u32,
        rbrace: u32,
    },
    If {
        cond: NodeId,
        then: NodeId,
        #[serde(default)]
        else_branch: Option<NodeId>,
    },
    For {
        #[serde(default)]
        init: Option<NodeId>,
        #[serde(default)]
        cond: Option<NodeId>,
        #[serde(default)]
        inc: Option<NodeId>,
        body: NodeId,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    Do {
        body: NodeId,
        cond: NodeId,
    },
    Switch {
        cond: NodeId,
        body: NodeId,
    },
    Case {
        value: NodeId,
        #[serde(default)]
        sub: Option<NodeId>,
    },
    Default {
        #[serde(default)]
        sub: Option<NodeId>,
    },
    Label {
        name: String,
        #[serde(default)]
        sub: Option<NodeId>,
    },
    Break,
    Continue,
    Return {
        #[serde(default)]
        value: Option<NodeId>,
    },
    DeclStmt {
        decls: Vec<DeclId>,
        #[serde(default)]
        inits: Vec<NodeId>,
    },
    Null,
    Try {
        body: NodeId,
        #[serde(default)]
        handlers: Vec<NodeId>,
    },
    Catch {
        body: NodeId,
    },
    StmtExpr {
        body: NodeId,
    },
    Other {
        #[serde(default)]
        children: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;

        match self {
            BinaryOperator { lhs, rhs, .. } => vec![*lhs, *rhs],
            UnaryOperator { operand, .. } => vec![*operand],
            OperatorCall { args, .. } => args.clone(),
            Call { object, args, .. } => object.iter().chain(args.iter()).copied().collect(),
            Member { base, .. } => vec![*base],
            ArraySubscript { base, index } => vec![*base, *index],
            Paren { inner } | ImplicitCast { inner } | Cast { inner } => vec![*inner],
            Compound { body, .. } => body.clone(),
            If {
                cond,
                then,
                else_branch,
            } => [Some(*cond), Some(*then), *else_branch]
                .into_iter()
                .flatten()
                .collect(),
            For {
                init,
                cond,
                inc,
                body,
            } => [*init, *cond, *inc, Some(*body)]
                .into_iter()
                .flatten()
                .collect(),
            While { cond, body } | Switch { cond, body } => vec![*cond, *body],
            Do { body, cond } => vec![*body, *cond],
            Case { value, sub } => std::iter::once(*value).chain(*sub).collect(),
            Default { sub } | Label { sub, .. } => sub.iter().copied().collect(),
            Return { value } => value.iter().copied().collect(),
            DeclStmt { inits, .. } => inits.clone(),
            Try { body, handlers } => std::iter::once(*body)
                .chain(handlers.iter().copied())
                .collect(),
            Catch { body } | StmtExpr { body } => vec![*body],
            Other { children } => children.clone(),
            IntegerLiteral | FloatingLiteral | Literal | DeclRef { .. } | Break | Continue
            | Null => Vec::new(),
        }
    }

    /// Expression kinds; everything else is a plain statement.
    pub fn is_expr(&self) -> bool {
        use NodeKind::*;

        matches!(
            self,
            BinaryOperator { .. }
                | UnaryOperator { .. }
                | OperatorCall { .. }
                | Call { .. }
                | DeclRef { .. }
                | Member { .. }
                | ArraySubscript { .. }
                | IntegerLiteral
                | FloatingLiteral
                | Literal
                | Paren { .. }
                | ImplicitCast { .. }
                | Cast { .. }
                | StmtExpr { .. }
        )
    }

    /// Case or default label.
    pub fn is_switch_case(&self) -> bool {
        matches!(self, NodeKind::Case { .. } | NodeKind::Default { .. })
    }
}

/// One node of the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub range: TextRange,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<ConstValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    #[default]
    None,
    Static,
    Extern,
    Register,
}

/// Variable or parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,

    /// Offset where the declaration begins.
    pub begin: u32,

    #[serde(default)]
    pub is_const: bool,

    #[serde(default)]
    pub storage: StorageClass,

    #[serde(default)]
    pub is_param: bool,
}

/// Function definition with its symbol lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    /// Whole definition, signature included.
    pub range: TextRange,

    pub body: NodeId,

    #[serde(default)]
    pub params: Vec<DeclId>,

    /// Every local declaration in the body, in source order.
    #[serde(default)]
    pub locals: Vec<DeclId>,

    #[serde(default)]
    pub returns: Vec<NodeId>,
}

/// Fact base of one translation unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Main source file, relative to the fact file.
    pub file: PathBuf,

    pub nodes: Vec<Node>,

    #[serde(default)]
    pub decls: Vec<VarDecl>,

    #[serde(default)]
    pub functions: Vec<Function>,

    /// Lexical scopes in source order.
    #[serde(default)]
    pub scopes: Vec<TextRange>,

    #[serde(default)]
    pub enum_decls: Vec<TextRange>,

    #[serde(default)]
    pub array_decl_sizes: Vec<TextRange>,

    #[serde(default)]
    pub typedefs: Vec<TextRange>,

    /// Scalar references the off-by-one operator must skip once each.
    #[serde(default)]
    pub non_mutatable_scalar_refs: Vec<String>,

    #[serde(skip)]
    pub(crate) parents: Vec<Option<NodeId>>,
}

impl TranslationUnit {
    /// Parse a fact file and derive parent links.
    pub fn from_json(json: &str) -> Result<Self, FactError> {
        let mut tu: TranslationUnit = serde_json::from_str(json)?;
        tu.link()?;
        Ok(tu)
    }

    /// Validate cross references and compute parent links.
    pub fn link(&mut self) -> Result<(), FactError> {
        let count = self.nodes.len() as u32;
        let decl_count = self.decls.len() as u32;
        let mut parents = vec![None; self.nodes.len()];

        for (idx, node) in self.nodes.iter().enumerate() {
            for child in node.kind.children() {
                if child.0 >= count {
                    return Err(FactError::DanglingNode {
                        referrer: idx as u32,
                        target: child.0,
                    });
                }
                if parents[child.0 as usize].is_some() {
                    return Err(FactError::MultipleParents { node: child.0 });
                }
                parents[child.0 as usize] = Some(NodeId(idx as u32));
            }

            let decl_refs: Vec<DeclId> = match &node.kind {
                NodeKind::DeclRef { decl, .. } => decl.iter().copied().collect(),
                NodeKind::DeclStmt { decls, .. } => decls.clone(),
                _ => Vec::new(),
            };
            if let Some(bad) = decl_refs.iter().find(|d| d.0 >= decl_count) {
                return Err(FactError::DanglingDecl {
                    referrer: format!("node {idx}"),
                    target: bad.0,
                });
            }

            if let NodeKind::Call {
                lvalue_ref_args, ..
            } = &node.kind
            {
                if let Some(bad) = lvalue_ref_args.iter().find(|a| a.0 >= count) {
                    return Err(FactError::DanglingNode {
                        referrer: idx as u32,
                        target: bad.0,
                    });
                }
            }
        }

        for func in &self.functions {
            if func.body.0 >= count {
                return Err(FactError::DanglingNode {
                    referrer: func.body.0,
                    target: func.body.0,
                });
            }
            if let Some(bad) = func
                .params
                .iter()
                .chain(func.locals.iter())
                .find(|d| d.0 >= decl_count)
            {
                return Err(FactError::DanglingDecl {
                    referrer: format!("function {}", func.name),
                    target: bad.0,
                });
            }
            if let Some(bad) = func.returns.iter().find(|r| r.0 >= count) {
                return Err(FactError::DanglingNode {
                    referrer: func.body.0,
                    target: bad.0,
                });
            }
        }

        self.parents = parents;
        Ok(())
    }

    /// Check every recorded offset against the loaded source text.
    pub fn check_offsets(&self, text: &str) -> Result<(), FactError> {
        let len = text.len() as u32;
        let offset = |what: &dyn Fn() -> String, at: u32| -> Result<(), FactError> {
            if at > len || !text.is_char_boundary(at as usize) {
                return Err(FactError::OutOfSource {
                    what: what(),
                    offset: at,
                    len,
                });
            }
            Ok(())
        };
        let range = |what: &dyn Fn() -> String, r: TextRange| -> Result<(), FactError> {
            if r.start > r.end {
                return Err(FactError::InvertedRange {
                    what: what(),
                    start: r.start,
                    end: r.end,
                });
            }
            offset(what, r.start)?;
            offset(what, r.end)
        };

        for (idx, node) in self.nodes.iter().enumerate() {
            let what = || format!("node {idx}");
            range(&what, node.range)?;
            match &node.kind {
                NodeKind::BinaryOperator {
                    operator_offset, ..
                } => offset(&what, *operator_offset)?,
                // Closing tokens are spliced up to one byte past them.
                NodeKind::Call { rparen, .. } => offset(&what, rparen.saturating_add(1))?,
                NodeKind::Compound { lbrace, rbrace, .. } => {
                    offset(&what, *lbrace)?;
                    offset(&what, rbrace.saturating_add(1))?;
                }
                _ => {}
            }
        }

        for (idx, decl) in self.decls.iter().enumerate() {
            offset(&|| format!("declaration {idx}"), decl.begin)?;
        }
        for func in &self.functions {
            range(&|| format!("function {}", func.name), func.range)?;
        }

        let regions = [
            ("scope", &self.scopes),
            ("enum declaration", &self.enum_decls),
            ("array size", &self.array_decl_sizes),
            ("typedef", &self.typedefs),
        ];
        for (label, list) in regions {
            for r in list {
                range(&|| label.to_string(), *r)?;
            }
        }

        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.node(id).range
    }

    pub fn ty(&self, id: NodeId) -> Option<&Type> {
        self.node(id).ty.as_ref()
    }

    pub fn decl(&self, id: DeclId) -> &VarDecl {
        &self.decls[id.0 as usize]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.0 as usize).copied().flatten()
    }

    /// Iterator over `id`'s ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// All nodes in pre-order, roots in arena order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self
            .node_ids()
            .filter(|id| self.parent(*id).is_none())
            .collect();
        stack.reverse();

        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.kind(id).children();
            children.reverse();
            stack.extend(children);
        }

        out
    }

    /// `id` and all of its descendants in pre-order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            out.push(id);
            let mut children = self.kind(id).children();
            children.reverse();
            stack.extend(children);
        }

        out
    }

    /// Strip implicit casts.
    pub fn ignore_imp_casts(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::ImplicitCast { inner } = self.kind(id) {
            id = *inner;
        }
        id
    }

    /// Function whose body contains `id`.
    pub fn enclosing_function(&self, id: NodeId) -> Option<usize> {
        let range = self.range(id);
        self.functions
            .iter()
            .position(|f| self.range(f.body).contains(&range))
    }
}
