//! Range-containment predicates the operators consult before mutating.

use crate::ast::{NodeId, NodeKind, TranslationUnit};
use crate::source::SourceFile;
use crate::span::TextRange;

const ASSIGNMENT_OPCODES: &[&str] = &[
    "=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", "&=", "|=", "^=",
];

const NON_FLOATING_OPCODES: &[&str] = &[
    "%", "<<", ">>", "&", "|", "^", "%=", "<<=", ">>=", "&=", "|=", "^=",
];

pub fn is_assignment_opcode(opcode: &str) -> bool {
    ASSIGNMENT_OPCODES.contains(&opcode)
}

/// User-selected window outside which no mutant may be produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationRange {
    /// Inclusive start offset; `None` means start of file.
    pub start: Option<u32>,

    /// Exclusive end offset; `None` means end of file.
    pub end: Option<u32>,
}

impl MutationRange {
    #[cfg(test)]
    pub fn whole_file() -> Self {
        Self::default()
    }

    pub fn contains(&self, range: TextRange) -> bool {
        self.start.is_none_or(|s| range.start >= s) && self.end.is_none_or(|e| range.end <= e)
    }
}

/// Answers "is this node inside construct C" for one translation unit.
#[derive(Debug, Clone, Copy)]
pub struct StmtContext<'a> {
    tu: &'a TranslationUnit,
}

impl<'a> StmtContext<'a> {
    pub fn new(tu: &'a TranslationUnit) -> Self {
        Self { tu }
    }

    fn in_any_region(&self, regions: &[TextRange], node: NodeId) -> bool {
        let range = self.tu.range(node);
        regions.iter().any(|r| r.contains(&range))
    }

    /// Walk up from `node`, handing each ancestor and the child on the path to `guard`.
    fn any_enclosing(&self, node: NodeId, guard: impl Fn(&NodeKind, NodeId) -> bool) -> bool {
        let mut child = node;
        for ancestor in self.tu.ancestors(node) {
            if guard(self.tu.kind(ancestor), child) {
                return true;
            }
            child = ancestor;
        }
        false
    }

    pub fn is_in_array_decl_size(&self, node: NodeId) -> bool {
        self.in_any_region(&self.tu.array_decl_sizes, node)
    }

    pub fn is_in_enum_decl(&self, node: NodeId) -> bool {
        self.in_any_region(&self.tu.enum_decls, node)
    }

    pub fn is_in_typedef(&self, node: NodeId) -> bool {
        self.in_any_region(&self.tu.typedefs, node)
    }

    pub fn is_in_lhs_of_assignment(&self, node: NodeId) -> bool {
        self.any_enclosing(node, |kind, child| match kind {
            NodeKind::BinaryOperator { opcode, lhs, .. } => {
                is_assignment_opcode(opcode) && *lhs == child
            }
            _ => false,
        })
    }

    pub fn is_in_address_op(&self, node: NodeId) -> bool {
        self.any_enclosing(node, |kind, _| {
            matches!(kind, NodeKind::UnaryOperator { opcode, .. } if opcode == "&")
        })
    }

    pub fn is_in_unary_inc_dec(&self, node: NodeId) -> bool {
        self.any_enclosing(node, |kind, _| {
            matches!(kind, NodeKind::UnaryOperator { opcode, .. } if opcode == "++" || opcode == "--")
        })
    }

    /// Inside the value of a `case` label.
    pub fn is_in_switch_case(&self, node: NodeId) -> bool {
        self.any_enclosing(
            node,
            |kind, child| matches!(kind, NodeKind::Case { value, .. } if *value == child),
        )
    }

    pub fn is_in_switch_condition(&self, node: NodeId) -> bool {
        self.any_enclosing(
            node,
            |kind, child| matches!(kind, NodeKind::Switch { cond, .. } if *cond == child),
        )
    }

    /// Inside the index of an array subscript.
    pub fn is_in_array_subscript(&self, node: NodeId) -> bool {
        self.any_enclosing(
            node,
            |kind, child| matches!(kind, NodeKind::ArraySubscript { index, .. } if *index == child),
        )
    }

    /// Operand of an operator that rejects floating operands.
    pub fn is_in_non_floating_expr(&self, node: NodeId) -> bool {
        self.any_enclosing(node, |kind, _| match kind {
            NodeKind::BinaryOperator { opcode, .. } => NON_FLOATING_OPCODES.contains(&opcode.as_str()),
            NodeKind::UnaryOperator { opcode, .. } => opcode == "~",
            _ => false,
        })
    }

    pub fn is_in_currently_parsed_function(&self, node: NodeId) -> bool {
        self.tu.enclosing_function(node).is_some()
    }

    /// Innermost statement that sits directly inside a block and encloses `node`.
    pub fn enclosing_statement(&self, node: NodeId) -> NodeId {
        std::iter::once(node)
            .chain(self.tu.ancestors(node))
            .find(|id| {
                self.tu
                    .parent(*id)
                    .is_some_and(|p| matches!(self.tu.kind(p), NodeKind::Compound { .. }))
            })
            .unwrap_or(node)
    }

    /// Proteus-style line number: line where the enclosing statement starts.
    pub fn proteus_line(&self, node: NodeId, source: &SourceFile) -> u32 {
        source.line_of(self.tu.range(self.enclosing_statement(node)).start)
    }
}
