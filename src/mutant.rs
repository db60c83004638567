use crate::span::SourceSpan;
use serde::{Deserialize, Serialize};

/// Category of a mutation operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatorCategory {
    /// One binary operator symbol replaced by another (for example `==` → `&&`).
    OperatorReplacement,

    /// Call arguments or whole calls removed or replaced by constants.
    CallMutation,

    /// A scalar reference replaced by another variable.
    VariableReplacement,

    /// A scalar reference nudged by one or guarded by a sign trap.
    Twiddle,

    /// Statements moved across block boundaries or substituted.
    StatementMutation,
}

/// Identifier for a specific mutation operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationOperator {
    /// Category this operator belongs to.
    pub category: OperatorCategory,

    /// Short, stable mnemonic for the operator (for example `ORLN`).
    pub name: String,
}

/// Secondary edit that travels with a mutant, e.g. a header include at file start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExtraEdit {
    pub span: SourceSpan,

    /// Text the span covers in the original file (empty for insertions).
    pub original: String,

    pub replacement: String,
}

/// Representation of a single first-order mutant at the C/C++ source level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Mutant {
    /// Monotonically increasing identifier.
    pub id: u64,

    /// Operator applied to create this mutant.
    pub operator: MutationOperator,

    /// Location of the mutated snippet in the source code.
    pub span: SourceSpan,

    /// Proteus-style line number: line of the statement that encloses the edit.
    pub line: u32,

    /// Original source snippet (before mutation).
    pub original_snippet: String,

    /// Mutated source snippet (after mutation).
    pub mutated_snippet: String,

    /// Free-form variant tag such as `UP`, `plus` or `==&&`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Edits that must be applied together with the main one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_edits: Vec<ExtraEdit>,
}
