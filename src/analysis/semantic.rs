use crate::frontend::ast::{Position, Type};
use thiserror::Error;

/// Diagnostics raised while lowering a parsed program.
///
/// Messages embed the `(line, column)` of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("undefined variable '{name}' at {pos}")]
    UndefinedVariable { name: String, pos: Position },

    #[error("cannot assign to undefined variable '{name}' at {pos}")]
    AssignToUndefined { name: String, pos: Position },

    // Arithmetic operands, `out`, comparison operands and assignment targets
    #[error("expected a {expected} instead got {found} at {pos}")]
    TypeMismatch {
        expected: Type,
        found: Type,
        pos: Position,
    },

    #[error("expression at {value_pos} has type {found} but declaration at {pos} has type {declared}")]
    DeclarationMismatch {
        declared: Type,
        found: Type,
        pos: Position,
        value_pos: Position,
    },

    #[error("variable '{name}' at {pos} has type {ty} but is being used in condition so should be bool")]
    NonBoolCondition { name: String, ty: Type, pos: Position },

    #[error("int used as a condition at {pos}")]
    IntCondition { pos: Position },

    #[error("cannot use input as condition at {pos}")]
    InputCondition { pos: Position },

    #[error("cannot use '-' operator in condition at {pos}")]
    NegationCondition { pos: Position },
}
