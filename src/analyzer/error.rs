use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandSide {
    Left,
    Right,
}

impl fmt::Display for OperandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandSide::Left => f.write_str("left"),
            OperandSide::Right => f.write_str("right"),
        }
    }
}

/// One diagnostic of the declaration or type pass. The message starts with a
/// fixed category wording so the stream can be grepped by kind.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SemanticError {
    #[error("duplicate declaration: variable '{name}' is already declared in this scope (line {line})")]
    DuplicateDeclaration { name: String, line: usize },

    #[error("duplicate parameter: parameter '{name}' is already declared in this function (line {line})")]
    DuplicateParameter { name: String, line: usize },

    #[error("duplicate function: function '{name}' is already declared (line {line})")]
    DuplicateFunction { name: String, line: usize },

    #[error("void variable: variable '{name}' is declared with type void (line {line})")]
    VoidVariable { name: String, line: usize },

    #[error("undeclared identifier: identifier '{name}' is not declared in any visible scope (line {line})")]
    UndeclaredIdentifier { name: String, line: usize },

    #[error("array assignment without index: array '{name}' cannot be assigned as a whole (line {line})")]
    ArrayAssignWithoutIndex { name: String, line: usize },

    #[error("void rvalue: right-hand side of the assignment has type void (line {line})")]
    VoidRValue { line: usize },

    #[error("void operand: {side} operand of the operator has type void (line {line})")]
    VoidOperand { side: OperandSide, line: usize },

    #[error("indexing non-array: identifier '{name}' is not an array (line {line})")]
    IndexingNonArray { name: String, line: usize },

    #[error("missing main: function 'main' is not declared in the program")]
    MissingMain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SemanticErrorKind {
    DuplicateDeclaration,
    DuplicateParameter,
    DuplicateFunction,
    VoidVariable,
    UndeclaredIdentifier,
    ArrayAssignWithoutIndex,
    VoidRValue,
    VoidOperand,
    IndexingNonArray,
    MissingMain,
}

impl SemanticError {
    pub fn kind(&self) -> SemanticErrorKind {
        match self {
            SemanticError::DuplicateDeclaration { .. } => SemanticErrorKind::DuplicateDeclaration,
            SemanticError::DuplicateParameter { .. } => SemanticErrorKind::DuplicateParameter,
            SemanticError::DuplicateFunction { .. } => SemanticErrorKind::DuplicateFunction,
            SemanticError::VoidVariable { .. } => SemanticErrorKind::VoidVariable,
            SemanticError::UndeclaredIdentifier { .. } => SemanticErrorKind::UndeclaredIdentifier,
            SemanticError::ArrayAssignWithoutIndex { .. } => {
                SemanticErrorKind::ArrayAssignWithoutIndex
            }
            SemanticError::VoidRValue { .. } => SemanticErrorKind::VoidRValue,
            SemanticError::VoidOperand { .. } => SemanticErrorKind::VoidOperand,
            SemanticError::IndexingNonArray { .. } => SemanticErrorKind::IndexingNonArray,
            SemanticError::MissingMain => SemanticErrorKind::MissingMain,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            SemanticError::DuplicateDeclaration { line, .. }
            | SemanticError::DuplicateParameter { line, .. }
            | SemanticError::DuplicateFunction { line, .. }
            | SemanticError::VoidVariable { line, .. }
            | SemanticError::UndeclaredIdentifier { line, .. }
            | SemanticError::ArrayAssignWithoutIndex { line, .. }
            | SemanticError::VoidRValue { line }
            | SemanticError::VoidOperand { line, .. }
            | SemanticError::IndexingNonArray { line, .. } => Some(*line),
            SemanticError::MissingMain => None,
        }
    }
}
