use thiserror::Error;

use crate::analyzer::SemanticError;
use crate::lexer::LexError;
use crate::parser::ParseError;

/// Memory could not be reserved while growing the symbol table or the IR buffer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("memory allocation failed while {0}")]
pub struct AllocationFailure(pub &'static str);

#[derive(Error, Debug, PartialEq)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("{} semantic error(s) found while building the symbol table", .0.len())]
    Declaration(Vec<SemanticError>),

    #[error("{} type error(s) found", .0.len())]
    TypeCheck(Vec<SemanticError>),

    #[error(transparent)]
    AllocationFailure(#[from] AllocationFailure),
}

impl CompileError {
    /// Semantic diagnostics carried by the error, empty for non-semantic failures.
    pub fn diagnostics(&self) -> &[SemanticError] {
        match self {
            CompileError::Declaration(errors) | CompileError::TypeCheck(errors) => errors,
            _ => &[],
        }
    }
}
