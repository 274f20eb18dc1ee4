pub mod analyzer;
pub mod codegen;
mod error;
pub mod lexer;
pub mod parser;

use analyzer::{SemanticVisitor, SymbolTable};
use codegen::{Codegen, Instruction};
use lexer::Lexer;
use parser::{Parser, Tree};

pub use error::{AllocationFailure, CompileError};

/// Everything a clean compilation produces.
#[derive(Debug)]
pub struct Compilation {
    pub tree: Tree,
    pub symbol_table: SymbolTable,
    pub code: Vec<Instruction>,
}

pub fn parse(source: &str) -> Result<Tree, CompileError> {
    let tokens = Lexer::tokenize(source)?;
    Ok(Parser::new(tokens).parse()?)
}

/// Runs the declaration pass and, if it was clean, the type pass.
pub fn analyze(tree: &mut Tree) -> Result<SymbolTable, CompileError> {
    let mut visitor = SemanticVisitor::new();

    visitor.build_symbol_table(tree)?;
    if visitor.has_errors() {
        return Err(CompileError::Declaration(visitor.take_errors()));
    }

    visitor.type_check(tree)?;
    if visitor.has_errors() {
        return Err(CompileError::TypeCheck(visitor.take_errors()));
    }

    Ok(visitor.into_symbol_table())
}

pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    let mut tree = parse(source)?;
    let symbol_table = analyze(&mut tree)?;
    let code = Codegen::new().generate(&tree)?;

    Ok(Compilation {
        tree,
        symbol_table,
        code,
    })
}
