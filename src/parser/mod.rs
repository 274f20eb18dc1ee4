mod ast;
mod parser;
pub mod printer;

pub use ast::*;
pub use parser::*;
