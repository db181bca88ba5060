//! Lexer, AST, and recursive-descent parser for dice expressions.
//!
//! Pure functions over `dice_core` types: no I/O, no RNG. `dice_engine`
//! is the only downstream consumer.
#![forbid(unsafe_code)]

mod ast;
mod lexer;
mod parser;

pub use ast::{Ast, BinOp, DiceKind, DiceOp, Node};
pub use parser::parse;
