//! Symbolic unit expressions.
//!
//! Provides the pieces a declaration script runs on:
//! - Free symbols with assumptions (`symbol kg: positive`)
//! - Bindings simplified eagerly into monomial normal form
//! - A symbol table that keeps declaration order and lets later
//!   declarations overwrite earlier ones

pub mod evaluator;
pub mod monomial;
pub mod parser;
pub mod script;
pub mod types;


pub use evaluator::{evaluate, express_in, numeric_value, simplify, EvalError};
pub use monomial::Monomial;
pub use parser::{parse_expression, Expr, ParseError};
pub use script::{parse_script, parse_statement, ScriptLine, Statement};
pub use types::{Assumption, Binding, Entry, Symbol, SymbolTable};
