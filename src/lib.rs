pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod runner;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Diagnostics;
use parser::Parser;
use stmt::Stmt;
use token::Token;

pub use error::{LoxError, Result};
pub use interpreter::Interpreter;
pub use runner::Session;

/// Lex `source`, returning the tokens (always `EOF`‑terminated) together
/// with every lexical error found.
pub fn scan(source: &str) -> (Vec<Token>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = scanner::scan_tokens(source, &mut diagnostics);
    (tokens, diagnostics)
}

/// Parse `tokens`, returning the statements that parsed together with every
/// syntax error found.
pub fn parse(tokens: Vec<Token>) -> (Vec<Stmt>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let statements = Parser::new(tokens, &mut diagnostics).parse();
    (statements, diagnostics)
}
