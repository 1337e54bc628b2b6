//! The scan → parse → interpret pipeline, in file mode and session mode.
//!
//! File mode runs one compilation unit on a fresh [`Interpreter`]. Session
//! mode keeps a single interpreter alive so that globals defined by one
//! input are visible to the next; a runtime error aborts only the input
//! that raised it.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::{Diagnostics, LoxError, Result};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::scan_tokens;
use crate::stmt::Stmt;

/// Scan and parse `source`. Any lexical or syntax error turns the whole
/// unit into [`LoxError::Syntax`]; nothing is executed in that case.
pub fn compile(source: &str) -> Result<Vec<Stmt>> {
    let mut diagnostics = Diagnostics::new();

    let tokens = scan_tokens(source, &mut diagnostics);
    let statements = Parser::new(tokens, &mut diagnostics).parse();

    if diagnostics.has_errors() {
        debug!("Compilation produced {} diagnostics", diagnostics.len());
        return Err(LoxError::Syntax(diagnostics));
    }

    Ok(statements)
}

/// Compile `source` and execute it on `interpreter`.
pub fn run_source<W: Write>(source: &str, interpreter: &mut Interpreter<W>) -> Result<()> {
    let statements = compile(source)?;
    interpreter.interpret(&statements)
}

/// File mode: one fresh interpreter for the whole program.
pub fn run_file(source: &str) -> Result<()> {
    info!("Running program of {} bytes", source.len());

    let mut interpreter = Interpreter::new();
    run_source(source, &mut interpreter)
}

/// Session (interactive) mode state.
pub struct Session<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
    inputs: usize,
}

impl Session<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Session<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Session<W> {
    pub fn with_output(out: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            inputs: 0,
        }
    }

    /// Run one input against the persistent global scope.
    pub fn run(&mut self, source: &str) -> Result<()> {
        self.inputs += 1;
        debug!("Session input #{}: {:?}", self.inputs, source);

        run_source(source, &mut self.interpreter)
    }

    pub fn interpreter(&self) -> &Interpreter<W> {
        &self.interpreter
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }
}
