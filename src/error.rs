//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Two error classes exist. Syntax errors produced by the scanner and the
//! parser are *recorded* in a [`Diagnostics`] sink and never stop the pass
//! that found them; once a compilation unit is complete the caller decides
//! what to do with them (see [`LoxError::Syntax`]). Runtime errors raised by
//! the interpreter halt the current program and travel up as
//! [`LoxError::Runtime`] / [`LoxError::StackOverflow`].
//!
//! The module **does not** print diagnostics itself

use std::fmt;
use std::io;
use thiserror::Error;

use log::info;

/// One recorded syntax problem: `(line, location hint, message)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Diagnostic {
    /// 1‑based line where the error occurred.
    pub line: usize,

    /// `""`, `" at end"` or `" at '<lexeme>'"`.
    pub location: String,

    /// Human‑readable description.
    pub message: String,
}

impl Diagnostic {
    /// A scanner error; lexical errors carry no location hint.
    pub fn lexical<S: Into<String>>(line: usize, msg: S) -> Self {
        let diagnostic = Diagnostic {
            line,
            location: String::new(),
            message: msg.into(),
        };

        info!("Creating lexical error: {}", diagnostic);

        diagnostic
    }
}

/// Collector for syntax errors, created per compilation unit and handed by
/// `&mut` to the scanner and the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error at `line`.
    pub fn report<L, M>(&mut self, line: usize, location: L, message: M)
    where
        L: Into<String>,
        M: Into<String>,
    {
        let diagnostic = Diagnostic {
            line,
            location: location.into(),
            message: message.into(),
        };

        self.push(diagnostic);
    }

    /// Record an already built diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        info!("Recording diagnostic: {}", diagnostic);

        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Move every entry of `other` into `self`, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

impl<'d> IntoIterator for &'d Diagnostics {
    type Item = &'d Diagnostic;
    type IntoIter = std::slice::Iter<'d, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// A compilation unit finished scanning/parsing with recorded errors.
    #[error("{0}")]
    Syntax(Diagnostics),

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Call depth exceeded the interpreter limit.
    #[error("Stack overflow.\n[line {line}]")]
    StackOverflow { line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    /// `true` for errors raised while executing (as opposed to compiling).
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            LoxError::Runtime { .. } | LoxError::StackOverflow { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
