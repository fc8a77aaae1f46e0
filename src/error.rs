// ABOUTME: Error types and the shared diagnostic channel for lex/parse/resolve/runtime errors

use crate::token::{Token, TokenKind};
use std::cell::Cell;
use thiserror::Error;

/// A runtime error, raised during evaluation and unwound to the interpreter's
/// top level. Carries the offending token so the driver can print a line
/// number (spec §7: "Each carries the offending token").
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError {
            token,
            message: message.into(),
        }
    }

    pub fn operand_must_be_number(token: Token) -> Self {
        Self::new(token, "Operand must be a number.")
    }

    pub fn operands_must_be_strings_or_numbers(token: Token) -> Self {
        Self::new(token, "Operands must both be either strings or numbers")
    }

    pub fn undefined_variable(token: Token) -> Self {
        let name = token.lexeme.clone();
        Self::new(token, format!("Undefined Variable '{name}'."))
    }

    pub fn undefined_property(token: Token) -> Self {
        let name = token.lexeme.clone();
        Self::new(token, format!("Undefined property {name}."))
    }

    pub fn not_callable(token: Token) -> Self {
        Self::new(token, "Can only call functions and classes.")
    }

    pub fn arity_mismatch(token: Token) -> Self {
        Self::new(token, "Wrong number of arguments.")
    }

    pub fn not_an_instance(token: Token) -> Self {
        Self::new(token, "Only instances have properties")
    }

    pub fn superclass_must_be_class(token: Token) -> Self {
        Self::new(token, "Superclass must be a class.")
    }
}

/// What can interrupt statement execution: either a genuine runtime error,
/// or a `return` unwinding to the nearest active call frame. The latter is
/// normal control flow, not a failure — it carries the returned value and
/// is caught by the function call boundary, never surfaced to the driver.
#[derive(Debug, Clone)]
pub enum Unwind {
    Return(crate::value::Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Unwind::Error(error)
    }
}

/// Collects lex/parse/resolve diagnostics and tracks the had-error flag the
/// driver consults to decide whether to proceed to the next pipeline stage
/// (spec §6/§7). Shared by the lexer, parser, and resolver via `&Diagnostics`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: Cell<bool>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics {
            had_error: Cell::new(false),
        }
    }

    pub fn had_error(&self) -> bool {
        self.had_error.get()
    }

    pub fn reset(&self) {
        self.had_error.set(false);
    }

    /// Lexer-side error: no token context, just a line number.
    pub fn lex_error(&self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// Parser/resolver-side error: reported against a specific token.
    pub fn parse_error(&self, token: &Token, message: &str) {
        if token.kind == TokenKind::Eof {
            self.report(token.line, " at end", message);
        } else {
            self.report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    fn report(&self, line: usize, location: &str, message: &str) {
        eprintln!("[line {line}] Error{location}: {message}");
        self.had_error.set(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Literal;

    #[test]
    fn parse_error_at_eof_mentions_end() {
        let diag = Diagnostics::new();
        let eof = Token::new(TokenKind::Eof, "", Literal::None, 3);
        diag.parse_error(&eof, "Expect expression.");
        assert!(diag.had_error());
    }

    #[test]
    fn fresh_diagnostics_has_no_error() {
        let diag = Diagnostics::new();
        assert!(!diag.had_error());
    }

    #[test]
    fn reset_clears_had_error() {
        let diag = Diagnostics::new();
        diag.lex_error(1, "Unexpected Character.");
        assert!(diag.had_error());
        diag.reset();
        assert!(!diag.had_error());
    }
}
