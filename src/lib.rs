// ABOUTME: Library module exposing the Lox pipeline stages for the binary and tests

pub mod ast;
pub mod builtins;
pub mod config;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod token;
pub mod value;

use error::Diagnostics;
use interpreter::Interpreter;

/// Runs one compilation unit (a whole script, or a single REPL line) through
/// the full pipeline: lex, parse, resolve, then — if no stage reported an
/// error — interpret. Returns whether a compile-time error was reported and,
/// separately, any runtime error that unwound to the top level, mirroring
/// the two error tiers the driver must distinguish to pick an exit code.
pub struct RunOutcome {
    pub had_compile_error: bool,
    pub runtime_error: Option<error::RuntimeError>,
}

pub fn run(source: &str, interpreter: &mut Interpreter) -> RunOutcome {
    let diagnostics = Diagnostics::new();

    let tokens = lexer::Lexer::new(source, &diagnostics).scan_tokens();
    let statements = parser::Parser::new(tokens, &diagnostics).parse();

    if diagnostics.had_error() {
        return RunOutcome {
            had_compile_error: true,
            runtime_error: None,
        };
    }

    let locals = resolver::Resolver::new(&diagnostics).resolve(&statements);

    if diagnostics.had_error() {
        return RunOutcome {
            had_compile_error: true,
            runtime_error: None,
        };
    }

    interpreter.add_locals(locals);

    match interpreter.interpret(&statements) {
        Ok(()) => RunOutcome {
            had_compile_error: false,
            runtime_error: None,
        },
        Err(err) => RunOutcome {
            had_compile_error: false,
            runtime_error: Some(err),
        },
    }
}
