mod ast;
mod builtins;
mod config;
mod env;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod resolver;
mod token;
mod value;

use clap::Parser;
use error::{Diagnostics, RuntimeError};
use interpreter::Interpreter;
use log::{debug, info, trace};
use rustyline::error::ReadlineError;
use rustyline::{Config as RlConfig, Editor};
use std::path::PathBuf;
use std::process::ExitCode;

/// A tree-walking interpreter for Lox
#[derive(Parser, Debug)]
#[command(name = "lox-rs")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for Lox")]
struct CliArgs {
    /// Script file to execute (optional — if not provided, starts the REPL).
    /// Accepts an unbounded number of positionals so the CLI-misuse case
    /// (two or more args) can be reported with spec's own usage line and
    /// exit code 64, rather than clap's generic arg-count error.
    #[arg(value_name = "FILE")]
    args: Vec<PathBuf>,

    /// Increase log verbosity (trace-level pipeline diagnostics)
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let level = if args.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Warn
    };
    simple_logger::init_with_level(level.to_level().unwrap_or(log::Level::Warn))
        .unwrap_or_else(|e| eprintln!("logger init failed: {e}"));

    match args.args.as_slice() {
        [] => run_repl(),
        [script] => run_file(script),
        _ => {
            println!("{}", config::USAGE);
            ExitCode::from(config::EXIT_USAGE as u8)
        }
    }
}

/// Reads and runs a single script, then exits with the spec's compile/runtime
/// exit codes (65/70) or 0 on a clean run.
fn run_file(path: &PathBuf) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Cannot read script file {}: {e}", path.display());
            return ExitCode::from(config::EXIT_USAGE as u8);
        }
    };

    let mut interpreter = Interpreter::new();
    let outcome = run_source(&source, &mut interpreter);

    if outcome.had_compile_error {
        return ExitCode::from(config::EXIT_COMPILE_ERROR as u8);
    }

    if let Some(err) = outcome.runtime_error {
        eprintln!("{}\n[line {}]", err.message, err.token.line);
        return ExitCode::from(config::EXIT_RUNTIME_ERROR as u8);
    }

    ExitCode::from(config::EXIT_OK as u8)
}

/// The result of running one compilation unit: whether a lex/parse/resolve
/// error blocked execution (spec §7 tier 1/2), and any runtime error (tier 3)
/// that unwound to here.
struct RunOutcome {
    had_compile_error: bool,
    runtime_error: Option<RuntimeError>,
}

/// Drives one source string through lex → parse → resolve → interpret,
/// skipping later stages once any stage has reported an error (spec §7).
fn run_source(source: &str, interpreter: &mut Interpreter) -> RunOutcome {
    let diagnostics = Diagnostics::new();

    let tokens = lexer::Lexer::new(source, &diagnostics).scan_tokens();
    trace!("lexed {} tokens", tokens.len());

    let statements = parser::Parser::new(tokens, &diagnostics).parse();
    trace!("parsed {} statements", statements.len());

    if diagnostics.had_error() {
        return RunOutcome {
            had_compile_error: true,
            runtime_error: None,
        };
    }

    let locals = resolver::Resolver::new(&diagnostics).resolve(&statements);
    trace!("resolved {} local references", locals.len());

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

/// Interactive prompt: reads a line, runs it, resets had-error between
/// prompts (spec §6), exits cleanly on EOF.
fn run_repl() -> ExitCode {
    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    let rl_config = RlConfig::builder().auto_add_history(true).build();
    let mut rl: Editor<(), rustyline::history::DefaultHistory> =
        match Editor::with_config(rl_config) {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize REPL: {e}");
                return ExitCode::from(config::EXIT_USAGE as u8);
            }
        };

    let _ = rl.load_history(config::HISTORY_FILE);

    let mut interpreter = Interpreter::new();

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let outcome = run_source(&line, &mut interpreter);
                if outcome.had_compile_error {
                    debug!("line rejected by lex/parse/resolve");
                } else if let Some(err) = outcome.runtime_error {
                    eprintln!("{}\n[line {}]", err.message, err.token.line);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
    info!("repl session ended");
    ExitCode::from(config::EXIT_OK as u8)
}
