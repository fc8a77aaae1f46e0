// ABOUTME: Version string, REPL banner text, and process exit codes

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "Lox Interpreter v1.0";
pub const WELCOME_SUBTITLE: &str = "A tree-walking interpreter for Lox, in Rust";

/// Exit codes per spec §6.
pub const EXIT_OK: i32 = 0;
pub const EXIT_USAGE: i32 = 64;
pub const EXIT_COMPILE_ERROR: i32 = 65;
pub const EXIT_RUNTIME_ERROR: i32 = 70;

pub const HISTORY_FILE: &str = ".lox_history";

pub const USAGE: &str = "Usage: lox-rs [script]";
