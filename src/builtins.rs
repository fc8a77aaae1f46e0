// ABOUTME: Native callables preloaded into the global environment

use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::env::Environment;
use crate::value::{NativeFunction, Value};

/// Preloads `clock`, the one native function spec §6 names that is reachable
/// as a call expression. `print` is a reserved word (`token::keyword`), so it
/// only ever lexes as `TokenKind::Print` and can never appear as an
/// `Identifier`; its `print(x)` behavior lives entirely in `Stmt::Print`, not
/// as a second global binding of the same name.
pub fn register(globals: &Rc<Environment>) {
    globals.define("clock", Value::Native(Rc::new(clock())));
}

fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: Box::new(|_interpreter, _args| {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("system clock is after the Unix epoch");
            Ok(Value::Number(now.as_secs_f64()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use crate::interpreter::Interpreter;

    #[test]
    fn clock_returns_a_nonnegative_number() {
        let mut interpreter = Interpreter::new();
        let clock = match interpreter.globals.get(&ident("clock")).unwrap() {
            Value::Native(native) => native,
            other => panic!("expected native function, got {other}"),
        };
        let result: Result<Value, RuntimeError> = (clock.func)(&mut interpreter, &[]);
        match result.unwrap() {
            Value::Number(n) => assert!(n >= 0.0),
            other => panic!("expected Number, got {other}"),
        }
    }

    fn ident(name: &str) -> crate::token::Token {
        crate::token::Token::new(crate::token::TokenKind::Identifier, name, crate::token::Literal::None, 1)
    }
}
