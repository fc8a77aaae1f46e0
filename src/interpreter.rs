// ABOUTME: Tree-walking evaluator — executes statements, evaluates expressions, drives calls and inheritance

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::env::Environment;
use crate::error::{RuntimeError, Unwind};
use crate::resolver::Locals;
use crate::token::{Token, TokenKind};
use crate::value::{LoxClass, LoxFunction, Value};

pub struct Interpreter {
    pub globals: Rc<Environment>,
    environment: Rc<Environment>,
    locals: Locals,
    output: Rc<RefCell<dyn Write>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Rc::new(RefCell::new(io::stdout())))
    }

    /// Builds an interpreter that writes `print`/`Print` output through
    /// `output` instead of stdout — lets tests assert on captured output
    /// without spawning the binary.
    pub fn with_output(output: Rc<RefCell<dyn Write>>) -> Self {
        let globals = Environment::new_global();
        crate::builtins::register(&globals);
        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            output,
        }
    }

    /// Merges in a resolver pass's side table. Node ids are unique process-wide
    /// (see `ast::next_id`), so repeated calls (one per REPL line) accumulate
    /// rather than clobber each other.
    pub fn add_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// The single place `print`/`Print` route through, so both share the same
    /// sink (spec §6: native `print(x)` and the `print` statement both print
    /// `x` followed by a newline).
    pub fn print(&self, value: &Value) {
        let _ = writeln!(self.output.borrow_mut(), "{value}");
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}
                Err(Unwind::Error(err)) => return Err(err),
                Err(Unwind::Return(_)) => {
                    unreachable!("resolver forbids return from top-level code")
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.print(&value);
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let env = Environment::new_enclosed(&self.environment);
                self.execute_block(statements, env)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment
                    .define(decl.name.lexeme.clone(), Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass, methods),
        }
    }

    /// Runs `statements` in `environment`, restoring the previous environment
    /// on every exit path — normal completion, a runtime error, or a `Return`
    /// unwind.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<Environment>,
    ) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;
        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: &Option<Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Unwind> {
        let superclass_value = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = superclass_token(expr);
                    return Err(RuntimeError::superclass_must_be_class(token).into());
                }
            },
            None => None,
        };

        self.environment.define(name.lexeme.clone(), Value::Nil);

        let previous_env = Rc::clone(&self.environment);
        if let Some(super_class) = &superclass_value {
            let env = Environment::new_enclosed(&self.environment);
            env.define("super", Value::Class(Rc::clone(super_class)));
            self.environment = env;
        }

        let mut method_map = HashMap::with_capacity(methods.len());
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = LoxFunction::new(Rc::clone(method), Rc::clone(&self.environment), is_initializer);
            method_map.insert(method.name.lexeme.clone(), Rc::new(function));
        }

        let class = Rc::new(LoxClass::new(name.lexeme.clone(), superclass_value, method_map));

        if superclass.is_some() {
            self.environment = previous_env;
        }

        self.environment
            .assign(name, Value::Class(class))
            .map_err(Unwind::Error)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { op, operand } => self.evaluate_unary(op, operand),
            Expr::Binary { left, op, right } => self.evaluate_binary(left, op, right),
            Expr::Logical { left, op, right } => self.evaluate_logical(left, op, right),
            Expr::Variable { id, name } => self.lookup_variable(*id, name),
            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.get(id) {
                    Some(&distance) => self.environment.assign_at(distance, &name.lexeme, value.clone()),
                    None => self.globals.assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call {
                callee,
                closing_paren,
                args,
            } => {
                let callee_value = self.evaluate(callee)?;
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate(arg)?);
                }
                self.call(callee_value, closing_paren, arg_values)
            }
            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(RuntimeError::not_an_instance(name.clone())),
            },
            Expr::Set { object, name, value } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;
                    instance.set(name, value.clone());
                    Ok(value)
                }
                _ => Err(RuntimeError::not_an_instance(name.clone())),
            },
            Expr::This { id, keyword } => self.lookup_variable(*id, keyword),
            Expr::Super { id, keyword, method } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, op: &Token, operand: &Expr) -> Result<Value, RuntimeError> {
        let right = self.evaluate(operand)?;
        match op.kind {
            TokenKind::Minus => Ok(Value::Number(-as_number(&right, op)?)),
            TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
            _ => unreachable!("parser only emits '-' or '!' as unary operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        match op.kind {
            TokenKind::Minus => Ok(Value::Number(as_number(&left, op)? - as_number(&right, op)?)),
            TokenKind::Slash => Ok(Value::Number(as_number(&left, op)? / as_number(&right, op)?)),
            TokenKind::Star => Ok(Value::Number(as_number(&left, op)? * as_number(&right, op)?)),
            TokenKind::Plus => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => Err(RuntimeError::operands_must_be_strings_or_numbers(op.clone())),
            },
            TokenKind::Greater => Ok(Value::Bool(as_number(&left, op)? > as_number(&right, op)?)),
            TokenKind::GreaterEqual => Ok(Value::Bool(as_number(&left, op)? >= as_number(&right, op)?)),
            TokenKind::Less => Ok(Value::Bool(as_number(&left, op)? < as_number(&right, op)?)),
            TokenKind::LessEqual => Ok(Value::Bool(as_number(&left, op)? <= as_number(&right, op)?)),
            TokenKind::BangEqual => Ok(Value::Bool(left != right)),
            TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
            _ => unreachable!("parser only emits arithmetic/comparison/equality ops as binary"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(left)?;
        match op.kind {
            TokenKind::Or if left.is_truthy() => Ok(left),
            TokenKind::And if !left.is_truthy() => Ok(left),
            TokenKind::Or | TokenKind::And => self.evaluate(right),
            _ => unreachable!("parser only emits 'and'/'or' as logical operators"),
        }
    }

    fn evaluate_super(&mut self, id: crate::ast::NodeId, keyword: &Token, method: &Token) -> Result<Value, RuntimeError> {
        let distance = *self
            .locals
            .get(&id)
            .expect("resolver guarantees 'super' always resolves inside a subclass method");
        let superclass = match self.environment.get_at(distance, "super") {
            Value::Class(class) => class,
            _ => unreachable!("'super' always binds a class value"),
        };
        let instance = match self.environment.get_at(distance - 1, "this") {
            Value::Instance(instance) => instance,
            _ => unreachable!("'this' always binds an instance value one scope inside 'super'"),
        };

        let _ = keyword;
        superclass
            .find_method(&method.lexeme)
            .map(|bound| Value::Function(Rc::new(bound.bind(instance))))
            .ok_or_else(|| RuntimeError::undefined_property(method.clone()))
    }

    fn lookup_variable(&self, id: crate::ast::NodeId, name: &Token) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Ok(self.environment.get_at(distance, &name.lexeme)),
            None => self.globals.get(name),
        }
    }

    fn call(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => {
                if args.len() != function.arity() {
                    return Err(RuntimeError::arity_mismatch(paren.clone()));
                }
                function.call(self, args)
            }
            Value::Native(native) => {
                if args.len() != native.arity {
                    return Err(RuntimeError::arity_mismatch(paren.clone()));
                }
                (native.func)(self, &args)
            }
            Value::Class(class) => {
                if args.len() != class.arity() {
                    return Err(RuntimeError::arity_mismatch(paren.clone()));
                }
                class.instantiate(self, args)
            }
            _ => Err(RuntimeError::not_callable(paren.clone())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Nil => Value::Nil,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::String(s) => Value::string(s.clone()),
    }
}

fn as_number(value: &Value, token: &Token) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::operand_must_be_number(token.clone())),
    }
}

/// `classDecl`'s superclass clause is always an `Expr::Variable`; used only
/// to recover a token for the "Superclass must be a class." error.
fn superclass_token(expr: &Expr) -> Token {
    match expr {
        Expr::Variable { name, .. } => name.clone(),
        _ => unreachable!("parser only ever builds Variable exprs for a superclass clause"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Diagnostics;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use crate::resolver::Resolver;

    fn run(source: &str) -> Result<(), RuntimeError> {
        let diagnostics = Diagnostics::new();
        let tokens = Lexer::new(source, &diagnostics).scan_tokens();
        let statements = Parser::new(tokens, &diagnostics).parse();
        assert!(!diagnostics.had_error(), "unexpected compile error");
        let locals = Resolver::new(&diagnostics).resolve(&statements);
        assert!(!diagnostics.had_error(), "unexpected resolve error");
        let mut interpreter = Interpreter::new();
        interpreter.add_locals(locals);
        interpreter.interpret(&statements)
    }

    #[test]
    fn arithmetic_precedence() {
        assert!(run("print 1 + 2 * 3;").is_ok());
    }

    #[test]
    fn closures_capture_environment_by_reference() {
        assert!(run(
            r#"
            var a = 1;
            fun f() { print a; }
            a = 2;
            f();
            "#
        )
        .is_ok());
    }

    #[test]
    fn inheritance_and_super_dispatch() {
        assert!(run(
            r#"
            class A { greet() { print "A"; } }
            class B < A {
              greet() { super.greet(); print "B"; }
            }
            B().greet();
            "#
        )
        .is_ok());
    }

    #[test]
    fn initializer_returns_instance_on_bare_return() {
        assert!(run(
            r#"
            class C { init() { return; } }
            print C().init();
            "#
        )
        .is_ok());
    }

    #[test]
    fn adding_string_and_number_is_a_runtime_error() {
        let err = run(r#"print "a" + 1;"#).unwrap_err();
        assert_eq!(err.message, "Operands must both be either strings or numbers");
    }

    #[test]
    fn calling_a_non_callable_is_a_runtime_error() {
        let err = run("var x = 1; x();").unwrap_err();
        assert_eq!(err.message, "Can only call functions and classes.");
    }

    #[test]
    fn wrong_arity_is_a_runtime_error() {
        let err = run("fun f(a) { return a; } f(1, 2);").unwrap_err();
        assert_eq!(err.message, "Wrong number of arguments.");
    }

    #[test]
    fn getting_a_property_off_a_non_instance_is_a_runtime_error() {
        let err = run("var x = 1; print x.y;").unwrap_err();
        assert_eq!(err.message, "Only instances have properties");
    }

    #[test]
    fn undefined_property_is_a_runtime_error() {
        let err = run("class A {} print A().missing;").unwrap_err();
        assert_eq!(err.message, "Undefined property missing.");
    }

    #[test]
    fn non_class_superclass_is_a_runtime_error() {
        let err = run("var NotAClass = 1; class A < NotAClass {}").unwrap_err();
        assert_eq!(err.message, "Superclass must be a class.");
    }
}
