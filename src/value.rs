// ABOUTME: The runtime value domain — nil/bool/number/string/callables/instances

use crate::ast::FunctionDecl;
use crate::env::Environment;
use crate::error::{RuntimeError, Unwind};
use crate::interpreter::Interpreter;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Native(Rc<NativeFunction>),
    Instance(Rc<LoxInstance>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Rc::from(s.into()))
    }

    /// Only `nil` and `false` are falsy; everything else, including `0` and
    /// `""`, is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Native(_) => "native function",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    /// Structural equality: `nil == nil`; same-type values compare by
    /// content; different types are never equal. Callables and instances
    /// compare by reference identity (pointer equality on the shared `Rc`).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Function(fun) => write!(f, "<fn {}>", fun.declaration.name.lexeme),
            Value::Class(class) => write!(f, "{}", class.name),
            Value::Native(native) => write!(f, "<native fn {}>", native.name),
            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}

pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<Environment>,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<Environment>, is_initializer: bool) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Binds `this` to `instance` in a fresh one-deep child of this
    /// function's own closure, regardless of how deeply the class itself is
    /// nested, and preserves the initializer flag.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let env = Environment::new_enclosed(&self.closure);
        env.define("this", Value::Instance(instance));
        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

impl LoxFunction {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let env = Environment::new_enclosed(&self.closure);
        for (param, arg) in self.declaration.params.iter().zip(args) {
            env.define(param.lexeme.clone(), arg);
        }

        let result = interpreter.execute_block(&self.declaration.body, env);

        if self.is_initializer {
            return Ok(self.closure.get_at(0, "this"));
        }

        match result {
            Ok(()) => Ok(Value::Nil),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(error)) => Err(error),
        }
    }
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: Box<dyn Fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>>,
}

pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    /// Checks this class's own method table, then (recursively) its
    /// superclass. First match wins.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }
        self.superclass.as_ref()?.find_method(name)
    }
}

impl LoxClass {
    /// The arity of a class-as-constructor equals its `init` method's arity,
    /// or 0 if it has none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Constructs a fresh instance and, if an `init` method exists, binds and
    /// calls it with `args` before returning the instance.
    pub fn instantiate(
        self: &Rc<Self>,
        interpreter: &mut Interpreter,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let instance = Rc::new(LoxInstance {
            class: Rc::clone(self),
            fields: RefCell::new(HashMap::new()),
        });

        if let Some(initializer) = self.find_method("init") {
            initializer.bind(Rc::clone(&instance)).call(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }
}

pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn get(self: &Rc<Self>, name: &crate::token::Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            let bound = method.bind(Rc::clone(self));
            return Ok(Value::Function(Rc::new(bound)));
        }
        Err(RuntimeError::undefined_property(name.clone()))
    }

    pub fn set(&self, name: &crate::token::Token, value: Value) {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_numbers_print_without_fraction() {
        assert_eq!(Value::Number(7.0).to_string(), "7");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
    }

    #[test]
    fn fractional_numbers_print_with_fraction() {
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
    }

    #[test]
    fn nil_equals_nil() {
        assert_eq!(Value::Nil, Value::Nil);
    }

    #[test]
    fn different_types_are_never_equal() {
        assert_ne!(Value::Nil, Value::Number(0.0));
    }

    #[test]
    fn truthiness_matches_lox_rules() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::string("").is_truthy());
    }

    #[test]
    fn instance_display_uses_class_name() {
        let class = Rc::new(LoxClass::new("Bagel".to_string(), None, HashMap::new()));
        let instance = Rc::new(LoxInstance {
            class,
            fields: RefCell::new(HashMap::new()),
        });
        assert_eq!(Value::Instance(instance).to_string(), "Bagel instance");
    }
}
