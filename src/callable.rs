//! The callable capability and the two function kinds that implement it.
//!
//! Classes are callable too; see [`crate::class`].

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::Instance;
use crate::environment::{EnvRef, Environment};
use crate::error::Result;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Anything a call expression can invoke.
pub trait Callable<'a>: fmt::Display {
    /// Number of arguments the callee needs; callers may pass more.
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>)
        -> Result<Value<'a>>;
}

/// Signature of a built‑in implemented in Rust.
pub type NativeFn = for<'v> fn(&[Value<'v>]) -> Value<'v>;

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl<'a> Callable<'a> for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> Result<Value<'a>> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

/// Seconds since the Unix epoch, with sub‑second precision.
pub fn clock<'v>(_arguments: &[Value<'v>]) -> Value<'v> {
    let micros: i64 = chrono::Utc::now().timestamp_micros();

    Value::Number(micros as f64 / 1_000_000.0)
}

/// A user function or method: its declaration plus the environment it
/// closed over.
pub struct Function<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: EnvRef<'a>,
    is_initializer: bool,
}

impl<'a> Function<'a> {
    pub fn new(declaration: Rc<FunctionDecl<'a>>, closure: EnvRef<'a>, is_initializer: bool) -> Self {
        Function {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    /// A new function whose closure is a child scope binding `this` to
    /// `instance`.  The receiver is left untouched.
    pub fn bind(&self, instance: &Rc<Instance<'a>>) -> Function<'a> {
        let environment: EnvRef<'a> = Environment::child(&self.closure);

        environment
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(instance)));

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }
}

impl<'a> Callable<'a> for Function<'a> {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter<'a>, arguments: Vec<Value<'a>>) -> Result<Value<'a>> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment: EnvRef<'a> = Environment::child(&self.closure);

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            debug!("Binding parameter '{}' to {}", param.lexeme, argument);

            environment.borrow_mut().define(param.lexeme, argument);
        }

        let flow: Flow<'a> = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Nil));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl<'a> fmt::Debug for Function<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.declaration.params.len())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

impl<'a> fmt::Display for Function<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
