use std::cell::RefCell;
use std::fmt::{self, Display};
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{ExecSignal, Interpreter};
use crate::object::Object;
use crate::stmt::FunctionDecl;

/// A user-defined function or method: a pointer to its static declaration
/// plus the environment frame that was active when it was declared (its
/// closure). `is_initializer` marks a class's `init` method, which returns
/// `this` instead of its normal result.
#[derive(Debug)]
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>, is_initializer: bool) -> Self {
        Function { declaration, closure, is_initializer }
    }

    /// Returns a new function sharing this one's declaration, whose closure
    /// is a fresh child environment with `this` bound to `instance`.
    pub fn bind(&self, instance: Object) -> Function {
        let environment = Environment::new(Some(Rc::clone(&self.closure)));
        environment.borrow_mut().define("this", instance);
        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let environment = Environment::new(Some(Rc::clone(&self.closure)));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        let signal = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(self.closure.borrow().get_at(0, "this"));
        }

        match signal {
            ExecSignal::Return(value) => Ok(value),
            ExecSignal::Normal => Ok(Object::Nil),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

/// A built-in function implemented in Rust rather than Lox. See
/// `interpreter::install_globals` for the fixed set installed at startup.
pub struct NativeFunction {
    pub name: &'static str,
    arity: usize,
    function: fn(&mut Interpreter<'_>, Vec<Object>) -> Result<Object, RuntimeError>,
}

impl NativeFunction {
    pub fn new(
        name: &'static str,
        arity: usize,
        function: fn(&mut Interpreter<'_>, Vec<Object>) -> Result<Object, RuntimeError>,
    ) -> Self {
        NativeFunction { name, arity, function }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn call(&self, interpreter: &mut Interpreter<'_>, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        (self.function)(interpreter, arguments)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}
