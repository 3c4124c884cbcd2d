use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::{ErrorReporter, RuntimeError};
use crate::expr::Expr;
use crate::function::{Function, NativeFunction};
use crate::object::Object;
use crate::stmt::{ClassDecl, Stmt};
use crate::token::{Token, Type};

/// The outcome of executing a statement: either it ran to completion, or a
/// `return` unwound control flow up to the enclosing function call. Threaded
/// explicitly through every statement-execution function (rather than
/// modeled as an exception) so `execute_block`'s environment restoration is
/// trivially correct on every exit path.
pub enum ExecSignal {
    Normal,
    Return(Object),
}

/// Walks a resolved statement list, evaluating expressions and performing
/// their side effects. Holds the global frame, the currently active frame,
/// and an injectable output sink so both the CLI (stdout) and tests
/// (an in-memory buffer) can drive the same `print` code path.
pub struct Interpreter<'out> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    output: &'out mut dyn Write,
}

impl<'out> Interpreter<'out> {
    pub fn new(output: &'out mut dyn Write) -> Self {
        let globals = Environment::new(None);
        install_globals(&globals);
        Interpreter { environment: Rc::clone(&globals), globals, output }
    }

    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut ErrorReporter) {
        use crate::error::Diagnostic;

        for statement in statements {
            if let Err(error) = self.execute(statement) {
                error.report(reporter);
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<ExecSignal, RuntimeError> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ExecSignal::Normal)
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{value}").expect("writing to the output sink should not fail");
                Ok(ExecSignal::Normal)
            }
            Stmt::Assert(keyword, expr) => {
                let value = self.evaluate(expr)?;
                if !value.is_truthy() {
                    return Err(RuntimeError {
                        token: keyword.clone(),
                        message: format!("{value} is not truthy."),
                    });
                }
                Ok(ExecSignal::Normal)
            }
            Stmt::Var(name, initializer) => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(ExecSignal::Normal)
            }
            Stmt::Block(statements) => {
                let block_env = Environment::new(Some(Rc::clone(&self.environment)));
                self.execute_block(statements, block_env)
            }
            Stmt::If(condition, then_branch, else_branch) => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ExecSignal::Normal)
                }
            }
            Stmt::While(condition, body) => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        ExecSignal::Normal => {}
                        signal @ ExecSignal::Return(_) => return Ok(signal),
                    }
                }
                Ok(ExecSignal::Normal)
            }
            Stmt::Function(decl) => {
                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(&decl.name.lexeme, Object::Function(Rc::new(function)));
                Ok(ExecSignal::Normal)
            }
            Stmt::Return(_, value) => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::Nil,
                };
                Ok(ExecSignal::Return(value))
            }
            Stmt::Class(decl) => self.execute_class(decl),
        }
    }

    /// Runs `statements` in a new current environment, restoring the
    /// previous one on every exit path: normal completion, a `Return`
    /// unwind, or a propagated runtime error.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<ExecSignal, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(ExecSignal::Normal);
        for statement in statements {
            match self.execute(statement) {
                Ok(ExecSignal::Normal) => {}
                Ok(signal @ ExecSignal::Return(_)) => {
                    result = Ok(signal);
                    break;
                }
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, decl: &Rc<ClassDecl>) -> Result<ExecSignal, RuntimeError> {
        let superclass = match &decl.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::Class(class) => Some(class),
                    _ => {
                        let token = match expr {
                            Expr::Variable(name, _) => name.clone(),
                            _ => unreachable!("the parser only ever attaches a Variable expr as a superclass"),
                        };
                        return Err(RuntimeError { token, message: "Superclass must be a class.".into() });
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&decl.name.lexeme, Object::Nil);

        let method_env = match &superclass {
            Some(superclass) => {
                let env = Environment::new(Some(Rc::clone(&self.environment)));
                env.borrow_mut().define("super", Object::Class(Rc::clone(superclass)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let mut methods = HashMap::with_capacity(decl.methods.len());
        for method_decl in &decl.methods {
            let is_initializer = method_decl.name.lexeme == "init";
            let function = Function::new(Rc::clone(method_decl), Rc::clone(&method_env), is_initializer);
            methods.insert(method_decl.name.lexeme.clone(), Rc::new(function));
        }

        let class = Object::Class(Rc::new(Class::new(decl.name.lexeme.clone(), superclass, methods)));

        self.environment
            .borrow_mut()
            .assign(&decl.name, class)
            .expect("the class name was just defined in this environment");

        Ok(ExecSignal::Normal)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary(operator, right) => self.evaluate_unary(operator, right),
            Expr::Binary(left, operator, right) => self.evaluate_binary(left, operator, right),
            Expr::Logical(left, operator, right) => self.evaluate_logical(left, operator, right),
            Expr::Variable(name, depth) => self.look_up_variable(name, depth),
            Expr::Assign(name, value, depth) => {
                let value = self.evaluate(value)?;
                match depth.get() {
                    Some(d) => self.environment.borrow_mut().assign_at(d, &name.lexeme, value.clone()),
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call(callee, paren, arguments) => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }
                self.call_value(callee, paren, values)
            }
            Expr::Get(object, name) => {
                let object = self.evaluate(object)?;
                self.get_property(object, name)
            }
            Expr::Set(object, name, value) => {
                let object = self.evaluate(object)?;
                let Object::Instance(instance) = object else {
                    return Err(RuntimeError { token: name.clone(), message: "Only instances have fields.".into() });
                };
                let value = self.evaluate(value)?;
                instance.borrow_mut().fields.insert(name.lexeme.clone(), value.clone());
                Ok(value)
            }
            Expr::This(keyword, depth) => self.look_up_variable(keyword, depth),
            Expr::Super(keyword, method, depth) => self.evaluate_super(keyword, method, depth),
        }
    }

    fn look_up_variable(&self, name: &Token, depth: &Cell<Option<usize>>) -> Result<Object, RuntimeError> {
        match depth.get() {
            Some(d) => Ok(self.environment.borrow().get_at(d, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Object, RuntimeError> {
        let right = self.evaluate(right)?;
        match operator.r#type {
            Type::Minus => match right {
                Object::Number(n) => Ok(Object::Number(-n)),
                _ => Err(RuntimeError { token: operator.clone(), message: "Operand must be a number.".into() }),
            },
            Type::Bang => Ok(Object::Bool(!right.is_truthy())),
            _ => unreachable!("the parser only emits Minus/Bang as unary operators"),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, RuntimeError> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        match operator.r#type {
            Type::Plus => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Number(l + r)),
                (Object::String(l), Object::String(r)) => Ok(Object::String(l + &r)),
                _ => Err(RuntimeError {
                    token: operator.clone(),
                    message: "Operands must be two numbers or two strings.".into(),
                }),
            },
            Type::Minus => numeric_op(operator, left, right, |l, r| Object::Number(l - r)),
            Type::Star => numeric_op(operator, left, right, |l, r| Object::Number(l * r)),
            Type::Slash => numeric_op(operator, left, right, |l, r| Object::Number(l / r)),
            Type::Greater => numeric_op(operator, left, right, |l, r| Object::Bool(l > r)),
            Type::GreaterEqual => numeric_op(operator, left, right, |l, r| Object::Bool(l >= r)),
            Type::Less => numeric_op(operator, left, right, |l, r| Object::Bool(l < r)),
            Type::LessEqual => numeric_op(operator, left, right, |l, r| Object::Bool(l <= r)),
            Type::EqualEqual => Ok(Object::Bool(left == right)),
            Type::BangEqual => Ok(Object::Bool(left != right)),
            _ => unreachable!("the parser only emits arithmetic/comparison/equality operators as Binary"),
        }
    }

    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Object, RuntimeError> {
        let left = self.evaluate(left)?;
        match operator.r#type {
            Type::Or if left.is_truthy() => Ok(left),
            Type::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn call_value(&mut self, callee: Object, paren: &Token, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let arity = match &callee {
            Object::Function(function) => function.arity(),
            Object::NativeFunction(function) => function.arity(),
            Object::Class(class) => class.arity(),
            _ => {
                return Err(RuntimeError {
                    token: paren.clone(),
                    message: "Can only call functions and classes.".into(),
                });
            }
        };

        if arguments.len() != arity {
            return Err(RuntimeError {
                token: paren.clone(),
                message: format!("Expected {arity} arguments but got {}.", arguments.len()),
            });
        }

        match callee {
            Object::Function(function) => function.call(self, arguments),
            Object::NativeFunction(function) => function.call(self, arguments),
            Object::Class(class) => {
                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));
                if let Some(initializer) = class.find_method("init") {
                    initializer.bind(Object::Instance(Rc::clone(&instance))).call(self, arguments)?;
                }
                Ok(Object::Instance(instance))
            }
            _ => unreachable!("the arity check above already rejected non-callables"),
        }
    }

    fn get_property(&mut self, object: Object, name: &Token) -> Result<Object, RuntimeError> {
        let Object::Instance(instance) = &object else {
            return Err(RuntimeError { token: name.clone(), message: "Only instances have properties.".into() });
        };

        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let class = Rc::clone(&instance.borrow().class);
        if let Some(method) = class.find_method(&name.lexeme) {
            return Ok(Object::Function(Rc::new(method.bind(object.clone()))));
        }

        Err(RuntimeError { token: name.clone(), message: format!("Undefined property '{}'.", name.lexeme) })
    }

    fn evaluate_super(
        &mut self,
        keyword: &Token,
        method: &Token,
        depth: &Cell<Option<usize>>,
    ) -> Result<Object, RuntimeError> {
        let distance = depth.get().expect("the resolver always assigns 'super' a depth inside a subclass");
        let superclass = self.environment.borrow().get_at(distance, "super");
        let Object::Class(superclass) = superclass else {
            unreachable!("the resolver only ever binds the name 'super' to a class object");
        };

        // `this` lives one frame shallower than `super` — see the resolver's
        // class scope layout (super scope wraps the this/method scope).
        let instance = self.environment.borrow().get_at(distance - 1, "this");

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Object::Function(Rc::new(found.bind(instance)))),
            None => Err(RuntimeError {
                token: method.clone(),
                message: format!("Undefined property '{}'.", method.lexeme),
            }),
        }
    }
}

fn numeric_op(
    operator: &Token,
    left: Object,
    right: Object,
    op: impl Fn(f64, f64) -> Object,
) -> Result<Object, RuntimeError> {
    match (left, right) {
        (Object::Number(l), Object::Number(r)) => Ok(op(l, r)),
        _ => Err(RuntimeError { token: operator.clone(), message: "Operands must be numbers.".into() }),
    }
}

/// Installs the language's tiny native-function surface: `clock` (named by
/// the original spec) and `str` (a minimal standard-library stand-in so
/// user code can convert a value to its `print` representation without
/// round-tripping through a side effect).
fn install_globals(globals: &Rc<RefCell<Environment>>) {
    let mut env = globals.borrow_mut();

    env.define(
        "clock",
        Object::NativeFunction(Rc::new(NativeFunction::new("clock", 0, |_, _| {
            let elapsed = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system clock should be after the Unix epoch");
            Ok(Object::Number(elapsed.as_secs_f64()))
        }))),
    );

    env.define(
        "str",
        Object::NativeFunction(Rc::new(NativeFunction::new("str", 1, |_, mut arguments| {
            Ok(Object::String(arguments.remove(0).to_string()))
        }))),
    );
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(source: &str) -> String {
        let mut output = Vec::new();
        let mut reporter = ErrorReporter::new();

        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, &mut reporter).parse();
        Resolver::new(&mut reporter).resolve(&statements);

        let mut interpreter = Interpreter::new(&mut output);
        interpreter.interpret(&statements, &mut reporter);

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run(r#"var a = "foo"; var b = "bar"; print a + b;"#), "foobar\n");
    }

    #[test]
    fn closures_capture_their_own_frame() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    print i;
                }
                return count;
            }
            var c = makeCounter();
            c(); c(); c();
        "#;
        assert_eq!(run(source), "1\n2\n3\n");
    }

    #[test]
    fn super_dispatch() {
        let source = r#"
            class A { speak() { print "A"; } }
            class B < A { speak() { super.speak(); print "B"; } }
            B().speak();
        "#;
        assert_eq!(run(source), "A\nB\n");
    }

    #[test]
    fn blocks_shadow_without_leaking() {
        let source = r#"
            var x = "outer";
            { var x = "inner"; print x; }
            print x;
        "#;
        assert_eq!(run(source), "inner\nouter\n");
    }

    #[test]
    fn clock_is_nonnegative() {
        assert_eq!(run("print clock() >= 0;"), "true\n");
    }

    #[test]
    fn print_empty_string_prints_empty_line() {
        assert_eq!(run(r#"print "";"#), "\n");
    }

    #[test]
    fn division_by_zero_yields_infinity_not_an_error() {
        assert_eq!(run("print 1 / 0;"), "inf\n");
    }

    #[test]
    fn nil_equals_false_is_false() {
        assert_eq!(run("print nil == false;"), "false\n");
    }
}
