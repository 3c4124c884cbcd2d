use std::collections::HashMap;

use crate::error::{Diagnostic, ErrorReporter, ResolveError};
use crate::expr::Expr;
use crate::stmt::{ClassDecl, FunctionDecl, Stmt};
use crate::token::Token;
use std::rc::Rc;

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// A static pass over the AST that, for every variable reference, counts
/// how many scopes out the declaring binding lives and stores that count
/// directly on the expression node (`Depth`). Also catches a handful of
/// errors that only make sense before runtime: reading a variable in its
/// own initializer, `return` outside a function, `this`/`super` misuse.
pub struct Resolver<'r> {
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionKind,
    current_class: ClassKind,
    reporter: &'r mut ErrorReporter,
}

impl<'r> Resolver<'r> {
    pub fn new(reporter: &'r mut ErrorReporter) -> Self {
        Resolver { scopes: Vec::new(), current_function: FunctionKind::None, current_class: ClassKind::None, reporter }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Assert(_, expr) => self.resolve_expr(expr),
            Stmt::Var(name, initializer) => {
                self.declare(name);
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }
                self.define(name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve(statements);
                self.end_scope();
            }
            Stmt::If(condition, then_branch, else_branch) => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While(condition, body) => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Return(keyword, value) => {
                if self.current_function == FunctionKind::None {
                    self.error(keyword.clone(), "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    if self.current_function == FunctionKind::Initializer {
                        self.error(keyword.clone(), "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class(decl) => self.resolve_class(decl),
        }
    }

    fn resolve_class(&mut self, decl: &Rc<ClassDecl>) {
        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(&decl.name);
        self.define(&decl.name);

        if let Some(Expr::Variable(superclass_name, _)) = &decl.superclass {
            if superclass_name.lexeme == decl.name.lexeme {
                self.error(superclass_name.clone(), "A class can't inherit from itself.");
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_expr(decl.superclass.as_ref().unwrap());
        }

        if decl.superclass.is_some() {
            self.begin_scope();
            self.scopes.last_mut().unwrap().insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().unwrap().insert("this".to_string(), true);

        for method in &decl.methods {
            let kind = if method.name.lexeme == "init" { FunctionKind::Initializer } else { FunctionKind::Method };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if decl.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, decl: &Rc<FunctionDecl>, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) => self.resolve_expr(inner),
            Expr::Unary(_, right) => self.resolve_expr(right),
            Expr::Binary(left, _, right) | Expr::Logical(left, _, right) => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Variable(name, depth) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name.clone(), "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(name, depth);
            }
            Expr::Assign(name, value, depth) => {
                self.resolve_expr(value);
                self.resolve_local(name, depth);
            }
            Expr::Call(callee, _, arguments) => {
                self.resolve_expr(callee);
                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get(object, _) => self.resolve_expr(object),
            Expr::Set(object, _, value) => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This(keyword, depth) => {
                if self.current_class == ClassKind::None {
                    self.error(keyword.clone(), "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(keyword, depth);
            }
            Expr::Super(keyword, _, depth) => {
                match self.current_class {
                    ClassKind::None => self.error(keyword.clone(), "Can't use 'super' outside of a class."),
                    ClassKind::Class => {
                        self.error(keyword.clone(), "Can't use 'super' in a class with no superclass.")
                    }
                    ClassKind::Subclass => self.resolve_local(keyword, depth),
                }
            }
        }
    }

    fn resolve_local(&self, name: &Token, depth: &crate::expr::Depth) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                depth.set(Some(i));
                return;
            }
        }
        // Not found in any local scope: left unresolved, so the interpreter
        // falls back to the global environment by name.
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };
        if scope.contains_key(&name.lexeme) {
            self.error(name.clone(), "Already a variable with this name in this scope.");
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn error(&mut self, token: Token, message: &str) {
        ResolveError { token, message: message.to_string() }.report(self.reporter);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> (Vec<Stmt>, bool) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, &mut reporter).parse();
        Resolver::new(&mut reporter).resolve(&statements);
        (statements, reporter.had_error())
    }

    #[test]
    fn variable_resolves_to_correct_depth() {
        let (statements, had_error) = resolve("{ var a = 1; { print a; } }");
        assert!(!had_error);
        let Stmt::Block(outer) = &statements[0] else { panic!() };
        let Stmt::Block(inner) = &outer[1] else { panic!() };
        let Stmt::Print(Expr::Variable(_, depth)) = &inner[0] else { panic!() };
        assert_eq!(depth.get(), Some(1));
    }

    #[test]
    fn self_referential_initializer_is_an_error() {
        let (_, had_error) = resolve("{ var a = a; }");
        assert!(had_error);
    }

    #[test]
    fn redeclaring_in_the_same_scope_is_an_error() {
        let (_, had_error) = resolve("{ var a = 1; var a = 2; }");
        assert!(had_error);
    }

    #[test]
    fn top_level_return_is_an_error() {
        let (_, had_error) = resolve("return 1;");
        assert!(had_error);
    }

    #[test]
    fn this_outside_a_class_is_an_error() {
        let (_, had_error) = resolve("print this;");
        assert!(had_error);
    }

    #[test]
    fn class_inheriting_from_itself_is_an_error() {
        let (_, had_error) = resolve("class A < A {}");
        assert!(had_error);
    }

    #[test]
    fn global_variables_are_left_unresolved() {
        let (statements, had_error) = resolve("var a = 1; print a;");
        assert!(!had_error);
        let Stmt::Print(Expr::Variable(_, depth)) = &statements[1] else { panic!() };
        assert_eq!(depth.get(), None);
    }
}
