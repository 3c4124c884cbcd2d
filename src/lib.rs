#![allow(clippy::needless_return)]

//! Lox is a programming language written in Rust. It is a dynamically typed language with
//! lexical scoping and first-class functions. Lox is a tree-walk interpreter with a hand-written
//! recursive descent parser. This crate is a hobby project and is not intended for production use.
//!
//! Lox is a dynamically typed language. This means that the type of a variable is determined at
//! runtime. This is in contrast to statically typed languages, where the type of a variable is
//! determined at compile time. Dynamically typed languages are often easier to use, but are
//! generally slower than statically typed languages.
//!
//! Lox is a tree-walk interpreter. This means that the interpreter walks the abstract syntax tree
//! (AST) and evaluates each node. This is in contrast to a compiler, which would convert the AST
//! into bytecode or machine code. Tree-walk interpreters are generally easier to implement than
//! compilers, but are generally slower than compilers.
//!
//! This project is inspired by the [Crafting Interpreters](https://craftinginterpreters.com/) book
//! by Bob Nystrom. The goal of this project is to learn more about programming languages and
//! interpreters.
//!
//! ## Scanning
//! The first step in the interpreter is scanning. Scanning is the process of converting a string of
//! characters into a list of tokens. A token is a single unit of a programming language. For
//! example, the string `1 + 2` would be converted into the following tokens:
//! ```text
//! [Number(1), Plus, Number(2)]
//! ```
//! The scanner is implemented in the [`scanner`](scanner) module. It is a simple state machine
//! that produces the next token in the source code as it advances through the character stream.
//!
//! The scanner reports syntax errors in the source code as a [`ScanError`](error::ScanError).
//! These errors are trivial problems like an unterminated string literal or an unexpected character.
//! Scan errors are reported as soon as they are encountered, but scanning continues afterward so the
//! user can see more than one problem per run.
//!
//! ## Parsing
//! The second step in the interpreter is parsing. Parsing is the process of converting a list of
//! tokens into an abstract syntax tree (AST). The parser is implemented in the [`parser`](parser)
//! module as a recursive descent parser. The parser transforms the list of tokens into expressions
//! and statements. [`Expressions`](expr::Expr) are pieces of code that produce a value, specifically
//! an [`Object`](object::Object). Objects are an umbrella term for all types of values in Lox
//! including literals, functions, classes and instances. [`Statements`](stmt::Stmt) are pieces of
//! code that do not produce a value but instead perform some action.
//!
//! The parser reports syntax errors in the source code as a [`ParseError`](error::ParseError).
//! Unlike the scanner, the parser catches errors that span multiple tokens. Much like the scanner,
//! the parser continues parsing the source code after an error using a technique called
//! synchronization, so multiple mistakes can be reported in one run.
//!
//! ## Resolving
//! The third step in the interpreter is resolving. Resolving is the process of statically analyzing
//! the AST to determine the scope of each variable before the program runs. The resolver is
//! implemented in the [`resolver`](resolver) module and is run after the parser because it needs
//! the AST fully constructed. The resolver reports errors as a [`ResolveError`](error::ResolveError)
//! — problems that are syntactically valid but semantically invalid, and so can't be caught by the
//! scanner or parser. For example, the following is valid Lox syntax but is semantically invalid
//! because `a` is declared twice in the same scope:
//! ```text
//! {
//!    var a = 1;
//!    var a = 2;
//! }
//! ```
//!
//! ## Interpreting
//! The final step is interpreting: walking the AST and evaluating each node. The interpreter is
//! implemented in the [`interpreter`](interpreter) module. The interpreter reports errors as a
//! [`RuntimeError`](error::RuntimeError). While the scanner, parser and resolver try to catch as
//! many errors as possible before running the code, most errors can only be caught at runtime. For
//! example, the following expression is valid Lox syntax but is semantically invalid because it
//! tries to add a string and a number:
//! ```text
//! var a = "123";
//! var b = a + 123;
//! ```
//! The interpreter is also responsible for managing the environment, a mapping of variable names to
//! their values implemented as a chain of scopes in the [`environment`](environment) module. This
//! allows the interpreter to implement lexical scoping and closures.

use std::fs;
use std::io::Write;

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use error::ErrorReporter;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

pub const EXIT_USAGE: i32 = 64;
pub const EXIT_DATA_ERROR: i32 = 65;
pub const EXIT_SOFTWARE: i32 = 70;

/// The top-level driver for the scan → parse → resolve → interpret pipeline.
/// Owns the long-lived pieces of state that must survive across calls to
/// [`Lox::run`] within the same process: the interpreter (so globals and
/// top-level declarations persist across REPL lines) and the error
/// reporter (so the caller can inspect and reset its flags between runs).
pub struct Lox<'out> {
    interpreter: Interpreter<'out>,
    reporter: ErrorReporter,
}

impl<'out> Lox<'out> {
    pub fn new(output: &'out mut dyn Write) -> Self {
        Lox { interpreter: Interpreter::new(output), reporter: ErrorReporter::new() }
    }

    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    pub fn reset_errors(&mut self) {
        self.reporter.reset();
    }

    /// Reads `path` and runs it to completion. Returns the process exit
    /// code the caller should use: `0` on success, [`EXIT_DATA_ERROR`] if
    /// scanning/parsing/resolving failed, [`EXIT_SOFTWARE`] on an
    /// unhandled runtime error.
    pub fn run_file(&mut self, path: &str) -> i32 {
        let contents = fs::read_to_string(path).expect("should have been able to read the file");

        self.run(&contents);

        if self.had_error() {
            EXIT_DATA_ERROR
        } else if self.had_runtime_error() {
            EXIT_SOFTWARE
        } else {
            0
        }
    }

    /// Runs one chunk of source through the full pipeline. Each step only
    /// proceeds if the previous one reported no errors, since later stages
    /// assume the AST they're handed is well-formed.
    pub fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source, &mut self.reporter).scan_tokens();
        if self.reporter.had_error() {
            return;
        }

        let statements = Parser::new(tokens, &mut self.reporter).parse();
        if self.reporter.had_error() {
            return;
        }

        Resolver::new(&mut self.reporter).resolve(&statements);
        if self.reporter.had_error() {
            return;
        }

        self.interpreter.interpret(&statements, &mut self.reporter);
    }
}
