use std::fmt;

use crate::token::{Token, Type};

/// Accumulates error state across the scan, parse, resolve, and runtime
/// phases. Owned by whoever drives the pipeline (the CLI, the REPL loop, or
/// a test) rather than kept in process-wide statics, so a REPL can reset it
/// between lines and tests can inspect it without touching global state.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any scan, parse, or resolution error has been reported.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// Whether a runtime error aborted evaluation.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears both flags. Used between REPL lines; interpreter state
    /// (globals, environment) is untouched.
    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

/// Implemented by every diagnostic type so the scanner, parser, resolver,
/// and interpreter all report through the same reporter object.
pub trait Diagnostic {
    fn report(&self, reporter: &mut ErrorReporter);
}

fn print_at(line: usize, location: &str, message: &str) {
    eprintln!("[line {line}] Error{location}: {message}");
}

/// Raised by the scanner on a bad character or an unterminated string.
/// Reported immediately; scanning continues to the end of the source.
#[derive(Debug)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Diagnostic for ScanError {
    fn report(&self, reporter: &mut ErrorReporter) {
        print_at(self.line, "", &self.message);
        reporter.had_error = true;
    }
}

/// Raised by the parser on a missing or unexpected token. Unwinds to the
/// nearest statement boundary, where the synchronizer resumes parsing.
#[derive(Debug)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ParseError {
    fn report(&self, reporter: &mut ErrorReporter) {
        if self.token.r#type == Type::EOF {
            print_at(self.token.line, " at end", &self.message);
        } else {
            print_at(self.token.line, &format!(" at '{}'", self.token.lexeme), &self.message);
        }
        reporter.had_error = true;
    }
}

/// Raised by the resolver for scope-related rule violations (self-init,
/// top-level return, misused `this`/`super`, self-inheriting classes, ...).
#[derive(Debug)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ResolveError {
    fn report(&self, reporter: &mut ErrorReporter) {
        print_at(self.token.line, &format!(" at '{}'", self.token.lexeme), &self.message);
        reporter.had_error = true;
    }
}

/// Raised by the interpreter for type errors, arity mismatches, undefined
/// names, and failed `assert`s. The first one aborts evaluation.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for RuntimeError {
    fn report(&self, reporter: &mut ErrorReporter) {
        eprintln!("{}\n[line {}]", self.message, self.token.line);
        reporter.had_runtime_error = true;
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [line {}]", self.message, self.token.line)
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fresh_reporter_has_no_errors() {
        let reporter = ErrorReporter::new();
        assert!(!reporter.had_error());
        assert!(!reporter.had_runtime_error());
    }

    #[test]
    fn reset_clears_both_flags() {
        let mut reporter = ErrorReporter::new();
        reporter.had_error = true;
        reporter.had_runtime_error = true;
        reporter.reset();
        assert!(!reporter.had_error());
        assert!(!reporter.had_runtime_error());
    }

    #[test]
    fn runtime_error_only_sets_runtime_flag() {
        let mut reporter = ErrorReporter::new();
        let error = RuntimeError {
            token: Token::new(Type::Identifier, "x".into(), None, 3),
            message: "Undefined variable 'x'.".into(),
        };
        error.report(&mut reporter);
        assert!(!reporter.had_error());
        assert!(reporter.had_runtime_error());
    }
}
