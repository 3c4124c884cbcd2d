use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::{Diagnostic, ErrorReporter, ScanError};
use crate::token::{Literal, Token, Type};

fn keyword(text: &str) -> Option<Type> {
    Some(match text {
        "and" => Type::And,
        "class" => Type::Class,
        "else" => Type::Else,
        "false" => Type::False,
        "for" => Type::For,
        "fun" => Type::Fun,
        "if" => Type::If,
        "nil" => Type::Nil,
        "or" => Type::Or,
        "print" => Type::Print,
        "return" => Type::Return,
        "assert" => Type::Assert,
        "super" => Type::Super,
        "this" => Type::This,
        "true" => Type::True,
        "var" => Type::Var,
        "while" => Type::While,
        _ => return None,
    })
}

/// Turns raw source text into a flat token stream. Scans one character at
/// a time through a `peekmore` cursor so multi-character lexemes (`!=`,
/// string/number literals, comments) can look one or two characters ahead
/// without consuming them until they're confirmed.
pub struct Scanner<'r> {
    source: PeekMoreIterator<Chars<'r>>,
    tokens: Vec<Token>,
    lexeme: String,
    line: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'r> Scanner<'r> {
    pub fn new(source: &'r str, reporter: &'r mut ErrorReporter) -> Self {
        Scanner { source: source.chars().peekmore(), tokens: Vec::new(), lexeme: String::new(), line: 1, reporter }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        loop {
            self.lexeme.clear();
            let Some(c) = self.advance() else { break };
            self.scan_token(c);
        }
        self.tokens.push(Token::new(Type::EOF, String::new(), None, self.line));
        self.tokens
    }

    fn scan_token(&mut self, c: char) {
        match c {
            '(' => self.add_token(Type::LeftParen, None),
            ')' => self.add_token(Type::RightParen, None),
            '{' => self.add_token(Type::LeftBrace, None),
            '}' => self.add_token(Type::RightBrace, None),
            ',' => self.add_token(Type::Comma, None),
            '.' => self.add_token(Type::Dot, None),
            '-' => self.add_token(Type::Minus, None),
            '+' => self.add_token(Type::Plus, None),
            ';' => self.add_token(Type::Semicolon, None),
            '*' => self.add_token(Type::Star, None),
            '!' => {
                let r#type = if self.match_next('=') { Type::BangEqual } else { Type::Bang };
                self.add_token(r#type, None);
            }
            '=' => {
                let r#type = if self.match_next('=') { Type::EqualEqual } else { Type::Equal };
                self.add_token(r#type, None);
            }
            '<' => {
                let r#type = if self.match_next('=') { Type::LessEqual } else { Type::Less };
                self.add_token(r#type, None);
            }
            '>' => {
                let r#type = if self.match_next('=') { Type::GreaterEqual } else { Type::Greater };
                self.add_token(r#type, None);
            }
            '/' => {
                if self.match_next('/') {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.advance();
                    }
                } else {
                    self.add_token(Type::Slash, None);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            c => self.error(format!("Unexpected character: {c}")),
        }
    }

    fn string(&mut self) {
        let start_line = self.line;

        while !matches!(self.peek(), Some('"') | None) {
            if self.peek() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.peek().is_none() {
            self.line = start_line;
            self.error("Unterminated string.".to_string());
            return;
        }

        self.advance();

        let value = self.lexeme[1..self.lexeme.len() - 1].to_string();
        self.add_token(Type::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.lexeme.parse().expect("a scanned number lexeme always parses as f64");
        self.add_token(Type::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let r#type = keyword(&self.lexeme).unwrap_or(Type::Identifier);
        self.add_token(r#type, None);
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.next();
        if let Some(c) = c {
            self.lexeme.push(c);
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.source.peek().copied()
    }

    fn peek_next(&mut self) -> Option<char> {
        self.source.peek_nth(1).copied()
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.peek() != Some(expected) {
            return false;
        }
        self.advance();
        true
    }

    fn add_token(&mut self, r#type: Type, literal: Option<Literal>) {
        self.tokens.push(Token::new(r#type, self.lexeme.clone(), literal, self.line));
    }

    fn error(&mut self, message: String) {
        ScanError { line: self.line, message }.report(self.reporter);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, bool) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        (tokens, reporter.had_error())
    }

    #[test]
    fn scans_single_and_double_character_operators() {
        let (tokens, had_error) = scan("!= == <= >=");
        assert!(!had_error);
        let types: Vec<_> = tokens.iter().map(|t| t.r#type).collect();
        assert_eq!(types, vec![Type::BangEqual, Type::EqualEqual, Type::LessEqual, Type::GreaterEqual, Type::EOF]);
    }

    #[test]
    fn scans_a_string_literal() {
        let (tokens, had_error) = scan(r#""hello world""#);
        assert!(!had_error);
        assert_eq!(tokens[0].literal, Some(Literal::String("hello world".to_string())));
    }

    #[test]
    fn scans_an_integer_and_a_decimal_number() {
        let (tokens, _) = scan("123 4.5");
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(4.5)));
    }

    #[test]
    fn line_comments_are_skipped() {
        let (tokens, _) = scan("// a comment\nvar");
        assert_eq!(tokens[0].r#type, Type::Var);
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let (_, had_error) = scan(r#""unterminated"#);
        assert!(had_error);
    }

    #[test]
    fn keywords_are_distinguished_from_identifiers() {
        let (tokens, _) = scan("assert foo");
        assert_eq!(tokens[0].r#type, Type::Assert);
        assert_eq!(tokens[1].r#type, Type::Identifier);
    }

    #[test]
    fn unexpected_character_is_an_error_but_scanning_continues() {
        let (tokens, had_error) = scan("@ var");
        assert!(had_error);
        assert_eq!(tokens[0].r#type, Type::Var);
    }
}
