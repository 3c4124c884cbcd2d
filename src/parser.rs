use std::rc::Rc;

use crate::error::{Diagnostic, ErrorReporter, ParseError};
use crate::expr::Expr;
use crate::object::Object;
use crate::stmt::{ClassDecl, FunctionDecl, Stmt};
use crate::token::{Literal, Token, Type};

const MAX_ARGUMENTS: usize = 255;

/// Recursive-descent parser producing a tagged-variant AST from a flat
/// token stream. Precedence is encoded by call order, loosest-binding
/// first: assignment, or, and, equality, comparison, term, factor, unary,
/// call, primary.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'r> Parser<'r> {
    pub fn new(tokens: Vec<Token>, reporter: &'r mut ErrorReporter) -> Self {
        Parser { tokens, current: 0, reporter }
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(error) => {
                    error.report(self.reporter);
                    self.synchronize();
                }
            }
        }
        statements
    }

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.match_token(&[Type::Class]) {
            return self.class_declaration();
        }
        if self.match_token(&[Type::Fun]) {
            return self.function_declaration("function");
        }
        if self.match_token(&[Type::Var]) {
            return self.var_declaration();
        }
        self.statement()
    }

    fn class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(Type::Identifier, "Expect class name.")?;

        let superclass = if self.match_token(&[Type::Less]) {
            self.consume(Type::Identifier, "Expect superclass name.")?;
            Some(Expr::variable(self.previous().clone()))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            let Stmt::Function(method) = self.function_declaration("method")? else {
                unreachable!("function_declaration always returns Stmt::Function");
            };
            methods.push(method);
        }

        self.consume(Type::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(Rc::new(ClassDecl { name, superclass, methods })))
    }

    fn function_declaration(&mut self, kind: &str) -> Result<Stmt, ParseError> {
        let name = self.consume(Type::Identifier, &format!("Expect {kind} name."))?;
        self.consume(Type::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= MAX_ARGUMENTS {
                    return Err(self.error(self.peek().clone(), "Can't have more than 255 parameters."));
                }
                params.push(self.consume(Type::Identifier, "Expect parameter name.")?);
                if !self.match_token(&[Type::Comma]) {
                    break;
                }
            }
        }
        self.consume(Type::RightParen, "Expect ')' after parameters.")?;

        self.consume(Type::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(Type::Identifier, "Expect variable name.")?;
        let initializer = if self.match_token(&[Type::Equal]) { Some(self.expression()?) } else { None };
        self.consume(Type::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(name, initializer))
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.match_token(&[Type::Print]) {
            return self.print_statement();
        }
        if self.match_token(&[Type::Assert]) {
            return self.assert_statement();
        }
        if self.match_token(&[Type::Return]) {
            return self.return_statement();
        }
        if self.match_token(&[Type::If]) {
            return self.if_statement();
        }
        if self.match_token(&[Type::While]) {
            return self.while_statement();
        }
        if self.match_token(&[Type::For]) {
            return self.for_statement();
        }
        if self.match_token(&[Type::LeftBrace]) {
            return Ok(Stmt::Block(self.block()?));
        }
        self.expression_statement()
    }

    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn assert_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        let value = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Assert(keyword, value))
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous().clone();
        let value = if self.check(Type::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(Type::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(keyword, value))
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch =
            if self.match_token(&[Type::Else]) { Some(Box::new(self.statement()?)) } else { None };

        Ok(Stmt::If(condition, then_branch, else_branch))
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(condition, body))
    }

    /// Desugars `for (init; cond; incr) body` into a `while` wrapped in the
    /// blocks needed to scope `init` and to run `incr` after each iteration.
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_token(&[Type::Semicolon]) {
            None
        } else if self.match_token(&[Type::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition =
            if self.check(Type::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(Type::Semicolon, "Expect ';' after loop condition.")?;

        let increment =
            if self.check(Type::RightParen) { None } else { Some(self.expression()?) };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal(Object::Bool(true)));
        body = Stmt::While(condition, Box::new(body));

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(Type::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or()?;

        if self.match_token(&[Type::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return Ok(match expr {
                Expr::Variable(name, _) => Expr::assign(name, value),
                Expr::Get(object, name) => Expr::Set(object, name, Box::new(value)),
                _ => {
                    self.error(equals, "Invalid assignment target.").report(self.reporter);
                    expr
                }
            });
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and()?;
        while self.match_token(&[Type::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;
        while self.match_token(&[Type::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;
        while self.match_token(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;
        while self.match_token(&[Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;
        while self.match_token(&[Type::Minus, Type::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while self.match_token(&[Type::Slash, Type::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary(Box::new(expr), operator, Box::new(right));
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&[Type::Bang, Type::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary(operator, Box::new(right)));
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&[Type::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_token(&[Type::Dot]) {
                let name = self.consume(Type::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get(Box::new(expr), name);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    return Err(self.error(self.peek().clone(), "Can't have more than 255 arguments."));
                }
                arguments.push(self.expression()?);
                if !self.match_token(&[Type::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(Type::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::Call(Box::new(callee), paren, arguments))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&[Type::False]) {
            return Ok(Expr::Literal(Object::Bool(false)));
        }
        if self.match_token(&[Type::True]) {
            return Ok(Expr::Literal(Object::Bool(true)));
        }
        if self.match_token(&[Type::Nil]) {
            return Ok(Expr::Literal(Object::Nil));
        }
        if self.match_token(&[Type::Number, Type::String]) {
            return Ok(Expr::Literal(match self.previous().literal.clone() {
                Some(Literal::Number(n)) => Object::Number(n),
                Some(Literal::String(s)) => Object::String(s),
                None => unreachable!("Number/String tokens always carry a literal"),
            }));
        }
        if self.match_token(&[Type::Super]) {
            let keyword = self.previous().clone();
            self.consume(Type::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Type::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::super_(keyword, method));
        }
        if self.match_token(&[Type::This]) {
            return Ok(Expr::this(self.previous().clone()));
        }
        if self.match_token(&[Type::Identifier]) {
            return Ok(Expr::variable(self.previous().clone()));
        }
        if self.match_token(&[Type::LeftParen]) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error(self.peek().clone(), "Expect expression."))
    }

    fn match_token(&mut self, types: &[Type]) -> bool {
        if types.iter().any(|t| self.check(*t)) {
            self.advance();
            return true;
        }
        false
    }

    fn check(&self, r#type: Type) -> bool {
        !self.is_at_end() && self.peek().r#type == r#type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().r#type == Type::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, r#type: Type, message: &str) -> Result<Token, ParseError> {
        if self.check(r#type) {
            return Ok(self.advance().clone());
        }
        Err(self.error(self.peek().clone(), message))
    }

    fn error(&self, token: Token, message: &str) -> ParseError {
        ParseError { token, message: message.to_string() }
    }

    /// Discards tokens until a likely statement boundary, so one parse
    /// error doesn't cascade into a wall of spurious follow-on errors.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().r#type == Type::Semicolon {
                return;
            }
            match self.peek().r#type {
                Type::Class
                | Type::Fun
                | Type::Var
                | Type::For
                | Type::If
                | Type::While
                | Type::Print
                | Type::Assert
                | Type::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, bool) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens, &mut reporter).parse();
        (statements, reporter.had_error())
    }

    #[test]
    fn parses_arithmetic_with_correct_precedence() {
        let (statements, had_error) = parse("1 + 2 * 3;");
        assert!(!had_error);
        assert_eq!(statements.len(), 1);
        match &statements[0] {
            Stmt::Expression(Expr::Binary(_, operator, _)) => assert_eq!(operator.r#type, Type::Plus),
            other => panic!("expected a top-level Plus binary, got {other:?}"),
        }
    }

    #[test]
    fn for_loop_desugars_to_a_block_containing_a_while() {
        let (statements, had_error) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!had_error);
        assert!(matches!(statements[0], Stmt::Block(_)));
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        let (_, had_error) = parse("1 = 2;");
        assert!(had_error);
    }

    #[test]
    fn invalid_assignment_target_does_not_abort_the_statement() {
        // An invalid l-value still yields an expression, so parsing falls
        // through to `Ok` instead of a fatal `ParseError` that would make
        // `synchronize()` swallow the rest of the for-header.
        let (statements, had_error) = parse("for (1 = 2; true; i = i + 1) print i;");
        assert!(had_error);
        assert!(matches!(statements[0], Stmt::Block(_)));
    }

    #[test]
    fn max_parameters_is_accepted_and_one_more_is_reported() {
        let params = (0..255).map(|i| format!("p{i}")).collect::<Vec<_>>().join(", ");
        let (_, had_error) = parse(&format!("fun f({params}) {{}}"));
        assert!(!had_error);

        let params = (0..256).map(|i| format!("p{i}")).collect::<Vec<_>>().join(", ");
        let (_, had_error) = parse(&format!("fun f({params}) {{}}"));
        assert!(had_error);
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let (_, had_error) = parse("print 1");
        assert!(had_error);
    }

    #[test]
    fn class_with_superclass_parses() {
        let (statements, had_error) = parse("class A {} class B < A { init() {} }");
        assert!(!had_error);
        assert_eq!(statements.len(), 2);
    }
}
