use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, FunctionLiteral, InfixOperator, PrefixOperator, Program, Statement};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Copy, Clone)]
enum Precedence {
    LOWEST,
    ASSIGN,      // =
    OR,          // ||
    AND,         // &&
    EQUALS,      // == !=
    LessGreater, // > < >= <=
    SUM,         // + -
    PRODUCT,     // * / %
    PREFIX,      // -X, !X
    CALL,
    INDEX,
}

fn get_precedence(token: TokenType) -> Precedence {
    match token {
        TokenType::ASSIGN => Precedence::ASSIGN,
        TokenType::OR => Precedence::OR,
        TokenType::AND => Precedence::AND,
        TokenType::EQ | TokenType::NotEq => Precedence::EQUALS,
        TokenType::LT | TokenType::GT | TokenType::LtEq | TokenType::GtEq => Precedence::LessGreater,
        TokenType::PLUS | TokenType::MINUS => Precedence::SUM,
        TokenType::ASTERISK | TokenType::SLASH | TokenType::PERCENT => Precedence::PRODUCT,
        TokenType::LPAREN => Precedence::CALL,
        TokenType::LBRACKET => Precedence::INDEX,
        _ => Precedence::LOWEST,
    }
}

fn infix_operator(token: TokenType) -> Option<InfixOperator> {
    let op = match token {
        TokenType::PLUS => InfixOperator::Plus,
        TokenType::MINUS => InfixOperator::Minus,
        TokenType::ASTERISK => InfixOperator::Multiply,
        TokenType::SLASH => InfixOperator::Divide,
        TokenType::PERCENT => InfixOperator::Modulo,
        TokenType::LT => InfixOperator::Lt,
        TokenType::GT => InfixOperator::Gt,
        TokenType::LtEq => InfixOperator::LtEq,
        TokenType::GtEq => InfixOperator::GtEq,
        TokenType::EQ => InfixOperator::Eq,
        TokenType::NotEq => InfixOperator::NotEq,
        TokenType::AND => InfixOperator::And,
        TokenType::OR => InfixOperator::Or,
        _ => return None,
    };
    Some(op)
}

/// Pratt parser. Syntax errors are collected rather than returned; check
/// [`Parser::errors`] before evaluating the program.
pub struct Parser {
    l: Lexer,
    errors: Vec<ParseError>,

    cur_token: Token,
    peek_token: Token,
}

impl Parser {
    pub fn new(mut l: Lexer) -> Self {
        let cur_token = l.next_token();
        let peek_token = l.next_token();
        Parser { l, errors: Vec::new(), cur_token, peek_token }
    }

    fn next_token(&mut self) {
        let next = self.l.next_token();
        self.cur_token = std::mem::replace(&mut self.peek_token, next);
    }

    fn cur_token_is(&self, t: TokenType) -> bool {
        self.cur_token.token_type == t
    }

    fn peek_token_is(&self, t: TokenType) -> bool {
        self.peek_token.token_type == t
    }

    fn expect_peek(&mut self, t: TokenType) -> bool {
        if self.peek_token_is(t) {
            self.next_token();
            true
        } else {
            self.peek_error(t);
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.cur_token_is(TokenType::NEWLINE) {
            self.next_token();
        }
    }

    fn skip_peek_newlines(&mut self) {
        while self.peek_token_is(TokenType::NEWLINE) {
            self.next_token();
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn error_at(&mut self, message: String, token: &Token) {
        let err = ParseError::new(message, token);
        tracing::debug!(%err, "recorded parse error");
        self.errors.push(err);
    }

    fn peek_error(&mut self, t: TokenType) {
        let peek = self.peek_token.clone();
        self.error_at(format!("expected next token to be {}, got {} instead", t, peek.token_type), &peek);
    }

    fn no_prefix_fn_error(&mut self) {
        let cur = self.cur_token.clone();
        let message = match cur.token_type {
            TokenType::ILLEGAL => format!("illegal character '{}'", cur.literal),
            t => format!("no prefix parse function for {} found", t),
        };
        self.error_at(message, &cur);
    }

    /// After a statement the next token must end it.
    fn expect_statement_end(&mut self) -> bool {
        match self.peek_token.token_type {
            TokenType::NEWLINE | TokenType::SEMICOLON | TokenType::RBRACE | TokenType::EOF => true,
            t => {
                let peek = self.peek_token.clone();
                self.error_at(format!("expected end of statement, got {} instead", t), &peek);
                false
            }
        }
    }

    /// True when the last recorded error is about the current `}`, which then
    /// still has to close its block.
    fn failed_on_closing_brace(&self) -> bool {
        self.cur_token_is(TokenType::RBRACE)
            && self
                .errors
                .last()
                .is_some_and(|err| (err.line, err.column) == (self.cur_token.line, self.cur_token.column))
    }

    /// Skips to the next statement boundary, stopping short of a closing brace.
    fn synchronize(&mut self) {
        if self.failed_on_closing_brace() {
            return;
        }
        while !self.cur_token_is(TokenType::NEWLINE)
            && !self.cur_token_is(TokenType::SEMICOLON)
            && !self.cur_token_is(TokenType::EOF)
            && !self.peek_token_is(TokenType::RBRACE)
            && !self.peek_token_is(TokenType::EOF)
        {
            self.next_token();
        }
    }

    #[tracing::instrument(level = "trace", skip_all)]
    pub fn parse_program(&mut self) -> Program {
        let mut p = Program::default();

        while !self.cur_token_is(TokenType::EOF) {
            if self.cur_token_is(TokenType::NEWLINE) || self.cur_token_is(TokenType::SEMICOLON) {
                self.next_token();
                continue;
            }
            match self.parse_statement() {
                Some(s) => {
                    p.statements.push(s);
                    if !self.expect_statement_end() {
                        self.synchronize();
                    }
                }
                None => self.synchronize(),
            }
            self.next_token();
        }
        p
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.cur_token.token_type {
            TokenType::LET => self.parse_binding_statement(false),
            TokenType::CONST => self.parse_binding_statement(true),
            TokenType::RETURN => self.parse_return_statement(),
            TokenType::WHILE => self.parse_while_statement(),
            TokenType::FOR => self.parse_for_statement(),
            TokenType::BREAK => Some(Statement::Break),
            TokenType::CONTINUE => Some(Statement::Continue),
            TokenType::LBRACE => {
                if self.brace_starts_map() {
                    self.parse_expression_statement()
                } else {
                    Some(Statement::Block(self.parse_block_statement()?))
                }
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Decides whether a statement-level `{` opens a map literal, which is `{}`
    /// or `{ key: ...`. Parses ahead and then restores the parser state.
    fn brace_starts_map(&mut self) -> bool {
        let (l, cur_token, peek_token, error_count) =
            (self.l.clone(), self.cur_token.clone(), self.peek_token.clone(), self.errors.len());

        self.skip_peek_newlines();
        let is_map = if self.peek_token_is(TokenType::RBRACE) {
            true
        } else {
            self.next_token();
            self.parse_expression(Precedence::LOWEST).is_some() && self.peek_token_is(TokenType::COLON)
        };

        self.l = l;
        self.cur_token = cur_token;
        self.peek_token = peek_token;
        self.errors.truncate(error_count);
        is_map
    }

    fn parse_binding_statement(&mut self, constant: bool) -> Option<Statement> {
        if !self.expect_peek(TokenType::IDENT) {
            return None;
        }
        let name = self.cur_token.literal.clone();

        if !self.expect_peek(TokenType::ASSIGN) {
            return None;
        }
        self.next_token();
        self.skip_newlines();

        let value = self.parse_expression(Precedence::LOWEST)?;

        Some(if constant { Statement::Const { name, value } } else { Statement::Let { name, value } })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        match self.peek_token.token_type {
            TokenType::NEWLINE | TokenType::SEMICOLON | TokenType::RBRACE | TokenType::EOF => {
                return Some(Statement::Return(None))
            }
            _ => {}
        }
        self.next_token();
        let ret_val = self.parse_expression(Precedence::LOWEST)?;
        Some(Statement::Return(Some(ret_val)))
    }

    fn parse_while_statement(&mut self) -> Option<Statement> {
        self.next_token();
        let condition = self.parse_expression(Precedence::LOWEST)?;
        if !self.expect_peek(TokenType::LBRACE) {
            return None;
        }
        let body = self.parse_block_statement()?;
        Some(Statement::While { condition, body })
    }

    fn parse_for_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenType::LPAREN) {
            return None;
        }

        self.next_token();
        let init = if self.cur_token_is(TokenType::SEMICOLON) {
            None
        } else {
            let init = match self.cur_token.token_type {
                TokenType::LET => self.parse_binding_statement(false)?,
                TokenType::CONST => self.parse_binding_statement(true)?,
                _ => self.parse_expression_statement()?,
            };
            if !self.expect_peek(TokenType::SEMICOLON) {
                return None;
            }
            Some(Box::new(init))
        };

        self.next_token();
        let condition = if self.cur_token_is(TokenType::SEMICOLON) {
            None
        } else {
            let condition = self.parse_expression(Precedence::LOWEST)?;
            if !self.expect_peek(TokenType::SEMICOLON) {
                return None;
            }
            Some(condition)
        };

        self.next_token();
        let update = if self.cur_token_is(TokenType::RPAREN) {
            None
        } else {
            let update = self.parse_expression(Precedence::LOWEST)?;
            if !self.expect_peek(TokenType::RPAREN) {
                return None;
            }
            Some(update)
        };

        if !self.expect_peek(TokenType::LBRACE) {
            return None;
        }
        let body = self.parse_block_statement()?;

        Some(Statement::For { init, condition, update, body })
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::LOWEST)?;
        Some(Statement::Expression(expression))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let mut left_exp = match self.cur_token.token_type {
            TokenType::IDENT => self.parse_identifier(),
            TokenType::INT => self.parse_integer_literal(),
            TokenType::STRING => self.parse_string_literal(),
            TokenType::TRUE | TokenType::FALSE => self.parse_boolean(),
            TokenType::NULL => Some(Expression::Null),
            TokenType::MINUS | TokenType::BANG => self.parse_prefix_expression(),
            TokenType::LPAREN => self.parse_grouped_expression(),
            TokenType::LBRACKET => self.parse_array_literal(),
            TokenType::LBRACE => self.parse_map_literal(),
            TokenType::IF => self.parse_if_expression(),
            TokenType::FUNCTION => self.parse_function_literal(),
            _ => {
                self.no_prefix_fn_error();
                None
            }
        }?;

        while !self.peek_token_is(TokenType::SEMICOLON) && precedence < self.peek_precedence() {
            left_exp = match self.peek_token.token_type {
                TokenType::ASSIGN => {
                    self.next_token();
                    self.parse_assign_expression(left_exp)?
                }
                TokenType::LPAREN => {
                    self.next_token();
                    self.parse_call_expression(left_exp)?
                }
                TokenType::LBRACKET => {
                    self.next_token();
                    self.parse_index_expression(left_exp)?
                }
                _ => {
                    self.next_token();
                    self.parse_infix_expression(left_exp)?
                }
            }
        }
        Some(left_exp)
    }

    fn peek_precedence(&self) -> Precedence {
        get_precedence(self.peek_token.token_type)
    }

    fn cur_precedence(&self) -> Precedence {
        get_precedence(self.cur_token.token_type)
    }

    fn parse_identifier(&self) -> Option<Expression> {
        Some(Expression::Identifier {
            name: self.cur_token.literal.clone(),
            position: self.cur_token.position(),
        })
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.cur_token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer(value)),
            Err(_) => {
                let cur = self.cur_token.clone();
                self.error_at(format!("could not parse {} as integer", cur.literal), &cur);
                None
            }
        }
    }

    fn parse_string_literal(&self) -> Option<Expression> {
        Some(Expression::String(unescape(&self.cur_token.literal)))
    }

    fn parse_boolean(&self) -> Option<Expression> {
        Some(Expression::Boolean(self.cur_token_is(TokenType::TRUE)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match self.cur_token.token_type {
            TokenType::BANG => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };
        let position = self.cur_token.position();
        self.next_token();
        let right = self.parse_expression(Precedence::PREFIX)?;
        Some(Expression::Prefix { operator, right: Box::new(right), position })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = match infix_operator(self.cur_token.token_type) {
            Some(op) => op,
            None => {
                self.no_prefix_fn_error();
                return None;
            }
        };
        let position = self.cur_token.position();
        let precedence = self.cur_precedence();
        self.next_token();
        self.skip_newlines();
        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix { operator, left: Box::new(left), right: Box::new(right), position })
    }

    /// `name = value`, right-associative. Only bare identifiers are assignable.
    fn parse_assign_expression(&mut self, target: Expression) -> Option<Expression> {
        let (name, position) = match target {
            Expression::Identifier { name, position } => (name, position),
            other => {
                let cur = self.cur_token.clone();
                self.error_at(format!("invalid assignment target {}", other), &cur);
                return None;
            }
        };
        self.next_token();
        self.skip_newlines();
        let value = self.parse_expression(Precedence::LOWEST)?;
        Some(Expression::Assign { name, value: Box::new(value), position })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();
        self.skip_newlines();
        let exp = self.parse_expression(Precedence::LOWEST)?;
        self.skip_peek_newlines();
        if !self.expect_peek(TokenType::RPAREN) {
            return None;
        }
        Some(exp)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        self.next_token();
        let condition = self.parse_expression(Precedence::LOWEST)?;
        if !self.expect_peek(TokenType::LBRACE) {
            return None;
        }
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token_is(TokenType::ELSE) {
            self.next_token();
            if self.peek_token_is(TokenType::IF) {
                self.next_token();
                let nested = self.parse_if_expression()?;
                Some(BlockStatement { statements: vec![Statement::Expression(nested)] })
            } else {
                if !self.expect_peek(TokenType::LBRACE) {
                    return None;
                }
                Some(self.parse_block_statement()?)
            }
        } else {
            None
        };

        Some(Expression::If { condition: Box::new(condition), consequence, alternative })
    }

    /// Expects the current token to be `{`; leaves it on the matching `}`.
    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let mut block = BlockStatement::default();
        self.next_token();
        while !self.cur_token_is(TokenType::RBRACE) {
            if self.cur_token_is(TokenType::EOF) {
                let cur = self.cur_token.clone();
                self.error_at("expected } to close block".to_string(), &cur);
                return None;
            }
            if self.cur_token_is(TokenType::NEWLINE) || self.cur_token_is(TokenType::SEMICOLON) {
                self.next_token();
                continue;
            }
            match self.parse_statement() {
                Some(st) => {
                    block.statements.push(st);
                    if !self.expect_statement_end() {
                        self.synchronize();
                    }
                }
                None => {
                    self.synchronize();
                    if self.failed_on_closing_brace() {
                        continue;
                    }
                }
            }
            self.next_token();
        }
        Some(block)
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        let name = if self.peek_token_is(TokenType::IDENT) {
            self.next_token();
            Some(self.cur_token.literal.clone())
        } else {
            None
        };

        if !self.expect_peek(TokenType::LPAREN) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenType::LBRACE) {
            return None;
        }
        let body = self.parse_block_statement()?;

        Some(Expression::Function(Rc::new(FunctionLiteral { name, parameters, body })))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut params: Vec<String> = Vec::new();
        self.skip_peek_newlines();
        if self.peek_token_is(TokenType::RPAREN) {
            self.next_token();
            return Some(params);
        }

        loop {
            if !self.expect_peek(TokenType::IDENT) {
                return None;
            }
            let param = self.cur_token.literal.clone();
            if params.contains(&param) {
                let cur = self.cur_token.clone();
                self.error_at(format!("duplicate parameter {}", param), &cur);
                return None;
            }
            params.push(param);

            self.skip_peek_newlines();
            if !self.peek_token_is(TokenType::COMMA) {
                break;
            }
            self.next_token();
            self.skip_peek_newlines();
        }

        if !self.expect_peek(TokenType::RPAREN) {
            return None;
        }
        Some(params)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let position = self.cur_token.position();
        let arguments = self.parse_expression_list(TokenType::RPAREN)?;
        Some(Expression::Call { function: Box::new(function), arguments, position })
    }

    /// Comma separated expressions up to `end`; a trailing comma is accepted.
    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        self.skip_peek_newlines();
        if self.peek_token_is(end) {
            self.next_token();
            return Some(list);
        }
        self.next_token();
        list.push(self.parse_expression(Precedence::LOWEST)?);
        self.skip_peek_newlines();

        while self.peek_token_is(TokenType::COMMA) {
            self.next_token();
            self.skip_peek_newlines();
            if self.peek_token_is(end) {
                break;
            }
            self.next_token();
            list.push(self.parse_expression(Precedence::LOWEST)?);
            self.skip_peek_newlines();
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenType::RBRACKET)?;
        Some(Expression::Array(elements))
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        let position = self.cur_token.position();
        self.next_token();
        self.skip_newlines();
        let index = self.parse_expression(Precedence::LOWEST)?;
        self.skip_peek_newlines();

        if !self.expect_peek(TokenType::RBRACKET) {
            return None;
        }

        Some(Expression::Index { left: Box::new(left), index: Box::new(index), position })
    }

    fn parse_map_literal(&mut self) -> Option<Expression> {
        let position = self.cur_token.position();
        let mut pairs = Vec::new();

        self.skip_peek_newlines();
        while !self.peek_token_is(TokenType::RBRACE) {
            self.next_token();
            let key = self.parse_expression(Precedence::LOWEST)?;
            if !self.expect_peek(TokenType::COLON) {
                return None;
            }

            self.next_token();
            self.skip_newlines();
            let value = self.parse_expression(Precedence::LOWEST)?;
            pairs.push((key, value));

            self.skip_peek_newlines();
            if !self.peek_token_is(TokenType::RBRACE) && !self.expect_peek(TokenType::COMMA) {
                return None;
            }
            self.skip_peek_newlines();
        }

        if !self.expect_peek(TokenType::RBRACE) {
            return None;
        }
        Some(Expression::Map { pairs, position })
    }
}

/// Decodes `\n`, `\t`, `\r`, `\"` and `\\`; other escapes are kept as written.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod test {
    use crate::ast::{Expression, InfixOperator, PrefixOperator, Program, Statement};
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Program {
        let l = Lexer::new(input);
        let mut p = Parser::new(l);
        let program = p.parse_program();
        if !p.errors().is_empty() {
            let messages: Vec<String> = p.errors().iter().map(|e| e.to_string()).collect();
            panic!("parser errors for {:?}:\n{}", input, messages.join("\n"));
        }
        program
    }

    fn parse_errors(input: &str) -> Vec<String> {
        let mut p = Parser::new(Lexer::new(input));
        p.parse_program();
        p.errors().iter().map(|e| e.message.clone()).collect()
    }

    fn single_expression(input: &str) -> Expression {
        let program = parse(input);
        assert_eq!(program.statements.len(), 1, "statements: {}", program);
        match program.statements.into_iter().next() {
            Some(Statement::Expression(exp)) => exp,
            other => panic!("not expression statement: {:?}", other),
        }
    }

    fn is_ident(exp: &Expression, expected: &str) -> bool {
        matches!(exp, Expression::Identifier { name, .. } if name == expected)
    }

    #[test]
    fn test_let_statement() {
        struct Test<'a> {
            input: &'a str,
            exp_identifier: &'a str,
            exp_value: &'a str,
        }
        let tests = vec![
            Test { input: "let x = 5;", exp_identifier: "x", exp_value: "5" },
            Test { input: "let y = true;", exp_identifier: "y", exp_value: "true" },
            Test { input: "let foobar = y", exp_identifier: "foobar", exp_value: "y" },
            Test { input: "let s = \"hi\"\n", exp_identifier: "s", exp_value: "\"hi\"" },
        ];

        for test in tests {
            let program = parse(test.input);
            assert_eq!(program.statements.len(), 1);

            match &program.statements[0] {
                Statement::Let { name, value } => {
                    assert_eq!(name, test.exp_identifier);
                    assert_eq!(value.to_string(), test.exp_value);
                }
                other => panic!("not let statement: {:?}", other),
            }
        }
    }

    #[test]
    fn test_const_statement() {
        let program = parse("const PI = 3");
        assert_eq!(
            program.statements,
            vec![Statement::Const { name: "PI".to_string(), value: Expression::Integer(3) }]
        );
    }

    #[test]
    fn test_return_statement() {
        let tests = vec![
            ("return true;", Some("true")),
            ("return 5", Some("5")),
            ("return foobar;", Some("foobar")),
            ("return", None),
            ("return;", None),
        ];

        for (input, expected) in tests {
            let program = parse(input);
            assert_eq!(program.statements.len(), 1);
            match &program.statements[0] {
                Statement::Return(value) => {
                    assert_eq!(value.as_ref().map(|v| v.to_string()).as_deref(), expected)
                }
                other => panic!("not return statement: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parsing_prefix_expressions() {
        let tests = vec![
            ("!5;", PrefixOperator::Bang, "5"),
            ("-15;", PrefixOperator::Minus, "15"),
            ("!true;", PrefixOperator::Bang, "true"),
        ];

        for (input, exp_operator, exp_value) in tests {
            match single_expression(input) {
                Expression::Prefix { operator, right, .. } => {
                    assert_eq!(operator, exp_operator);
                    assert_eq!(right.to_string(), exp_value);
                }
                other => panic!("not prefix expression: {:?}", other),
            }
        }
    }

    #[test]
    fn test_parsing_infix_expressions() {
        let tests = vec![
            ("5+3;", "5", InfixOperator::Plus, "3"),
            ("5-3;", "5", InfixOperator::Minus, "3"),
            ("5*3;", "5", InfixOperator::Multiply, "3"),
            ("5/3;", "5", InfixOperator::Divide, "3"),
            ("5%3;", "5", InfixOperator::Modulo, "3"),
            ("5<3;", "5", InfixOperator::Lt, "3"),
            ("5>3;", "5", InfixOperator::Gt, "3"),
            ("5<=3;", "5", InfixOperator::LtEq, "3"),
            ("5>=3;", "5", InfixOperator::GtEq, "3"),
            ("5==3;", "5", InfixOperator::Eq, "3"),
            ("5!=3;", "5", InfixOperator::NotEq, "3"),
            ("foo!=bar", "foo", InfixOperator::NotEq, "bar"),
            ("true==bar", "true", InfixOperator::Eq, "bar"),
            ("a && b", "a", InfixOperator::And, "b"),
            ("a || b", "a", InfixOperator::Or, "b"),
        ];

        for (input, exp_left, exp_operator, exp_right) in tests {
            match single_expression(input) {
                Expression::Infix { operator, left, right, .. } => {
                    assert_eq!(operator, exp_operator);
                    assert_eq!(left.to_string(), exp_left);
                    assert_eq!(right.to_string(), exp_right);
                }
                other => panic!("not infix expression: {:?}", other),
            }
        }
    }

    #[test]
    fn test_operator_precedence() {
        struct Test<'a> {
            input: &'a str,
            expected: &'a str,
        }
        let tests = vec![
            Test { input: "-a*b", expected: "((-a) * b)" },
            Test { input: "!-a", expected: "(!(-a))" },
            Test { input: "a+b+c", expected: "((a + b) + c)" },
            Test { input: "a-b*c", expected: "(a - (b * c))" },
            Test { input: "a + b * c + d / e - f", expected: "(((a + (b * c)) + (d / e)) - f)" },
            Test { input: "0 + 4; -5 / 9", expected: "(0 + 4)((-5) / 9)" },
            Test { input: "5 > 4 == 3<4", expected: "((5 > 4) == (3 < 4))" },
            Test { input: "3 + 4 * 5 == 3 * 1 + 4 * 5", expected: "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))" },
            Test { input: "(5 + 5) * 2", expected: "((5 + 5) * 2)" },
            Test { input: "2 / (5 + 5)", expected: "(2 / (5 + 5))" },
            Test { input: "(5 + 5) * 2 * (5 + 5)", expected: "(((5 + 5) * 2) * (5 + 5))" },
            Test { input: "-(5 + 5)", expected: "(-(5 + 5))" },
            Test { input: "!(true == true)", expected: "(!(true == true))" },
            Test { input: "a + add(b * c) + d", expected: "((a + add((b * c))) + d)" },
            Test {
                input: "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                expected: "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            },
            Test { input: "add(a * b[2], b[1], 2 * [1, 2][1])", expected: "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))" },
            Test { input: "a || b && c", expected: "(a || (b && c))" },
            Test { input: "a && b == c", expected: "(a && (b == c))" },
            Test { input: "a <= b % c", expected: "(a <= (b % c))" },
            Test { input: "x = y = 3", expected: "(x = (y = 3))" },
            Test { input: "x = 1 + 2 * 3", expected: "(x = (1 + (2 * 3)))" },
            Test { input: "a = b || c", expected: "(a = (b || c))" },
            Test { input: "-a[0]", expected: "(-(a[0]))" },
            Test { input: "f(1)(2)", expected: "f(1)(2)" },
            Test { input: "1 +\n 2", expected: "(1 + 2)" },
        ];

        for test in tests {
            let program = parse(test.input);
            assert_eq!(program.to_string(), test.expected, "input: {:?}", test.input);
        }
    }

    #[test]
    fn test_if_expression() {
        match single_expression("if (x < y) { x }") {
            Expression::If { condition, consequence, alternative } => {
                assert_eq!(condition.to_string(), "(x < y)");
                assert_eq!(consequence.statements.len(), 1);
                assert_eq!(consequence.to_string(), "x");
                assert!(alternative.is_none());
            }
            other => panic!("not if expression: {:?}", other),
        }

        match single_expression("if x < y { x } else { y }") {
            Expression::If { alternative: Some(alt), .. } => assert_eq!(alt.to_string(), "y"),
            other => panic!("not if/else expression: {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain() {
        let exp = single_expression("if (a) { 1 } else if (b) { 2 } else { 3 }");
        assert_eq!(exp.to_string(), "if a {1} else {if b {2} else {3}}");
    }

    #[test]
    fn test_multiline_block() {
        let exp = single_expression("if (x) {\n  let y = 1\n\n  y; y\n}");
        match exp {
            Expression::If { consequence, .. } => assert_eq!(consequence.statements.len(), 3),
            other => panic!("not if expression: {:?}", other),
        }
    }

    #[test]
    fn test_function_literal() {
        match single_expression("fn(x, y) {x+y;}") {
            Expression::Function(literal) => {
                assert_eq!(literal.name, None);
                assert_eq!(literal.parameters, vec!["x".to_string(), "y".to_string()]);
                assert_eq!(literal.body.to_string(), "(x + y)");
            }
            other => panic!("not function literal: {:?}", other),
        }
    }

    #[test]
    fn test_function_parameters() {
        let tests = vec![("fn() {}", vec![]), ("fn(x) {}", vec!["x"]), ("fn(x,\n y, z) {}", vec!["x", "y", "z"])];

        for (input, expected) in tests {
            match single_expression(input) {
                Expression::Function(literal) => assert_eq!(literal.parameters, expected),
                other => panic!("not function literal: {:?}", other),
            }
        }
    }

    #[test]
    fn test_named_function_literal() {
        match single_expression("fn add(a, b) {\n return a + b\n}") {
            Expression::Function(literal) => {
                assert_eq!(literal.name.as_deref(), Some("add"));
                assert_eq!(literal.to_string(), "fn add(a, b) {return (a + b)}");
            }
            other => panic!("not function literal: {:?}", other),
        }
    }

    #[test]
    fn test_call_expression() {
        match single_expression("add(1, 2*3, 4+a)") {
            Expression::Call { function, arguments, .. } => {
                assert!(is_ident(&function, "add"));
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                assert_eq!(args, vec!["1", "(2 * 3)", "(4 + a)"]);
            }
            other => panic!("not call expression: {:?}", other),
        }
    }

    #[test]
    fn test_assignment_expression() {
        match single_expression("x = 5") {
            Expression::Assign { name, value, position } => {
                assert_eq!(name, "x");
                assert_eq!(*value, Expression::Integer(5));
                assert_eq!((position.line, position.column), (1, 1));
            }
            other => panic!("not assignment: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_targets() {
        assert_eq!(parse_errors("a[0] = 1"), vec!["invalid assignment target (a[0])".to_string()]);
        assert_eq!(parse_errors("1 = 2"), vec!["invalid assignment target 1".to_string()]);
    }

    #[test]
    fn test_while_statement() {
        let program = parse("while (x < 5) {\n x = x + 1\n}");
        match &program.statements[..] {
            [Statement::While { condition, body }] => {
                assert_eq!(condition.to_string(), "(x < 5)");
                assert_eq!(body.to_string(), "(x = (x + 1))");
            }
            other => panic!("not while statement: {:?}", other),
        }
    }

    #[test]
    fn test_for_statement() {
        let program = parse("for (let i = 0; i < 10; i = i + 1) { sum = sum + i }");
        assert_eq!(program.to_string(), "for (let i = 0; (i < 10); (i = (i + 1))) {(sum = (sum + i))}");

        let program = parse("for (;;) { break }");
        match &program.statements[..] {
            [Statement::For { init: None, condition: None, update: None, body }] => {
                assert_eq!(body.statements, vec![Statement::Break]);
            }
            other => panic!("not bare for statement: {:?}", other),
        }

        let program = parse("for (i = 0; ; ) { continue }");
        assert_eq!(program.to_string(), "for ((i = 0); ; ) {continue}");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(single_expression("\"hello world\""), Expression::String("hello world".to_string()));
        assert_eq!(
            single_expression(r#""line\nnext \"quoted\" \q""#),
            Expression::String("line\nnext \"quoted\" \\q".to_string())
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(single_expression("null"), Expression::Null);
        assert_eq!(single_expression("false"), Expression::Boolean(false));
        assert_eq!(single_expression("9223372036854775807"), Expression::Integer(i64::MAX));
    }

    #[test]
    fn test_array_literal() {
        match single_expression("[1, a+2]") {
            Expression::Array(v) => {
                assert_eq!(v.len(), 2);
                assert_eq!(v[0], Expression::Integer(1));
                assert_eq!(v[1].to_string(), "(a + 2)");
            }
            other => panic!("not array literal: {:?}", other),
        }
        assert_eq!(single_expression("[\n 1,\n 2,\n]").to_string(), "[1, 2]");
        assert_eq!(single_expression("[]"), Expression::Array(vec![]));
    }

    #[test]
    fn test_index_expression() {
        match single_expression("myArray[a+2]") {
            Expression::Index { left, index, .. } => {
                assert!(is_ident(&left, "myArray"));
                assert_eq!(index.to_string(), "(a + 2)");
            }
            other => panic!("not index expression: {:?}", other),
        }
    }

    #[test]
    fn test_map_literal() {
        match single_expression(r#"{"one": 1, "two": 1 + 1}"#) {
            Expression::Map { pairs, .. } => {
                let rendered: Vec<(String, String)> =
                    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
                assert_eq!(
                    rendered,
                    vec![
                        ("\"one\"".to_string(), "1".to_string()),
                        ("\"two\"".to_string(), "(1 + 1)".to_string())
                    ]
                );
            }
            other => panic!("not map literal: {:?}", other),
        }
        assert!(matches!(single_expression("{}"), Expression::Map { pairs, .. } if pairs.is_empty()));
        assert!(matches!(single_expression("{\n}"), Expression::Map { .. }));
        assert!(matches!(single_expression("{a: 1}[a]"), Expression::Index { .. }));
        assert_eq!(single_expression("{\n 1: true,\n 2: false\n}").to_string(), "{1: true, 2: false}");
    }

    #[test]
    fn test_block_statement() {
        let program = parse("let a = 1; { let a = 2; }; a");
        assert_eq!(program.statements.len(), 3);
        assert!(matches!(&program.statements[1], Statement::Block(block) if block.statements.len() == 1));
        assert_eq!(program.to_string(), "let a = 1{let a = 2}a");

        let program = parse("{\n  x\n  y = x + 1\n}\n{ {} }");
        assert_eq!(program.statements[0].to_string(), "{x; (y = (x + 1))}");
        assert_eq!(program.statements[1].to_string(), "{{}}");
    }

    #[test]
    fn test_statements_split_by_newlines() {
        let program = parse("let a = 1\nlet b = 2\n\na + b");
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_parse_errors_are_collected() {
        let mut p = Parser::new(Lexer::new("let = 5\nlet y 3\nlet z = 10"));
        let program = p.parse_program();

        let errors = p.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "expected next token to be IDENT, got = instead");
        assert_eq!((errors[0].line, errors[0].column), (1, 5));
        assert_eq!(errors[0].token, "=");
        assert_eq!(errors[1].message, "expected next token to be =, got INT instead");
        assert_eq!(errors[1].line, 2);

        assert_eq!(program.to_string(), "let z = 10");
    }

    #[test]
    fn test_error_recovery_inside_block() {
        let mut p = Parser::new(Lexer::new("let f = fn() {\n let = 1\n 2\n}\nf"));
        let program = p.parse_program();
        assert_eq!(p.errors().len(), 1);
        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.statements[0].to_string(), "let f = fn() {2}");
    }

    #[test]
    fn test_misc_parse_errors() {
        assert_eq!(parse_errors("5 6"), vec!["expected end of statement, got INT instead".to_string()]);
        assert_eq!(parse_errors("a & b"), vec!["expected end of statement, got ILLEGAL instead".to_string()]);
        assert_eq!(parse_errors("& b"), vec!["illegal character '&'".to_string()]);
        assert_eq!(parse_errors(")"), vec!["no prefix parse function for ) found".to_string()]);
        assert_eq!(
            parse_errors("99999999999999999999"),
            vec!["could not parse 99999999999999999999 as integer".to_string()]
        );
        assert_eq!(parse_errors("fn(a, a) {}")[0], "duplicate parameter a");
        assert_eq!(parse_errors("if (x) { 1"), vec!["expected } to close block".to_string()]);
        assert_eq!(parse_errors("if (true) { 1 + }"), vec!["no prefix parse function for } found".to_string()]);
        assert_eq!(parse_errors("{ let = 1 }"), vec!["expected next token to be IDENT, got = instead".to_string()]);
    }
}
