use super::token::{look_up_ident, Position, Token, TokenType};

/// Byte-oriented scanner producing one token per `next_token` call.
#[derive(Clone)]
pub struct Lexer {
    input: String,
    position: usize,
    read_position: usize,
    ch: u8,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut l = Lexer {
            input: input.to_string(),
            position: 0,
            read_position: 0,
            ch: 0,
            line: 1,
            column: 0,
        };
        l.read_char();
        l
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_white_space();

        let position = Position::new(self.line, self.column);

        let tok = match self.ch {
            b'=' => self.either(b'=', TokenType::EQ, TokenType::ASSIGN, position),
            b'!' => self.either(b'=', TokenType::NotEq, TokenType::BANG, position),
            b'<' => self.either(b'=', TokenType::LtEq, TokenType::LT, position),
            b'>' => self.either(b'=', TokenType::GtEq, TokenType::GT, position),
            b'&' => self.either(b'&', TokenType::AND, TokenType::ILLEGAL, position),
            b'|' => self.either(b'|', TokenType::OR, TokenType::ILLEGAL, position),
            b'+' => self.single(TokenType::PLUS, position),
            b'-' => self.single(TokenType::MINUS, position),
            b'*' => self.single(TokenType::ASTERISK, position),
            b'/' => self.single(TokenType::SLASH, position),
            b'%' => self.single(TokenType::PERCENT, position),
            b';' => self.single(TokenType::SEMICOLON, position),
            b':' => self.single(TokenType::COLON, position),
            b',' => self.single(TokenType::COMMA, position),
            b'{' => self.single(TokenType::LBRACE, position),
            b'}' => self.single(TokenType::RBRACE, position),
            b'(' => self.single(TokenType::LPAREN, position),
            b')' => self.single(TokenType::RPAREN, position),
            b'[' => self.single(TokenType::LBRACKET, position),
            b']' => self.single(TokenType::RBRACKET, position),
            b'\n' => self.single(TokenType::NEWLINE, position),
            b'"' => {
                let literal = self.read_string();
                return Token::new(TokenType::STRING, literal, position);
            }
            b'#' => {
                self.skip_comment();
                return self.next_token();
            }
            0 if self.at_end() => return Token::new(TokenType::EOF, "", position),
            ch if is_letter(ch) => {
                let literal = self.read_identifier();
                return Token::new(look_up_ident(&literal), literal, position);
            }
            ch if is_digit(ch) => {
                let literal = self.read_number();
                return Token::new(TokenType::INT, literal, position);
            }
            _ => return self.read_illegal(position),
        };
        self.read_char();

        tok
    }

    fn at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn skip_white_space(&mut self) {
        while self.ch == b' ' || self.ch == b'\t' || self.ch == b'\r' {
            self.read_char();
        }
    }

    fn skip_comment(&mut self) {
        while self.ch != b'\n' && !self.at_end() {
            self.read_char();
        }
    }

    fn read_char(&mut self) {
        if self.ch == b'\n' {
            self.line += 1;
            self.column = 0;
        }
        self.ch = self.input.as_bytes().get(self.read_position).copied().unwrap_or(0);
        self.position = self.read_position;
        self.read_position += 1;
        self.column += 1;
    }

    fn peek_char(&self) -> u8 {
        self.input.as_bytes().get(self.read_position).copied().unwrap_or(0)
    }

    /// Two-byte token if the next byte is `second`, otherwise the one-byte fallback.
    /// Leaves `ch` on the last byte of the token.
    fn either(&mut self, second: u8, double: TokenType, fallback: TokenType, position: Position) -> Token {
        if self.peek_char() == second {
            let start = self.position;
            self.read_char();
            Token::new(double, &self.input[start..=self.position], position)
        } else {
            self.single(fallback, position)
        }
    }

    fn single(&self, token_type: TokenType, position: Position) -> Token {
        Token::new(token_type, char::from(self.ch).to_string(), position)
    }

    fn read_identifier(&mut self) -> String {
        let position = self.position;
        while is_letter(self.ch) || is_digit(self.ch) {
            self.read_char();
        }
        self.input[position..self.position].to_string()
    }

    fn read_number(&mut self) -> String {
        let position = self.position;
        while is_digit(self.ch) {
            self.read_char();
        }
        self.input[position..self.position].to_string()
    }

    /// Raw string contents; escapes are kept as written.
    fn read_string(&mut self) -> String {
        let position = self.position + 1;
        loop {
            self.read_char();
            if self.at_end() || self.ch == b'"' {
                break;
            }
            if self.ch == b'\\' && self.read_position < self.input.len() {
                self.read_char();
            }
        }
        let literal = self.input.get(position..self.position).unwrap_or_default().to_string();
        if !self.at_end() {
            self.read_char();
        }
        literal
    }

    fn read_illegal(&mut self, position: Position) -> Token {
        let ch = self
            .input
            .get(self.position..)
            .and_then(|rest| rest.chars().next())
            .unwrap_or(char::from(self.ch));
        for _ in 0..ch.len_utf8() {
            self.read_char();
        }
        Token::new(TokenType::ILLEGAL, ch.to_string(), position)
    }
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_digit(ch: u8) -> bool {
    ch.is_ascii_digit()
}
