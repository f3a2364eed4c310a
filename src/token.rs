use std::fmt;
use std::fmt::Formatter;

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Clone, Copy, Hash)]
pub enum TokenType {
    ILLEGAL,
    EOF,

    IDENT,
    INT,
    STRING,

    ASSIGN,
    PLUS,
    MINUS,
    BANG, // !
    ASTERISK,
    SLASH,
    PERCENT,

    LT,
    GT,
    LtEq,
    GtEq,
    EQ,
    NotEq,

    AND, // &&
    OR,  // ||

    COMMA,
    SEMICOLON,
    COLON,
    NEWLINE,

    LPAREN,   // (
    RPAREN,   // )
    LBRACE,   // {
    RBRACE,   // }
    LBRACKET, // [
    RBRACKET, // ]

    // keywords
    FUNCTION, // fn
    LET,      // let
    CONST,    // const
    TRUE,     // true
    FALSE,    // false
    NULL,     // null
    IF,       // if
    ELSE,     // else
    WHILE,    // while
    FOR,      // for
    BREAK,    // break
    CONTINUE, // continue
    RETURN,   // return
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                TokenType::ILLEGAL => "ILLEGAL",
                TokenType::EOF => "EOF",
                TokenType::IDENT => "IDENT",
                TokenType::INT => "INT",
                TokenType::STRING => "STRING",
                TokenType::ASSIGN => "=",
                TokenType::PLUS => "+",
                TokenType::MINUS => "-",
                TokenType::BANG => "!",
                TokenType::ASTERISK => "*",
                TokenType::SLASH => "/",
                TokenType::PERCENT => "%",
                TokenType::LT => "<",
                TokenType::GT => ">",
                TokenType::LtEq => "<=",
                TokenType::GtEq => ">=",
                TokenType::EQ => "==",
                TokenType::NotEq => "!=",
                TokenType::AND => "&&",
                TokenType::OR => "||",
                TokenType::COMMA => ",",
                TokenType::SEMICOLON => ";",
                TokenType::COLON => ":",
                TokenType::NEWLINE => "NEWLINE",
                TokenType::LPAREN => "(",
                TokenType::RPAREN => ")",
                TokenType::LBRACE => "{",
                TokenType::RBRACE => "}",
                TokenType::LBRACKET => "[",
                TokenType::RBRACKET => "]",
                TokenType::FUNCTION => "FUNCTION",
                TokenType::LET => "LET",
                TokenType::CONST => "CONST",
                TokenType::TRUE => "TRUE",
                TokenType::FALSE => "FALSE",
                TokenType::NULL => "NULL",
                TokenType::IF => "IF",
                TokenType::ELSE => "ELSE",
                TokenType::WHILE => "WHILE",
                TokenType::FOR => "FOR",
                TokenType::BREAK => "BREAK",
                TokenType::CONTINUE => "CONTINUE",
                TokenType::RETURN => "RETURN",
            }
        )
    }
}

/// Source location of a token, 1-based.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Clone, Copy, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, literal: impl Into<String>, position: Position) -> Self {
        Token {
            token_type,
            literal: literal.into(),
            line: position.line,
            column: position.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}: {}}}", self.token_type, self.literal.escape_debug())
    }
}

pub fn look_up_ident(ident: &str) -> TokenType {
    match ident {
        "fn" => TokenType::FUNCTION,
        "let" => TokenType::LET,
        "const" => TokenType::CONST,
        "true" => TokenType::TRUE,
        "false" => TokenType::FALSE,
        "null" => TokenType::NULL,
        "if" => TokenType::IF,
        "else" => TokenType::ELSE,
        "while" => TokenType::WHILE,
        "for" => TokenType::FOR,
        "break" => TokenType::BREAK,
        "continue" => TokenType::CONTINUE,
        "return" => TokenType::RETURN,
        _ => TokenType::IDENT,
    }
}
