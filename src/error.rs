use std::fmt;

use thiserror::Error;

use crate::token::{Position, Token};

/// A syntax error recorded by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error [line {line}, column {column}] near '{token}': {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub token: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>, token: &Token) -> Self {
        ParseError {
            message: message.into(),
            line: token.line,
            column: token.column,
            token: token.literal.escape_debug().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("cannot reassign constant '{0}'")]
    ConstReassignment(String),
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        left: &'static str,
        operator: String,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("not a function: {0}")]
    NotAFunction(&'static str),
    #[error("unusable as map key: {0}")]
    UnhashableKey(&'static str),
    #[error("index operator not supported: {0}")]
    NotIndexable(&'static str),
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
    #[error("wrong number of arguments to {name}: want {want}, got {got}")]
    WrongArgCount {
        name: &'static str,
        want: String,
        got: usize,
    },
    #[error("{0}")]
    Builtin(String),
}

/// A runtime error, positioned at the innermost node that raised it when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub position: Option<Position>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        RuntimeError { kind, position: None }
    }

    /// Attaches `position` unless a more precise one is already set.
    pub fn at(mut self, position: Position) -> Self {
        self.position.get_or_insert(position);
        self
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        RuntimeError::new(kind)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(f, "error [{}]: {}", position, self.kind),
            None => write!(f, "error: {}", self.kind),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Everything that can stop a script run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("'{0}' outside of a loop")]
    UnexpectedSignal(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
}
