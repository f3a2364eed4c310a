use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;
use std::string::String;

use crate::token::Position;

/// Entry point for the evaluator: any tree node, borrowed.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Block(&'a BlockStatement),
    Statement(&'a Statement),
    Expression(&'a Expression),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for stmt in self.statements.iter() {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

/// Brace-delimited statement list: the body of `if`, `fn`, `while` and `for`,
/// or a bare block statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let body = self
            .statements
            .iter()
            .map(|stmt| stmt.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: String, value: Expression },
    Const { name: String, value: Expression },
    Return(Option<Expression>),
    While { condition: Expression, body: BlockStatement },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: BlockStatement,
    },
    Break,
    Continue,
    Block(BlockStatement),
    Expression(Expression),
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {}", name, value),
            Statement::Const { name, value } => write!(f, "const {} = {}", name, value),
            Statement::Return(None) => write!(f, "return"),
            Statement::Return(Some(value)) => write!(f, "return {}", value),
            Statement::While { condition, body } => write!(f, "while {} {{{}}}", condition, body),
            Statement::For { init, condition, update, body } => {
                let clause = |c: Option<String>| c.unwrap_or_default();
                write!(
                    f,
                    "for ({}; {}; {}) {{{}}}",
                    clause(init.as_ref().map(|s| s.to_string())),
                    clause(condition.as_ref().map(|c| c.to_string())),
                    clause(update.as_ref().map(|u| u.to_string())),
                    body
                )
            }
            Statement::Break => write!(f, "break"),
            Statement::Continue => write!(f, "continue"),
            Statement::Block(block) => write!(f, "{{{}}}", block),
            Statement::Expression(exp) => write!(f, "{}", exp),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Bang => write!(f, "!"),
            PrefixOperator::Minus => write!(f, "-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Modulo => "%",
            InfixOperator::Lt => "<",
            InfixOperator::Gt => ">",
            InfixOperator::LtEq => "<=",
            InfixOperator::GtEq => ">=",
            InfixOperator::Eq => "==",
            InfixOperator::NotEq => "!=",
            InfixOperator::And => "&&",
            InfixOperator::Or => "||",
        };
        write!(f, "{}", op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub parameters: Vec<String>,
    pub body: BlockStatement,
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fn{}({}) {{{}}}",
            self.name.as_ref().map(|n| format!(" {}", n)).unwrap_or_default(),
            self.parameters.join(", "),
            self.body
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier { name: String, position: Position },
    Boolean(bool),
    Integer(i64),
    String(String),
    Null,
    Array(Vec<Expression>),
    /// Key/value pairs in source order; `position` is the opening brace.
    Map {
        pairs: Vec<(Expression, Expression)>,
        position: Position,
    },
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
        position: Position,
    },
    Infix {
        operator: InfixOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        position: Position,
    },
    Assign {
        name: String,
        value: Box<Expression>,
        position: Position,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function(Rc<FunctionLiteral>),
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
        position: Position,
    },
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
        position: Position,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier { name, .. } => write!(f, "{}", name),
            Expression::Boolean(b) => write!(f, "{}", b),
            Expression::Integer(int) => write!(f, "{}", int),
            Expression::String(st) => write!(f, "{:?}", st),
            Expression::Null => write!(f, "null"),
            Expression::Array(exps) => {
                write!(f, "[{}]", exps.iter().map(|exp| exp.to_string()).collect::<Vec<_>>().join(", "))
            }
            Expression::Map { pairs, .. } => {
                write!(
                    f,
                    "{{{}}}",
                    pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect::<Vec<_>>().join(", ")
                )
            }
            Expression::Prefix { operator, right, .. } => write!(f, "({}{})", operator, right),
            Expression::Infix { operator, left, right, .. } => write!(f, "({} {} {})", left, operator, right),
            Expression::Assign { name, value, .. } => write!(f, "({} = {})", name, value),
            Expression::If { condition, consequence, alternative } => {
                write!(f, "if {} {{{}}}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {{{}}}", alt)?;
                }
                Ok(())
            }
            Expression::Function(literal) => write!(f, "{}", literal),
            Expression::Call { function, arguments, .. } => {
                write!(
                    f,
                    "{}({})",
                    function,
                    arguments.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(", ")
                )
            }
            Expression::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
        }
    }
}
