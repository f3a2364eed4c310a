//! Scanner, Pratt parser and tree-walking evaluator for the sasak scripting
//! language.

use std::sync::Once;

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod error;
pub mod object;
pub mod environment;
pub mod builtin;
pub mod evaluator;
pub mod repl;

use crate::ast::Node;
use crate::environment::Environment;
use crate::error::Error;
use crate::evaluator::Evaluator;
use crate::lexer::Lexer;
use crate::object::{Object, Signal};
use crate::parser::Parser;

static TRACING_INIT: Once = Once::new();

/// Installs a stderr subscriber filtered by `RUST_LOG`. Does nothing when the
/// variable is unset; later calls are no-ops.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Parses and evaluates `source` in a fresh environment.
pub fn run_source(source: &str) -> Result<Object, Error> {
    let mut p = Parser::new(Lexer::new(source));
    let program = p.parse_program();
    if !p.errors().is_empty() {
        return Err(Error::Parse(p.errors().to_vec()));
    }

    let env = Environment::new();
    match Evaluator::new().eval(Node::Program(&program), &env) {
        Ok(obj) | Err(Signal::Return(obj)) => Ok(obj),
        Err(Signal::Error(err)) => Err(Error::Runtime(err)),
        Err(Signal::Break) => Err(Error::UnexpectedSignal("break")),
        Err(Signal::Continue) => Err(Error::UnexpectedSignal("continue")),
    }
}
