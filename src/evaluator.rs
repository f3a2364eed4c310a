use std::rc::Rc;

use crate::ast::{BlockStatement, Expression, InfixOperator, Node, PrefixOperator, Program, Statement};
use crate::builtin::BuiltinTable;
use crate::environment::{Env, Environment};
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::object::{EvalResult, Function, MapPair, MapPairs, Object, Signal};
use crate::token::Position;

/// Tree-walking evaluator. All scope state lives in the [`Env`] handed to
/// each call, so one evaluator can serve any number of environments.
#[derive(Debug, Clone)]
pub struct Evaluator {
    builtins: BuiltinTable,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_builtins(BuiltinTable::standard())
    }

    pub fn with_builtins(builtins: BuiltinTable) -> Self {
        Self { builtins }
    }

    pub fn eval(&self, node: Node, env: &Env) -> EvalResult {
        match node {
            Node::Program(program) => self.eval_program(program, env),
            Node::Block(block) => self.eval_block_statement(block, env),
            Node::Statement(stmt) => self.eval_statement(stmt, env),
            Node::Expression(exp) => self.eval_expression(exp, env),
        }
    }

    /// Runs a whole program. A top-level `return` ends the run with its value;
    /// `break`, `continue` and errors are handed back to the caller.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn eval_program(&self, program: &Program, env: &Env) -> EvalResult {
        let mut result = Object::Null;

        for stmt in program.statements.iter() {
            result = match self.eval_statement(stmt, env) {
                Ok(value) => value,
                Err(Signal::Return(value)) => return Ok(value),
                Err(Signal::Error(err)) => {
                    tracing::debug!(%err, "runtime error");
                    return Err(Signal::Error(err));
                }
                Err(signal) => return Err(signal),
            };
        }
        Ok(result)
    }

    fn eval_block_statement(&self, block: &BlockStatement, env: &Env) -> EvalResult {
        let mut result = Object::Null;

        for stmt in block.statements.iter() {
            result = self.eval_statement(stmt, env)?;
        }
        Ok(result)
    }

    fn eval_statement(&self, stmt: &Statement, env: &Env) -> EvalResult {
        match stmt {
            Statement::Let { name, value } => {
                let val = self.eval_expression(value, env)?;
                env.borrow_mut().set(name.clone(), val.clone());
                Ok(val)
            }
            Statement::Const { name, value } => {
                let val = self.eval_expression(value, env)?;
                env.borrow_mut().set_const(name.clone(), val.clone());
                Ok(val)
            }
            Statement::Return(None) => Err(Signal::Return(Object::Null)),
            Statement::Return(Some(value)) => {
                let val = self.eval_expression(value, env)?;
                Err(Signal::Return(val))
            }
            Statement::While { condition, body } => self.eval_while_statement(condition, body, env),
            Statement::For { init, condition, update, body } => {
                self.eval_for_statement(init.as_deref(), condition.as_ref(), update.as_ref(), body, env)
            }
            Statement::Break => Err(Signal::Break),
            Statement::Continue => Err(Signal::Continue),
            // a bare block keeps its own `let` bindings; assignment still reaches outward
            Statement::Block(block) => self.eval_block_statement(block, &Environment::enclosed(Rc::clone(env))),
            Statement::Expression(exp) => self.eval_expression(exp, env),
        }
    }

    fn eval_while_statement(&self, condition: &Expression, body: &BlockStatement, env: &Env) -> EvalResult {
        let mut result = Object::Null;

        loop {
            if !self.eval_expression(condition, env)?.is_truthy() {
                break;
            }
            tracing::trace!("while iteration");

            match self.eval_block_statement(body, env) {
                Ok(value) => result = value,
                Err(Signal::Break) => return Ok(Object::Null),
                Err(Signal::Continue) => continue,
                Err(signal) => return Err(signal),
            }
        }
        Ok(result)
    }

    /// The loop gets its own frame holding the init bindings; the body shares it.
    fn eval_for_statement(
        &self,
        init: Option<&Statement>,
        condition: Option<&Expression>,
        update: Option<&Expression>,
        body: &BlockStatement,
        env: &Env,
    ) -> EvalResult {
        let loop_env = Environment::enclosed(Rc::clone(env));
        if let Some(init) = init {
            self.eval_statement(init, &loop_env)?;
        }

        let mut result = Object::Null;
        loop {
            if let Some(condition) = condition {
                if !self.eval_expression(condition, &loop_env)?.is_truthy() {
                    break;
                }
            }
            tracing::trace!("for iteration");

            match self.eval_block_statement(body, &loop_env) {
                Ok(value) => result = value,
                Err(Signal::Break) => return Ok(Object::Null),
                Err(Signal::Continue) => {}
                Err(signal) => return Err(signal),
            }

            if let Some(update) = update {
                self.eval_expression(update, &loop_env)?;
            }
        }
        Ok(result)
    }

    fn eval_expression(&self, exp: &Expression, env: &Env) -> EvalResult {
        match exp {
            Expression::Identifier { name, position } => self.eval_identifier(name, *position, env),
            Expression::Integer(i) => Ok(Object::Integer(*i)),
            Expression::String(s) => Ok(Object::String(s.clone())),
            Expression::Boolean(b) => Ok(Object::Boolean(*b)),
            Expression::Null => Ok(Object::Null),
            Expression::Prefix { operator, right, position } => {
                let right = self.eval_expression(right, env)?;
                Ok(eval_prefix_expression(*operator, right).map_err(|err| err.at(*position))?)
            }
            Expression::Infix { operator: InfixOperator::And, left, right, .. } => {
                if !self.eval_expression(left, env)?.is_truthy() {
                    return Ok(Object::Boolean(false));
                }
                Ok(Object::Boolean(self.eval_expression(right, env)?.is_truthy()))
            }
            Expression::Infix { operator: InfixOperator::Or, left, right, .. } => {
                if self.eval_expression(left, env)?.is_truthy() {
                    return Ok(Object::Boolean(true));
                }
                Ok(Object::Boolean(self.eval_expression(right, env)?.is_truthy()))
            }
            Expression::Infix { operator, left, right, position } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                Ok(eval_infix_expression(*operator, left, right).map_err(|err| err.at(*position))?)
            }
            Expression::Assign { name, value, position } => self.eval_assign_expression(name, value, *position, env),
            Expression::If { condition, consequence, alternative } => {
                if self.eval_expression(condition, env)?.is_truthy() {
                    self.eval_block_statement(consequence, env)
                } else {
                    match alternative {
                        Some(alt) => self.eval_block_statement(alt, env),
                        None => Ok(Object::Null),
                    }
                }
            }
            Expression::Function(literal) => {
                let function = Object::Function(Rc::new(Function { literal: Rc::clone(literal), env: Rc::clone(env) }));
                // a named literal is also bound where it is defined, so it can recurse
                if let Some(name) = &literal.name {
                    env.borrow_mut().set(name.clone(), function.clone());
                }
                Ok(function)
            }
            Expression::Call { function, arguments, position } => {
                let function = self.eval_expression(function, env)?;
                let args = self.eval_expressions(arguments, env)?;
                self.apply_function(function, &args).map_err(|signal| locate(signal, *position))
            }
            Expression::Array(elements) => Ok(Object::array(self.eval_expressions(elements, env)?)),
            Expression::Index { left, index, position } => {
                let left = self.eval_expression(left, env)?;
                let index = self.eval_expression(index, env)?;
                Ok(eval_index_expression(&left, &index).map_err(|err| err.at(*position))?)
            }
            Expression::Map { pairs, position } => self.eval_map_literal(pairs, *position, env),
        }
    }

    fn eval_identifier(&self, name: &str, position: Position, env: &Env) -> EvalResult {
        if let Some(obj) = env.borrow().get(name) {
            return Ok(obj);
        }
        match self.builtins.look_up(name) {
            Some(builtin) => Ok(Object::Builtin(builtin)),
            None => Err(RuntimeError::new(RuntimeErrorKind::UndefinedVariable(name.to_string())).at(position).into()),
        }
    }

    fn eval_assign_expression(&self, name: &str, value: &Expression, position: Position, env: &Env) -> EvalResult {
        if env.borrow().is_const(name) {
            return Err(RuntimeError::new(RuntimeErrorKind::ConstReassignment(name.to_string())).at(position).into());
        }
        let undefined = || RuntimeError::new(RuntimeErrorKind::UndefinedVariable(name.to_string())).at(position);
        if env.borrow().get(name).is_none() {
            return Err(undefined().into());
        }

        let val = self.eval_expression(value, env)?;
        if !env.borrow_mut().update(name, val.clone()) {
            return Err(undefined().into());
        }
        Ok(val)
    }

    fn eval_expressions(&self, exps: &[Expression], env: &Env) -> Result<Vec<Object>, Signal> {
        exps.iter().map(|exp| self.eval_expression(exp, env)).collect()
    }

    fn eval_map_literal(&self, pairs: &[(Expression, Expression)], position: Position, env: &Env) -> EvalResult {
        let mut map = MapPairs::default();
        for (key, value) in pairs {
            let key = self.eval_expression(key, env)?;
            let value = self.eval_expression(value, env)?;
            let hashed = key.hash_key().map_err(|err| err.at(position))?;
            map.insert(hashed, MapPair { key, value });
        }
        Ok(Object::map(map))
    }

    fn apply_function(&self, function: Object, args: &[Object]) -> EvalResult {
        match function {
            Object::Function(func) => {
                tracing::debug!(name = func.literal.name.as_deref().unwrap_or("<anonymous>"), args = args.len(), "call");
                let call_env = Environment::enclosed(Rc::clone(&func.env));
                {
                    let mut frame = call_env.borrow_mut();
                    for (param, arg) in func.literal.parameters.iter().zip(args) {
                        frame.set(param.clone(), arg.clone());
                    }
                }

                match self.eval_block_statement(&func.literal.body, &call_env) {
                    Err(Signal::Return(value)) => Ok(value),
                    other => other,
                }
            }
            Object::Builtin(builtin) => {
                tracing::debug!(name = builtin.name, args = args.len(), "builtin call");
                Ok(builtin.call(args)?)
            }
            other => Err(RuntimeErrorKind::NotAFunction(other.type_name()).into()),
        }
    }
}

fn locate(signal: Signal, position: Position) -> Signal {
    match signal {
        Signal::Error(err) => Signal::Error(err.at(position)),
        other => other,
    }
}

fn eval_prefix_expression(operator: PrefixOperator, right: Object) -> Result<Object, RuntimeError> {
    match operator {
        PrefixOperator::Bang => Ok(Object::Boolean(!right.is_truthy())),
        PrefixOperator::Minus => match right {
            Object::Integer(i) => Ok(Object::Integer(i.wrapping_neg())),
            other => Err(RuntimeErrorKind::UnknownOperator(format!("-{}", other.type_name())).into()),
        },
    }
}

fn eval_infix_expression(operator: InfixOperator, left: Object, right: Object) -> Result<Object, RuntimeError> {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix_expression(operator, *l, *r),
        (Object::String(l), Object::String(r)) => eval_string_infix_expression(operator, l, r),
        _ => match operator {
            InfixOperator::Eq => Ok(Object::Boolean(left == right)),
            InfixOperator::NotEq => Ok(Object::Boolean(left != right)),
            _ if left.type_name() == right.type_name() => Err(type_mismatch(operator, &left, &right)),
            _ => Err(RuntimeErrorKind::UnknownOperator(format!(
                "{} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            ))
            .into()),
        },
    }
}

fn type_mismatch(operator: InfixOperator, left: &Object, right: &Object) -> RuntimeError {
    RuntimeErrorKind::TypeMismatch { left: left.type_name(), operator: operator.to_string(), right: right.type_name() }
        .into()
}

fn eval_integer_infix_expression(operator: InfixOperator, left: i64, right: i64) -> Result<Object, RuntimeError> {
    let value = match operator {
        InfixOperator::Plus => Object::Integer(left.wrapping_add(right)),
        InfixOperator::Minus => Object::Integer(left.wrapping_sub(right)),
        InfixOperator::Multiply => Object::Integer(left.wrapping_mul(right)),
        InfixOperator::Divide | InfixOperator::Modulo if right == 0 => {
            return Err(RuntimeErrorKind::DivisionByZero.into())
        }
        InfixOperator::Divide => Object::Integer(left.wrapping_div(right)),
        InfixOperator::Modulo => Object::Integer(left.wrapping_rem(right)),
        InfixOperator::Lt => Object::Boolean(left < right),
        InfixOperator::Gt => Object::Boolean(left > right),
        InfixOperator::LtEq => Object::Boolean(left <= right),
        InfixOperator::GtEq => Object::Boolean(left >= right),
        InfixOperator::Eq => Object::Boolean(left == right),
        InfixOperator::NotEq => Object::Boolean(left != right),
        InfixOperator::And | InfixOperator::Or => {
            return Err(type_mismatch(operator, &Object::Integer(left), &Object::Integer(right)))
        }
    };
    Ok(value)
}

fn eval_string_infix_expression(operator: InfixOperator, left: &str, right: &str) -> Result<Object, RuntimeError> {
    match operator {
        InfixOperator::Plus => Ok(Object::String(format!("{}{}", left, right))),
        InfixOperator::Eq => Ok(Object::Boolean(left == right)),
        InfixOperator::NotEq => Ok(Object::Boolean(left != right)),
        _ => Err(RuntimeErrorKind::TypeMismatch { left: "string", operator: operator.to_string(), right: "string" }.into()),
    }
}

fn eval_index_expression(left: &Object, index: &Object) -> Result<Object, RuntimeError> {
    match left {
        Object::Array(arr) => match index {
            Object::Integer(i) => Ok(eval_array_index(&arr.borrow(), *i)),
            other => Err(RuntimeErrorKind::TypeMismatch {
                left: "array",
                operator: "[]".to_string(),
                right: other.type_name(),
            }
            .into()),
        },
        Object::Map(map) => {
            let key = index.hash_key()?;
            Ok(map.borrow().get(&key).map(|pair| pair.value.clone()).unwrap_or(Object::Null))
        }
        other => Err(RuntimeErrorKind::NotIndexable(other.type_name()).into()),
    }
}

fn eval_array_index(arr: &[Object], index: i64) -> Object {
    if index < 0 || index >= arr.len() as i64 {
        Object::Null
    } else {
        arr[index as usize].clone()
    }
}
