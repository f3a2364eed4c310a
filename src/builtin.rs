use std::fmt;
use std::fmt::Formatter;
use std::io::{BufRead, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use rustc_hash::FxHashMap;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::object::{MapPair, Object};

pub type BuiltinFn = fn(args: &[Object]) -> Result<Object, RuntimeError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish_non_exhaustive()
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Builtin {
    pub fn new(name: &'static str, func: BuiltinFn) -> Self {
        Builtin { name, func }
    }

    pub fn call(&self, args: &[Object]) -> Result<Object, RuntimeError> {
        (self.func)(args)
    }
}

/// Functions the evaluator falls back to when a name has no binding.
#[derive(Clone, Debug, Default)]
pub struct BuiltinTable {
    functions: FxHashMap<&'static str, Builtin>,
}

impl BuiltinTable {
    pub fn standard() -> Self {
        let mut table = BuiltinTable::default();
        table.register("print", builtin_print);
        table.register("input", builtin_input);
        table.register("len", builtin_len);
        table.register("type", builtin_type);
        table.register("time", builtin_time);
        table.register("random", builtin_random);
        table.register("sleep", builtin_sleep);
        table.register("get", builtin_get);
        table.register("set", builtin_set);
        table.register("push", builtin_push);
        table.register("first", builtin_first);
        table.register("last", builtin_last);
        table
    }

    pub fn register(&mut self, name: &'static str, func: BuiltinFn) {
        self.functions.insert(name, Builtin::new(name, func));
    }

    pub fn look_up(&self, name: &str) -> Option<Builtin> {
        self.functions.get(name).copied()
    }
}

fn arity(name: &'static str, args: &[Object], want: usize) -> Result<(), RuntimeError> {
    if args.len() != want {
        return Err(RuntimeErrorKind::WrongArgCount { name, want: want.to_string(), got: args.len() }.into());
    }
    Ok(())
}

fn builtin_error(msg: String) -> RuntimeError {
    RuntimeErrorKind::Builtin(msg).into()
}

fn builtin_print(args: &[Object]) -> Result<Object, RuntimeError> {
    let line = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(" ");
    println!("{}", line);
    Ok(Object::Null)
}

fn builtin_input(args: &[Object]) -> Result<Object, RuntimeError> {
    if args.len() > 1 {
        return Err(RuntimeErrorKind::WrongArgCount { name: "input", want: "0 or 1".to_string(), got: args.len() }.into());
    }
    if let Some(prompt) = args.first() {
        print!("{}", prompt);
        std::io::stdout().flush().map_err(|e| builtin_error(format!("input: {}", e)))?;
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| builtin_error(format!("input: failed to read line: {}", e)))?;
    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Object::String(trimmed.to_string()))
}

fn builtin_len(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("len", args, 1)?;
    match &args[0] {
        Object::String(s) => Ok(Object::Integer(s.len() as i64)),
        Object::Array(v) => Ok(Object::Integer(v.borrow().len() as i64)),
        Object::Map(m) => Ok(Object::Integer(m.borrow().len() as i64)),
        other => Err(builtin_error(format!("len: unsupported argument type {}", other.type_name()))),
    }
}

fn builtin_type(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("type", args, 1)?;
    Ok(Object::String(args[0].type_name().to_string()))
}

fn builtin_time(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("time", args, 0)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| builtin_error(format!("time: {}", e)))?;
    Ok(Object::Integer(now.as_secs() as i64))
}

fn builtin_random(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("random", args, 1)?;
    match &args[0] {
        Object::Integer(max) if *max > 0 => Ok(Object::Integer(rand::thread_rng().gen_range(0..*max))),
        Object::Integer(max) => Err(builtin_error(format!("random: bound must be positive, got {}", max))),
        other => Err(builtin_error(format!("random: expected integer, got {}", other.type_name()))),
    }
}

fn builtin_sleep(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("sleep", args, 1)?;
    match &args[0] {
        Object::Integer(ms) if *ms >= 0 => {
            std::thread::sleep(Duration::from_millis(*ms as u64));
            Ok(Object::Null)
        }
        Object::Integer(ms) => Err(builtin_error(format!("sleep: duration must not be negative, got {}", ms))),
        other => Err(builtin_error(format!("sleep: expected integer, got {}", other.type_name()))),
    }
}

fn builtin_get(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("get", args, 2)?;
    match (&args[0], &args[1]) {
        (Object::Array(arr), Object::Integer(i)) => {
            let arr = arr.borrow();
            Ok(usize::try_from(*i).ok().and_then(|i| arr.get(i).cloned()).unwrap_or(Object::Null))
        }
        (Object::Array(_), other) => Err(builtin_error(format!("get: array index must be integer, got {}", other.type_name()))),
        (Object::Map(map), key) => {
            let key = key.hash_key()?;
            Ok(map.borrow().get(&key).map(|pair| pair.value.clone()).unwrap_or(Object::Null))
        }
        (other, _) => Err(builtin_error(format!("get: expected array or map, got {}", other.type_name()))),
    }
}

fn builtin_set(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("set", args, 3)?;
    let value = args[2].clone();
    match (&args[0], &args[1]) {
        (Object::Array(arr), Object::Integer(i)) => {
            let mut elements = arr.borrow_mut();
            let len = elements.len();
            match usize::try_from(*i).ok().filter(|&index| index < len) {
                Some(index) => elements[index] = value,
                None => return Err(builtin_error(format!("set: index {} out of range for length {}", i, len))),
            }
        }
        (Object::Array(_), other) => {
            return Err(builtin_error(format!("set: array index must be integer, got {}", other.type_name())))
        }
        (Object::Map(map), key) => {
            let hashed = key.hash_key()?;
            map.borrow_mut().insert(hashed, MapPair { key: key.clone(), value });
        }
        (other, _) => return Err(builtin_error(format!("set: expected array or map, got {}", other.type_name()))),
    }
    Ok(args[0].clone())
}

fn builtin_push(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("push", args, 2)?;
    match &args[0] {
        Object::Array(arr) => {
            let mut elements = arr.borrow().clone();
            elements.push(args[1].clone());
            Ok(Object::array(elements))
        }
        other => Err(builtin_error(format!("push: expected array, got {}", other.type_name()))),
    }
}

fn builtin_first(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("first", args, 1)?;
    match &args[0] {
        Object::Array(arr) => Ok(arr.borrow().first().cloned().unwrap_or(Object::Null)),
        other => Err(builtin_error(format!("first: expected array, got {}", other.type_name()))),
    }
}

fn builtin_last(args: &[Object]) -> Result<Object, RuntimeError> {
    arity("last", args, 1)?;
    match &args[0] {
        Object::Array(arr) => Ok(arr.borrow().last().cloned().unwrap_or(Object::Null)),
        other => Err(builtin_error(format!("last: expected array, got {}", other.type_name()))),
    }
}
