use std::cell::RefCell;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::FunctionLiteral;
use crate::builtin::Builtin;
use crate::environment::Env;
use crate::error::{RuntimeError, RuntimeErrorKind};

/// Result of evaluating any node: a value, or a signal unwinding towards
/// whatever construct consumes it.
pub type EvalResult = Result<Object, Signal>;

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Return(Object),
    Break,
    Continue,
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(err: RuntimeError) -> Self {
        Signal::Error(err)
    }
}

impl From<RuntimeErrorKind> for Signal {
    fn from(kind: RuntimeErrorKind) -> Self {
        Signal::Error(RuntimeError::new(kind))
    }
}

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum HashKey {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HashKey::Integer(i) => write!(f, "{}", i),
            HashKey::String(s) => write!(f, "{}", s),
            HashKey::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// A map entry keeps the original key alongside its value.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPair {
    pub key: Object,
    pub value: Object,
}

pub type MapPairs = FxHashMap<HashKey, MapPair>;

/// A closure: the literal it was built from plus the frame it was defined in.
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub env: Env,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("literal", &self.literal).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,
    Array(Rc<RefCell<Vec<Object>>>),
    Map(Rc<RefCell<MapPairs>>),
    Function(Rc<Function>),
    Builtin(Builtin),
}

impl Object {
    pub fn array(elements: Vec<Object>) -> Self {
        Object::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn map(pairs: MapPairs) -> Self {
        Object::Map(Rc::new(RefCell::new(pairs)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "integer",
            Object::String(_) => "string",
            Object::Boolean(_) => "boolean",
            Object::Null => "null",
            Object::Array(_) => "array",
            Object::Map(_) => "map",
            Object::Function(_) => "function",
            Object::Builtin(_) => "builtin",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Null => false,
            Object::Boolean(b) => *b,
            _ => true,
        }
    }

    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Object::Integer(i) => Ok(HashKey::Integer(*i)),
            Object::String(s) => Ok(HashKey::String(s.clone())),
            Object::Boolean(b) => Ok(HashKey::Boolean(*b)),
            Object::Null | Object::Array(_) | Object::Map(_) | Object::Function(_) | Object::Builtin(_) => {
                Err(RuntimeErrorKind::UnhashableKey(self.type_name()).into())
            }
        }
    }
}

/// Address of a collection's shared cell, used to spot self-references.
fn cell_addr<T>(cell: &Rc<RefCell<T>>) -> usize {
    Rc::as_ptr(cell) as *const () as usize
}

impl Object {
    /// Structural equality. `seen` holds the collection pairs currently being
    /// compared; meeting one again means both sides loop the same way.
    fn equals(&self, other: &Object, seen: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Object::Integer(a), Object::Integer(b)) => a == b,
            (Object::String(a), Object::String(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null) => true,
            (Object::Array(a), Object::Array(b)) => {
                let pair = (cell_addr(a), cell_addr(b));
                if Rc::ptr_eq(a, b) || seen.contains(&pair) {
                    return true;
                }
                let (left, right) = (a.borrow(), b.borrow());
                if left.len() != right.len() {
                    return false;
                }
                seen.push(pair);
                let equal = left.iter().zip(right.iter()).all(|(x, y)| x.equals(y, seen));
                seen.pop();
                equal
            }
            (Object::Map(a), Object::Map(b)) => {
                let pair = (cell_addr(a), cell_addr(b));
                if Rc::ptr_eq(a, b) || seen.contains(&pair) {
                    return true;
                }
                let (left, right) = (a.borrow(), b.borrow());
                if left.len() != right.len() {
                    return false;
                }
                seen.push(pair);
                let equal = left.iter().all(|(key, x)| match right.get(key) {
                    Some(y) => x.value.equals(&y.value, seen),
                    None => false,
                });
                seen.pop();
                equal
            }
            (Object::Function(a), Object::Function(b)) => Rc::ptr_eq(a, b),
            (Object::Builtin(a), Object::Builtin(b)) => a.name == b.name,
            _ => false,
        }
    }

    /// Writes the value; a collection already being written further up is
    /// shown as `[...]` or `{...}`.
    fn write_to(&self, f: &mut Formatter<'_>, seen: &mut Vec<usize>) -> fmt::Result {
        match self {
            Object::Integer(i) => write!(f, "{}", i),
            Object::String(s) => write!(f, "{}", s),
            Object::Boolean(b) => write!(f, "{}", b),
            Object::Null => write!(f, "null"),
            Object::Array(arr) => {
                let addr = cell_addr(arr);
                if seen.contains(&addr) {
                    return write!(f, "[...]");
                }
                seen.push(addr);
                write!(f, "[")?;
                for (i, element) in arr.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    element.write_to(f, seen)?;
                }
                seen.pop();
                write!(f, "]")
            }
            Object::Map(map) => {
                let addr = cell_addr(map);
                if seen.contains(&addr) {
                    return write!(f, "{{...}}");
                }
                seen.push(addr);
                let map = map.borrow();
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                write!(f, "{{")?;
                for (i, (_, pair)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", pair.key)?;
                    pair.value.write_to(f, seen)?;
                }
                seen.pop();
                write!(f, "}}")
            }
            Object::Function(func) => {
                let literal = &func.literal;
                write!(
                    f,
                    "fn{}({}) {{ ... }}",
                    literal.name.as_ref().map(|n| format!(" {}", n)).unwrap_or_default(),
                    literal.parameters.join(", ")
                )
            }
            Object::Builtin(bf) => write!(f, "builtin function {}", bf),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut Vec::new())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_to(f, &mut Vec::new())
    }
}
