use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::object::Object;

/// Shared handle to a scope frame.
pub type Env = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    store: FxHashMap<String, Object>,
    constants: FxHashSet<String>,
    outer: Option<Env>,
}

impl Environment {
    pub fn new() -> Env {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A child frame whose lookups fall through to `outer`.
    pub fn enclosed(outer: Env) -> Env {
        Rc::new(RefCell::new(Environment { outer: Some(outer), ..Environment::default() }))
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(obj) => Some(obj.clone()),
            None => match &self.outer {
                Some(env) => env.borrow().get(name),
                None => None,
            },
        }
    }

    /// Binds a mutable name in this frame, shadowing any outer binding.
    pub fn set(&mut self, name: String, value: Object) {
        self.constants.remove(&name);
        self.store.insert(name, value);
    }

    pub fn set_const(&mut self, name: String, value: Object) {
        self.constants.insert(name.clone());
        self.store.insert(name, value);
    }

    /// Whether `name` is marked constant in this frame or any enclosing one.
    pub fn is_const(&self, name: &str) -> bool {
        if self.constants.contains(name) {
            return true;
        }
        match &self.outer {
            Some(env) => env.borrow().is_const(name),
            None => false,
        }
    }

    /// Overwrites the binding in the nearest frame that owns `name`.
    /// Returns false when no frame does.
    pub fn update(&mut self, name: &str, value: Object) -> bool {
        if let Some(slot) = self.store.get_mut(name) {
            *slot = value;
            return true;
        }
        match &self.outer {
            Some(env) => env.borrow_mut().update(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let global = Environment::new();
        global.borrow_mut().set("a".to_string(), Object::Integer(1));
        let inner = Environment::enclosed(Rc::clone(&global));

        assert_eq!(inner.borrow().get("a"), Some(Object::Integer(1)));
        assert_eq!(inner.borrow().get("b"), None);
    }

    #[test]
    fn set_shadows_in_current_frame_only() {
        let global = Environment::new();
        global.borrow_mut().set("a".to_string(), Object::Integer(1));
        let inner = Environment::enclosed(Rc::clone(&global));
        inner.borrow_mut().set("a".to_string(), Object::Integer(2));

        assert_eq!(inner.borrow().get("a"), Some(Object::Integer(2)));
        assert_eq!(global.borrow().get("a"), Some(Object::Integer(1)));
    }

    #[test]
    fn update_writes_to_owning_frame() {
        let global = Environment::new();
        global.borrow_mut().set("a".to_string(), Object::Integer(1));
        let inner = Environment::enclosed(Rc::clone(&global));

        assert!(inner.borrow_mut().update("a", Object::Integer(5)));
        assert_eq!(global.borrow().get("a"), Some(Object::Integer(5)));
        assert!(!inner.borrow_mut().update("missing", Object::Null));
        assert_eq!(inner.borrow().get("missing"), None);
    }

    #[test]
    fn constants_are_visible_from_child_frames() {
        let global = Environment::new();
        global.borrow_mut().set_const("PI".to_string(), Object::Integer(3));
        let inner = Environment::enclosed(Rc::clone(&global));

        assert!(inner.borrow().is_const("PI"));
        assert!(!inner.borrow().is_const("other"));

        global.borrow_mut().set("PI".to_string(), Object::Integer(4));
        assert!(!inner.borrow().is_const("PI"));
    }
}
