// ABOUTME: Environment frames for lexically nested name bindings

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Env {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Env>>,
}

impl Env {
    /// Creates a root environment with no parent.
    pub fn new() -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a child frame extending `parent`; the parent is shared, never
    /// copied, so closures holding it observe later mutations.
    pub fn child(parent: Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Binds a name in this frame, shadowing any outer binding.
    pub fn def(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    /// Assigns the nearest existing binding, walking parent frames.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.set(name, value),
            None => Err(EvalError::UndefinedVariable(name.to_string())),
        }
    }

    /// Looks a name up through this frame and its parents.
    pub fn find(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.find(name))
    }

    /// Like `find`, but an absent binding is an evaluation error.
    pub fn get(&self, name: &str) -> Result<Value, EvalError> {
        self.find(name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    /// Resolves a head position: a symbol is looked up, anything else is not
    /// a reference at all.
    pub fn refer(&self, head: &Value) -> Option<Value> {
        match head {
            Value::Sym(name) => self.find(name),
            _ => None,
        }
    }
}
