use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope. Closures and child scopes keep their parent
/// alive through this handle.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One scope of the chain: its own bindings plus an optional link to the
/// enclosing scope. Links only ever point outward, so the chain is acyclic
/// and every lookup ends at the global scope.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh child of `enclosing` in a shareable handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Bind `name` in *this* scope, replacing any existing binding. This is
    /// how shadowing works.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Look `name` up along the chain; the result is a duplicate of the
    /// stored binding.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.duplicate());
        }

        let mut next: Option<EnvRef> = self.enclosing.clone();
        while let Some(scope) = next {
            let env = scope.borrow();
            if let Some(value) = env.values.get(name) {
                return Some(value.duplicate());
            }
            next = env.enclosing.clone();
        }

        None
    }

    /// Overwrite the nearest existing binding of `name`. Returns `false` if
    /// no scope on the chain declares it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if let Some(slot) = self.values.get_mut(name) {
            debug!("assign '{}' = {}", name, value);
            *slot = value;
            return true;
        }

        let mut next: Option<EnvRef> = self.enclosing.clone();
        while let Some(scope) = next {
            let mut env = scope.borrow_mut();
            if let Some(slot) = env.values.get_mut(name) {
                debug!("assign '{}' = {}", name, value);
                *slot = value;
                return true;
            }
            next = env.enclosing.clone();
        }

        false
    }
}
