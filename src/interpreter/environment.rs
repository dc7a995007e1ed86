// File: src/interpreter/environment.rs
//
// Variable storage for the Mend interpreter.
// Each binding remembers the type it was declared with so later assignments
// can be checked against it. Mend has no call expressions, so function bodies
// never open a scope of their own and a single global table is enough.

use super::value::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub declared_type: String,
    pub value: Value,
}

#[derive(Clone, Debug, Default)]
pub struct Environment {
    bindings: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    /// Define (or redeclare) a variable
    pub fn define(&mut self, name: String, declared_type: String, value: Value) {
        self.bindings.insert(name, Binding { declared_type, value });
    }

    /// Mutate an existing binding using a closure.
    /// Returns false if `name` was never declared.
    pub fn mutate<F>(&mut self, name: &str, f: F) -> bool
    where
        F: FnOnce(&mut Binding),
    {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                f(binding);
                true
            }
            None => false,
        }
    }

    /// All bindings sorted by name
    pub fn visible(&self) -> Vec<(&str, &Binding)> {
        let mut all: Vec<_> = self.bindings.iter().map(|(k, v)| (k.as_str(), v)).collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}
