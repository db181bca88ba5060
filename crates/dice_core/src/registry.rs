//! Custom-die registry: a name → [`CustomDie`] table that is heap-owned
//! rather than arena-owned, so it survives `Context::reset`.

use std::collections::HashMap;

use crate::Value;

/// One face of a custom die: an integer value plus an optional label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomSide {
    pub value: Value,
    pub label: Option<String>,
}

impl CustomSide {
    pub fn new(value: Value) -> Self {
        CustomSide { value, label: None }
    }

    pub fn labeled(value: Value, label: impl Into<String>) -> Self {
        CustomSide { value, label: Some(label.into()) }
    }
}

/// A die whose face set is explicit values rather than `1..=N`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomDie {
    pub name: Option<String>,
    pub sides: Vec<CustomSide>,
}

impl CustomDie {
    pub fn new(sides: Vec<CustomSide>) -> Self {
        CustomDie { name: None, sides }
    }

    pub fn named(name: impl Into<String>, sides: Vec<CustomSide>) -> Self {
        CustomDie { name: Some(name.into()), sides }
    }

    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    pub fn min_value(&self) -> Option<Value> {
        self.sides.iter().map(|s| s.value).min()
    }

    pub fn max_value(&self) -> Option<Value> {
        self.sides.iter().map(|s| s.value).max()
    }
}

/// Name → [`CustomDie`] lookup table. Registration is last-wins: a
/// duplicate name overwrites the previous entry, which a `HashMap` gives
/// for free.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    dice: HashMap<String, CustomDie>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { dice: HashMap::new() }
    }

    /// Register (or overwrite) a named custom die. Names are case-sensitive.
    pub fn register(&mut self, name: impl Into<String>, die: CustomDie) {
        self.dice.insert(name.into(), die);
    }

    pub fn lookup(&self, name: &str) -> Option<&CustomDie> {
        self.dice.get(name)
    }

    /// Drop every registered die. Called by `Context::reset` before
    /// re-applying feature defaults.
    pub fn clear(&mut self) {
        self.dice.clear();
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }
}
