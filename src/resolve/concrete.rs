//! Purpose: Map raw data to a concrete class for an abstract hydration target.
//! Exports: `ConcreteResolver`, `ConcreteMap`.
//! Role: Strategy seam invoked by the object initializer; an abstract class
//! without a resolver is never hydratable.
//! Invariants: `concretes()` is pure introspection and independent of the
//! resolution logic.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::schema::ClassDescriptor;

pub trait ConcreteResolver: Send + Sync {
    /// Returns the concrete class name for the given record, or `None` when
    /// no concrete type applies (which fails the hydration).
    fn concrete_for(&self, data: &Map<String, Value>, class: &ClassDescriptor) -> Option<String>;

    /// Static name-to-class table for introspection. Defaults to empty.
    fn concretes(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Table-driven resolver: reads a discriminant key from the record and looks
/// its string value up in a static map.
#[derive(Clone, Debug)]
pub struct ConcreteMap {
    key: String,
    table: BTreeMap<String, String>,
}

impl ConcreteMap {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            table: BTreeMap::new(),
        }
    }

    pub fn entry(mut self, discriminant: impl Into<String>, class: impl Into<String>) -> Self {
        self.table.insert(discriminant.into(), class.into());
        self
    }
}

impl ConcreteResolver for ConcreteMap {
    fn concrete_for(&self, data: &Map<String, Value>, _class: &ClassDescriptor) -> Option<String> {
        let discriminant = data.get(&self.key)?.as_str()?;
        self.table.get(discriminant).cloned()
    }

    fn concretes(&self) -> BTreeMap<String, String> {
        self.table.clone()
    }
}
