//! Purpose: Typed value model for hydrated objects.
//! Exports: `FieldValue`, `Instance`, `EnumCase`, `EnumValue`.
//! Role: The output side of hydration; raw `serde_json::Value` never leaks
//! into a typed field except through the explicit `Raw` variant.
//! Invariants: An `Instance` is only handed to callers once every declared
//! property of its class has been processed.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use time::{Duration, OffsetDateTime};

/// Backing value of one enumeration case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnumValue {
    Int(i64),
    Str(String),
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// A resolved case of a registered enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumCase {
    pub enum_name: String,
    pub case: String,
    pub value: EnumValue,
}

/// One hydrated property value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<FieldValue>),
    /// Untyped payload stored as-is: opaque objects and arrays without
    /// element metadata.
    Raw(Value),
    DateTime(OffsetDateTime),
    Duration(Duration),
    Case(EnumCase),
    Object(Instance),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Self::Raw(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_case(&self) -> Option<&EnumCase> {
        match self {
            Self::Case(case) => Some(case),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Instance> {
        match self {
            Self::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Raw(_) => "raw",
            Self::DateTime(_) => "date-time",
            Self::Duration(_) => "duration",
            Self::Case(_) => "enum",
            Self::Object(_) => "object",
        }
    }
}

/// A live object under (or after) hydration: the class it belongs to, its
/// typed fields, and a bag for dynamic fields when the class opts in.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    class: String,
    fields: BTreeMap<String, FieldValue>,
    dynamic: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: BTreeMap::new(),
            dynamic: BTreeMap::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn get(&self, property: &str) -> Option<&FieldValue> {
        self.fields.get(property)
    }

    pub fn has(&self, property: &str) -> bool {
        self.fields.contains_key(property)
    }

    pub fn set(&mut self, property: impl Into<String>, value: FieldValue) {
        self.fields.insert(property.into(), value);
    }

    /// Fluent variant of [`set`](Self::set) for building pre-initialized
    /// instances (container bindings, test fixtures).
    pub fn with(mut self, property: impl Into<String>, value: FieldValue) -> Self {
        self.set(property, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Leftover keys routed here when the class declares a dynamic-field
    /// sink; empty otherwise.
    pub fn dynamic(&self) -> &BTreeMap<String, Value> {
        &self.dynamic
    }

    pub(crate) fn set_dynamic(&mut self, key: String, value: Value) {
        self.dynamic.insert(key, value);
    }
}
