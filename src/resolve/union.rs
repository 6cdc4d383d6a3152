//! Purpose: Select exactly one concrete type for a union-declared property.
//! Exports: `UnionResolver`, `DefaultType`, `EnumOrScalar`.
//! Role: Strategy seam invoked by the orchestrator before coercion; the
//! engine never guesses across multiple declared types on its own.
//! Invariants: Resolution yields exactly one candidate or fails; there is no
//! best-effort fallback.
//! Invariants: `data` is the sub-value at the property's key when that value
//! is record-shaped (object or list), else the whole working record.

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Schema, TypeRef};

pub trait UnionResolver: Send + Sync {
    fn resolve(
        &self,
        property: &str,
        candidates: &[TypeRef],
        data: &Value,
        schema: &Schema,
    ) -> Result<TypeRef, Error>;
}

/// Always picks one statically named candidate, failing when the union does
/// not declare it.
#[derive(Clone, Debug)]
pub struct DefaultType {
    choice: TypeRef,
}

impl DefaultType {
    pub fn new(choice: TypeRef) -> Self {
        Self { choice }
    }
}

impl UnionResolver for DefaultType {
    fn resolve(
        &self,
        property: &str,
        candidates: &[TypeRef],
        _data: &Value,
        _schema: &Schema,
    ) -> Result<TypeRef, Error> {
        if candidates.contains(&self.choice) {
            return Ok(self.choice.clone());
        }
        Err(Error::new(ErrorKind::UnsupportedType)
            .with_property(property)
            .with_message(format!(
                "can only be {}, {} given",
                join_types(candidates),
                self.choice
            )))
    }
}

/// Treats the first candidate as a closed scalar-backed enumeration: when the
/// value matches one of its cases the enum wins, otherwise the value's
/// runtime kind picks the matching scalar candidate.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumOrScalar;

impl UnionResolver for EnumOrScalar {
    fn resolve(
        &self,
        property: &str,
        candidates: &[TypeRef],
        data: &Value,
        schema: &Schema,
    ) -> Result<TypeRef, Error> {
        let Some(first) = candidates.first() else {
            return Err(Error::new(ErrorKind::UnsupportedType)
                .with_property(property)
                .with_message("expects at least one candidate type"));
        };
        let enumeration = match first {
            TypeRef::Named(name) => schema.enumeration(name),
            _ => None,
        };
        let Some(enumeration) = enumeration else {
            return Err(Error::new(ErrorKind::UnsupportedType)
                .with_property(property)
                .with_message(format!(
                    "the enum must be the first type of the union, {first} given"
                )));
        };
        if candidates.len() == 1 {
            return Ok(first.clone());
        }

        let value = first_value(data);

        // Strings and integers may name an enum case directly; other kinds
        // never reach try-from (a float with zero fraction is still a float).
        let case_shaped = matches!(value, Value::String(_)) || value.as_i64().is_some();
        if case_shaped && enumeration.try_from_value(value).is_some() {
            return Ok(first.clone());
        }

        // Null defers to the property's own nullability during coercion.
        if value.is_null() {
            return Ok(first.clone());
        }

        if let Some(kind) = scalar_kind(value) {
            if let Some(chosen) = candidates[1..].iter().find(|candidate| **candidate == kind) {
                return Ok(chosen.clone());
            }
        }

        Err(Error::new(ErrorKind::UnsupportedType)
            .with_property(property)
            .with_message(format!(
                "can be {}, {} given",
                join_types(candidates),
                kind_name(value)
            )))
    }
}

/// First value of the passed data, mirroring the observed shift-first rule:
/// first field of a record, first element of a list, the value itself
/// otherwise. Record fields are visited in sorted key order (serde_json's
/// map ordering), not insertion order.
fn first_value(data: &Value) -> &Value {
    match data {
        Value::Object(map) => map.values().next().unwrap_or(&Value::Null),
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    }
}

fn scalar_kind(value: &Value) -> Option<TypeRef> {
    match value {
        Value::Bool(_) => Some(TypeRef::Bool),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(TypeRef::Int),
        Value::Number(_) => Some(TypeRef::Float),
        Value::String(_) => Some(TypeRef::Str),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join_types(candidates: &[TypeRef]) -> String {
    candidates
        .iter()
        .map(|candidate| candidate.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

#[cfg(test)]
mod tests {
    use super::{DefaultType, EnumOrScalar, UnionResolver};
    use crate::core::error::ErrorKind;
    use crate::core::schema::{EnumDescriptor, Schema, TypeRef};
    use serde_json::json;

    fn schema_with_level() -> Schema {
        Schema::builder()
            .enumeration(EnumDescriptor::string(
                "Level",
                [("foo", "aaa"), ("bar", "ccc")],
            ))
            .build()
    }

    #[test]
    fn default_type_picks_declared_candidate() {
        let resolver = DefaultType::new(TypeRef::named("TagPrice"));
        let candidates = [TypeRef::named("Tag"), TypeRef::named("TagPrice")];
        let chosen = resolver
            .resolve("tag", &candidates, &json!({}), &Schema::default())
            .unwrap();
        assert_eq!(chosen, TypeRef::named("TagPrice"));
    }

    #[test]
    fn default_type_fails_on_undeclared_candidate() {
        let resolver = DefaultType::new(TypeRef::named("TagPrice"));
        let candidates = [TypeRef::named("Tag"), TypeRef::Str];
        let err = resolver
            .resolve("tag", &candidates, &json!({}), &Schema::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn enum_or_scalar_prefers_matching_case() {
        let schema = schema_with_level();
        let candidates = [TypeRef::named("Level"), TypeRef::Str];
        let chosen = EnumOrScalar
            .resolve("value", &candidates, &json!({"value": "aaa"}), &schema)
            .unwrap();
        assert_eq!(chosen, TypeRef::named("Level"));
    }

    #[test]
    fn enum_or_scalar_falls_back_to_runtime_kind() {
        let schema = schema_with_level();
        let candidates = [
            TypeRef::named("Level"),
            TypeRef::Int,
            TypeRef::Float,
            TypeRef::Str,
        ];
        let cases = [
            (json!({"value": "bbb"}), TypeRef::Str),
            (json!({"value": 123}), TypeRef::Int),
            (json!({"value": 0.23}), TypeRef::Float),
        ];
        for (data, expected) in cases {
            let chosen = EnumOrScalar
                .resolve("value", &candidates, &data, &schema)
                .unwrap();
            assert_eq!(chosen, expected);
        }
    }

    #[test]
    fn enum_or_scalar_shifts_the_sorted_first_field() {
        let schema = schema_with_level();
        let candidates = [TypeRef::named("Level"), TypeRef::Int, TypeRef::Str];
        // "count" sorts before "value", so its value is the one shifted.
        let chosen = EnumOrScalar
            .resolve(
                "value",
                &candidates,
                &json!({"value": "bbb", "count": 7}),
                &schema,
            )
            .unwrap();
        assert_eq!(chosen, TypeRef::Int);
    }

    #[test]
    fn enum_or_scalar_rejects_unlisted_kind() {
        let schema = schema_with_level();
        let candidates = [TypeRef::named("Level"), TypeRef::Int, TypeRef::Str];
        let err = EnumOrScalar
            .resolve("value", &candidates, &json!({"value": false}), &schema)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn enum_or_scalar_requires_leading_enum() {
        let schema = schema_with_level();
        let candidates = [TypeRef::Int, TypeRef::named("Level")];
        let err = EnumOrScalar
            .resolve("value", &candidates, &json!({"value": 1}), &schema)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn enum_or_scalar_short_circuits_single_candidate() {
        let schema = schema_with_level();
        let candidates = [TypeRef::named("Level")];
        let chosen = EnumOrScalar
            .resolve("value", &candidates, &json!({"value": "zzz"}), &schema)
            .unwrap();
        assert_eq!(chosen, TypeRef::named("Level"));
    }

    #[test]
    fn enum_or_scalar_null_defers_to_enum_candidate() {
        let schema = schema_with_level();
        let candidates = [TypeRef::named("Level"), TypeRef::Str];
        let chosen = EnumOrScalar
            .resolve("value", &candidates, &json!({"value": null}), &schema)
            .unwrap();
        assert_eq!(chosen, TypeRef::named("Level"));
    }
}
