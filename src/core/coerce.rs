//! Purpose: Pure type-directed conversion of one raw value into a typed field.
//! Exports: `coerce_property` plus the date/duration parsing helpers.
//! Role: The dispatch table at the center of hydration; every property value
//! passes through here exactly once with a single resolved type.
//! Invariants: `null` and empty-string-for-non-string collapse to `Null`
//! before any type-specific rule runs.
//! Invariants: Every failure names the declaring class and property.

use serde_json::Value;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, format_description};

use crate::core::arrays;
use crate::core::error::{Error, ErrorKind};
use crate::core::hydrate::{HydrateCtx, Target};
use crate::core::schema::{EnumBacking, EnumDescriptor, PropertyDescriptor, TypeRef};
use crate::core::value::FieldValue;

/// Coerces `value` against the property's resolved single type.
pub(crate) fn coerce_property(
    ctx: &HydrateCtx<'_>,
    class: &str,
    property: &PropertyDescriptor,
    ty: &TypeRef,
    value: &Value,
) -> Result<FieldValue, Error> {
    // An empty string for a non-string type is always processed as null.
    let empty_as_null = matches!(value, Value::String(s) if s.is_empty()) && *ty != TypeRef::Str;
    if value.is_null() || empty_as_null {
        if property.is_nullable() {
            return Ok(FieldValue::Null);
        }
        return Err(invalid(class, property.name(), "cannot accept null"));
    }

    match ty {
        TypeRef::Bool => coerce_bool(class, property.name(), value),
        TypeRef::Int => coerce_int(class, property.name(), value),
        TypeRef::Float => coerce_float(class, property.name(), value),
        TypeRef::Str => match value {
            Value::String(s) => Ok(FieldValue::Str(s.clone())),
            _ => Err(invalid(class, property.name(), "expects a string")),
        },
        TypeRef::Array => coerce_array(ctx, class, property, value),
        TypeRef::Object => match value {
            Value::Object(_) if ctx.maps_as_objects => Ok(FieldValue::Raw(value.clone())),
            Value::Object(_) => Err(invalid(
                class,
                property.name(),
                "expects an object, but the payload was decoded as records",
            )),
            _ => Err(invalid(class, property.name(), "expects an object")),
        },
        TypeRef::DateTime => coerce_datetime(class, property.name(), value),
        TypeRef::Duration => coerce_duration(class, property.name(), value),
        TypeRef::Named(name) => {
            if let Some(enumeration) = ctx.schema().enumeration(name) {
                return coerce_enum(class, property.name(), enumeration, value);
            }
            if ctx.schema().class(name).is_some() {
                return coerce_nested(ctx, class, property.name(), name, value);
            }
            Err(Error::new(ErrorKind::UnsupportedType)
                .with_class(class)
                .with_property(property.name())
                .with_message(format!("contains an unsupported type {name}")))
        }
    }
}

fn invalid(class: &str, property: &str, message: &str) -> Error {
    Error::new(ErrorKind::InvalidValue)
        .with_class(class)
        .with_property(property)
        .with_message(message)
}

fn coerce_bool(class: &str, property: &str, value: &Value) -> Result<FieldValue, Error> {
    let token = match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" | "on" | "yes" => Some(true),
            "0" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    token
        .map(FieldValue::Bool)
        .ok_or_else(|| invalid(class, property, "expects a boolean"))
}

fn coerce_int(class: &str, property: &str, value: &Value) -> Result<FieldValue, Error> {
    let parsed = match value {
        Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                Some(int)
            } else {
                // A float with no fractional part still counts as an integer.
                n.as_f64().and_then(float_as_i64)
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed
        .map(FieldValue::Int)
        .ok_or_else(|| invalid(class, property, "expects an integer"))
}

fn float_as_i64(float: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, so the upper bound must be
    // exclusive or the cast saturates for out-of-range values.
    if float.is_finite()
        && float.fract() == 0.0
        && float >= i64::MIN as f64
        && float < 9_223_372_036_854_775_808.0
    {
        Some(float as i64)
    } else {
        None
    }
}

fn coerce_float(class: &str, property: &str, value: &Value) -> Result<FieldValue, Error> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    };
    parsed
        .map(FieldValue::Float)
        .ok_or_else(|| invalid(class, property, "expects a number"))
}

fn coerce_array(
    ctx: &HydrateCtx<'_>,
    class: &str,
    property: &PropertyDescriptor,
    value: &Value,
) -> Result<FieldValue, Error> {
    if !matches!(value, Value::Array(_) | Value::Object(_)) {
        return Err(invalid(class, property.name(), "expects an array"));
    }
    match property.array() {
        Some(meta) => arrays::hydrate_list(ctx, class, property.name(), value, &meta.element, meta.depth),
        // No element metadata: stored as-is, untyped.
        None => Ok(FieldValue::Raw(value.clone())),
    }
}

fn coerce_datetime(class: &str, property: &str, value: &Value) -> Result<FieldValue, Error> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|epoch| {
            OffsetDateTime::from_unix_timestamp(epoch).ok()
        }),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
            .parse::<i64>()
            .ok()
            .and_then(|epoch| OffsetDateTime::from_unix_timestamp(epoch).ok()),
        Value::String(s) => parse_datetime(s),
        _ => None,
    };
    parsed.map(FieldValue::DateTime).ok_or_else(|| {
        invalid(
            class,
            property,
            "expects a valid date-time string or timestamp",
        )
    })
}

/// Accepts RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM:SS`, and `YYYY-MM-DD`.
/// Formats without an offset are assumed UTC.
fn parse_datetime(text: &str) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(parsed);
    }
    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc2822) {
        return Some(parsed);
    }
    if let Ok(items) = format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]") {
        if let Ok(parsed) = PrimitiveDateTime::parse(text, items.as_slice()) {
            return Some(parsed.assume_utc());
        }
    }
    if let Ok(items) = format_description::parse("[year]-[month]-[day]") {
        if let Ok(parsed) = Date::parse(text, items.as_slice()) {
            return Some(parsed.midnight().assume_utc());
        }
    }
    None
}

fn coerce_duration(class: &str, property: &str, value: &Value) -> Result<FieldValue, Error> {
    let Value::String(text) = value else {
        return Err(invalid(class, property, "expects a string"));
    };
    parse_iso_duration(text)
        .map(FieldValue::Duration)
        .ok_or_else(|| {
            invalid(
                class,
                property,
                "expects a valid duration string based on ISO 8601",
            )
        })
}

/// Parses `PnYnMnDTnHnMnS` / `PnW` durations. Calendar units use fixed
/// conversions: 1 year = 365 days, 1 month = 30 days.
fn parse_iso_duration(text: &str) -> Option<Duration> {
    let mut chars = text.chars().peekable();
    if chars.next() != Some('P') {
        return None;
    }

    let mut seconds: i64 = 0;
    let mut in_time = false;
    let mut components = 0usize;
    let mut digits = String::new();

    for ch in chars {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if ch == 'T' {
            if !digits.is_empty() || in_time {
                return None;
            }
            in_time = true;
            continue;
        }
        let amount: i64 = digits.parse().ok()?;
        digits.clear();
        let unit: i64 = match (ch, in_time) {
            ('Y', false) => 365 * 86_400,
            ('M', false) => 30 * 86_400,
            ('W', false) => 7 * 86_400,
            ('D', false) => 86_400,
            ('H', true) => 3_600,
            ('M', true) => 60,
            ('S', true) => 1,
            _ => return None,
        };
        seconds = seconds.checked_add(amount.checked_mul(unit)?)?;
        components += 1;
    }

    if components == 0 || !digits.is_empty() {
        return None;
    }
    Some(Duration::seconds(seconds))
}

fn coerce_enum(
    class: &str,
    property: &str,
    enumeration: &EnumDescriptor,
    value: &Value,
) -> Result<FieldValue, Error> {
    // Kind gate first: the value must match the enum's backing scalar kind,
    // with numeric strings admitted for integer backing.
    let kind_matches = match enumeration.backing() {
        EnumBacking::Int => {
            value.as_i64().is_some()
                || matches!(value, Value::String(s) if s.trim().parse::<i64>().is_ok())
        }
        EnumBacking::Str => matches!(value, Value::String(_)),
    };
    if !kind_matches {
        let expected = match enumeration.backing() {
            EnumBacking::Int => "int",
            EnumBacking::Str => "string",
        };
        return Err(invalid(
            class,
            property,
            &format!("expects the following type: {expected}"),
        ));
    }

    enumeration
        .try_from_value(value)
        .map(FieldValue::Case)
        .ok_or_else(|| {
            invalid(
                class,
                property,
                &format!(
                    "expects one of the following values: {}",
                    enumeration.allowed_values()
                ),
            )
        })
}

fn coerce_nested(
    ctx: &HydrateCtx<'_>,
    class: &str,
    property: &str,
    target: &str,
    value: &Value,
) -> Result<FieldValue, Error> {
    let record = match value {
        Value::Object(map) => map.clone(),
        // A plain list carries no named keys; its entries pass through under
        // their index so a dynamic-field sink still receives them, while
        // named properties fall back to defaults/nullability as usual.
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item.clone()))
            .collect(),
        _ => {
            return Err(invalid(
                class,
                property,
                "expects an associative record or object",
            ));
        }
    };
    ctx.hydrator
        .hydrate_record(Target::class(target), record, ctx.maps_as_objects)
        .map(FieldValue::Object)
}
