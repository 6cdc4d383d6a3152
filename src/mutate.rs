//! Purpose: Per-property value transforms applied before coercion.
//! Exports: `Mutator`, `JsonDecode`.
//! Role: Ordered mutation pipeline declared on a property descriptor; each
//! transform sees the previous transform's output.
//! Invariants: Mutators are stateless and safe for concurrent reads.

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::json::parse;

pub trait Mutator: Send + Sync {
    fn mutate(&self, value: Value) -> Result<Value, Error>;
}

/// Decodes a string value holding embedded JSON into the nested structure it
/// describes, so the coercer sees a record instead of text.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecode;

impl Mutator for JsonDecode {
    fn mutate(&self, value: Value) -> Result<Value, Error> {
        let Value::String(text) = value else {
            return Err(Error::new(ErrorKind::InvalidValue)
                .with_message(format!("expects a JSON string to decode, got {value}")));
        };
        parse::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message("unable to decode JSON")
                .with_source(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonDecode, Mutator};
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn decodes_embedded_json_text() {
        let decoded = JsonDecode.mutate(json!(r#"{"foo":"bar"}"#)).unwrap();
        assert_eq!(decoded, json!({"foo": "bar"}));
    }

    #[test]
    fn rejects_non_string_input() {
        let err = JsonDecode.mutate(json!(42)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn surfaces_decode_failures() {
        let err = JsonDecode.mutate(json!("!")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
