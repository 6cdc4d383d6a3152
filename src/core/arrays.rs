//! Purpose: Hydrate list-valued properties to their declared nesting depth.
//! Exports: `hydrate_list`.
//! Role: Recursion helper for array element metadata; depth N means N-1
//! levels of plain nested lists precede element hydration.
//! Invariants: Element order is preserved; object-shaped levels contribute
//! their values in key order.
//! Invariants: At depth 1, an enum element that fails try-from keeps the raw
//! value unchanged rather than failing.

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::hydrate::{HydrateCtx, Target};
use crate::core::schema::TypeRef;
use crate::core::value::FieldValue;

pub(crate) fn hydrate_list(
    ctx: &HydrateCtx<'_>,
    class: &str,
    property: &str,
    value: &Value,
    element: &TypeRef,
    depth: u32,
) -> Result<FieldValue, Error> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => {
            return Err(Error::new(ErrorKind::InvalidValue)
                .with_class(class)
                .with_property(property)
                .with_message(format!("expects nested arrays down to depth {depth}")));
        }
    };

    if depth > 1 {
        let hydrated = items
            .into_iter()
            .map(|child| hydrate_list(ctx, class, property, child, element, depth - 1))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(FieldValue::List(hydrated));
    }

    let hydrated = items
        .into_iter()
        .map(|leaf| hydrate_leaf(ctx, class, property, leaf, element))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FieldValue::List(hydrated))
}

fn hydrate_leaf(
    ctx: &HydrateCtx<'_>,
    class: &str,
    property: &str,
    leaf: &Value,
    element: &TypeRef,
) -> Result<FieldValue, Error> {
    let TypeRef::Named(name) = element else {
        return Err(Error::new(ErrorKind::UnsupportedType)
            .with_class(class)
            .with_property(property)
            .with_message(format!(
                "array element type must name a registered enum or class, {element} given"
            )));
    };

    if let Some(enumeration) = ctx.schema().enumeration(name) {
        // Try-from semantics: a non-matching value is kept as-is, not an error.
        return Ok(enumeration
            .try_from_value(leaf)
            .map(FieldValue::Case)
            .unwrap_or_else(|| FieldValue::Raw(leaf.clone())));
    }

    if ctx.schema().class(name).is_some() {
        let record = match leaf {
            Value::Object(map) => map.clone(),
            _ => {
                return Err(Error::new(ErrorKind::InvalidValue)
                    .with_class(class)
                    .with_property(property)
                    .with_message(format!("expects each element to be a record, {leaf} given")));
            }
        };
        return ctx
            .hydrator
            .hydrate_record(Target::class(name), record, ctx.maps_as_objects)
            .map(FieldValue::Object);
    }

    Err(Error::new(ErrorKind::UnsupportedType)
        .with_class(class)
        .with_property(property)
        .with_message(format!("contains an unsupported element type {name}")))
}

#[cfg(test)]
mod tests {
    use super::hydrate_list;
    use crate::core::error::ErrorKind;
    use crate::core::hydrate::{HydrateCtx, Hydrator};
    use crate::core::schema::{
        ClassDescriptor, EnumDescriptor, PropertyDescriptor, Schema, TypeRef,
    };
    use crate::core::value::FieldValue;
    use serde_json::json;
    use std::sync::Arc;

    fn hydrator() -> Hydrator {
        let schema = Schema::builder()
            .class(
                ClassDescriptor::new("Tag")
                    .property(PropertyDescriptor::new("name", TypeRef::Str)),
            )
            .enumeration(EnumDescriptor::string(
                "Uuid",
                [
                    ("foo", "c1200a7e-136e-4a11-9bc3-cc937046e90f"),
                    ("bar", "a2b29b37-1c5a-4b36-9981-097ddd25c740"),
                ],
            ))
            .build();
        Hydrator::new(Arc::new(schema))
    }

    #[test]
    fn depth_one_hydrates_each_element_as_target_type() {
        let hydrator = hydrator();
        let ctx = HydrateCtx {
            hydrator: &hydrator,
            maps_as_objects: true,
        };
        let value = json!([{"name": "a"}, {"name": "b"}]);
        let list = hydrate_list(&ctx, "Product", "tags", &value, &TypeRef::named("Tag"), 1).unwrap();
        let items = list.as_list().unwrap();
        assert_eq!(items.len(), 2);
        let names: Vec<_> = items
            .iter()
            .map(|item| item.as_object().unwrap().get("name").unwrap().clone())
            .collect();
        assert_eq!(
            names,
            vec![FieldValue::Str("a".into()), FieldValue::Str("b".into())]
        );
    }

    #[test]
    fn depth_two_produces_two_levels_of_typed_elements() {
        let hydrator = hydrator();
        let ctx = HydrateCtx {
            hydrator: &hydrator,
            maps_as_objects: true,
        };
        let value = json!([[{"name": "a"}], [{"name": "b"}, {"name": "c"}]]);
        let list = hydrate_list(&ctx, "Product", "tags", &value, &TypeRef::named("Tag"), 2).unwrap();
        let outer = list.as_list().unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[0].as_list().unwrap().len(), 1);
        assert_eq!(outer[1].as_list().unwrap().len(), 2);
        assert!(outer[1].as_list().unwrap()[1].as_object().is_some());
    }

    #[test]
    fn enum_elements_keep_unmatched_values_unchanged() {
        let hydrator = hydrator();
        let ctx = HydrateCtx {
            hydrator: &hydrator,
            maps_as_objects: true,
        };
        let value = json!([
            "c1200a7e-136e-4a11-9bc3-cc937046e90f",
            "a2b29b37-1c5a-4b36-9981-097ddd25c740",
            "bbb",
        ]);
        let list = hydrate_list(&ctx, "Fixture", "value", &value, &TypeRef::named("Uuid"), 1).unwrap();
        let items = list.as_list().unwrap();
        assert_eq!(items[0].as_case().unwrap().case, "foo");
        assert_eq!(items[1].as_case().unwrap().case, "bar");
        assert_eq!(items[2], FieldValue::Raw(json!("bbb")));
    }

    #[test]
    fn scalar_where_nesting_expected_is_invalid() {
        let hydrator = hydrator();
        let ctx = HydrateCtx {
            hydrator: &hydrator,
            maps_as_objects: true,
        };
        let err = hydrate_list(
            &ctx,
            "Product",
            "tags",
            &json!([1, 2]),
            &TypeRef::named("Tag"),
            2,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn scalar_element_type_is_unsupported() {
        let hydrator = hydrator();
        let ctx = HydrateCtx {
            hydrator: &hydrator,
            maps_as_objects: true,
        };
        let err =
            hydrate_list(&ctx, "Product", "tags", &json!([1]), &TypeRef::Int, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }
}
