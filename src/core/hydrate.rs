//! Purpose: The hydration orchestrator and its public entry points.
//! Exports: `Hydrator`, `Target`, `DecodeOptions`.
//! Role: Composes initializer, union resolution, mutation pipeline, coercer
//! and array hydration per property, in class-descriptor order.
//! Invariants: A failed hydration never yields a half-populated instance.
//! Invariants: Consumed keys are removed from the working record; leftovers
//! go to the dynamic-field sink only when the class opts in.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::core::coerce;
use crate::core::error::{Error, ErrorKind};
use crate::core::init::{self, Container};
use crate::core::schema::Schema;
use crate::core::value::Instance;

/// What to hydrate: a registered class by name, or an already-live instance
/// whose set fields are preserved.
#[derive(Clone, Debug)]
pub enum Target {
    Class(String),
    Instance(Instance),
}

impl Target {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }
}

impl From<Instance> for Target {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::class(name)
    }
}

/// Controls how `hydrate_json` treats nested JSON maps: as hydratable
/// records (default) or as opaque objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeOptions {
    nested_as_objects: bool,
}

impl DecodeOptions {
    /// Nested maps are records: they hydrate into nested instances and
    /// array elements, but opaque `object` properties reject them.
    pub fn records() -> Self {
        Self::default()
    }

    /// Nested maps are opaque objects: `object` properties accept them
    /// unchanged.
    pub fn objects() -> Self {
        Self {
            nested_as_objects: true,
        }
    }
}

/// Shared, read-only state for one hydration call tree.
pub(crate) struct HydrateCtx<'a> {
    pub(crate) hydrator: &'a Hydrator,
    pub(crate) maps_as_objects: bool,
}

impl HydrateCtx<'_> {
    pub(crate) fn schema(&self) -> &Schema {
        &self.hydrator.schema
    }
}

/// The hydration engine: owns the schema and an optional DI container, and
/// is safe to share across threads for concurrent reads.
pub struct Hydrator {
    schema: Arc<Schema>,
    container: Option<Arc<dyn Container>>,
}

impl Hydrator {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            container: None,
        }
    }

    pub fn with_container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn container(&self) -> Option<&Arc<dyn Container>> {
        self.container.as_ref()
    }

    /// Hydrates the given target with the given data, which must be a
    /// record (JSON object).
    pub fn hydrate(&self, target: impl Into<Target>, data: &Value) -> Result<Instance, Error> {
        let record = as_record(data)?;
        self.hydrate_record(target.into(), record, true)
    }

    /// Decodes `text` as JSON, then hydrates the resulting record.
    pub fn hydrate_json(
        &self,
        target: impl Into<Target>,
        text: &str,
        options: DecodeOptions,
    ) -> Result<Instance, Error> {
        let data: Value = crate::json::parse::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Decode)
                .with_message("unable to decode JSON")
                .with_source(err)
        })?;
        let record = as_record(&data)?;
        self.hydrate_record(target.into(), record, options.nested_as_objects)
    }

    pub(crate) fn hydrate_record(
        &self,
        target: Target,
        record: Map<String, Value>,
        maps_as_objects: bool,
    ) -> Result<Instance, Error> {
        let ctx = HydrateCtx {
            hydrator: self,
            maps_as_objects,
        };
        let mut working = record;
        let mut instance = init::initialize(&ctx, target, &working)?;
        let descriptor = self.schema.expect_class(instance.class())?;
        debug!(class = descriptor.name(), keys = working.len(), "hydrating record");

        for property in descriptor.properties() {
            if property.is_static() {
                continue;
            }
            if property.types().is_empty() {
                return Err(Error::new(ErrorKind::UntypedProperty)
                    .with_class(descriptor.name())
                    .with_property(property.name())
                    .with_message("is not typed"));
            }

            // The alias key applies only when the declared key is absent.
            let key = if working.contains_key(property.name()) {
                property.name()
            } else {
                property.alias().unwrap_or(property.name())
            };

            let resolved = if property.types().len() > 1 {
                let Some(resolver) = property.union_resolver() else {
                    return Err(Error::new(ErrorKind::UnsupportedType)
                        .with_class(descriptor.name())
                        .with_property(property.name())
                        .with_message("cannot be hydrated automatically")
                        .with_hint(
                            "Attach a union resolver to the property or remove the union type.",
                        ));
                };
                // The resolver sees the sub-value at the effective key when
                // that value is record-shaped, else the whole record.
                let whole;
                let input = match working.get(key) {
                    Some(sub) if sub.is_object() || sub.is_array() => sub,
                    _ => {
                        whole = Value::Object(working.clone());
                        &whole
                    }
                };
                resolver
                    .resolve(property.name(), property.types(), input, &self.schema)
                    .map_err(|err| err.with_class(descriptor.name()))?
            } else {
                property.types()[0].clone()
            };

            if !working.contains_key(key) {
                // A value set by the class's own constructor satisfies the
                // property when the record omits its key.
                if instance.get(property.name()).is_some() {
                    continue;
                }
                if property.is_nullable() {
                    continue;
                }
                return Err(Error::new(ErrorKind::MissingRequiredValue)
                    .with_class(descriptor.name())
                    .with_property(property.name())
                    .with_message("is required"));
            }

            let mut raw = working
                .get(key)
                .cloned()
                .unwrap_or(Value::Null);
            for mutator in property.mutators() {
                raw = mutator.mutate(raw).map_err(|err| {
                    err.with_class(descriptor.name())
                        .with_property(property.name())
                })?;
            }

            let value =
                coerce::coerce_property(&ctx, descriptor.name(), property, &resolved, &raw)?;
            trace!(
                class = descriptor.name(),
                property = property.name(),
                kind = value.kind_name(),
                "assigned property"
            );
            instance.set(property.name(), value);
            working.remove(key);
        }

        if !working.is_empty() {
            if descriptor.accepts_dynamic_fields() {
                for (key, value) in working {
                    instance.set_dynamic(key, value);
                }
            } else {
                debug!(
                    class = descriptor.name(),
                    dropped = working.len(),
                    "discarding unmapped keys"
                );
            }
        }

        Ok(instance)
    }
}

fn as_record(data: &Value) -> Result<Map<String, Value>, Error> {
    match data {
        Value::Object(map) => Ok(map.clone()),
        _ => Err(Error::new(ErrorKind::InvalidValue)
            .with_message("hydration data must be a record (JSON object)")),
    }
}
