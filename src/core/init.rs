//! Purpose: Obtain a live instance for a hydration target.
//! Exports: `Container`, `StaticContainer`, `initialize`.
//! Role: Resolves the target spec (existing instance, abstract resolution,
//! constructor policies, container instantiation, default construction)
//! before any property is touched.
//! Invariants: The container is only read (`has`/`get`), never mutated.
//! Invariants: An abstract class without a concrete resolver never yields an
//! instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};
use crate::core::hydrate::{HydrateCtx, Target};
use crate::core::schema::{ClassDescriptor, ConstructPolicy};
use crate::core::value::{FieldValue, Instance};

/// Read-only dependency-injection capability: the engine asks it for
/// instances by type name and never registers anything.
pub trait Container: Send + Sync {
    fn has(&self, type_name: &str) -> bool;
    fn get(&self, type_name: &str) -> Option<FieldValue>;
}

enum Binding {
    Value(FieldValue),
    Factory(Box<dyn Fn() -> FieldValue + Send + Sync>),
}

/// Map-backed container for embedders and tests: bind ready values or
/// factories per type name.
#[derive(Default)]
pub struct StaticContainer {
    bindings: BTreeMap<String, Binding>,
}

impl StaticContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(mut self, type_name: impl Into<String>, value: FieldValue) -> Self {
        self.bindings.insert(type_name.into(), Binding::Value(value));
        self
    }

    pub fn with_factory(
        mut self,
        type_name: impl Into<String>,
        factory: impl Fn() -> FieldValue + Send + Sync + 'static,
    ) -> Self {
        self.bindings
            .insert(type_name.into(), Binding::Factory(Box::new(factory)));
        self
    }
}

impl Container for StaticContainer {
    fn has(&self, type_name: &str) -> bool {
        self.bindings.contains_key(type_name)
    }

    fn get(&self, type_name: &str) -> Option<FieldValue> {
        match self.bindings.get(type_name)? {
            Binding::Value(value) => Some(value.clone()),
            Binding::Factory(factory) => Some(factory()),
        }
    }
}

/// Resolves the target spec into a live instance, per the construction
/// policy of its class.
pub(crate) fn initialize(
    ctx: &HydrateCtx<'_>,
    target: Target,
    data: &Map<String, Value>,
) -> Result<Instance, Error> {
    match target {
        // Already-set fields on a given instance are preserved and treated
        // as satisfied when the record omits their key.
        Target::Instance(instance) => Ok(instance),
        Target::Class(name) => {
            let descriptor = ctx.schema().expect_class(&name)?;
            if descriptor.is_abstract() {
                return initialize_abstract(ctx, descriptor, data);
            }
            match descriptor.policy() {
                ConstructPolicy::SkipConstructor => Ok(Instance::new(descriptor.name())),
                ConstructPolicy::OverrideConstructor { method } => {
                    initialize_override(ctx, descriptor, method)
                }
                ConstructPolicy::Default => initialize_default(ctx, descriptor),
            }
        }
    }
}

fn initialize_abstract(
    ctx: &HydrateCtx<'_>,
    descriptor: &ClassDescriptor,
    data: &Map<String, Value>,
) -> Result<Instance, Error> {
    let Some(resolver) = descriptor.resolver() else {
        return Err(Error::new(ErrorKind::InvalidTarget)
            .with_class(descriptor.name())
            .with_message("cannot be instantiated")
            .with_hint("Attach a concrete resolver to the abstract class descriptor."));
    };
    let Some(concrete) = resolver.concrete_for(data, descriptor) else {
        return Err(Error::new(ErrorKind::InvalidTarget)
            .with_class(descriptor.name())
            .with_message("the concrete resolver returned no class for the given data"));
    };
    tracing::debug!(abstract_class = descriptor.name(), concrete = %concrete, "resolved concrete class");
    initialize(ctx, Target::Class(concrete), data)
}

fn initialize_override(
    ctx: &HydrateCtx<'_>,
    descriptor: &ClassDescriptor,
    method: &str,
) -> Result<Instance, Error> {
    let Some(construct) = descriptor.construct_method(method) else {
        return Err(Error::new(ErrorKind::InvalidTarget)
            .with_class(descriptor.name())
            .with_message(format!("unknown construction method {method}")));
    };

    let mut args = Vec::with_capacity(descriptor.params().len());
    for param in descriptor.params() {
        let from_container = ctx
            .hydrator
            .container()
            .filter(|container| container.has(param.type_name()))
            .and_then(|container| container.get(param.type_name()));
        let resolved = from_container.or_else(|| param.default().cloned()).or_else(|| {
            param.is_nullable().then_some(FieldValue::Null)
        });
        match resolved {
            Some(value) => args.push(value),
            None => {
                return Err(Error::new(ErrorKind::UninitializableTarget)
                    .with_class(descriptor.name())
                    .with_message(format!(
                        "cannot resolve constructor parameter {}",
                        param.name()
                    )));
            }
        }
    }
    construct(args)
}

fn initialize_default(
    ctx: &HydrateCtx<'_>,
    descriptor: &ClassDescriptor,
) -> Result<Instance, Error> {
    if let Some(container) = ctx.hydrator.container() {
        return match container.get(descriptor.name()) {
            Some(FieldValue::Object(instance)) => Ok(instance),
            Some(other) => Err(Error::new(ErrorKind::InvalidTarget)
                .with_class(descriptor.name())
                .with_message(format!(
                    "the container returned a non-object ({}) for this class",
                    other.kind_name()
                ))),
            None => Err(Error::new(ErrorKind::InvalidTarget)
                .with_class(descriptor.name())
                .with_message("the container cannot provide this class")),
        };
    }

    if descriptor.params().iter().any(|param| param.is_required()) {
        return Err(Error::new(ErrorKind::UninitializableTarget)
            .with_class(descriptor.name())
            .with_message("cannot be hydrated because its constructor has required parameters"));
    }

    let mut instance = Instance::new(descriptor.name());
    for (property, value) in descriptor.defaults() {
        instance.set(property.clone(), value.clone());
    }
    Ok(instance)
}
