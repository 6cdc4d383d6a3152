//! Purpose: Define the stable public API boundary for the hydrator.
//! Exports: Schema construction, the hydration engine, and extension traits.
//! Role: Public, additive-only surface; callers should not need to reach
//! into `core` submodules directly.
//! Invariants: This module is the only public path intended for downstream use.

pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::hydrate::{DecodeOptions, Hydrator, Target};
pub use crate::core::init::{Container, StaticContainer};
pub use crate::core::schema::{
    ArrayMeta, ClassDescriptor, ConstructFn, ConstructPolicy, EnumBacking, EnumDescriptor,
    ParamSpec, PropertyDescriptor, Schema, SchemaBuilder, TypeRef,
};
pub use crate::core::value::{EnumCase, EnumValue, FieldValue, Instance};
pub use crate::mutate::{JsonDecode, Mutator};
pub use crate::resolve::concrete::{ConcreteMap, ConcreteResolver};
pub use crate::resolve::union::{DefaultType, EnumOrScalar, UnionResolver};
