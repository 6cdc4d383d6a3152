//! Purpose: Library crate for hydrating untyped records into typed instances.
//! Exports: `api` (schema building, hydration, resolvers, mutators, errors).
//! Role: The `api` module is the supported surface; `core` stays internal
//! detail even though it is reachable.
//! Invariants: Hydration never mutates its input data or the schema.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.

pub mod api;
pub mod core;
mod json;
pub mod mutate;
pub mod resolve;
