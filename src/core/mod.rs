// Core modules implementing the schema registry, value model, and the
// hydration engine itself.
pub mod arrays;
pub mod coerce;
pub mod error;
pub mod hydrate;
pub mod init;
pub mod schema;
pub mod value;
