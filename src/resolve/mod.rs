// Pluggable resolution strategies: union-type selection and abstract-class
// concretization.
pub mod concrete;
pub mod union;
