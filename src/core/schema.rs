//! Purpose: Registration-time metadata describing hydratable classes and enums.
//! Exports: `Schema`, `SchemaBuilder`, `ClassDescriptor`, `PropertyDescriptor`,
//! `EnumDescriptor`, `TypeRef`, `ArrayMeta`, `ParamSpec`, `ConstructPolicy`.
//! Role: The read-only lookup the engine consults per class; built once by the
//! embedder, never mutated during hydration.
//! Invariants: Property order is declaration order and drives hydration order.
//! Invariants: A union property (more than one candidate type) must carry a
//! union resolver to be hydratable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::value::{EnumCase, EnumValue, FieldValue, Instance};
use crate::mutate::Mutator;
use crate::resolve::concrete::ConcreteResolver;
use crate::resolve::union::UnionResolver;

/// A single declared type a property can resolve to.
///
/// `Named` refers to a registered enumeration or class and is looked up in
/// the [`Schema`] at coercion time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Bool,
    Int,
    Float,
    Str,
    Array,
    /// Opaque object: stored unchanged, never recursed into.
    Object,
    DateTime,
    Duration,
    Named(String),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Str => write!(f, "string"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
            Self::DateTime => write!(f, "date-time"),
            Self::Duration => write!(f, "duration"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Element type and nesting depth for a list-valued property.
///
/// Depth 1 hydrates direct elements; depth N leaves N-1 levels of plain
/// nested lists before element hydration kicks in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayMeta {
    pub element: TypeRef,
    pub depth: u32,
}

/// One declared property of a hydratable class.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    types: Vec<TypeRef>,
    nullable: bool,
    alias: Option<String>,
    array: Option<ArrayMeta>,
    mutators: Vec<Arc<dyn Mutator>>,
    union_resolver: Option<Arc<dyn UnionResolver>>,
    is_static: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::with_types(name, vec![ty])
    }

    /// A union property: ordered candidate types, resolved per value.
    pub fn union(name: impl Into<String>, types: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::with_types(name, types.into_iter().collect())
    }

    /// A property with no declared type; hydrating it is always fatal.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::with_types(name, Vec::new())
    }

    fn with_types(name: impl Into<String>, types: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            types,
            nullable: false,
            alias: None,
            array: None,
            mutators: Vec::new(),
            union_resolver: None,
            is_static: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Alternate record key, consulted only when the declared name is absent.
    pub fn aliased(mut self, key: impl Into<String>) -> Self {
        self.alias = Some(key.into());
        self
    }

    /// Declares element type and nesting depth for a list-valued property.
    /// A depth below 1 is clamped to 1.
    pub fn of_elements(mut self, element: TypeRef, depth: u32) -> Self {
        self.array = Some(ArrayMeta {
            element,
            depth: depth.max(1),
        });
        self
    }

    /// Appends a transform to the mutation pipeline; transforms run in
    /// declaration order before coercion.
    pub fn mutated_by(mut self, mutator: Arc<dyn Mutator>) -> Self {
        self.mutators.push(mutator);
        self
    }

    pub fn resolved_by(mut self, resolver: Arc<dyn UnionResolver>) -> Self {
        self.union_resolver = Some(resolver);
        self
    }

    /// Static properties are skipped by hydration.
    pub fn statical(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &[TypeRef] {
        &self.types
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn array(&self) -> Option<&ArrayMeta> {
        self.array.as_ref()
    }

    pub fn mutators(&self) -> &[Arc<dyn Mutator>] {
        &self.mutators
    }

    pub fn union_resolver(&self) -> Option<&Arc<dyn UnionResolver>> {
        self.union_resolver.as_ref()
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("types", &self.types)
            .field("nullable", &self.nullable)
            .field("alias", &self.alias)
            .field("array", &self.array)
            .finish()
    }
}

/// How the Object Initializer obtains a blank instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructPolicy {
    /// Run the primary constructor (or the container, when supplied).
    Default,
    /// Allocate without running any constructor; field defaults do not apply.
    SkipConstructor,
    /// Invoke the named alternate construction method with container- or
    /// default-resolved arguments.
    OverrideConstructor { method: String },
}

/// One parameter of a class's primary constructor or alternate method.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    name: String,
    type_name: String,
    nullable: bool,
    default: Option<FieldValue>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: false,
            default: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default(mut self, value: FieldValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Alternate construction method registered on a class descriptor.
pub type ConstructFn = Arc<dyn Fn(Vec<FieldValue>) -> Result<Instance, Error> + Send + Sync>;

/// Registration-time description of one hydratable class.
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    is_abstract: bool,
    properties: Vec<PropertyDescriptor>,
    resolver: Option<Arc<dyn ConcreteResolver>>,
    policy: ConstructPolicy,
    params: Vec<ParamSpec>,
    defaults: BTreeMap<String, FieldValue>,
    methods: BTreeMap<String, ConstructFn>,
    dynamic_fields: bool,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_abstract: false,
            properties: Vec::new(),
            resolver: None,
            policy: ConstructPolicy::Default,
            params: Vec::new(),
            defaults: BTreeMap::new(),
            methods: BTreeMap::new(),
            dynamic_fields: false,
        }
    }

    /// An abstract class: never instantiated directly, requires a concrete
    /// resolver to hydrate.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        let mut descriptor = Self::new(name);
        descriptor.is_abstract = true;
        descriptor
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn resolved_by(mut self, resolver: Arc<dyn ConcreteResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn skip_constructor(mut self) -> Self {
        self.policy = ConstructPolicy::SkipConstructor;
        self
    }

    pub fn override_constructor(mut self, method: impl Into<String>) -> Self {
        self.policy = ConstructPolicy::OverrideConstructor {
            method: method.into(),
        };
        self
    }

    /// Declares a primary-constructor parameter; a param without a default
    /// makes the class uninitializable outside a container.
    pub fn constructor_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// A field value the primary constructor initializes; satisfies a
    /// missing record key.
    pub fn field_default(mut self, property: impl Into<String>, value: FieldValue) -> Self {
        self.defaults.insert(property.into(), value);
        self
    }

    /// Registers a named alternate construction method for the
    /// override-constructor policy.
    pub fn method(
        mut self,
        name: impl Into<String>,
        construct: impl Fn(Vec<FieldValue>) -> Result<Instance, Error> + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Arc::new(construct));
        self
    }

    /// Opts the class into the dynamic-field sink: leftover record keys are
    /// kept on the instance instead of being dropped.
    pub fn dynamic_fields(mut self) -> Self {
        self.dynamic_fields = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn resolver(&self) -> Option<&Arc<dyn ConcreteResolver>> {
        self.resolver.as_ref()
    }

    pub fn policy(&self) -> &ConstructPolicy {
        &self.policy
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn defaults(&self) -> &BTreeMap<String, FieldValue> {
        &self.defaults
    }

    pub fn construct_method(&self, name: &str) -> Option<&ConstructFn> {
        self.methods.get(name)
    }

    pub fn accepts_dynamic_fields(&self) -> bool {
        self.dynamic_fields
    }

    /// Static name-to-class table exposed by the concrete resolver, for
    /// introspection; empty when no resolver is attached.
    pub fn concretes(&self) -> BTreeMap<String, String> {
        self.resolver
            .as_ref()
            .map(|resolver| resolver.concretes())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("is_abstract", &self.is_abstract)
            .field("properties", &self.properties)
            .field("policy", &self.policy)
            .field("dynamic_fields", &self.dynamic_fields)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumBacking {
    Int,
    Str,
}

/// A closed scalar-backed enumeration.
#[derive(Clone, Debug)]
pub struct EnumDescriptor {
    name: String,
    backing: EnumBacking,
    cases: Vec<(String, EnumValue)>,
}

impl EnumDescriptor {
    pub fn int<'a>(
        name: impl Into<String>,
        cases: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Self {
        Self {
            name: name.into(),
            backing: EnumBacking::Int,
            cases: cases
                .into_iter()
                .map(|(case, value)| (case.to_string(), EnumValue::Int(value)))
                .collect(),
        }
    }

    pub fn string<'a>(
        name: impl Into<String>,
        cases: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self {
            name: name.into(),
            backing: EnumBacking::Str,
            cases: cases
                .into_iter()
                .map(|(case, value)| (case.to_string(), EnumValue::Str(value.to_string())))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backing(&self) -> EnumBacking {
        self.backing
    }

    /// All legal backing values, joined for diagnostics.
    pub fn allowed_values(&self) -> String {
        self.cases
            .iter()
            .map(|(_, value)| value.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Try-from conversion against the backing kind. Numeric strings are
    /// accepted when the backing kind is integer; no other cross-kind
    /// conversion happens here.
    pub fn try_from_value(&self, value: &Value) -> Option<EnumCase> {
        let wanted = match (self.backing, value) {
            (EnumBacking::Int, Value::Number(n)) => EnumValue::Int(n.as_i64()?),
            (EnumBacking::Int, Value::String(s)) => EnumValue::Int(s.trim().parse().ok()?),
            (EnumBacking::Str, Value::String(s)) => EnumValue::Str(s.clone()),
            _ => return None,
        };
        self.cases
            .iter()
            .find(|(_, value)| *value == wanted)
            .map(|(case, value)| EnumCase {
                enum_name: self.name.clone(),
                case: case.clone(),
                value: value.clone(),
            })
    }
}

/// The registry of hydratable classes and enumerations.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    classes: BTreeMap<String, ClassDescriptor>,
    enums: BTreeMap<String, EnumDescriptor>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema::default(),
        }
    }

    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    /// Looks a class up or fails with `InvalidTarget`.
    pub(crate) fn expect_class(&self, name: &str) -> Result<&ClassDescriptor, Error> {
        self.class(name).ok_or_else(|| {
            Error::new(ErrorKind::InvalidTarget)
                .with_class(name)
                .with_message("expects an instance or the name of a registered class")
        })
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn class(mut self, descriptor: ClassDescriptor) -> Self {
        self.schema
            .classes
            .insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn enumeration(mut self, descriptor: EnumDescriptor) -> Self {
        self.schema.enums.insert(descriptor.name.clone(), descriptor);
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}
