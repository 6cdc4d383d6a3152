use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// The target spec is not hydratable: unknown class, abstract class
    /// without a concrete resolver, or an unresolvable concrete name.
    InvalidTarget,
    /// The target's primary constructor requires arguments and no container
    /// is available to supply them.
    UninitializableTarget,
    /// A declared property carries no type.
    UntypedProperty,
    /// The coercer cannot handle the declared type, or a union property has
    /// no resolver.
    UnsupportedType,
    /// A required key is absent from the record.
    MissingRequiredValue,
    /// A value failed type-specific validation.
    InvalidValue,
    /// The text entry point received undecodable input.
    Decode,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    class: Option<String>,
    property: Option<String>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            class: None,
            property: None,
            hint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The `Class.property` path of the failing property, when both halves
    /// are known.
    pub fn property_path(&self) -> Option<String> {
        match (&self.class, &self.property) {
            (Some(class), Some(property)) => Some(format!("{class}.{property}")),
            _ => None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(path) = self.property_path() {
            write!(f, " [{path}]")?;
        } else if let Some(class) = &self.class {
            write!(f, " [{class}]")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
