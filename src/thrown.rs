//! Values that can be normalized or used as a cause.
//!
//! Anything "thrown" at the engine is one of three things:
//!
//! - an [`ErrorInstance`] built by some hierarchy (this one or another),
//! - a [`ForeignError`]: an error-like value that no hierarchy built, such as
//!   a `std::error::Error` or a deserialized plain object,
//! - an arbitrary JSON [`Value`].

use crate::instance::ErrorInstance;
use serde_json::{Map, Value};
use std::error::Error as StdError;

/// Any value accepted as a cause or as a normalization input.
#[derive(Debug, Clone)]
pub enum Thrown {
    /// Instance built by a hierarchy.
    Error(ErrorInstance),
    /// Error-like value from outside any hierarchy.
    Foreign(ForeignError),
    /// Anything else.
    Value(Value),
}

impl Thrown {
    /// Build a foreign error from a `std` error and its `source()` chain.
    pub fn from_std_error(error: &(dyn StdError + 'static)) -> Self {
        Self::Foreign(ForeignError::from_std(error))
    }

    /// True for instances and foreign errors.
    #[inline]
    pub fn is_error_like(&self) -> bool {
        !matches!(self, Self::Value(_))
    }

    /// The instance, if this is one.
    pub fn as_instance(&self) -> Option<&ErrorInstance> {
        match self {
            Self::Error(instance) => Some(instance),
            _ => None,
        }
    }
}

impl From<ErrorInstance> for Thrown {
    fn from(instance: ErrorInstance) -> Self {
        Self::Error(instance)
    }
}

impl From<&ErrorInstance> for Thrown {
    fn from(instance: &ErrorInstance) -> Self {
        Self::Error(instance.clone())
    }
}

impl From<ForeignError> for Thrown {
    fn from(error: ForeignError) -> Self {
        Self::Foreign(error)
    }
}

impl From<Value> for Thrown {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Thrown {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Thrown {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

/// Error-like value not built by any hierarchy.
///
/// `constructor` is the name of the type that produced it and `name` its
/// (possibly customized) display name; when `name` is `None` the
/// constructor name is used.
#[derive(Debug, Clone, Default)]
pub struct ForeignError {
    /// Name of the producing type (`"Error"`, `"TypeError"`, ...).
    pub constructor: String,
    /// Display name, when customized.
    pub name: Option<String>,
    /// Message.
    pub message: String,
    /// Full stack, when known.
    pub stack: Option<String>,
    /// Own properties.
    pub properties: Map<String, Value>,
    /// Its own cause.
    pub cause: Option<Box<Thrown>>,
    /// Aggregated errors.
    pub errors: Vec<Thrown>,
}

impl ForeignError {
    /// Foreign error with a constructor name and a message.
    #[must_use]
    pub fn new(constructor: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            constructor: constructor.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    /// Override the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the stack.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Add an own property.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Set the cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<Thrown>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    /// Set the aggregated errors.
    #[must_use]
    pub fn with_errors(mut self, errors: Vec<Thrown>) -> Self {
        self.errors = errors;
        self
    }

    /// Display name: `name` when set, else the constructor name.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.constructor)
    }

    /// Foreign error mirroring a `std` error. Its `source()` chain becomes
    /// the cause chain.
    pub fn from_std(error: &(dyn StdError + 'static)) -> Self {
        let mut foreign = Self::new("Error", error.to_string());
        if let Some(source) = error.source() {
            foreign.cause = Some(Box::new(Thrown::Foreign(Self::from_std(source))));
        }
        foreign
    }

    /// Foreign view of an instance built by another hierarchy.
    pub(crate) fn from_instance(instance: &ErrorInstance) -> Self {
        Self {
            constructor: instance.name().to_string(),
            name: Some(instance.name().to_string()),
            message: instance.message().to_string(),
            stack: Some(instance.stack().to_string()),
            properties: instance
                .enumerable_properties()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
            cause: instance.cause_value().cloned().map(|value| Box::new(Thrown::Value(value))),
            errors: instance
                .errors()
                .unwrap_or_default()
                .iter()
                .cloned()
                .map(Thrown::Error)
                .collect(),
        }
    }
}

impl<E: StdError + 'static> From<&E> for ForeignError {
    fn from(error: &E) -> Self {
        Self::from_std(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer failed")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("inner failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    impl StdError for Inner {}

    #[test]
    fn std_source_chain_becomes_cause_chain() {
        let foreign = ForeignError::from(&Outer(Inner));
        assert_eq!(foreign.message, "outer failed");
        assert_eq!(foreign.name(), "Error");
        match foreign.cause.as_deref() {
            Some(Thrown::Foreign(inner)) => {
                assert_eq!(inner.message, "inner failed");
                assert!(inner.cause.is_none());
            }
            other => panic!("unexpected cause: {other:?}"),
        }
    }

    #[test]
    fn name_defaults_to_constructor() {
        let foreign = ForeignError::new("TypeError", "bad");
        assert_eq!(foreign.name(), "TypeError");
        assert_eq!(foreign.with_name("CustomError").name(), "CustomError");
    }

    #[test]
    fn strings_become_values() {
        assert!(matches!(Thrown::from("boom"), Thrown::Value(Value::String(ref s)) if s == "boom"));
        assert!(!Thrown::from("boom").is_error_like());
        assert!(Thrown::from(ForeignError::new("Error", "boom")).is_error_like());
    }
}
