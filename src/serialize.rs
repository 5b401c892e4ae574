//! Plain-object boundary.
//!
//! An instance serializes to
//! `{"name", "message", "stack", "cause"?, "errors"?, ...enumerable props}`.
//! `cause` is the raw non-error cause, if any; `errors` holds the aggregated
//! errors in the same shape. Parsing it back restores an instance of the
//! named class when the hierarchy knows it, and a [`ForeignError`]
//! otherwise.

use crate::Result;
use crate::class::ErrorClass;
use crate::instance::{ErrorInstance, Property};
use crate::options::OptionsBag;
use crate::thrown::{ForeignError, Thrown};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Typed view of a serialized error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Class or constructor name.
    pub name: String,
    /// Message.
    #[serde(default)]
    pub message: String,
    /// Stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Raw cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Value>,
    /// Aggregated errors, serialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
    /// Enumerable properties.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Serialize `error` to a plain object. Non-enumerable properties are
/// left out.
pub fn to_plain_object(error: &ErrorInstance) -> Value {
    let mut object = Map::new();
    object.insert("name".into(), Value::String(error.name().to_string()));
    object.insert("message".into(), Value::String(error.message().to_string()));
    object.insert("stack".into(), Value::String(error.stack().to_string()));
    if let Some(cause) = error.cause_value() {
        object.insert("cause".into(), cause.clone());
    }
    if let Some(errors) = error.errors() {
        object.insert(
            "errors".into(),
            Value::Array(errors.iter().map(to_plain_object).collect()),
        );
    }
    for (key, value) in error.enumerable_properties() {
        object.insert(key.to_string(), value.clone());
    }
    Value::Object(object)
}

impl Serialize for ErrorInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        to_plain_object(self).serialize(serializer)
    }
}

/// Parse a plain object produced by [`to_plain_object`].
///
/// Values that are not error-shaped come back as [`Thrown::Value`].
///
/// # Errors
///
/// Aggregated errors that do not name a known class are normalized
/// through the root, which fails while `UnknownError` is missing.
pub fn from_plain_object(value: &Value, any_error: &ErrorClass) -> Result<Thrown> {
    let Ok(object) = serde_json::from_value::<ErrorObject>(value.clone()) else {
        return Ok(Thrown::Value(value.clone()));
    };

    match any_error.find(&object.name).filter(|class| !class.is_root()) {
        Some(class) => restore(class, object, any_error).map(Thrown::Error),
        None => foreign(object, any_error).map(Thrown::Foreign),
    }
}

fn restore(class: ErrorClass, object: ErrorObject, any_error: &ErrorClass) -> Result<ErrorInstance> {
    let ErrorObject {
        message,
        stack,
        cause,
        errors,
        properties,
        ..
    } = object;

    let mut instance =
        ErrorInstance::bare(class, message, String::new(), Arc::new(OptionsBag::new()), Vec::new());
    if let Some(stack) = stack {
        instance.stack = stack;
    }
    // Only enumerable properties are serialized.
    for (key, value) in properties {
        if !instance.is_protected(&key) && !value.is_null() {
            instance.props.push((key, Property::new(value, true)));
        }
    }
    instance.cause_value = cause.filter(|cause| !cause.is_null());

    if let Some(errors) = errors {
        let root = any_error.root();
        let errors = errors
            .iter()
            .map(|error| match from_plain_object(error, &root)? {
                Thrown::Error(instance) => Ok(instance),
                other => root.normalize(other),
            })
            .collect::<Result<Vec<_>>>()?;
        instance.errors = Some(errors);
    }
    Ok(instance)
}

fn foreign(object: ErrorObject, any_error: &ErrorClass) -> Result<ForeignError> {
    let ErrorObject {
        name,
        message,
        stack,
        cause,
        errors,
        properties,
    } = object;

    let cause = match cause {
        Some(cause) if !cause.is_null() => Some(Box::new(from_plain_object(&cause, any_error)?)),
        _ => None,
    };
    let errors = errors
        .unwrap_or_default()
        .iter()
        .map(|error| from_plain_object(error, any_error))
        .collect::<Result<Vec<_>>>()?;

    Ok(ForeignError {
        constructor: name.clone(),
        name: Some(name),
        message,
        stack,
        properties,
        cause,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ClassOptions, GlobalOptions, InstanceOptions};
    use serde_json::json;

    fn hierarchy() -> (ErrorClass, ErrorClass) {
        let any_error = ErrorClass::any_error(GlobalOptions::new()).unwrap();
        any_error.subclass("UnknownError", ClassOptions::new()).unwrap();
        let input = any_error.subclass("InputError", ClassOptions::new()).unwrap();
        (any_error, input)
    }

    #[test]
    fn plain_object_has_enumerable_props_only() {
        let (_, input) = hierarchy();
        let error = input
            .create(
                "bad",
                InstanceOptions::new().props(json!({ "path": "/tmp", "_secret": 1 })),
            )
            .unwrap();
        let object = to_plain_object(&error);
        assert_eq!(object["name"], json!("InputError"));
        assert_eq!(object["message"], json!("bad"));
        assert_eq!(object["path"], json!("/tmp"));
        assert!(object.get("_secret").is_none());
        assert!(object.get("cause").is_none());
        assert_eq!(serde_json::to_value(&error).unwrap(), object);
    }

    #[test]
    fn known_names_round_trip() {
        let (any_error, input) = hierarchy();
        let error = input
            .create(
                "bad",
                InstanceOptions::new()
                    .cause(json!({ "code": 5 }))
                    .props(json!({ "path": "/tmp" }))
                    .errors([Thrown::from("inner")]),
            )
            .unwrap();
        let object = to_plain_object(&error);

        let Thrown::Error(restored) = from_plain_object(&object, &any_error).unwrap() else {
            panic!("expected a restored instance");
        };
        assert_eq!(restored.name(), "InputError");
        assert_eq!(restored.message(), error.message());
        assert_eq!(restored.stack(), error.stack());
        assert_eq!(restored.get("path"), Some(&json!("/tmp")));
        assert_eq!(restored.cause_value(), Some(&json!({ "code": 5 })));
        assert_eq!(restored.errors().map(<[_]>::len), Some(1));
        assert_eq!(to_plain_object(&restored), object);
    }

    #[test]
    fn enumerable_underscore_keys_round_trip() {
        let (any_error, input) = hierarchy();
        let mut error = input.create("bad", InstanceOptions::new()).unwrap();
        error.define_property("_id", json!(7), true).unwrap();
        let object = to_plain_object(&error);
        assert_eq!(object["_id"], json!(7));

        let Thrown::Error(restored) = from_plain_object(&object, &any_error).unwrap() else {
            panic!("expected a restored instance");
        };
        assert!(restored.property("_id").is_some_and(Property::is_enumerable));
        assert_eq!(to_plain_object(&restored), object);
    }

    #[test]
    fn unknown_names_become_foreign_errors() {
        let (any_error, _) = hierarchy();
        let object = json!({
            "name": "TypeError",
            "message": "outer",
            "cause": { "name": "RangeError", "message": "inner" },
            "code": 3
        });
        let Thrown::Foreign(foreign) = from_plain_object(&object, &any_error).unwrap() else {
            panic!("expected a foreign error");
        };
        assert_eq!(foreign.name(), "TypeError");
        assert_eq!(foreign.properties["code"], json!(3));
        assert!(matches!(foreign.cause.as_deref(), Some(Thrown::Foreign(inner)) if inner.message == "inner"));
    }

    #[test]
    fn root_name_is_not_restored() {
        let (any_error, _) = hierarchy();
        let parsed = from_plain_object(&json!({ "name": "AnyError", "message": "x" }), &any_error);
        assert!(matches!(parsed, Ok(Thrown::Foreign(_))));
    }

    #[test]
    fn non_error_values_pass_through() {
        let (any_error, _) = hierarchy();
        for value in [json!("boom"), json!(5), json!({ "message": "no name" })] {
            assert!(matches!(
                from_plain_object(&value, &any_error),
                Ok(Thrown::Value(ref parsed)) if *parsed == value
            ));
        }
    }
}
