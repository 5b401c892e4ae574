//! Merging a cause into a new instance.
//!
//! A cause is never kept as a separate object: its message, frames,
//! properties, aggregated errors and (for instances of the same hierarchy)
//! instance options are folded into the new instance.
//!
//! # Prefixing
//!
//! The cause's name is prefixed onto its message when all hold:
//!
//! - the cause has a non-empty name and a non-empty constructor name,
//! - the constructor is not a native error type, unless the name was
//!   customized (name differs from the constructor name),
//! - the cause's class is neither an ancestor nor a descendant of the new
//!   instance's class.
//!
//! A prefixed cause with an empty message contributes its name alone.
//! Prefixing works on the merged copy only; the cause itself is untouched.

use crate::Result;
use crate::class::{ErrorClass, NATIVE_ERROR_NAMES};
use crate::instance::{ErrorInstance, Properties, Property, compose_stack, stack_frames, value_to_text};
use crate::normalize;
use crate::options::{OptionsBag, merge_bags};
use crate::thrown::{ForeignError, Thrown};
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::trace;

/// Everything a cause contributes, whatever its kind.
struct CauseShape {
    name: String,
    constructor: String,
    message: String,
    frames: String,
    props: Properties,
    errors: Vec<ErrorInstance>,
    options: Option<Arc<OptionsBag>>,
    class: Option<ErrorClass>,
    value: Option<Value>,
}

impl CauseShape {
    /// Message contributed to the merged one, prefixed when the rule holds.
    fn contributed_message(&self, related: bool) -> String {
        let prefix = !related
            && !self.name.is_empty()
            && !self.constructor.is_empty()
            && (!NATIVE_ERROR_NAMES.contains(&self.constructor.as_str())
                || self.name != self.constructor);

        if prefix && self.message.is_empty() {
            self.name.clone()
        } else if prefix {
            format!("{}: {}", self.name, self.message)
        } else {
            self.message.clone()
        }
    }
}

/// Merge `cause` into `error`. `frame` is used for anything normalized on
/// the way (aggregated errors of foreign causes).
pub(crate) fn merge_cause(error: &mut ErrorInstance, cause: Thrown, frame: &str) -> Result<()> {
    let root = error.class.root();
    let shape = shape_of(cause, &root, frame)?;

    let (wrap, related) = match &shape.class {
        Some(class) => (
            !class.is_subclass_of(&error.class),
            class.is_subclass_of(&error.class) || error.class.is_subclass_of(class),
        ),
        None => (true, false),
    };

    let message = concat_messages(&shape.contributed_message(related), &error.message);
    let frames = if shape.frames.is_empty() {
        error.frames()
    } else {
        shape.frames
    };
    error.stack = compose_stack(error.name(), &message, &frames);
    error.message = message;
    error.wrap = wrap;

    let own = std::mem::take(&mut error.props);
    let mut props: Properties = shape
        .props
        .into_iter()
        .filter(|(key, _)| !error.is_protected(key))
        .collect();
    merge_props_into(&mut props, own);
    error.props = props;

    if !shape.errors.is_empty() {
        let mut errors = shape.errors;
        errors.extend(error.errors.take().unwrap_or_default());
        error.errors = Some(errors);
    }

    if let Some(cause_options) = shape.options {
        error.options = Arc::new(merge_bags([cause_options.as_ref(), error.options.as_ref()]));
    }

    if shape.value.is_some() {
        error.cause_value = shape.value;
    }

    trace!(class = error.name(), wrap, cause = %shape.name, "cause merged");
    Ok(())
}

fn shape_of(cause: Thrown, root: &ErrorClass, frame: &str) -> Result<CauseShape> {
    match cause {
        Thrown::Error(instance) if instance.class.same_hierarchy(root) => Ok(instance_shape(instance)),
        Thrown::Error(instance) => foreign_shape(ForeignError::from_instance(&instance), root, frame),
        Thrown::Foreign(foreign) => foreign_shape(foreign, root, frame),
        Thrown::Value(value) => Ok(value_shape(value)),
    }
}

fn instance_shape(mut instance: ErrorInstance) -> CauseShape {
    instance.revert_plugin_values();
    let frames = instance.frames();
    CauseShape {
        name: instance.name().to_string(),
        constructor: instance.name().to_string(),
        message: std::mem::take(&mut instance.message),
        frames,
        props: std::mem::take(&mut instance.props),
        errors: instance.errors.take().unwrap_or_default(),
        options: Some(Arc::clone(&instance.options)),
        value: instance.cause_value.take(),
        class: Some(instance.class),
    }
}

/// Foreign errors are flattened with their own cause chain first.
fn foreign_shape(foreign: ForeignError, root: &ErrorClass, frame: &str) -> Result<CauseShape> {
    let name = foreign.name().to_string();
    let ForeignError {
        constructor,
        message,
        stack,
        properties,
        cause,
        errors,
        ..
    } = foreign;

    let mut shape = CauseShape {
        name,
        constructor,
        message,
        frames: stack.as_deref().map(stack_frames).unwrap_or_default(),
        props: properties
            .into_iter()
            .map(|(key, value)| {
                let enumerable = !key.starts_with('_');
                (key, Property::new(value, enumerable))
            })
            .collect(),
        errors: errors
            .into_iter()
            .map(|error| normalize::normalize(root, error, frame))
            .collect::<Result<Vec<_>>>()?,
        options: None,
        class: None,
        value: None,
    };

    if let Some(inner) = cause {
        let inner = shape_of(*inner, root, frame)?;
        shape.message = concat_messages(&inner.contributed_message(false), &shape.message);
        if !inner.frames.is_empty() {
            shape.frames = inner.frames;
        }
        let own = std::mem::replace(&mut shape.props, inner.props);
        merge_props_into(&mut shape.props, own);
        let own_errors = std::mem::replace(&mut shape.errors, inner.errors);
        shape.errors.extend(own_errors);
        shape.value = inner.value;
    }

    Ok(shape)
}

fn value_shape(value: Value) -> CauseShape {
    let (name, constructor, message) = match &value {
        Value::Null => (String::new(), String::new(), String::new()),
        Value::Object(object) => {
            let field = |key: &str| {
                object
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            (field("name"), "Object".to_string(), field("message"))
        }
        other => (String::new(), String::new(), value_to_text(other)),
    };

    CauseShape {
        name,
        constructor,
        message,
        frames: String::new(),
        props: SmallVec::new(),
        errors: Vec::new(),
        options: None,
        class: None,
        value: (!value.is_null()).then_some(value),
    }
}

/// `cause\nown`, or whichever of the two is non-empty.
pub(crate) fn concat_messages(cause: &str, own: &str) -> String {
    match (cause.is_empty(), own.is_empty()) {
        (true, _) => own.to_string(),
        (false, true) => cause.to_string(),
        (false, false) => format!("{cause}\n{own}"),
    }
}

/// Overlay `higher` on `lower`, keeping `lower`'s order for shared keys.
fn merge_props_into(lower: &mut Properties, higher: Properties) {
    for (key, property) in higher {
        match lower.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = property,
            None => lower.push((key, property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_concatenate_with_newline() {
        assert_eq!(concat_messages("a", "b"), "a\nb");
        assert_eq!(concat_messages("a", ""), "a");
        assert_eq!(concat_messages("", "b"), "b");
        assert_eq!(concat_messages("", ""), "");
    }

    fn shape(name: &str, constructor: &str, message: &str) -> CauseShape {
        CauseShape {
            name: name.into(),
            constructor: constructor.into(),
            message: message.into(),
            frames: String::new(),
            props: SmallVec::new(),
            errors: Vec::new(),
            options: None,
            class: None,
            value: None,
        }
    }

    #[test]
    fn native_constructors_are_not_prefixed() {
        assert_eq!(shape("Error", "Error", "boom").contributed_message(false), "boom");
        assert_eq!(
            shape("TypeError", "TypeError", "boom").contributed_message(false),
            "boom"
        );
    }

    #[test]
    fn customized_names_are_prefixed() {
        assert_eq!(
            shape("CustomError", "Error", "boom").contributed_message(false),
            "CustomError: boom"
        );
        assert_eq!(
            shape("OtherError", "OtherError", "boom").contributed_message(false),
            "OtherError: boom"
        );
    }

    #[test]
    fn related_or_unnamed_causes_are_not_prefixed() {
        assert_eq!(
            shape("OtherError", "OtherError", "boom").contributed_message(true),
            "boom"
        );
        assert_eq!(shape("", "Object", "boom").contributed_message(false), "boom");
        assert_eq!(shape("Error", "Error", "").contributed_message(false), "");
    }

    #[test]
    fn empty_messages_contribute_the_name() {
        assert_eq!(
            shape("OtherError", "OtherError", "").contributed_message(false),
            "OtherError"
        );
        assert_eq!(shape("CustomError", "Error", "").contributed_message(false), "CustomError");
        assert_eq!(shape("OtherError", "OtherError", "").contributed_message(true), "");
    }

    #[test]
    fn value_causes_keep_the_raw_value() {
        let shape = value_shape(json!("boom"));
        assert_eq!(shape.message, "boom");
        assert_eq!(shape.value, Some(json!("boom")));

        let shape = value_shape(json!({ "name": "CustomError", "message": "boom" }));
        assert_eq!(shape.contributed_message(false), "CustomError: boom");

        let shape = value_shape(Value::Null);
        assert_eq!(shape.message, "");
        assert_eq!(shape.value, None);

        assert_eq!(value_shape(json!(5)).message, "5");
    }

    #[test]
    fn props_overlay_keeps_lower_order() {
        let mut lower: Properties = SmallVec::new();
        lower.push(("one".into(), Property::new(json!(1), true)));
        lower.push(("two".into(), Property::new(json!(2), true)));
        let mut higher: Properties = SmallVec::new();
        higher.push(("two".into(), Property::new(json!(3), true)));
        higher.push(("three".into(), Property::new(json!(4), true)));

        merge_props_into(&mut lower, higher);
        let keys: Vec<_> = lower.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["one", "two", "three"]);
        assert_eq!(lower[1].1.value(), &json!(3));
    }
}
