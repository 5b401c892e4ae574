//! Normalization of thrown values into instances of a target class.

use crate::Result;
use crate::class::ErrorClass;
use crate::instance::ErrorInstance;
use crate::options::InstanceOptions;
use crate::thrown::Thrown;
use tracing::trace;

/// Normalize `value` into an instance of `target`.
///
/// Instances already of the target (any instance when the target is the
/// root) are returned as-is. Other instances of the hierarchy are
/// re-classed. Everything else becomes the cause of a new instance of the
/// target, or of `UnknownError` when the target is the root.
pub(crate) fn normalize(target: &ErrorClass, value: Thrown, frame: &str) -> Result<ErrorInstance> {
    let unknown = target.unknown_error()?;

    match value {
        Thrown::Error(instance) if instance.class().same_hierarchy(target) => {
            if target.is_root() || instance.is_instance_of(target) {
                trace!(class = instance.name(), "already normalized");
                Ok(instance)
            } else {
                reclass(target, instance)
            }
        }
        other => {
            let class = if target.is_root() { unknown } else { target.clone() };
            trace!(class = class.name(), "wrapping unknown value");
            class.construct(String::new(), InstanceOptions::new().cause(other), frame)
        }
    }
}

/// New instance of `target` carrying over message, stack, properties,
/// aggregated errors and options of `instance`.
fn reclass(target: &ErrorClass, mut instance: ErrorInstance) -> Result<ErrorInstance> {
    instance.revert_plugin_values();
    let old_name = instance.name().to_string();
    trace!(from = %old_name, to = target.name(), "re-classing instance");

    let ErrorInstance {
        message,
        stack,
        props,
        errors,
        cause_value,
        options,
        constructor_args,
        ..
    } = instance;

    let mut reclassed =
        ErrorInstance::bare(target.clone(), message, String::new(), options, constructor_args);
    reclassed.stack = stack;
    reclassed.rename_header(&old_name);
    reclassed.props = props
        .into_iter()
        .filter(|(key, _)| !reclassed.is_protected(key))
        .collect();
    reclassed.errors = errors;
    reclassed.cause_value = cause_value;
    reclassed.wrap = true;

    target.finish(reclassed)
}

#[cfg(test)]
mod tests {
    use crate::error::ConfigurationError;
    use crate::options::{ClassOptions, GlobalOptions, InstanceOptions};
    use crate::thrown::{ForeignError, Thrown};
    use crate::{Error, ErrorClass};
    use serde_json::json;

    fn hierarchy() -> (ErrorClass, ErrorClass, ErrorClass) {
        let any_error = ErrorClass::any_error(GlobalOptions::new()).unwrap();
        let unknown = any_error.subclass("UnknownError", ClassOptions::new()).unwrap();
        let input = any_error.subclass("InputError", ClassOptions::new()).unwrap();
        (any_error, unknown, input)
    }

    #[test]
    fn instances_of_target_are_returned_unchanged() {
        let (any_error, _, input) = hierarchy();
        let child = input.subclass("ChildError", ClassOptions::new()).unwrap();
        let error = child.create("test", InstanceOptions::new()).unwrap();

        assert!(input.normalize(error.clone()).unwrap().same_instance(&error));
        assert!(child.normalize(error.clone()).unwrap().same_instance(&error));
        assert!(any_error.normalize(error.clone()).unwrap().same_instance(&error));
    }

    #[test]
    fn other_known_instances_are_reclassed() {
        let (_, unknown, input) = hierarchy();
        let error = input
            .create("test", InstanceOptions::new().props(json!({ "prop": true })))
            .unwrap();

        let normalized = unknown.normalize(error.clone()).unwrap();
        assert!(!normalized.same_instance(&error));
        assert_eq!(normalized.name(), "UnknownError");
        assert_eq!(normalized.message(), "test");
        assert!(normalized.stack().starts_with("UnknownError: test"));
        assert_eq!(normalized.get("prop"), Some(&json!(true)));
    }

    #[test]
    fn values_become_unknown_error_through_root() {
        let (any_error, _, input) = hierarchy();
        for value in [json!("boom"), json!({ "message": "boom" }), json!(null), json!(5)] {
            let normalized = any_error.normalize(value.clone()).unwrap();
            assert_eq!(normalized.name(), "UnknownError");
            assert_eq!(normalized.cause_value(), (!value.is_null()).then_some(&value));
        }

        let normalized = input.normalize("boom").unwrap();
        assert_eq!(normalized.name(), "InputError");
        assert_eq!(normalized.message(), "boom");
    }

    #[test]
    fn foreign_errors_are_wrapped_with_prefix_rule() {
        let (any_error, _, _) = hierarchy();
        let plain = any_error.normalize(ForeignError::new("Error", "boom")).unwrap();
        assert_eq!(plain.message(), "boom");
        assert!(plain.wrap());

        let named = any_error
            .normalize(ForeignError::new("Error", "boom").with_name("CustomError"))
            .unwrap();
        assert_eq!(named.message(), "CustomError: boom");
    }

    #[test]
    fn instances_of_other_hierarchies_are_foreign() {
        let (any_error, _, _) = hierarchy();
        let (_, _, other_input) = hierarchy();
        let error = other_input.create("boom", InstanceOptions::new()).unwrap();

        let normalized = any_error.normalize(error).unwrap();
        assert_eq!(normalized.name(), "UnknownError");
        assert_eq!(normalized.message(), "InputError: boom");
    }

    #[test]
    fn aggregate_errors_are_normalized_in_order() {
        let (any_error, _, input) = hierarchy();
        let known = input.create("known", InstanceOptions::new()).unwrap();
        let error = input
            .create(
                "outer",
                InstanceOptions::new().errors([
                    Thrown::from("first"),
                    Thrown::from(known.clone()),
                    Thrown::from(ForeignError::new("TypeError", "third")),
                ]),
            )
            .unwrap();

        let errors = error.errors().unwrap();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].name(), "UnknownError");
        assert!(errors[1].same_instance(&known));
        assert_eq!(errors[2].message(), "third");
        assert!(any_error.normalize(error.clone()).unwrap().same_instance(&error));
    }

    #[test]
    fn normalization_needs_unknown_error() {
        let any_error = ErrorClass::any_error(GlobalOptions::new()).unwrap();
        assert_eq!(
            any_error.normalize("boom").unwrap_err(),
            Error::from(ConfigurationError::MissingUnknownError)
        );
    }
}
