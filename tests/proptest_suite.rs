//! Property-based tests for modern_errors
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use modern_errors::{
    ClassOptions, ErrorClass, GlobalOptions, InstanceOptions, MethodOutput, OptionsBag, Plugin,
    merge_bags, merge_values,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn hierarchy(global: GlobalOptions) -> (ErrorClass, ErrorClass) {
    let any_error = ErrorClass::any_error(global).unwrap();
    any_error.subclass("UnknownError", ClassOptions::new()).unwrap();
    let input = any_error.subclass("InputError", ClassOptions::new()).unwrap();
    (any_error, input)
}

fn level_plugin() -> std::sync::Arc<Plugin> {
    Plugin::builder("level")
        .get_options(|raw, _full| match raw {
            Value::Null | Value::Number(_) => Ok(raw.clone()),
            _ => Err("It must be a number".into()),
        })
        .is_options(Value::is_number)
        .instance_method("level", |info, _args| Ok(MethodOutput::from(info.options().clone())))
        .build()
}

fn object() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-e]", prop::option::of(0i64..100), 0..5).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(key, value)| (key, value.map_or(Value::Null, Value::from)))
            .collect()
    })
}

// ============================================================================
// MESSAGE PROPERTIES
// ============================================================================

proptest! {
    /// Cause and own message join with a newline, empty parts dropped
    #[test]
    fn messages_concatenate(cause in "[a-zA-Z .]{0,20}", own in "[a-zA-Z .]{0,20}") {
        let (_, input) = hierarchy(GlobalOptions::new());
        let error = input
            .create(own.clone(), InstanceOptions::new().cause(cause.clone()))
            .unwrap();

        let expected = match (cause.is_empty(), own.is_empty()) {
            (true, _) => own,
            (false, true) => cause,
            (false, false) => format!("{cause}\n{own}"),
        };
        prop_assert_eq!(error.message(), expected.as_str());
        prop_assert!(error.stack().starts_with("InputError"));
    }

    /// The log line stays valid UTF-8 and bounded whatever the message
    #[test]
    fn log_output_is_bounded(message in "\\PC{0,5000}") {
        let (_, input) = hierarchy(GlobalOptions::new());
        let error = input.create(message, InstanceOptions::new()).unwrap();

        let mut buffer = String::new();
        error.log().write_to(&mut buffer).unwrap();
        prop_assert!(std::str::from_utf8(buffer.as_bytes()).is_ok());
        prop_assert!(buffer.len() < 1200);
    }
}

// ============================================================================
// NORMALIZATION PROPERTIES
// ============================================================================

proptest! {
    /// Known instances survive normalization untouched
    #[test]
    fn normalization_preserves_identity(message in "\\PC{0,100}") {
        let (any_error, input) = hierarchy(GlobalOptions::new());
        let error = input.create(message, InstanceOptions::new()).unwrap();

        prop_assert!(any_error.normalize(error.clone()).unwrap().same_instance(&error));
        prop_assert!(input.normalize(error.clone()).unwrap().same_instance(&error));
    }

    /// Anything else becomes UnknownError through the root
    #[test]
    fn unknown_values_fall_back(value in prop_oneof![
        any::<i64>().prop_map(Value::from),
        "\\PC{0,50}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]) {
        let (any_error, _) = hierarchy(GlobalOptions::new());
        let error = any_error.normalize(value.clone()).unwrap();
        prop_assert_eq!(error.name(), "UnknownError");
        prop_assert!(error.wrap());
        prop_assert_eq!(error.cause_value(), Some(&value));
    }

    /// Aggregated errors keep their order and count
    #[test]
    fn aggregates_keep_order(messages in prop::collection::vec("[a-z]{1,8}", 0..6)) {
        let (_, input) = hierarchy(GlobalOptions::new());
        let error = input
            .create(
                "outer",
                InstanceOptions::new().errors(messages.iter().map(|message| message.as_str().into())),
            )
            .unwrap();

        let normalized: Vec<_> = error
            .errors()
            .unwrap_or_default()
            .iter()
            .map(|inner| inner.message().to_string())
            .collect();
        prop_assert_eq!(normalized, messages);
    }
}

// ============================================================================
// OPTIONS PROPERTIES
// ============================================================================

proptest! {
    /// The highest defined scope wins
    #[test]
    fn options_follow_precedence(
        global in prop::option::of(0i64..100),
        class in prop::option::of(0i64..100),
        instance in prop::option::of(0i64..100),
        method in prop::option::of(0i64..100),
    ) {
        let mut global_options = GlobalOptions::new().plugin(level_plugin());
        if let Some(global) = global {
            global_options = global_options.option("level", json!(global));
        }
        let any_error = ErrorClass::any_error(global_options).unwrap();
        any_error.subclass("UnknownError", ClassOptions::new()).unwrap();

        let mut class_options = ClassOptions::new();
        if let Some(class) = class {
            class_options = class_options.option("level", json!(class));
        }
        let test_error = any_error.subclass("TestError", class_options).unwrap();

        let mut instance_options = InstanceOptions::new();
        if let Some(instance) = instance {
            instance_options = instance_options.option("level", json!(instance));
        }
        let error = test_error.create("test", instance_options).unwrap();

        let args = method.map(|method| vec![json!(method)]).unwrap_or_default();
        let output = error.call("level", args).unwrap().ready().unwrap();

        let expected = method.or(instance).or(class).or(global).map_or(Value::Null, Value::from);
        prop_assert_eq!(output, expected);
    }

    /// Objects merge one level deep, higher keys winning, nulls ignored
    #[test]
    fn merge_is_shallow(lower in object(), higher in object()) {
        let merged = merge_values(&Value::Object(lower.clone()), &Value::Object(higher.clone()));
        let merged = merged.as_object().unwrap();

        for (key, value) in merged {
            let expected = match higher.get(key) {
                Some(value) if !value.is_null() => value,
                _ => &lower[key],
            };
            prop_assert_eq!(value, expected);
        }
        for (key, value) in &higher {
            if !value.is_null() {
                prop_assert!(merged.contains_key(key));
            }
        }
        for key in lower.keys() {
            prop_assert!(merged.contains_key(key));
        }
    }

    /// Nested objects are replaced, never merged
    #[test]
    fn nested_objects_are_replaced(a in 0i64..100, b in 0i64..100) {
        let merged = merge_values(&json!({ "nested": { "a": a } }), &json!({ "nested": { "b": b } }));
        prop_assert_eq!(merged, json!({ "nested": { "b": b } }));
    }

    /// A null layer never unsets a lower value
    #[test]
    fn null_never_unsets(value in 0i64..100) {
        prop_assert_eq!(merge_values(&json!(value), &Value::Null), json!(value));

        let mut lower = OptionsBag::new();
        lower.insert("plugin".into(), json!(value));
        let mut higher = OptionsBag::new();
        higher.insert("plugin".into(), Value::Null);
        prop_assert_eq!(merge_bags([&lower, &higher])["plugin"].clone(), json!(value));
    }
}
