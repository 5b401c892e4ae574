use modern_errors::{
    ClassOptions, ErrorClass, GlobalOptions, InstanceOptions, MethodOutput, Plugin, PluginError,
    PropertyMap, Result,
};
use serde_json::{Value, json};

/// Exit code per class, overridable per instance or per call.
fn exit_plugin() -> std::sync::Arc<Plugin> {
    Plugin::builder("exit")
        .get_options(|raw, _full| match raw {
            Value::Null => Ok(json!(1)),
            Value::Number(_) => Ok(raw.clone()),
            _ => Err("It must be an integer".to_string()),
        })
        .is_options(Value::is_number)
        .properties(|info| {
            let mut props = PropertyMap::new();
            props.insert("_exitCode".into(), info.options().clone());
            Ok(props)
        })
        .instance_method("exit_code", |info, _args| {
            Ok(MethodOutput::from(info.options().clone()))
        })
        .static_method("exit_codes", |info, _args| {
            let mut codes = serde_json::Map::new();
            for class in info.error_classes().iter() {
                let code = class
                    .class_options()
                    .get("exit")
                    .cloned()
                    .unwrap_or(json!(1));
                codes.insert(class.name().to_string(), code);
            }
            Ok(MethodOutput::from(Value::Object(codes)))
        })
        .build()
}

/// Describes an instance, with an optional prefix argument.
fn label_plugin() -> std::sync::Arc<Plugin> {
    Plugin::builder("label")
        .instance_method("describe", |info, args| {
            let error = info
                .error()
                .ok_or_else(|| PluginError::new("describe needs an instance"))?;
            let prefix = args.first().and_then(Value::as_str).unwrap_or("error");
            Ok(MethodOutput::from(json!(format!(
                "{prefix}: {} ({})",
                error.message(),
                error.name()
            ))))
        })
        .build()
}

fn main() -> Result<()> {
    let any_error = ErrorClass::any_error(
        GlobalOptions::new().plugins([exit_plugin(), label_plugin()]),
    )?;
    any_error.subclass("UnknownError", ClassOptions::new())?;
    let input_error = any_error.subclass("InputError", ClassOptions::new().option("exit", json!(2)))?;
    let auth_error = any_error.subclass("AuthError", ClassOptions::new().option("exit", json!(3)))?;

    println!("--- Plugin Methods Example ---\n");

    let error = input_error.create("Invalid argument.", InstanceOptions::new())?;
    println!("1. class option:    {:?}", error.call("exit_code", vec![])?.ready());
    println!("   hidden property: {:?}", error.get("_exitCode"));

    let error = auth_error.create("Token expired.", InstanceOptions::new().option("exit", json!(4)))?;
    println!("2. instance option: {:?}", error.call("exit_code", vec![])?.ready());
    println!("3. method option:   {:?}", error.call("exit_code", vec![json!(5)])?.ready());
    println!(
        "4. describe:        {:?}",
        error.call("describe", vec![json!("auth")])?.ready()
    );
    println!(
        "5. static method:   {:?}",
        any_error.call_static("exit_codes", vec![])?.ready()
    );
    Ok(())
}
