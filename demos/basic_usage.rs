use modern_errors::{ErrorClass, ErrorInstance, ForeignError, GlobalOptions, InstanceOptions, modern_errors};
use serde_json::json;
use std::error::Error;

fn read_config(input_error: &ErrorClass, path: &str) -> Result<String, Box<dyn Error>> {
    // Simulate a failed read: the I/O error becomes the cause
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, format!("{path}: not found"));
    let error: ErrorInstance = input_error.create(
        "Could not read the configuration file.",
        InstanceOptions::new()
            .cause(ForeignError::from(&io))
            .props(json!({ "filePath": path })),
    )?;
    Err(error.into())
}

fn main() -> Result<(), Box<dyn Error>> {
    let errors = modern_errors(
        ["InputError", "AuthError"],
        GlobalOptions::new().bugs_url("https://github.com/owner/repo/issues"),
    )?;
    let input_error = errors.class("InputError").ok_or("InputError is declared")?;

    println!("--- Basic Usage Example ---\n");

    // 1. Wrapping: the cause message comes first, properties are merged
    let err = match read_config(input_error, "/etc/app.toml") {
        Ok(_) => return Ok(()),
        Err(err) => err,
    };
    println!("1. [WRAPPED]");
    println!("   {err}");
    if let Some(error) = err.downcast_ref::<ErrorInstance>() {
        println!("   log: {}", error.log());

        // 2. Top-level handling: known errors pass through untouched
        let handled = errors.error_handler(error.clone());
        println!("\n2. [KNOWN] same instance: {}", handled.same_instance(error));
    }

    // 3. Anything else becomes UnknownError with the bug report line
    let handled = errors.error_handler(ForeignError::new("TypeError", "x is undefined"));
    println!("\n3. [UNKNOWN]");
    println!("   {}", handled.stack());

    // 4. Serialized form, and back
    let plain = modern_errors::to_plain_object(&handled);
    println!("\n4. [PLAIN OBJECT] {plain}");
    let parsed = errors.parse(&plain);
    println!("   parsed back as {}: {:?}", parsed.name(), parsed.message());
    Ok(())
}
