use modern_errors::{
    ClassOptions, ErrorClass, GlobalOptions, InstanceOptions, MethodOutput, Plugin, Result,
};
use serde_json::json;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let report = Plugin::builder("report")
        .instance_method("report", |info, _args| {
            let message = info
                .error()
                .map(|error| error.message().to_string())
                .unwrap_or_default();
            // The future is handed back untouched; the caller awaits it
            Ok(MethodOutput::pending(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(json!({ "reported": message }))
            }))
        })
        .build();

    let any_error = ErrorClass::any_error(GlobalOptions::new().plugin(report))?;
    any_error.subclass("UnknownError", ClassOptions::new())?;
    let network_error = any_error.subclass("NetworkError", ClassOptions::new())?;

    println!("--- Async Method Example ---\n");

    let error = network_error.create(
        "Connection reset.",
        InstanceOptions::new().cause("ECONNRESET"),
    )?;
    let output = error.call("report", vec![])?;
    println!("1. pending: {}", output.is_pending());
    println!("2. resolved: {}", output.resolve().await?);
    Ok(())
}
