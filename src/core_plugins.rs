//! Plugins every hierarchy starts with.
//!
//! `props` assigns arbitrary properties from its options:
//!
//! ```rust
//! use modern_errors::{ClassOptions, ErrorClass, GlobalOptions, InstanceOptions};
//! use serde_json::json;
//!
//! let any_error = ErrorClass::any_error(GlobalOptions::new())?;
//! any_error.subclass("UnknownError", ClassOptions::new())?;
//! let input_error = any_error.subclass(
//!     "InputError",
//!     ClassOptions::new().option("props", json!({ "exitCode": 1 })),
//! )?;
//!
//! let error = input_error.create("test", InstanceOptions::new().props(json!({ "path": "/tmp" })))?;
//! assert_eq!(error.get("exitCode"), Some(&json!(1)));
//! assert_eq!(error.get("path"), Some(&json!("/tmp")));
//! # Ok::<(), modern_errors::Error>(())
//! ```

use crate::plugin::{Plugin, PropertyMap};
use serde_json::Value;
use std::sync::Arc;

/// Name of the built-in properties plugin.
pub const PROPS: &str = "props";

/// The `props` plugin. Its options must be an object; `message` and
/// `stack` are never assigned from it.
pub(crate) fn props() -> Arc<Plugin> {
    Plugin::builder(PROPS)
        .get_options(|raw, _full| match raw {
            Value::Null | Value::Object(_) => Ok(raw.clone()),
            _ => Err("It must be a plain object".to_string()),
        })
        .properties(|info| {
            let mut props = match info.options() {
                Value::Object(props) => props.clone(),
                _ => PropertyMap::new(),
            };
            props.remove("message");
            props.remove("stack");
            Ok(props)
        })
        .build()
}
