//! # Modern Errors
//!
//! Custom error class hierarchies with layered options and pluggable
//! behavior.
//!
//! ## Design Philosophy
//!
//! 1. **One root per hierarchy.** Every class descends from `AnyError`, and
//!    `UnknownError` is the fallback for anything the hierarchy does not
//!    recognize.
//! 2. **Causes are merged, not nested.** A cause's message, stack,
//!    properties and aggregated errors are folded into the new error.
//! 3. **Anything can be thrown.** Foreign errors and plain values are
//!    normalized into instances of the hierarchy.
//! 4. **Behavior comes from plugins.** Plugins add properties and methods,
//!    configured through options at global, class, instance and call scope.
//!
//! ## Quick Start
//!
//! ```rust
//! use modern_errors::{ClassOptions, ErrorClass, GlobalOptions, InstanceOptions, Result};
//! use serde_json::json;
//!
//! fn classes() -> Result<(ErrorClass, ErrorClass)> {
//!     let any_error = ErrorClass::any_error(GlobalOptions::new())?;
//!     any_error.subclass("UnknownError", ClassOptions::new())?;
//!     let input_error = any_error.subclass("InputError", ClassOptions::new())?;
//!     Ok((any_error, input_error))
//! }
//!
//! let (any_error, input_error) = classes()?;
//!
//! // Wrapping: the cause's message comes first.
//! let error = input_error.create(
//!     "Could not read the file.",
//!     InstanceOptions::new().cause("ENOENT").props(json!({ "filePath": "/tmp" })),
//! )?;
//! assert_eq!(error.message(), "ENOENT\nCould not read the file.");
//! assert!(error.stack().starts_with("InputError: ENOENT"));
//!
//! // Normalizing: known instances are kept, the rest becomes UnknownError.
//! assert!(any_error.normalize(error.clone())?.same_instance(&error));
//! assert_eq!(any_error.normalize("oops")?.name(), "UnknownError");
//! # Ok::<(), modern_errors::Error>(())
//! ```
//!
//! ## Plugins
//!
//! ```rust
//! use modern_errors::{ClassOptions, ErrorClass, GlobalOptions, InstanceOptions, MethodOutput, Plugin};
//! use serde_json::json;
//!
//! let exit_code = Plugin::builder("exit")
//!     .get_options(|raw, _full| match raw {
//!         serde_json::Value::Null => Ok(json!(1)),
//!         serde_json::Value::Number(_) => Ok(raw.clone()),
//!         _ => Err("It must be a number".into()),
//!     })
//!     .instance_method("exitCode", |info, _args| Ok(MethodOutput::from(info.options().clone())))
//!     .build();
//!
//! let any_error = ErrorClass::any_error(GlobalOptions::new().plugin(exit_code))?;
//! any_error.subclass("UnknownError", ClassOptions::new())?;
//! let input_error = any_error.subclass("InputError", ClassOptions::new().option("exit", json!(2)))?;
//!
//! let error = input_error.create("bad", InstanceOptions::new())?;
//! assert_eq!(error.call("exitCode", vec![])?.ready(), Some(json!(2)));
//! # Ok::<(), modern_errors::Error>(())
//! ```
//!
//! ## Top-Level Handling
//!
//! [`modern_errors`] declares a hierarchy in one call; its
//! [`error_handler`](ModernErrors::error_handler) never fails and is meant
//! for the outermost `catch` of an application.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cause;
pub mod class;
pub mod core_plugins;
pub mod error;
pub mod handler;
pub mod info;
pub mod instance;
pub mod logging;
mod normalize;
pub mod options;
pub mod plugin;
mod registry;
pub mod serialize;
pub mod thrown;

pub use class::{
    ANY_ERROR, ConstructorArgs, CustomClass, CustomClassBuilder, CustomParent, ErrorClass,
    InitHook, NATIVE_ERROR_NAMES, UNKNOWN_ERROR,
};
pub use error::{ConfigurationError, Error, OptionsError, PluginError};
pub use handler::{ModernErrors, modern_errors};
pub use info::{ErrorClasses, ErrorInfo, Info};
pub use instance::{ErrorInstance, Property};
pub use logging::ErrorLog;
pub use options::{
    BugsUrl, ClassOptions, GlobalOptions, InstanceOptions, OnCreateHook, OptionsBag, merge_bags,
    merge_layers, merge_values,
};
pub use plugin::{MethodOutput, Plugin, PluginBuilder, PropertyMap};
pub use serialize::{ErrorObject, from_plain_object, to_plain_object};
pub use thrown::{ForeignError, Thrown};

/// Type alias for Results using our error type.
pub type Result<T> = std::result::Result<T, Error>;
