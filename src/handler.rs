//! One-call setup of a hierarchy and its top-level error handler.
//!
//! ```rust
//! use modern_errors::{ForeignError, GlobalOptions, modern_errors};
//!
//! let errors = modern_errors(["InputError", "AuthError"], GlobalOptions::new())?;
//!
//! let input = errors.class("InputError").unwrap().create("bad input", Default::default())?;
//! assert!(errors.error_handler(input.clone()).same_instance(&input));
//!
//! let unknown = errors.error_handler(ForeignError::new("Error", "boom"));
//! assert_eq!(unknown.name(), "UnknownError");
//! assert_eq!(unknown.message(), "boom");
//! # Ok::<(), modern_errors::Error>(())
//! ```

use crate::Result;
use crate::cause::concat_messages;
use crate::class::{ErrorClass, UNKNOWN_ERROR};
use crate::instance::{ErrorInstance, caller_frame, value_to_text};
use crate::normalize;
use crate::options::{ClassOptions, GlobalOptions, OptionsBag};
use crate::serialize::from_plain_object;
use crate::thrown::Thrown;
use serde_json::Value;
use std::panic::Location;
use std::sync::Arc;
use tracing::{debug, warn};

/// Create a hierarchy with `UnknownError` and one class per name.
///
/// `UnknownError` may be listed in `names`; it is only declared once.
///
/// # Errors
///
/// Whatever [`ErrorClass::any_error`] or [`ErrorClass::subclass`] reject.
pub fn modern_errors<I, S>(names: I, options: GlobalOptions) -> Result<ModernErrors>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let any_error = ErrorClass::any_error(options)?;
    let unknown_error = any_error.subclass(UNKNOWN_ERROR, ClassOptions::new())?;

    let mut classes = vec![unknown_error.clone()];
    for name in names {
        let name = name.into();
        if name != UNKNOWN_ERROR {
            classes.push(any_error.subclass(name, ClassOptions::new())?);
        }
    }

    debug!(classes = classes.len(), "error classes declared");
    Ok(ModernErrors {
        any_error,
        unknown_error,
        classes,
    })
}

/// Classes created by [`modern_errors`].
#[derive(Debug, Clone)]
pub struct ModernErrors {
    any_error: ErrorClass,
    unknown_error: ErrorClass,
    classes: Vec<ErrorClass>,
}

impl ModernErrors {
    /// Root class.
    #[inline]
    pub fn any_error(&self) -> &ErrorClass {
        &self.any_error
    }

    /// Fallback class.
    #[inline]
    pub fn unknown_error(&self) -> &ErrorClass {
        &self.unknown_error
    }

    /// Class named `name`, `UnknownError` included.
    pub fn class(&self, name: &str) -> Option<&ErrorClass> {
        self.classes.iter().find(|class| class.name() == name)
    }

    /// Declared classes, `UnknownError` first.
    #[inline]
    pub fn classes(&self) -> &[ErrorClass] {
        &self.classes
    }

    /// Normalize anything caught at the top level.
    ///
    /// Known instances are returned as-is. Anything else becomes an
    /// `UnknownError`, whose message ends with the bug report line when
    /// `bugs_url` is set. This never fails: if a plugin rejects the
    /// normalization, a bare `UnknownError` is built instead.
    #[track_caller]
    pub fn error_handler(&self, value: impl Into<Thrown>) -> ErrorInstance {
        let frame = caller_frame(Location::caller());
        self.handle(value.into(), &frame)
    }

    /// Restore a serialized error, then run it through
    /// [`error_handler`](Self::error_handler).
    #[track_caller]
    pub fn parse(&self, value: &Value) -> ErrorInstance {
        let frame = caller_frame(Location::caller());
        match from_plain_object(value, &self.any_error) {
            Ok(thrown) => self.handle(thrown, &frame),
            Err(err) => {
                warn!(error = %err, "parsing failed, falling back to UnknownError");
                self.fallback(&Thrown::Value(value.clone()), &frame)
            }
        }
    }

    fn handle(&self, value: Thrown, frame: &str) -> ErrorInstance {
        let value = match value {
            Thrown::Error(instance) if instance.class().same_hierarchy(&self.any_error) => {
                return instance;
            }
            other => other,
        };

        let original = value.clone();
        match normalize::normalize(&self.any_error, value, frame) {
            Ok(mut error) => {
                if error.class() == &self.unknown_error {
                    self.append_bugs_line(&mut error);
                    debug!(error = %error.log(), "unknown error handled");
                }
                error
            }
            Err(err) => {
                warn!(error = %err, "normalization failed, falling back to UnknownError");
                self.fallback(&original, frame)
            }
        }
    }

    /// `UnknownError` built without running any plugin.
    fn fallback(&self, value: &Thrown, frame: &str) -> ErrorInstance {
        let message = match value {
            Thrown::Error(instance) => instance.message().to_string(),
            Thrown::Foreign(foreign) => foreign.message.clone(),
            Thrown::Value(Value::Object(object)) => object
                .get("message")
                .map(value_to_text)
                .unwrap_or_default(),
            Thrown::Value(other) => value_to_text(other),
        };

        let mut error = ErrorInstance::bare(
            self.unknown_error.clone(),
            message,
            frame.to_string(),
            Arc::new(OptionsBag::new()),
            Vec::new(),
        );
        error.wrap = true;
        if let Thrown::Value(raw) = value {
            error.cause_value = (!raw.is_null()).then(|| raw.clone());
        }
        self.append_bugs_line(&mut error);
        error
    }

    fn append_bugs_line(&self, error: &mut ErrorInstance) {
        if let Some(url) = self.any_error.bugs_url() {
            let line = format!("Please report this bug at: {url}");
            let message = concat_messages(error.message(), &line);
            error.set_message(message);
        }
    }
}
