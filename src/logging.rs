//! Structured log view of an instance.
//!
//! [`ErrorLog`] borrows from the [`ErrorInstance`] that created it and
//! cannot outlive it. It exists for the duration of a logging call:
//!
//! ```rust
//! # use modern_errors::{ClassOptions, ErrorClass, GlobalOptions, InstanceOptions};
//! # use serde_json::json;
//! # let any_error = ErrorClass::any_error(GlobalOptions::new())?;
//! # any_error.subclass("UnknownError", ClassOptions::new())?;
//! # let input_error = any_error.subclass("InputError", ClassOptions::new())?;
//! let error = input_error.create("bad path", InstanceOptions::new().props(json!({ "path": "/tmp" })))?;
//! tracing::warn!(error = %error.log(), "request rejected");
//! assert_eq!(error.log().to_string(), "[InputError] message='bad path' path='/tmp'");
//! # Ok::<(), modern_errors::Error>(())
//! ```

use crate::instance::{ErrorInstance, value_to_text};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Maximum length of any field in formatted output.
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Appended to truncated fields.
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Borrowed structured view of an [`ErrorInstance`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorLog<'a> {
    error: &'a ErrorInstance,
}

impl<'a> ErrorLog<'a> {
    #[inline]
    pub(crate) fn new(error: &'a ErrorInstance) -> Self {
        Self { error }
    }

    /// Write `[Name] message='...'`, then `wrap`, the number of aggregated
    /// errors and the enumerable properties. Fields are truncated.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{}] message='{}'",
            self.name(),
            truncate_with_indicator(self.message())
        )?;

        if self.wrap() {
            f.write_str(" wrap=true")?;
        }

        if self.aggregated() > 0 {
            write!(f, " errors={}", self.aggregated())?;
        }

        for (key, value) in self.properties() {
            let text = value_to_text(value);
            write!(f, " {}='{}'", key, truncate_with_indicator(&text))?;
        }

        Ok(())
    }

    /// Class name.
    #[inline]
    pub fn name(&self) -> &'a str {
        self.error.name()
    }

    /// Message.
    #[inline]
    pub fn message(&self) -> &'a str {
        self.error.message()
    }

    /// Full stack, untruncated.
    #[inline]
    pub fn stack(&self) -> &'a str {
        self.error.stack()
    }

    /// Whether the instance wraps a cause of an unrelated class.
    #[inline]
    pub fn wrap(&self) -> bool {
        self.error.wrap()
    }

    /// Number of aggregated errors.
    #[inline]
    pub fn aggregated(&self) -> usize {
        self.error.errors().map_or(0, <[ErrorInstance]>::len)
    }

    /// Enumerable properties, untruncated.
    pub fn properties(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.error.enumerable_properties()
    }
}

impl fmt::Display for ErrorLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Cut `s` to [`MAX_FIELD_OUTPUT_LEN`] bytes on a char boundary, indicator
/// included. Borrows when nothing is cut.
fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let mut idx = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ClassOptions, GlobalOptions, InstanceOptions};
    use crate::{ErrorClass, Thrown};
    use serde_json::json;

    fn input_error() -> ErrorClass {
        let any_error = ErrorClass::any_error(GlobalOptions::new()).unwrap();
        any_error.subclass("UnknownError", ClassOptions::new()).unwrap();
        any_error.subclass("InputError", ClassOptions::new()).unwrap()
    }

    #[test]
    fn log_lists_enumerable_properties() {
        let error = input_error()
            .create(
                "bad",
                InstanceOptions::new().props(json!({ "path": "/tmp", "code": 4, "_hidden": true })),
            )
            .unwrap();
        assert_eq!(
            error.log().to_string(),
            "[InputError] message='bad' path='/tmp' code='4'"
        );
    }

    #[test]
    fn log_reports_wrap_and_aggregates() {
        let error = input_error()
            .create(
                "outer",
                InstanceOptions::new()
                    .cause("inner")
                    .errors([Thrown::from("one"), Thrown::from("two")]),
            )
            .unwrap();
        let log = error.log();
        assert_eq!(log.aggregated(), 2);
        assert!(log.stack().starts_with("InputError: inner\nouter"));
        assert_eq!(log.to_string(), "[InputError] message='inner\nouter' wrap=true errors=2");
    }

    #[test]
    fn long_messages_are_truncated_in_output_only() {
        let message = "a".repeat(MAX_FIELD_OUTPUT_LEN * 2);
        let error = input_error().create(message.clone(), InstanceOptions::new()).unwrap();
        let mut buffer = String::new();
        error.log().write_to(&mut buffer).unwrap();
        assert!(buffer.contains(TRUNCATION_INDICATOR));
        assert!(buffer.len() < message.len());
        assert_eq!(error.log().message(), message);
    }

    #[test]
    fn no_truncate_when_under_limit() {
        let truncated = truncate_with_indicator("short string");
        assert!(matches!(truncated, Cow::Borrowed("short string")));
    }

    #[test]
    fn exactly_at_limit_is_kept() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN);
        let truncated = truncate_with_indicator(&s);
        assert!(matches!(truncated, Cow::Borrowed(_)));
        assert!(!truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn one_over_limit_is_cut() {
        let s = "a".repeat(MAX_FIELD_OUTPUT_LEN + 1);
        let truncated = truncate_with_indicator(&s);
        assert!(matches!(truncated, Cow::Owned(_)));
        assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
        assert!(truncated.ends_with(TRUNCATION_INDICATOR));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        for s in ["й".repeat(MAX_FIELD_OUTPUT_LEN), "🔥".repeat(MAX_FIELD_OUTPUT_LEN)] {
            let truncated = truncate_with_indicator(&s);
            assert!(truncated.len() <= MAX_FIELD_OUTPUT_LEN);
            assert!(truncated.ends_with(TRUNCATION_INDICATOR));
        }
    }
}
