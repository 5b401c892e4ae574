//! Plugin descriptors.
//!
//! A [`Plugin`] contributes behavior to every class of a chain:
//!
//! - `get_options(raw, full)`: validates and normalizes the plugin's options.
//!   `full` is `false` for partial validation at registration time and `true`
//!   when the options are about to be handed to a hook.
//! - `is_options(candidate)`: decides whether the trailing argument of a
//!   method call is method-scoped options.
//! - `properties(info)`: computes properties assigned onto each new instance.
//! - instance and static methods, dispatched by name.
//!
//! Options of a plugin are namespaced under its name: `{"prop": ...}` configures
//! the plugin named `prop`.
//!
//! # Example
//!
//! ```rust
//! use modern_errors::{MethodOutput, Plugin};
//! use serde_json::json;
//!
//! let plugin = Plugin::builder("retry")
//!     .get_options(|raw, _full| match raw {
//!         serde_json::Value::Null | serde_json::Value::Bool(_) => Ok(raw.clone()),
//!         _ => Err("it must be a boolean".to_string()),
//!     })
//!     .properties(|info| {
//!         let mut props = serde_json::Map::new();
//!         props.insert("retryable".into(), json!(info.options().as_bool().unwrap_or(false)));
//!         Ok(props)
//!     })
//!     .instance_method("isRetryable", |info, _args| {
//!         Ok(MethodOutput::from(json!(info.options().as_bool().unwrap_or(false))))
//!     })
//!     .build();
//!
//! assert_eq!(plugin.name(), "retry");
//! ```

use crate::error::{OptionsError, PluginError};
use crate::info::Info;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Properties returned by a `properties` hook.
pub type PropertyMap = Map<String, Value>;

/// `get_options(raw, full)` hook. `Err` carries the reason shown to the user.
pub type GetOptionsHook = Arc<dyn Fn(&Value, bool) -> Result<Value, String> + Send + Sync>;

/// `is_options(candidate)` hook.
pub type IsOptionsHook = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// `properties(info)` hook.
pub type PropertiesHook =
    Arc<dyn Fn(&Info<'_>) -> Result<PropertyMap, PluginError> + Send + Sync>;

/// Instance or static method.
pub type MethodHook =
    Arc<dyn Fn(&Info<'_>, &[Value]) -> Result<MethodOutput, PluginError> + Send + Sync>;

/// Future returned by an asynchronous plugin method.
pub type PendingOutput = Pin<Box<dyn Future<Output = Result<Value, PluginError>> + Send + 'static>>;

/// What a plugin method returned.
///
/// Pending computations are handed back to the caller as-is: the core never
/// awaits or inspects them.
pub enum MethodOutput {
    /// Value computed synchronously.
    Ready(Value),
    /// Computation still running.
    Pending(PendingOutput),
}

impl MethodOutput {
    /// Wrap a future as a pending output.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, PluginError>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    /// The value, if it was computed synchronously.
    pub fn ready(self) -> Option<Value> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// True if the method returned a future.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Await the output, whichever shape it has.
    pub async fn resolve(self) -> Result<Value, PluginError> {
        match self {
            Self::Ready(value) => Ok(value),
            Self::Pending(future) => future.await,
        }
    }
}

impl From<Value> for MethodOutput {
    fn from(value: Value) -> Self {
        Self::Ready(value)
    }
}

impl fmt::Debug for MethodOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Self::Pending(_) => f.write_str("Pending(<future>)"),
        }
    }
}

/// A named method contributed by a plugin.
#[derive(Clone)]
pub(crate) struct PluginMethod {
    pub(crate) name: String,
    pub(crate) hook: MethodHook,
}

/// Plugin descriptor. Shared as `Arc<Plugin>`; passing the very same `Arc`
/// to a class and to one of its descendants is allowed.
pub struct Plugin {
    name: String,
    get_options: Option<GetOptionsHook>,
    is_options: Option<IsOptionsHook>,
    properties: Option<PropertiesHook>,
    instance_methods: Vec<PluginMethod>,
    static_methods: Vec<PluginMethod>,
}

impl Plugin {
    /// Start describing a plugin called `name`.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PluginBuilder {
        PluginBuilder {
            plugin: Plugin {
                name: name.into(),
                get_options: None,
                is_options: None,
                properties: None,
                instance_methods: Vec::new(),
                static_methods: Vec::new(),
            },
        }
    }

    /// Plugin name, also the key of its options.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the instance methods, in declaration order.
    pub fn instance_method_names(&self) -> impl Iterator<Item = &str> {
        self.instance_methods.iter().map(|m| m.name.as_str())
    }

    /// Names of the static methods, in declaration order.
    pub fn static_method_names(&self) -> impl Iterator<Item = &str> {
        self.static_methods.iter().map(|m| m.name.as_str())
    }

    #[inline]
    pub(crate) fn instance_methods(&self) -> &[PluginMethod] {
        &self.instance_methods
    }

    #[inline]
    pub(crate) fn static_methods(&self) -> &[PluginMethod] {
        &self.static_methods
    }

    #[inline]
    pub(crate) fn properties_hook(&self) -> Option<&PropertiesHook> {
        self.properties.as_ref()
    }

    /// Run `get_options` on a merged value.
    ///
    /// Without a hook, the plugin accepts no options: anything but `null`
    /// is rejected.
    pub(crate) fn normalize_options(&self, raw: &Value, full: bool) -> Result<Value, OptionsError> {
        match &self.get_options {
            Some(hook) => hook(raw, full).map_err(|reason| OptionsError::Invalid {
                plugin: self.name.clone(),
                reason,
            }),
            None if raw.is_null() => Ok(Value::Null),
            None => Err(OptionsError::NotAccepted {
                plugin: self.name.clone(),
            }),
        }
    }

    /// Split method-scoped options off the trailing argument.
    pub(crate) fn split_method_options(&self, mut args: Vec<Value>) -> (Vec<Value>, Option<Value>) {
        let is_options = match (&self.is_options, args.last()) {
            (Some(hook), Some(last)) => hook(last),
            _ => false,
        };
        if is_options {
            let options = args.pop();
            (args, options)
        } else {
            (args, None)
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("get_options", &self.get_options.is_some())
            .field("is_options", &self.is_options.is_some())
            .field("properties", &self.properties.is_some())
            .field(
                "instance_methods",
                &self.instance_method_names().collect::<Vec<_>>(),
            )
            .field("static_methods", &self.static_method_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent builder for [`Plugin`].
#[must_use = "call build() to obtain the plugin"]
pub struct PluginBuilder {
    plugin: Plugin,
}

impl PluginBuilder {
    /// Set the option normalization hook.
    pub fn get_options<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value, bool) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.plugin.get_options = Some(Arc::new(hook));
        self
    }

    /// Set the method-options predicate.
    pub fn is_options<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.plugin.is_options = Some(Arc::new(hook));
        self
    }

    /// Set the `properties` hook.
    pub fn properties<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Info<'_>) -> Result<PropertyMap, PluginError> + Send + Sync + 'static,
    {
        self.plugin.properties = Some(Arc::new(hook));
        self
    }

    /// Add an instance method. Later definitions with the same name are
    /// rejected at registration.
    pub fn instance_method<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Info<'_>, &[Value]) -> Result<MethodOutput, PluginError> + Send + Sync + 'static,
    {
        self.plugin.instance_methods.push(PluginMethod {
            name: name.into(),
            hook: Arc::new(hook),
        });
        self
    }

    /// Add a static method.
    pub fn static_method<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Info<'_>, &[Value]) -> Result<MethodOutput, PluginError> + Send + Sync + 'static,
    {
        self.plugin.static_methods.push(PluginMethod {
            name: name.into(),
            hook: Arc::new(hook),
        });
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> Arc<Plugin> {
        Arc::new(self.plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop_plugin() -> Arc<Plugin> {
        Plugin::builder("prop")
            .get_options(|raw, full| {
                if raw == &json!("invalid") {
                    return Err("Invalid prop".into());
                }
                Ok(json!({ "prop": raw, "full": full }))
            })
            .is_options(|candidate| candidate.is_boolean() || candidate.is_object())
            .build()
    }

    #[test]
    fn options_hook_errors_name_the_plugin() {
        let err = prop_plugin()
            .normalize_options(&json!("invalid"), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid \"prop\" options: Invalid prop");
    }

    #[test]
    fn missing_hook_forbids_options() {
        let plugin = Plugin::builder("bare").build();
        assert_eq!(plugin.normalize_options(&Value::Null, true), Ok(Value::Null));
        assert_eq!(
            plugin.normalize_options(&json!({ "prop": true }), true),
            Err(OptionsError::NotAccepted {
                plugin: "bare".into()
            })
        );
    }

    #[test]
    fn trailing_options_are_split_only_when_recognized() {
        let plugin = prop_plugin();
        let (args, options) = plugin.split_method_options(vec![json!(0), json!(true)]);
        assert_eq!(args, vec![json!(0)]);
        assert_eq!(options, Some(json!(true)));

        let (args, options) = plugin.split_method_options(vec![json!(0)]);
        assert_eq!(args, vec![json!(0)]);
        assert_eq!(options, None);

        let (args, options) = plugin.split_method_options(Vec::new());
        assert!(args.is_empty());
        assert_eq!(options, None);
    }

    #[test]
    fn without_predicate_arguments_are_forwarded() {
        let plugin = Plugin::builder("plain").build();
        let (args, options) = plugin.split_method_options(vec![json!(0), json!(true)]);
        assert_eq!(args, vec![json!(0), json!(true)]);
        assert_eq!(options, None);
    }

    #[test]
    fn ready_output_resolves_synchronously() {
        let output = MethodOutput::from(json!(1));
        assert!(!output.is_pending());
        assert_eq!(output.ready(), Some(json!(1)));
    }
}
