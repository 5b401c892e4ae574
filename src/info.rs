//! Context handed to plugin hooks, and method dispatch.
//!
//! Every `properties` hook and every instance or static method receives an
//! [`Info`]. It is read-only: options are an owned copy resolved for that
//! one plugin, and [`ErrorClasses`] is a snapshot, so nothing a hook does
//! with them is visible outside the call.

use crate::Result;
use crate::class::ErrorClass;
use crate::error::Error;
use crate::instance::ErrorInstance;
use crate::options::OptionsBag;
use crate::plugin::{MethodOutput, Plugin};
use crate::thrown::Thrown;
use serde_json::Value;
use tracing::trace;

/// Read-only context of one hook invocation.
pub struct Info<'a> {
    error: Option<&'a ErrorInstance>,
    options: Value,
    error_class: ErrorClass,
    plugin: &'a Plugin,
    method_options: Option<Value>,
}

impl<'a> Info<'a> {
    pub(crate) fn new(
        error_class: ErrorClass,
        plugin: &'a Plugin,
        options: Value,
        error: Option<&'a ErrorInstance>,
        method_options: Option<Value>,
    ) -> Self {
        Self {
            error,
            options,
            error_class,
            plugin,
            method_options,
        }
    }

    /// The instance, for `properties` hooks and instance methods.
    #[inline]
    pub fn error(&self) -> Option<&'a ErrorInstance> {
        self.error
    }

    /// This plugin's options, normalized with `full = true`.
    #[inline]
    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Class of the instance, or the class a static method was called on.
    #[inline]
    pub fn error_class(&self) -> &ErrorClass {
        &self.error_class
    }

    /// Root class of the hierarchy.
    pub fn any_error(&self) -> ErrorClass {
        self.error_class.root()
    }

    /// Every class of the hierarchy except the root.
    pub fn error_classes(&self) -> ErrorClasses {
        self.error_class.classes()
    }

    /// Name of the plugin being invoked.
    #[inline]
    pub fn plugin_name(&self) -> &str {
        self.plugin.name()
    }

    /// Normalize `value` through the root and resolve this plugin's options
    /// for it. Method options of the current call still apply.
    ///
    /// # Errors
    ///
    /// Same as [`ErrorClass::normalize`], plus option rejection.
    #[track_caller]
    pub fn error_info(&self, value: impl Into<Thrown>) -> Result<ErrorInfo> {
        let error = self.any_error().normalize(value)?;
        let error_class = error.class().clone();
        let options = error_class.resolve_options(
            self.plugin,
            error.options(),
            self.method_options.as_ref(),
        )?;
        Ok(ErrorInfo {
            error,
            options,
            error_class,
        })
    }
}

impl std::fmt::Debug for Info<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Info")
            .field("plugin", &self.plugin.name())
            .field("error_class", &self.error_class.name())
            .field("error", &self.error.map(ErrorInstance::message))
            .field("options", &self.options)
            .finish()
    }
}

/// Result of [`Info::error_info`].
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// The normalized instance.
    pub error: ErrorInstance,
    /// The plugin's options for it.
    pub options: Value,
    /// Its class.
    pub error_class: ErrorClass,
}

/// Read-only snapshot of the classes of a hierarchy, root excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorClasses {
    classes: Vec<ErrorClass>,
}

impl ErrorClasses {
    pub(crate) fn new(classes: Vec<ErrorClass>) -> Self {
        Self { classes }
    }

    /// Class named `name`.
    pub fn get(&self, name: &str) -> Option<&ErrorClass> {
        self.classes.iter().find(|class| class.name() == name)
    }

    /// Class names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(ErrorClass::name)
    }

    /// Classes, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorClass> {
        self.classes.iter()
    }

    /// Number of classes.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True if only the root exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<'a> IntoIterator for &'a ErrorClasses {
    type Item = &'a ErrorClass;
    type IntoIter = std::slice::Iter<'a, ErrorClass>;

    fn into_iter(self) -> Self::IntoIter {
        self.classes.iter()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

pub(crate) fn call_instance_method(
    error: &ErrorInstance,
    method: &str,
    args: Vec<Value>,
) -> Result<MethodOutput> {
    let class = error.class();
    let (plugin, hook) = class
        .plugins()
        .instance_method(method)
        .ok_or_else(|| Error::UnknownMethod(method.to_string()))?;

    let (args, method_options) = plugin.split_method_options(args);
    let options = class.resolve_options(plugin, error.options(), method_options.as_ref())?;
    let info = Info::new(class.clone(), plugin, options, Some(error), method_options);

    trace!(class = class.name(), plugin = plugin.name(), method, "instance method called");
    Ok(hook(&info, &args)?)
}

pub(crate) fn call_static_method(
    class: &ErrorClass,
    method: &str,
    args: Vec<Value>,
) -> Result<MethodOutput> {
    class.unknown_error()?;
    let (plugin, hook) = class
        .plugins()
        .static_method(method)
        .ok_or_else(|| Error::UnknownMethod(method.to_string()))?;

    let (args, method_options) = plugin.split_method_options(args);
    let options = class.resolve_options(plugin, &OptionsBag::new(), method_options.as_ref())?;
    let info = Info::new(class.clone(), plugin, options, None, method_options);

    trace!(class = class.name(), plugin = plugin.name(), method, "static method called");
    Ok(hook(&info, &args)?)
}
