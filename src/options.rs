//! Layered option merging.
//!
//! Options live at four scopes, lowest precedence first: global, class
//! (root to leaf), instance, method. Each scope is an [`OptionsBag`] keyed by
//! plugin name whose values are opaque JSON.
//!
//! # Merge Rules
//!
//! - The value of a key comes from the highest layer where it is defined.
//! - `null` means "not defined": it never unsets a lower layer's value.
//! - When consecutive defined values are both objects they are shallow
//!   merged: top-level keys of the higher one win, deeper objects are
//!   replaced wholesale.
//!
//! Merging always produces owned values, so callers can mutate their inputs
//! afterwards without affecting anything already stored.
//!
//! # Scopes
//!
//! [`GlobalOptions`], [`ClassOptions`] and [`InstanceOptions`] are the
//! builders for the three static scopes. Method options are the trailing
//! argument of a method call.

use crate::class::CustomClass;
use crate::error::{ConfigurationError, PluginError};
use crate::instance::ErrorInstance;
use crate::plugin::Plugin;
use crate::thrown::Thrown;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Options for one scope, keyed by plugin name.
pub type OptionsBag = Map<String, Value>;

/// Merge two values, `higher` taking precedence.
///
/// ```rust
/// use modern_errors::options::merge_values;
/// use serde_json::json;
///
/// let merged = merge_values(
///     &json!({ "a": 1, "b": { "c": 1 } }),
///     &json!({ "b": { "d": 2 } }),
/// );
/// assert_eq!(merged, json!({ "a": 1, "b": { "d": 2 } }));
/// ```
pub fn merge_values(lower: &Value, higher: &Value) -> Value {
    match (lower, higher) {
        (_, Value::Null) => lower.clone(),
        (Value::Object(lower), Value::Object(higher)) => {
            let mut merged = lower.clone();
            for (key, value) in higher {
                if !value.is_null() {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Value::Object(merged)
        }
        _ => higher.clone(),
    }
}

/// Merge any number of layers, lowest precedence first.
///
/// Returns `Value::Null` when no layer defines a value.
pub fn merge_layers<'a, I>(layers: I) -> Value
where
    I: IntoIterator<Item = &'a Value>,
{
    layers
        .into_iter()
        .fold(Value::Null, |acc, layer| merge_values(&acc, layer))
}

/// Merge whole bags, lowest precedence first. Keys keep first-seen order.
pub fn merge_bags<'a, I>(bags: I) -> OptionsBag
where
    I: IntoIterator<Item = &'a OptionsBag>,
{
    let mut merged = OptionsBag::new();
    for bag in bags {
        for (key, value) in bag {
            let current = merged.get(key).unwrap_or(&Value::Null);
            let next = merge_values(current, value);
            if next.is_null() {
                continue;
            }
            merged.insert(key.clone(), next);
        }
    }
    merged
}

/// Value of `key` in `bag`, or `null`.
#[inline]
pub(crate) fn layer<'a>(bag: &'a OptionsBag, key: &str) -> &'a Value {
    bag.get(key).unwrap_or(&Value::Null)
}

// ============================================================================
// Scoped option builders
// ============================================================================

/// Hook run at the end of every construction. Failing rejects it.
pub type OnCreateHook =
    Arc<dyn Fn(&mut ErrorInstance, &OptionsBag) -> Result<(), PluginError> + Send + Sync>;

/// Where to report bugs, appended to `UnknownError` messages by the
/// handler.
#[derive(Debug, Clone, PartialEq)]
pub enum BugsUrl {
    /// Already parsed.
    Parsed(Url),
    /// Parsed when the hierarchy is created.
    Raw(String),
}

impl BugsUrl {
    pub(crate) fn resolve(self) -> Result<Url, ConfigurationError> {
        match self {
            Self::Parsed(url) => Ok(url),
            Self::Raw(raw) => Url::parse(&raw).map_err(|err| ConfigurationError::InvalidBugsUrl {
                url: raw.clone(),
                reason: err.to_string(),
            }),
        }
    }
}

impl From<Url> for BugsUrl {
    fn from(url: Url) -> Self {
        Self::Parsed(url)
    }
}

impl From<&str> for BugsUrl {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<String> for BugsUrl {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

/// Options bound to a whole hierarchy.
#[derive(Clone, Default)]
#[must_use]
pub struct GlobalOptions {
    pub(crate) plugins: Vec<Arc<Plugin>>,
    pub(crate) options: OptionsBag,
    pub(crate) on_create: Option<OnCreateHook>,
    pub(crate) bugs_url: Option<BugsUrl>,
}

impl GlobalOptions {
    /// No plugins, no options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin on the root class.
    pub fn plugin(mut self, plugin: Arc<Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Register several plugins on the root class.
    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Arc<Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Global options of plugin `name`.
    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Hook run after every construction.
    pub fn on_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ErrorInstance, &OptionsBag) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        self.on_create = Some(Arc::new(hook));
        self
    }

    /// Bug report URL.
    pub fn bugs_url(mut self, url: impl Into<BugsUrl>) -> Self {
        self.bugs_url = Some(url.into());
        self
    }
}

impl fmt::Debug for GlobalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalOptions")
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("options", &self.options)
            .field("on_create", &self.on_create.is_some())
            .field("bugs_url", &self.bugs_url)
            .finish()
    }
}

/// Options passed to `subclass()`.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct ClassOptions {
    pub(crate) custom: Option<Arc<CustomClass>>,
    pub(crate) plugins: Vec<Arc<Plugin>>,
    pub(crate) options: OptionsBag,
}

impl ClassOptions {
    /// No custom base, no plugins, no options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Splice a custom base between the parent and the new class.
    pub fn custom(mut self, custom: Arc<CustomClass>) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Add a plugin to the new class and its descendants.
    pub fn plugin(mut self, plugin: Arc<Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Add several plugins.
    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Arc<Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Class options of plugin `name`.
    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }
}

/// Options passed to `create()`.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct InstanceOptions {
    pub(crate) cause: Option<Thrown>,
    pub(crate) errors: Option<Vec<Thrown>>,
    pub(crate) options: OptionsBag,
    pub(crate) args: Vec<Value>,
}

impl InstanceOptions {
    /// Nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// What caused the new error. Merged into it.
    pub fn cause(mut self, cause: impl Into<Thrown>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Aggregated errors, normalized on construction.
    pub fn errors(mut self, errors: impl IntoIterator<Item = Thrown>) -> Self {
        self.errors = Some(errors.into_iter().collect());
        self
    }

    /// Instance options of plugin `name`.
    pub fn option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Options of the built-in `props` plugin.
    pub fn props(self, props: Value) -> Self {
        self.option("props", props)
    }

    /// Extra constructor argument, visible to custom `init` hooks.
    pub fn arg(mut self, arg: Value) -> Self {
        self.args.push(arg);
        self
    }
}
