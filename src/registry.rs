//! Per-class plugin sets.
//!
//! Every class node owns a [`PluginSet`]: its parent's plugins followed by
//! the ones it adds. Sets are validated once, when the node is registered,
//! and are immutable afterwards.
//!
//! # Validation
//!
//! - plugin names start with a lowercase ASCII letter and continue with
//!   letters, digits, `-` or `_`; a few names are reserved for instance
//!   options (`cause`, `errors`, ...).
//! - the same `Arc<Plugin>` may be passed again (it is deduplicated), a
//!   different plugin with the same name may not.
//! - method names are unique across plugins and across the instance and
//!   static categories, and never shadow a native error member.

use crate::error::ConfigurationError;
use crate::plugin::{MethodHook, Plugin};
use smallvec::SmallVec;
use std::sync::Arc;

/// Option keys with a meaning of their own on instances.
const RESERVED_PLUGIN_NAMES: &[&str] = &["cause", "errors", "custom", "plugins", "wrap"];

/// Members every error already has; plugin methods cannot shadow them.
pub(crate) const NATIVE_MEMBERS: &[&str] = &[
    "constructor",
    "name",
    "message",
    "stack",
    "cause",
    "errors",
    "wrap",
    "toString",
    "constructorArgs",
    "subclass",
    "normalize",
];

/// Ordered, validated list of plugins visible to one class.
#[derive(Clone, Default)]
pub(crate) struct PluginSet {
    plugins: SmallVec<[Arc<Plugin>; 4]>,
}

impl PluginSet {
    /// Empty set.
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Validate `added` against this set and return the combined set.
    ///
    /// `self` is never modified: a failed registration leaves the parent
    /// untouched.
    pub(crate) fn extend(&self, added: &[Arc<Plugin>]) -> Result<Self, ConfigurationError> {
        let mut combined = self.clone();
        for plugin in added {
            validate_plugin_name(plugin.name())?;

            if let Some(existing) = combined.get(plugin.name()) {
                if Arc::ptr_eq(existing, plugin) {
                    continue;
                }
                return Err(ConfigurationError::DuplicatePlugin(plugin.name().to_string()));
            }

            combined.check_methods(plugin)?;
            combined.plugins.push(Arc::clone(plugin));
        }
        Ok(combined)
    }

    fn check_methods(&self, plugin: &Plugin) -> Result<(), ConfigurationError> {
        let declared = plugin
            .instance_method_names()
            .chain(plugin.static_method_names());

        let mut seen: SmallVec<[&str; 8]> = SmallVec::new();
        for method in declared {
            if NATIVE_MEMBERS.contains(&method) {
                return Err(ConfigurationError::NativeMethod {
                    plugin: plugin.name().to_string(),
                    method: method.to_string(),
                });
            }

            if seen.contains(&method) {
                return Err(duplicate_method(method, plugin.name(), plugin.name()));
            }
            seen.push(method);

            if let Some(owner) = self.method_owner(method) {
                return Err(duplicate_method(method, owner.name(), plugin.name()));
            }
        }
        Ok(())
    }

    fn method_owner(&self, method: &str) -> Option<&Arc<Plugin>> {
        self.plugins.iter().find(|plugin| {
            plugin.instance_method_names().any(|name| name == method)
                || plugin.static_method_names().any(|name| name == method)
        })
    }

    /// Plugins in registration order.
    #[inline]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<Plugin>> {
        self.plugins.iter()
    }

    /// Plugin named `name`.
    pub(crate) fn get(&self, name: &str) -> Option<&Arc<Plugin>> {
        self.plugins.iter().find(|plugin| plugin.name() == name)
    }

    #[inline]
    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Instance method `name` and the plugin defining it.
    pub(crate) fn instance_method(&self, name: &str) -> Option<(&Arc<Plugin>, &MethodHook)> {
        self.plugins.iter().find_map(|plugin| {
            plugin
                .instance_methods()
                .iter()
                .find(|method| method.name == name)
                .map(|method| (plugin, &method.hook))
        })
    }

    /// Static method `name` and the plugin defining it.
    pub(crate) fn static_method(&self, name: &str) -> Option<(&Arc<Plugin>, &MethodHook)> {
        self.plugins.iter().find_map(|plugin| {
            plugin
                .static_methods()
                .iter()
                .find(|method| method.name == name)
                .map(|method| (plugin, &method.hook))
        })
    }

    /// Every instance method name, across all plugins.
    pub(crate) fn instance_method_names(&self) -> impl Iterator<Item = &str> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.instance_method_names())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.plugins.len()
    }
}

impl std::fmt::Debug for PluginSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|plugin| plugin.name()))
            .finish()
    }
}

fn duplicate_method(method: &str, first: &str, second: &str) -> ConfigurationError {
    ConfigurationError::DuplicateMethod {
        method: method.to_string(),
        first: first.to_string(),
        second: second.to_string(),
    }
}

fn validate_plugin_name(name: &str) -> Result<(), ConfigurationError> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid_start || !valid_rest || RESERVED_PLUGIN_NAMES.contains(&name) {
        return Err(ConfigurationError::InvalidPluginName(name.to_string()));
    }
    Ok(())
}
