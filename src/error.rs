//! Failure taxonomy of the class engine.
//!
//! Three families of failures exist, each with its own type:
//!
//! - [`ConfigurationError`]: programmer errors raised while building the
//!   hierarchy (bad names, invalid custom classes, method collisions). They are
//!   returned by the registration call itself and are never retried.
//! - [`OptionsError`]: raised by a plugin's option normalization. Global and
//!   class options fail at registration; instance and method options fail at
//!   construction or call time.
//! - [`PluginError`]: raised by plugin hooks (`properties`, methods) or by the
//!   `on_create` hook. Propagated to the caller unchanged.
//!
//! [`Error`] unifies them for the crate-level [`Result`](crate::Result).

use thiserror::Error;

/// Registration-time failure. Always fatal to the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Class name is the empty string.
    #[error("error class name must not be empty")]
    EmptyClassName,

    /// Class name is not an identifier.
    #[error("error class name \"{0}\" must be a valid identifier")]
    InvalidClassName(String),

    /// Class name shadows a native error type (`TypeError`, ...).
    #[error("\"{0}\" is a native error type and cannot be used as an error class name")]
    NativeClassName(String),

    /// Class name is already used somewhere in the hierarchy.
    #[error("error class \"{0}\" is already defined")]
    DuplicateClass(String),

    /// An instance was requested before the fallback class exists.
    #[error("\"UnknownError\" must be defined with subclass() before errors can be created or normalized")]
    MissingUnknownError,

    /// The root class was asked for an instance without a cause to take
    /// its class from.
    #[error("\"{0}\" can only be instantiated with a cause; use one of its subclasses instead")]
    MissingRootCause(String),

    /// The fallback class cannot use a custom base.
    #[error("\"custom\" cannot be used when defining \"UnknownError\"")]
    CustomUnknownError,

    /// Custom class has an empty name.
    #[error("custom class name must not be empty")]
    EmptyCustomName,

    /// Custom class does not extend the class `subclass()` was called on.
    #[error("custom class \"{custom}\" must extend \"{parent}\"")]
    CustomNotExtending {
        /// Name of the custom class.
        custom: String,
        /// Name of the class `subclass()` was called on.
        parent: String,
    },

    /// Custom class redefines `constructor` or a protected property.
    #[error("custom class \"{custom}\" must not redefine \"{member}\"")]
    CustomProtectedMember {
        /// Name of the custom class.
        custom: String,
        /// Offending member.
        member: String,
    },

    /// A class that never went through `subclass()` was instantiated.
    #[error("\"{0}\" must be registered with subclass() before being instantiated")]
    UnregisteredClass(String),

    /// Plugin name is empty or not kebab/snake case.
    #[error("plugin name \"{0}\" is invalid: it must start with a lowercase letter and contain only letters, digits, \"-\" or \"_\"")]
    InvalidPluginName(String),

    /// Two different plugins share a name in one chain.
    #[error("plugin \"{0}\" must not be passed twice")]
    DuplicatePlugin(String),

    /// Two plugins (or two categories of one plugin) define the same method.
    #[error("plugins \"{first}\" and \"{second}\" must not both define \"{method}()\"")]
    DuplicateMethod {
        /// Method name.
        method: String,
        /// Plugin that defined it first.
        first: String,
        /// Plugin that defined it again.
        second: String,
    },

    /// Plugin method shadows a native error member.
    #[error("plugin \"{plugin}\" must not redefine \"error.{method}\"")]
    NativeMethod {
        /// Plugin name.
        plugin: String,
        /// Method name.
        method: String,
    },

    /// `bugs_url` could not be parsed.
    #[error("option \"bugs_url\" must be a valid URL: \"{url}\" ({reason})")]
    InvalidBugsUrl {
        /// The rejected input.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Attempt to write a protected property on an instance.
    #[error("property \"{0}\" is protected and cannot be set")]
    ProtectedProperty(String),
}

/// Option validation failure raised by a plugin's `get_options` hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// The plugin rejected the value.
    #[error("Invalid \"{plugin}\" options: {reason}")]
    Invalid {
        /// Plugin name.
        plugin: String,
        /// Message returned by the hook.
        reason: String,
    },

    /// The plugin has no `get_options` hook, so it accepts no options.
    #[error("Invalid \"{plugin}\" options: this plugin does not accept options")]
    NotAccepted {
        /// Plugin name.
        plugin: String,
    },

    /// No plugin in the chain owns this option key.
    #[error("unknown option \"{0}\": no plugin with that name is registered")]
    UnknownOption(String),
}

/// Failure raised by a plugin hook or by `on_create`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    /// Create a plugin error with the given message.
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message given by the plugin.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Any failure returned by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// See [`ConfigurationError`].
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// See [`OptionsError`].
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// See [`PluginError`].
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// No plugin in the chain defines this method.
    #[error("no plugin defines the method \"{0}()\" on this error class")]
    UnknownMethod(String),
}

impl Error {
    /// True for registration-time failures.
    #[inline]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
