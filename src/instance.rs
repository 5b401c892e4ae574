//! Constructed error values.
//!
//! An [`ErrorInstance`] is produced by [`ErrorClass::create`] or
//! [`ErrorClass::normalize`]; by the time it is returned its cause has been
//! merged into it and every plugin `properties` hook has run.
//!
//! # Properties
//!
//! Besides `message` and `stack`, an instance carries a small ordered bag of
//! properties. Keys starting with `_` are non-enumerable unless the key
//! already exists, in which case its descriptor is kept. Enumerable
//! properties are the ones that survive serialization.
//!
//! Some keys are protected and can never be written: `wrap`, `cause`,
//! `errors`, `name`, `constructorArgs`, `constructor`, plus every instance
//! method contributed by a plugin of the class.
//!
//! # Message and stack
//!
//! The first stack line is `Name: message` (or `Name` for an empty message),
//! followed by frames (`    at ...`). Only indented `at` lines are frames,
//! so a message line reading `at startup` stays part of the message.
//! Writing one keeps the other in sync.
//!
//! # Revert snapshots
//!
//! Values written by plugin `properties` hooks are recorded together with
//! the value they replaced. When the instance later becomes a cause, every
//! recorded key that still holds the plugin-set value is restored, so one
//! wrapping layer never leaks its computed values into the next one.
//!
//! [`ErrorClass::create`]: crate::ErrorClass::create
//! [`ErrorClass::normalize`]: crate::ErrorClass::normalize

use crate::class::ErrorClass;
use crate::error::ConfigurationError;
use crate::logging::ErrorLog;
use crate::options::OptionsBag;
use crate::plugin::{MethodOutput, PropertyMap};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Keys no plugin and no caller may write.
pub(crate) const PROTECTED_KEYS: &[&str] = &[
    "wrap",
    "cause",
    "errors",
    "name",
    "constructorArgs",
    "constructor",
];

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// One property of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    value: Value,
    enumerable: bool,
}

impl Property {
    /// Property with an explicit descriptor.
    #[inline]
    pub fn new(value: Value, enumerable: bool) -> Self {
        Self { value, enumerable }
    }

    /// Property value.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether the property shows up in serialization.
    #[inline]
    pub fn is_enumerable(&self) -> bool {
        self.enumerable
    }
}

#[derive(Debug, Clone, PartialEq)]
enum RevertKey {
    Message,
    Stack,
    Property(String),
}

/// A write made by a `properties` hook. `None` stands for "absent".
#[derive(Debug, Clone)]
struct RevertEntry {
    key: RevertKey,
    previous: Option<Value>,
    set: Option<Value>,
}

pub(crate) type Properties = SmallVec<[(String, Property); 4]>;

/// An error built by a class of some hierarchy.
///
/// Cloning is cheap-ish and keeps identity: clones compare equal under
/// [`same_instance`](Self::same_instance).
#[derive(Clone)]
pub struct ErrorInstance {
    pub(crate) id: u64,
    pub(crate) class: ErrorClass,
    pub(crate) message: String,
    pub(crate) stack: String,
    pub(crate) props: Properties,
    pub(crate) wrap: bool,
    pub(crate) errors: Option<Vec<ErrorInstance>>,
    pub(crate) cause_value: Option<Value>,
    pub(crate) options: Arc<OptionsBag>,
    pub(crate) constructor_args: Vec<Value>,
    revert: Vec<RevertEntry>,
}

impl ErrorInstance {
    /// Instance with no cause, properties or aggregated errors yet.
    pub(crate) fn bare(
        class: ErrorClass,
        message: String,
        frames: String,
        options: Arc<OptionsBag>,
        constructor_args: Vec<Value>,
    ) -> Self {
        let stack = compose_stack(class.name(), &message, &frames);
        Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            class,
            message,
            stack,
            props: SmallVec::new(),
            wrap: false,
            errors: None,
            cause_value: None,
            options,
            constructor_args,
            revert: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Name of the concrete class.
    #[inline]
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// Concrete class.
    #[inline]
    pub fn class(&self) -> &ErrorClass {
        &self.class
    }

    /// Message, including merged cause messages.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Stack: header line followed by frames.
    #[inline]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// True when the merged cause was not of this class or a subclass.
    #[inline]
    pub fn wrap(&self) -> bool {
        self.wrap
    }

    /// Aggregated errors, normalized.
    pub fn errors(&self) -> Option<&[ErrorInstance]> {
        self.errors.as_deref()
    }

    /// Raw cause when it was not error-like (a string, an object, ...).
    #[inline]
    pub fn cause_value(&self) -> Option<&Value> {
        self.cause_value.as_ref()
    }

    /// Own property `key`, else a member of the class's custom base.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.property(key)
            .map(Property::value)
            .or_else(|| self.class.member(key))
    }

    /// Own property descriptor.
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.props
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, property)| property)
    }

    /// All own properties, in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.props.iter().map(|(key, property)| (key.as_str(), property))
    }

    /// Own enumerable properties, in insertion order.
    pub fn enumerable_properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.props
            .iter()
            .filter(|(_, property)| property.enumerable)
            .map(|(key, property)| (key.as_str(), &property.value))
    }

    /// Instance options, keyed by plugin name.
    #[inline]
    pub fn options(&self) -> &OptionsBag {
        &self.options
    }

    /// Extra constructor arguments, as seen after custom `init` hooks.
    #[inline]
    pub fn constructor_args(&self) -> &[Value] {
        &self.constructor_args
    }

    /// True if the concrete class is `class` or one of its descendants.
    #[inline]
    pub fn is_instance_of(&self, class: &ErrorClass) -> bool {
        self.class.is_subclass_of(class)
    }

    /// True if `other` is this very instance (or a clone of it).
    #[inline]
    pub fn same_instance(&self, other: &ErrorInstance) -> bool {
        self.id == other.id
    }

    /// Borrowed structured view for logging.
    #[inline]
    pub fn log(&self) -> ErrorLog<'_> {
        ErrorLog::new(self)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Call instance method `method`.
    ///
    /// If the owning plugin recognizes the trailing argument as options, it
    /// is removed from `args` and merged on top of the instance options.
    pub fn call(&self, method: &str, args: Vec<Value>) -> crate::Result<MethodOutput> {
        crate::info::call_instance_method(self, method, args)
    }

    /// Replace the message, keeping the stack header in sync.
    pub fn set_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        let old_header = stack_header(self.name(), &self.message);
        let new_header = stack_header(self.name(), &message);

        self.stack = if let Some(rest) = self.stack.strip_prefix(old_header.as_str()) {
            format!("{new_header}{rest}")
        } else if !self.message.is_empty() && self.stack.contains(self.message.as_str()) {
            self.stack.replacen(self.message.as_str(), &message, 1)
        } else {
            compose_stack(self.name(), &message, &stack_frames(&self.stack))
        };
        self.message = message;
    }

    /// Replace the stack. When its header reads `Name: ...` the message is
    /// updated to match.
    pub fn set_stack(&mut self, stack: impl Into<String>) {
        let stack = stack.into();
        let header = stack
            .lines()
            .take_while(|line| !is_frame(line))
            .collect::<Vec<_>>()
            .join("\n");

        if header == self.name() {
            self.message.clear();
        } else if let Some(message) = header
            .strip_prefix(self.name())
            .and_then(|rest| rest.strip_prefix(": "))
        {
            self.message = message.to_string();
        }
        self.stack = stack;
    }

    /// Write property `key`. `message` and `stack` are routed to their
    /// setters; `null` deletes the property.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ProtectedProperty`] for protected keys.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigurationError> {
        if self.is_protected(key) {
            return Err(ConfigurationError::ProtectedProperty(key.to_string()));
        }
        match key {
            "message" => self.set_message(value_to_text(&value)),
            "stack" => self.set_stack(value_to_text(&value)),
            _ if value.is_null() => self.remove_property(key),
            _ => self.insert_property(key, value),
        }
        Ok(())
    }

    /// Define property `key` with an explicit descriptor.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ProtectedProperty`] for protected keys, as well
    /// as `message` and `stack`.
    pub fn define_property(
        &mut self,
        key: &str,
        value: Value,
        enumerable: bool,
    ) -> Result<(), ConfigurationError> {
        if self.is_protected(key) || key == "message" || key == "stack" {
            return Err(ConfigurationError::ProtectedProperty(key.to_string()));
        }
        let property = Property::new(value, enumerable);
        match self.props.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => *existing = property,
            None => self.props.push((key.to_string(), property)),
        }
        Ok(())
    }

    /// True if `key` can never be written on this instance.
    pub fn is_protected(&self, key: &str) -> bool {
        PROTECTED_KEYS.contains(&key)
            || self
                .class
                .plugins()
                .instance_method_names()
                .any(|method| method == key)
    }

    pub(crate) fn insert_property(&mut self, key: &str, value: Value) {
        match self.props.iter_mut().find(|(name, _)| name == key) {
            Some((_, existing)) => existing.value = value,
            None => {
                let enumerable = !key.starts_with('_');
                self.props.push((key.to_string(), Property::new(value, enumerable)));
            }
        }
    }

    pub(crate) fn remove_property(&mut self, key: &str) {
        self.props.retain(|(name, _)| name != key);
    }

    /// Frames of the current stack, header excluded.
    pub(crate) fn frames(&self) -> String {
        stack_frames(&self.stack)
    }

    /// Rewrite the header after a class change.
    pub(crate) fn rename_header(&mut self, old_name: &str) {
        let old_header = stack_header(old_name, &self.message);
        let new_header = stack_header(self.name(), &self.message);
        if let Some(rest) = self.stack.strip_prefix(old_header.as_str()) {
            self.stack = format!("{new_header}{rest}");
        } else {
            self.stack = compose_stack(self.name(), &self.message, &stack_frames(&self.stack));
        }
    }

    // ========================================================================
    // Plugin-set values
    // ========================================================================

    /// Assign the result of a `properties` hook, recording what it replaced.
    ///
    /// Protected keys are skipped. `stack` is applied before `message` so a
    /// hook returning both ends up with a consistent pair.
    pub(crate) fn apply_plugin_properties(&mut self, properties: PropertyMap) {
        let mut entries: Vec<(String, Value)> = properties.into_iter().collect();
        entries.sort_by_key(|(key, _)| match key.as_str() {
            "stack" => 0,
            "message" => 1,
            _ => 2,
        });

        for (key, value) in entries {
            if self.is_protected(&key) {
                tracing::trace!(class = self.name(), key = %key, "skipped protected property");
                continue;
            }
            match key.as_str() {
                "message" => {
                    let previous = Value::String(self.message.clone());
                    self.set_message(value_to_text(&value));
                    let set = Value::String(self.message.clone());
                    self.record(RevertKey::Message, Some(previous), Some(set));
                }
                "stack" => {
                    let previous = Value::String(self.stack.clone());
                    self.set_stack(value_to_text(&value));
                    let set = Value::String(self.stack.clone());
                    self.record(RevertKey::Stack, Some(previous), Some(set));
                }
                _ => {
                    let previous = self.property(&key).map(|property| property.value.clone());
                    let set = if value.is_null() {
                        self.remove_property(&key);
                        None
                    } else {
                        self.insert_property(&key, value.clone());
                        Some(value)
                    };
                    self.record(RevertKey::Property(key), previous, set);
                }
            }
        }
    }

    fn record(&mut self, key: RevertKey, previous: Option<Value>, set: Option<Value>) {
        self.revert.push(RevertEntry { key, previous, set });
    }

    /// Undo plugin-set values that were not changed since.
    pub(crate) fn revert_plugin_values(&mut self) {
        let entries = std::mem::take(&mut self.revert);
        for entry in entries.into_iter().rev() {
            match entry.key {
                RevertKey::Message => {
                    if entry.set.as_ref().and_then(Value::as_str) == Some(self.message.as_str()) {
                        if let Some(Value::String(previous)) = entry.previous {
                            self.set_message(previous);
                        }
                    }
                }
                RevertKey::Stack => {
                    if entry.set.as_ref().and_then(Value::as_str) == Some(self.stack.as_str()) {
                        if let Some(Value::String(previous)) = entry.previous {
                            self.stack = previous;
                        }
                    }
                }
                RevertKey::Property(key) => {
                    let current = self.property(&key).map(Property::value);
                    if current != entry.set.as_ref() {
                        continue;
                    }
                    match entry.previous {
                        Some(previous) => self.insert_property(&key, previous),
                        None => self.remove_property(&key),
                    }
                }
            }
        }
    }
}

impl fmt::Debug for ErrorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorInstance")
            .field("name", &self.name())
            .field("message", &self.message)
            .field("wrap", &self.wrap)
            .field("properties", &self.props)
            .field("errors", &self.errors.as_ref().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ErrorInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stack_header(self.name(), &self.message))
    }
}

impl std::error::Error for ErrorInstance {}

// ============================================================================
// Stack helpers
// ============================================================================

/// Frame for the caller of a constructing function.
pub(crate) fn caller_frame(location: &Location<'_>) -> String {
    format!("    at {}:{}:{}", location.file(), location.line(), location.column())
}

#[inline]
fn is_frame(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.len() < line.len() && trimmed.starts_with("at ")
}

pub(crate) fn stack_header(name: &str, message: &str) -> String {
    if message.is_empty() {
        name.to_string()
    } else {
        format!("{name}: {message}")
    }
}

pub(crate) fn stack_frames(stack: &str) -> String {
    stack
        .lines()
        .filter(|line| is_frame(line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn compose_stack(name: &str, message: &str, frames: &str) -> String {
    let header = stack_header(name, message);
    if frames.is_empty() {
        header
    } else {
        format!("{header}\n{frames}")
    }
}

/// Text written when a non-string lands on `message` or `stack`.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
