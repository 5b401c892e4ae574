//! Error class hierarchy.
//!
//! A hierarchy starts with [`ErrorClass::any_error`], which creates the root
//! class `AnyError`. Every other class is created with
//! [`ErrorClass::subclass`] on an existing one, and is immutable afterwards.
//!
//! # Rules
//!
//! - class names are non-empty identifiers, unique within the hierarchy, and
//!   never the name of a native error type (`TypeError`, ...).
//! - `UnknownError` is the fallback class. It may be declared at any point,
//!   but nothing can be created, normalized or dispatched statically until
//!   it exists.
//! - the root is never the concrete class of an instance: creating through
//!   it resolves the class from the cause (or falls back to `UnknownError`).
//! - a [`CustomClass`] can be spliced between a class and its new subclass.
//!   It must extend the class `subclass()` is called on and must not
//!   redefine protected members. Custom classes are never instantiable on
//!   their own.
//!
//! # Example
//!
//! ```rust
//! use modern_errors::{ClassOptions, ErrorClass, GlobalOptions, InstanceOptions};
//!
//! let any_error = ErrorClass::any_error(GlobalOptions::new())?;
//! any_error.subclass("UnknownError", ClassOptions::new())?;
//! let input_error = any_error.subclass("InputError", ClassOptions::new())?;
//!
//! let error = input_error.create("Invalid file path", InstanceOptions::new())?;
//! assert_eq!(error.name(), "InputError");
//! assert!(error.is_instance_of(&any_error));
//! # Ok::<(), modern_errors::Error>(())
//! ```

use crate::Result;
use crate::cause;
use crate::core_plugins;
use crate::error::{ConfigurationError, OptionsError, PluginError};
use crate::info::{self, ErrorClasses, Info};
use crate::instance::{ErrorInstance, PROTECTED_KEYS, caller_frame};
use crate::normalize;
use crate::options::{
    BugsUrl, ClassOptions, GlobalOptions, InstanceOptions, OnCreateHook, OptionsBag, layer,
    merge_layers,
};
use crate::plugin::{MethodOutput, Plugin};
use crate::registry::PluginSet;
use crate::thrown::Thrown;
use serde_json::{Map, Value};
use std::fmt;
use std::iter;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};
use url::Url;

/// Name of the root class.
pub const ANY_ERROR: &str = "AnyError";

/// Name of the fallback class.
pub const UNKNOWN_ERROR: &str = "UnknownError";

/// Native error type names, never usable as class names and never worth
/// prefixing onto a message.
pub const NATIVE_ERROR_NAMES: &[&str] = &[
    "Error",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
    "AggregateError",
    "InternalError",
];

static NEXT_HIERARCHY_ID: AtomicU64 = AtomicU64::new(1);

/// Index of a node inside its hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ClassId(usize);

// ============================================================================
// Hierarchy
// ============================================================================

struct Settings {
    options: OptionsBag,
    on_create: Option<OnCreateHook>,
    bugs_url: Option<Url>,
}

/// Registry shared by every class of one hierarchy. Append-only.
pub(crate) struct Hierarchy {
    id: u64,
    settings: Settings,
    nodes: RwLock<Vec<Arc<ClassNode>>>,
}

impl Hierarchy {
    /// Read access, recovering from poisoning: nodes are only ever pushed
    /// whole, so a panicking writer cannot leave a torn entry behind.
    fn read_nodes(&self) -> RwLockReadGuard<'_, Vec<Arc<ClassNode>>> {
        match self.nodes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_nodes(&self) -> RwLockWriteGuard<'_, Vec<Arc<ClassNode>>> {
        match self.nodes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn find(&self, name: &str) -> Option<Arc<ClassNode>> {
        self.read_nodes()
            .iter()
            .find(|node| node.name == name)
            .map(Arc::clone)
    }
}

pub(crate) struct ClassNode {
    id: ClassId,
    name: String,
    /// Root first, parent last.
    ancestors: Vec<Arc<ClassNode>>,
    custom: Option<Arc<CustomClass>>,
    class_options: OptionsBag,
    plugins: PluginSet,
    /// Members of every custom base up the chain, nearest last-written.
    members: Map<String, Value>,
}

// ============================================================================
// ErrorClass
// ============================================================================

/// Handle to one class of a hierarchy.
#[derive(Clone)]
pub struct ErrorClass {
    hierarchy: Arc<Hierarchy>,
    node: Arc<ClassNode>,
}

impl ErrorClass {
    /// Create a new hierarchy and return its root class, `AnyError`.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError`] for an invalid plugin set or `bugs_url`.
    /// - [`OptionsError`] when a global option is rejected by its plugin or
    ///   belongs to no plugin.
    pub fn any_error(options: GlobalOptions) -> Result<Self> {
        let GlobalOptions {
            plugins,
            options,
            on_create,
            bugs_url,
        } = options;

        let bugs_url = bugs_url.map(BugsUrl::resolve).transpose()?;
        let plugins = PluginSet::new()
            .extend(&[core_plugins::props()])?
            .extend(&plugins)?;

        for (key, value) in &options {
            let plugin = plugins
                .get(key)
                .ok_or_else(|| OptionsError::UnknownOption(key.clone()))?;
            plugin.normalize_options(value, false)?;
        }

        let node = Arc::new(ClassNode {
            id: ClassId(0),
            name: ANY_ERROR.to_string(),
            ancestors: Vec::new(),
            custom: None,
            class_options: OptionsBag::new(),
            plugins,
            members: Map::new(),
        });
        let hierarchy = Arc::new(Hierarchy {
            id: NEXT_HIERARCHY_ID.fetch_add(1, Ordering::Relaxed),
            settings: Settings {
                options,
                on_create,
                bugs_url,
            },
            nodes: RwLock::new(vec![Arc::clone(&node)]),
        });

        debug!(
            hierarchy = hierarchy.id,
            plugins = node.plugins.len(),
            "error hierarchy created"
        );
        Ok(Self { hierarchy, node })
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Class name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.node.name
    }

    /// True for `AnyError`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.node.ancestors.is_empty()
    }

    /// Direct parent, `None` for the root.
    pub fn parent(&self) -> Option<ErrorClass> {
        self.node.ancestors.last().map(|node| self.with_node(node))
    }

    /// Root of the hierarchy.
    pub fn root(&self) -> ErrorClass {
        match self.node.ancestors.first() {
            Some(root) => self.with_node(root),
            None => self.clone(),
        }
    }

    /// True if `self` is `other` or one of its descendants.
    pub fn is_subclass_of(&self, other: &ErrorClass) -> bool {
        self.same_hierarchy(other)
            && (self.node.id == other.node.id
                || self.node.ancestors.iter().any(|node| node.id == other.node.id))
    }

    /// True if both classes belong to the same hierarchy.
    #[inline]
    pub fn same_hierarchy(&self, other: &ErrorClass) -> bool {
        Arc::ptr_eq(&self.hierarchy, &other.hierarchy)
    }

    /// Custom base spliced in at this class.
    #[inline]
    pub fn custom(&self) -> Option<&Arc<CustomClass>> {
        self.node.custom.as_ref()
    }

    /// Member `key` of the custom bases of this class and its ancestors.
    pub fn member(&self, key: &str) -> Option<&Value> {
        self.node.members.get(key)
    }

    /// Class options declared on this class only.
    #[inline]
    pub fn class_options(&self) -> &OptionsBag {
        &self.node.class_options
    }

    /// Plugin names, in registration order.
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.node.plugins.iter().map(|plugin| plugin.name())
    }

    /// Class named `name` in this hierarchy.
    pub fn find(&self, name: &str) -> Option<ErrorClass> {
        self.hierarchy.find(name).map(|node| self.with_node(&node))
    }

    /// Every class except the root.
    pub fn classes(&self) -> ErrorClasses {
        let classes = self
            .hierarchy
            .read_nodes()
            .iter()
            .filter(|node| !node.ancestors.is_empty())
            .map(|node| self.with_node(node))
            .collect();
        ErrorClasses::new(classes)
    }

    /// The fallback class.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MissingUnknownError`] until it is declared.
    pub fn unknown_error(&self) -> Result<ErrorClass> {
        self.find(UNKNOWN_ERROR)
            .ok_or_else(|| ConfigurationError::MissingUnknownError.into())
    }

    /// Bug report URL of the hierarchy.
    #[inline]
    pub fn bugs_url(&self) -> Option<&Url> {
        self.hierarchy.settings.bugs_url.as_ref()
    }

    #[inline]
    pub(crate) fn plugins(&self) -> &PluginSet {
        &self.node.plugins
    }

    fn with_node(&self, node: &Arc<ClassNode>) -> ErrorClass {
        ErrorClass {
            hierarchy: Arc::clone(&self.hierarchy),
            node: Arc::clone(node),
        }
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Register a new class extending this one.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError`] for an invalid or duplicate name, an invalid
    ///   custom base, or a plugin/method collision.
    /// - [`OptionsError`] when a class option is rejected.
    pub fn subclass(&self, name: impl Into<String>, options: ClassOptions) -> Result<ErrorClass> {
        let name = name.into();
        validate_class_name(&name)?;

        let ClassOptions {
            custom,
            plugins,
            options: class_options,
        } = options;
        if name == UNKNOWN_ERROR && custom.is_some() {
            return Err(ConfigurationError::CustomUnknownError.into());
        }

        let plugins = self.node.plugins.extend(&plugins)?;

        let mut members = self.node.members.clone();
        if let Some(custom) = &custom {
            custom.validate_base(self)?;
            for base in custom.chain().into_iter().rev() {
                for (key, value) in &base.members {
                    if key == "constructor"
                        || PROTECTED_KEYS.contains(&key.as_str())
                        || plugins.instance_method_names().any(|method| method == key)
                    {
                        return Err(ConfigurationError::CustomProtectedMember {
                            custom: base.name.clone(),
                            member: key.clone(),
                        }
                        .into());
                    }
                    members.insert(key.clone(), value.clone());
                }
            }
        }

        let mut ancestors = self.node.ancestors.clone();
        ancestors.push(Arc::clone(&self.node));

        for (key, value) in &class_options {
            let plugin = plugins
                .get(key)
                .ok_or_else(|| OptionsError::UnknownOption(key.clone()))?;
            let merged = merge_layers(
                iter::once(layer(&self.hierarchy.settings.options, key))
                    .chain(ancestors.iter().map(|node| layer(&node.class_options, key)))
                    .chain(iter::once(value)),
            );
            plugin.normalize_options(&merged, false)?;
        }

        let node = {
            let mut nodes = self.hierarchy.write_nodes();
            if nodes.iter().any(|node| node.name == name) {
                return Err(ConfigurationError::DuplicateClass(name).into());
            }
            let node = Arc::new(ClassNode {
                id: ClassId(nodes.len()),
                name,
                ancestors,
                custom,
                class_options,
                plugins,
                members,
            });
            nodes.push(Arc::clone(&node));
            node
        };

        debug!(
            hierarchy = self.hierarchy.id,
            class = %node.name,
            parent = %self.node.name,
            "error class registered"
        );
        Ok(self.with_node(&node))
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    /// Create an instance.
    ///
    /// On the root class, the concrete class is taken from the cause when it
    /// is an instance of this hierarchy, else `UnknownError`. A root
    /// construction needs a cause; an explicit `null` one is enough.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::MissingUnknownError`] before `UnknownError`
    ///   is declared.
    /// - [`ConfigurationError::MissingRootCause`] on the root class without
    ///   a cause.
    /// - [`OptionsError`] for rejected instance options.
    /// - [`PluginError`] from a custom `init`, a `properties` hook or
    ///   `on_create`.
    #[track_caller]
    pub fn create(&self, message: impl Into<String>, options: InstanceOptions) -> Result<ErrorInstance> {
        let frame = caller_frame(Location::caller());
        self.construct(message.into(), options, &frame)
    }

    /// Normalize any thrown value into an instance of this class.
    ///
    /// - an instance of this class (or a descendant) is returned unchanged;
    ///   through the root any instance of the hierarchy is.
    /// - an instance of another class of the hierarchy is re-classed.
    /// - anything else is wrapped, in `UnknownError` when normalizing
    ///   through the root.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create).
    #[track_caller]
    pub fn normalize(&self, value: impl Into<Thrown>) -> Result<ErrorInstance> {
        let frame = caller_frame(Location::caller());
        normalize::normalize(self, value.into(), &frame)
    }

    /// Call static method `method`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownMethod`](crate::Error::UnknownMethod) when no
    ///   plugin defines it.
    /// - [`OptionsError`] for rejected method options.
    /// - [`PluginError`] from the method itself.
    pub fn call_static(&self, method: &str, args: Vec<Value>) -> Result<MethodOutput> {
        info::call_static_method(self, method, args)
    }

    pub(crate) fn construct(
        &self,
        message: String,
        options: InstanceOptions,
        frame: &str,
    ) -> Result<ErrorInstance> {
        let unknown = self.unknown_error()?;
        let class = if self.is_root() {
            let Some(cause) = options.cause.as_ref() else {
                let name = self.name().to_string();
                return Err(ConfigurationError::MissingRootCause(name).into());
            };
            match cause.as_instance() {
                Some(cause) if cause.class.same_hierarchy(self) => cause.class.clone(),
                _ => unknown,
            }
        } else {
            self.clone()
        };
        class.build(message, options, frame)
    }

    fn build(&self, message: String, options: InstanceOptions, frame: &str) -> Result<ErrorInstance> {
        let InstanceOptions {
            cause,
            errors,
            options,
            args,
        } = options;

        let mut constructor_args = ConstructorArgs {
            message,
            options,
            args,
        };
        self.run_inits(&mut constructor_args)?;
        let ConstructorArgs {
            message,
            options,
            args,
        } = constructor_args;

        self.validate_instance_options(&options)?;

        let mut instance =
            ErrorInstance::bare(self.clone(), message, frame.to_string(), Arc::new(options), args);

        if let Some(errors) = errors {
            let root = self.root();
            let errors = errors
                .into_iter()
                .map(|error| normalize::normalize(&root, error, frame))
                .collect::<Result<Vec<_>>>()?;
            instance.errors = Some(errors);
        }

        if let Some(cause) = cause {
            cause::merge_cause(&mut instance, cause, frame)?;
        }

        self.finish(instance)
    }

    /// Custom `init` hooks, nearest first.
    fn run_inits(&self, args: &mut ConstructorArgs) -> std::result::Result<(), PluginError> {
        let nodes = iter::once(&self.node).chain(self.node.ancestors.iter().rev());
        for node in nodes {
            let Some(custom) = &node.custom else { continue };
            for base in custom.chain() {
                if let Some(init) = &base.init {
                    init(&mut *args)?;
                }
            }
        }
        Ok(())
    }

    fn validate_instance_options(&self, options: &OptionsBag) -> Result<()> {
        for (key, value) in options {
            let plugin = self
                .node
                .plugins
                .get(key)
                .ok_or_else(|| OptionsError::UnknownOption(key.clone()))?;
            if value.is_null() {
                continue;
            }
            let merged = merge_layers(self.static_layers(plugin).chain(iter::once(value)));
            plugin.normalize_options(&merged, false)?;
        }
        Ok(())
    }

    /// Global and class layers of `plugin`, lowest first.
    fn static_layers<'a>(&'a self, plugin: &'a Plugin) -> impl Iterator<Item = &'a Value> + 'a {
        let name = plugin.name();
        iter::once(layer(&self.hierarchy.settings.options, name))
            .chain(
                self.node
                    .ancestors
                    .iter()
                    .map(move |node| layer(&node.class_options, name)),
            )
            .chain(iter::once(layer(&self.node.class_options, name)))
    }

    /// Options handed to a hook of `plugin`: global, class, instance and
    /// method layers merged, then normalized with `full = true`.
    pub(crate) fn resolve_options(
        &self,
        plugin: &Plugin,
        instance: &OptionsBag,
        method: Option<&Value>,
    ) -> std::result::Result<Value, OptionsError> {
        let merged = merge_layers(
            self.static_layers(plugin)
                .chain(iter::once(layer(instance, plugin.name())))
                .chain(method),
        );
        plugin.normalize_options(&merged, true)
    }

    /// Run `properties` hooks then `on_create`.
    pub(crate) fn finish(&self, mut instance: ErrorInstance) -> Result<ErrorInstance> {
        for plugin in self.node.plugins.iter() {
            let Some(hook) = plugin.properties_hook() else {
                continue;
            };
            let properties = {
                let options = self.resolve_options(plugin, &instance.options, None)?;
                let info = Info::new(self.clone(), plugin, options, Some(&instance), None);
                hook(&info)?
            };
            instance.apply_plugin_properties(properties);
        }

        if let Some(on_create) = &self.hierarchy.settings.on_create {
            let options = Arc::clone(&instance.options);
            on_create(&mut instance, &options)?;
        }

        trace!(class = %self.node.name, wrap = instance.wrap, "error created");
        Ok(instance)
    }
}

impl PartialEq for ErrorClass {
    fn eq(&self, other: &Self) -> bool {
        self.same_hierarchy(other) && self.node.id == other.node.id
    }
}

impl Eq for ErrorClass {}

impl fmt::Debug for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClass")
            .field("name", &self.node.name)
            .field("hierarchy", &self.hierarchy.id)
            .field("plugins", &self.node.plugins)
            .finish()
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.name)
    }
}

fn validate_class_name(name: &str) -> std::result::Result<(), ConfigurationError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigurationError::EmptyClassName);
    };
    if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigurationError::InvalidClassName(name.to_string()));
    }
    if NATIVE_ERROR_NAMES.contains(&name) {
        return Err(ConfigurationError::NativeClassName(name.to_string()));
    }
    Ok(())
}

// ============================================================================
// Custom classes
// ============================================================================

/// Hook run before construction. It may rewrite the message, the instance
/// options and the extra arguments, or reject the construction.
pub type InitHook = Arc<dyn Fn(&mut ConstructorArgs) -> std::result::Result<(), PluginError> + Send + Sync>;

/// What a custom class extends.
#[derive(Clone)]
pub struct CustomParent(ParentKind);

#[derive(Clone)]
enum ParentKind {
    Class {
        hierarchy: u64,
        class: ClassId,
        name: String,
    },
    Custom(Arc<CustomClass>),
}

impl From<&ErrorClass> for CustomParent {
    fn from(class: &ErrorClass) -> Self {
        Self(ParentKind::Class {
            hierarchy: class.hierarchy.id,
            class: class.node.id,
            name: class.node.name.clone(),
        })
    }
}

impl From<ErrorClass> for CustomParent {
    fn from(class: ErrorClass) -> Self {
        Self::from(&class)
    }
}

impl From<Arc<CustomClass>> for CustomParent {
    fn from(custom: Arc<CustomClass>) -> Self {
        Self(ParentKind::Custom(custom))
    }
}

impl From<&Arc<CustomClass>> for CustomParent {
    fn from(custom: &Arc<CustomClass>) -> Self {
        Self(ParentKind::Custom(Arc::clone(custom)))
    }
}

/// User-authored base spliced between a class and a subclass.
///
/// Only usable through [`ClassOptions::custom`].
pub struct CustomClass {
    name: String,
    parent: CustomParent,
    members: Map<String, Value>,
    init: Option<InitHook>,
}

impl CustomClass {
    /// Start describing a custom class extending `parent`.
    pub fn builder(name: impl Into<String>, parent: impl Into<CustomParent>) -> CustomClassBuilder {
        CustomClassBuilder {
            custom: CustomClass {
                name: name.into(),
                parent: parent.into(),
                members: Map::new(),
                init: None,
            },
        }
    }

    /// Class name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members inherited by instances.
    #[inline]
    pub fn members(&self) -> &Map<String, Value> {
        &self.members
    }

    /// Custom classes cannot be instantiated without being registered
    /// through `subclass()`.
    ///
    /// # Errors
    ///
    /// Always [`ConfigurationError::UnregisteredClass`].
    pub fn create(&self, _message: impl Into<String>) -> Result<ErrorInstance> {
        Err(ConfigurationError::UnregisteredClass(self.name.clone()).into())
    }

    /// This class, then every custom class it extends.
    fn chain(&self) -> Vec<&CustomClass> {
        let mut chain = vec![self];
        let mut current = self;
        while let ParentKind::Custom(parent) = &current.parent.0 {
            current = parent.as_ref();
            chain.push(current);
        }
        chain
    }

    fn validate_base(&self, parent: &ErrorClass) -> std::result::Result<(), ConfigurationError> {
        let chain = self.chain();
        if chain.iter().any(|layer| layer.name.is_empty()) {
            return Err(ConfigurationError::EmptyCustomName);
        }

        let extends_parent = chain.last().is_some_and(|base| match &base.parent.0 {
            ParentKind::Class {
                hierarchy, class, ..
            } => *hierarchy == parent.hierarchy.id && *class == parent.node.id,
            ParentKind::Custom(_) => false,
        });
        if !extends_parent {
            return Err(ConfigurationError::CustomNotExtending {
                custom: self.name.clone(),
                parent: parent.name().to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CustomClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = match &self.parent.0 {
            ParentKind::Class { name, .. } => name.as_str(),
            ParentKind::Custom(custom) => custom.name(),
        };
        f.debug_struct("CustomClass")
            .field("name", &self.name)
            .field("parent", &parent)
            .field("members", &self.members)
            .field("init", &self.init.is_some())
            .finish()
    }
}

/// Fluent builder for [`CustomClass`].
#[must_use = "call build() to obtain the custom class"]
pub struct CustomClassBuilder {
    custom: CustomClass,
}

impl CustomClassBuilder {
    /// Add a member inherited by every instance.
    pub fn member(mut self, key: impl Into<String>, value: Value) -> Self {
        self.custom.members.insert(key.into(), value);
        self
    }

    /// Set the `init` hook.
    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ConstructorArgs) -> std::result::Result<(), PluginError> + Send + Sync + 'static,
    {
        self.custom.init = Some(Arc::new(hook));
        self
    }

    /// Finish the custom class.
    pub fn build(self) -> Arc<CustomClass> {
        Arc::new(self.custom)
    }
}

/// Arguments of a construction, as seen by custom `init` hooks.
#[derive(Debug, Clone)]
pub struct ConstructorArgs {
    message: String,
    options: OptionsBag,
    args: Vec<Value>,
}

impl ConstructorArgs {
    /// Message passed to `create()`.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Instance options.
    #[inline]
    pub fn options(&self) -> &OptionsBag {
        &self.options
    }

    /// Instance options, mutable.
    #[inline]
    pub fn options_mut(&mut self) -> &mut OptionsBag {
        &mut self.options
    }

    /// Extra arguments.
    #[inline]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Extra arguments, mutable.
    #[inline]
    pub fn args_mut(&mut self) -> &mut Vec<Value> {
        &mut self.args
    }
}
