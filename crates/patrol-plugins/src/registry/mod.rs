//! Plugin registry mapping stable names to constructors.
//!
//! Plugins are resolved through an explicit factory map populated at
//! startup, so an unknown name is a typed, testable error rather than a
//! reflection failure. Duplicate registrations for the same plugin name are
//! rejected.

use std::collections::HashMap;
use std::fmt;

use crate::error::PluginError;
use crate::plugin::{Fault, ScanPlugin};

/// Constructor for one plugin variant.
///
/// Factories may fail; a failing factory surfaces as
/// [`PluginError::Construct`] at load time.
pub type PluginFactory = Box<dyn Fn() -> Result<Box<dyn ScanPlugin>, Fault> + Send + Sync>;

/// Registry of available plugin constructors.
///
/// # Example
///
/// ```
/// use patrol_plugins::registry::PluginRegistry;
/// use patrol_plugins::plugin::{Fault, PluginContext, ScanPlugin};
///
/// struct NullScan;
///
/// impl ScanPlugin for NullScan {
///     fn configure(&mut self, _ctx: &PluginContext) -> Result<(), Fault> { Ok(()) }
///     fn start(&mut self, _ctx: &PluginContext) -> Result<(), Fault> { Ok(()) }
///     fn stop(&mut self, _ctx: &PluginContext) -> Result<(), Fault> { Ok(()) }
/// }
///
/// let mut registry = PluginRegistry::new();
/// registry.register("null", || Ok(Box::new(NullScan))).expect("register");
/// assert!(registry.contains("null"));
/// ```
#[derive(Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin constructor under a stable name.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyRegistered`] when the name is taken.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> Result<(), PluginError>
    where
        F: Fn() -> Result<Box<dyn ScanPlugin>, Fault> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(PluginError::AlreadyRegistered { name });
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    /// Constructs a plugin instance by name.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown names and
    /// [`PluginError::Construct`] when the factory fails.
    pub fn construct(&self, name: &str) -> Result<Box<dyn ScanPlugin>, PluginError> {
        let factory = self.factories.get(name).ok_or_else(|| PluginError::NotFound {
            name: name.to_owned(),
        })?;
        factory().map_err(|fault| PluginError::Construct {
            name: name.to_owned(),
            message: fault.to_string(),
        })
    }

    /// Returns whether a plugin is registered under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered plugin names in unspecified order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Returns the number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` when no plugins are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
