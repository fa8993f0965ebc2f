//! Driver entry points and the factories that instantiate them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::loader::ClassHandle;

use super::RegistryError;

/// A registered driver instance.
pub trait Driver: Send + Sync + fmt::Debug {
    /// Class this driver was instantiated from.
    fn class(&self) -> &ClassHandle;

    /// Whether the driver handles this connection string.
    fn accepts_url(&self, url: &str) -> bool;

    fn name(&self) -> &str {
        self.class().name()
    }
}

/// Driver that accepts every connection string starting with a fixed prefix.
#[derive(Debug, Clone)]
pub struct PrefixDriver {
    class: ClassHandle,
    prefix: String,
}

impl PrefixDriver {
    pub fn new(class: ClassHandle, prefix: impl Into<String>) -> Self {
        Self {
            class,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Driver for PrefixDriver {
    fn class(&self) -> &ClassHandle {
        &self.class
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with(&self.prefix)
    }
}

/// Builds a driver from a freshly loaded class.
pub type DriverFactory = Arc<dyn Fn(&ClassHandle) -> Result<Arc<dyn Driver>, RegistryError> + Send + Sync>;

/// Entry-point classes and URL prefixes of the drivers the wrappers ship for.
pub const KNOWN_DRIVERS: &[(&str, &str)] = &[
    ("org.apache.hive.jdbc.HiveDriver", "jdbc:hive2:"),
    ("org.apache.hadoop.hive.jdbc.HiveDriver", "jdbc:hive:"),
    ("com.simba.athena.jdbc.Driver", "jdbc:awsathena:"),
];

/// Factory lookup keyed by fully-qualified class name.
#[derive(Clone, Default)]
pub struct DriverFactories {
    factories: HashMap<String, DriverFactory>,
}

impl DriverFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factories for every entry in [`KNOWN_DRIVERS`].
    pub fn with_known_drivers() -> Self {
        let mut factories = Self::new();
        for (class, prefix) in KNOWN_DRIVERS {
            factories.register_prefix(class, prefix);
        }
        factories
    }

    /// Register `factory` for `class`, replacing any previous one.
    pub fn register<F>(&mut self, class: &str, factory: F)
    where
        F: Fn(&ClassHandle) -> Result<Arc<dyn Driver>, RegistryError> + Send + Sync + 'static,
    {
        self.factories.insert(class.to_string(), Arc::new(factory));
    }

    /// Register a [`PrefixDriver`] factory for `class`.
    pub fn register_prefix(&mut self, class: &str, prefix: &str) {
        let prefix = prefix.to_string();
        self.register(class, move |handle| {
            Ok(Arc::new(PrefixDriver::new(handle.clone(), prefix.clone())) as Arc<dyn Driver>)
        });
    }

    pub fn resolve(&self, class: &str) -> Result<DriverFactory, RegistryError> {
        self.factories
            .get(class)
            .cloned()
            .ok_or_else(|| RegistryError::NoFactory(class.to_string()))
    }

    /// Instantiate the driver for a loaded class.
    pub fn instantiate(&self, handle: &ClassHandle) -> Result<Arc<dyn Driver>, RegistryError> {
        let factory = self.resolve(handle.name())?;
        factory(handle)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for DriverFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverFactories")
            .field("classes", &self.classes())
            .finish()
    }
}
