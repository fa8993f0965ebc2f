//! Explicit driver manager.
//!
//! Plays the role of the client library's process-wide driver registry, but
//! as an ordinary value: hosts pass it to their connection-setup path and
//! tests make a fresh one per case.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::loader::ClassHandle;

use super::driver::Driver;
use super::RegistryError;

/// Ordered set of registered drivers.
#[derive(Debug, Default)]
pub struct DriverManager {
    drivers: RwLock<Vec<Arc<dyn Driver>>>,
}

impl DriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver.
    ///
    /// Fails if a driver for the same class handle is already registered.
    /// Same-named classes from different loader contexts are distinct.
    pub fn register(&self, driver: Arc<dyn Driver>) -> Result<(), RegistryError> {
        let mut drivers = self.drivers.write();
        if drivers.iter().any(|d| d.class() == driver.class()) {
            return Err(RegistryError::AlreadyRegistered {
                class: driver.name().to_string(),
                context_id: driver.class().context_id(),
            });
        }
        tracing::debug!(
            class = driver.name(),
            context_id = driver.class().context_id(),
            "driver registered"
        );
        drivers.push(driver);
        Ok(())
    }

    /// First registered driver accepting `url`.
    pub fn driver_for_url(&self, url: &str) -> Result<Arc<dyn Driver>, RegistryError> {
        self.drivers
            .read()
            .iter()
            .find(|d| d.accepts_url(url))
            .cloned()
            .ok_or_else(|| RegistryError::NoSuitableDriver(url.to_string()))
    }

    pub fn driver_for_class(&self, class: &ClassHandle) -> Option<Arc<dyn Driver>> {
        self.drivers.read().iter().find(|d| d.class() == class).cloned()
    }

    /// Remove the driver for `class`. Returns whether one was registered.
    pub fn deregister(&self, class: &ClassHandle) -> bool {
        let mut drivers = self.drivers.write();
        let before = drivers.len();
        drivers.retain(|d| d.class() != class);
        drivers.len() != before
    }

    /// Snapshot of all drivers in registration order.
    pub fn drivers(&self) -> Vec<Arc<dyn Driver>> {
        self.drivers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.drivers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.read().is_empty()
    }
}
