//! Connection-setup path: one loader context per distinct driver path set,
//! load once, register once.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::loader::{ClassHandle, LinkPolicy, LoadError, LoaderContext};
use crate::registry::{Driver, DriverFactories, DriverManager, RegistryError};
use crate::telemetry::{SetupSpan, SpanExt};

use super::options::DriverOptions;
use super::HostError;

/// Result of a successful setup.
#[derive(Debug, Clone)]
pub struct DriverBinding {
    pub context: Arc<LoaderContext>,
    pub class: ClassHandle,
    pub driver: Arc<dyn Driver>,
    /// True when an already registered driver was reused.
    pub reused: bool,
}

/// Owns the loader contexts of a host process and wires loaded drivers into
/// its driver manager.
pub struct DriverHost {
    registry: Arc<DriverManager>,
    factories: DriverFactories,
    policy: LinkPolicy,
    contexts: DashMap<Vec<String>, Arc<LoaderContext>>,
}

impl DriverHost {
    pub fn new(registry: Arc<DriverManager>, factories: DriverFactories, policy: LinkPolicy) -> Self {
        Self {
            registry,
            factories,
            policy,
            contexts: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<DriverManager> {
        &self.registry
    }

    /// Number of distinct loader contexts created so far.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Context for an already split path set, if one exists.
    pub fn context(&self, paths: &[String]) -> Option<Arc<LoaderContext>> {
        self.contexts.get(paths).map(|c| c.value().clone())
    }

    /// Make the configured driver available in the registry.
    ///
    /// Reconnects with a configuration whose driver is already loaded and
    /// registered perform no I/O and no registration.
    pub fn setup(&self, options: &DriverOptions) -> Result<DriverBinding, HostError> {
        let span = SetupSpan::new(&options.driver_class, &options.driver_path);
        let _entered = span.enter();

        let result = self.try_setup(options);
        span.record_result(&result);
        match &result {
            Ok(binding) => {
                span.record("context_id", binding.context.id());
                let outcome = if binding.reused { "reused" } else { "loaded" };
                metrics::counter!("driver_loader_setup_total", "outcome" => outcome).increment(1);
            }
            Err(e) => {
                metrics::counter!("driver_loader_setup_total", "outcome" => "failed").increment(1);
                tracing::warn!(
                    class = %options.driver_class,
                    paths = %options.driver_path,
                    error = %e,
                    "driver setup failed"
                );
            }
        }
        result
    }

    fn try_setup(&self, options: &DriverOptions) -> Result<DriverBinding, HostError> {
        let paths = options.paths();
        if paths.is_empty() {
            return Err(HostError::MissingOption(super::options::DRIVER_PATH_OPTION));
        }
        let load_error = |source: LoadError| HostError::Load {
            class: options.driver_class.clone(),
            paths: paths.join(";"),
            source,
        };

        let context = self.context_for(&paths).map_err(load_error)?;

        if let Some(class) = context.is_loaded(&options.driver_class) {
            if let Some(driver) = self.registry.driver_for_class(&class) {
                tracing::debug!(
                    class = %options.driver_class,
                    context_id = context.id(),
                    "reusing registered driver"
                );
                return Ok(DriverBinding {
                    context,
                    class,
                    driver,
                    reused: true,
                });
            }
        }

        let class = context.load_class(&options.driver_class).map_err(load_error)?;
        let driver = self.factories.instantiate(&class)?;

        match self.registry.register(driver.clone()) {
            Ok(()) => {
                tracing::info!(
                    class = %class.name(),
                    origin = %class.origin(),
                    sha256 = %class.sha256(),
                    context_id = context.id(),
                    "driver loaded and registered"
                );
                Ok(DriverBinding {
                    context,
                    class,
                    driver,
                    reused: false,
                })
            }
            // Another setup for the same configuration registered first.
            Err(err @ RegistryError::AlreadyRegistered { .. }) => match self.registry.driver_for_class(&class) {
                Some(driver) => Ok(DriverBinding {
                    context,
                    class,
                    driver,
                    reused: true,
                }),
                None => Err(err.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    fn context_for(&self, paths: &[String]) -> Result<Arc<LoaderContext>, LoadError> {
        if let Some(context) = self.contexts.get(paths) {
            return Ok(context.value().clone());
        }

        match self.contexts.entry(paths.to_vec()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => {
                let context = Arc::new(LoaderContext::new(paths)?.with_policy(self.policy.clone()));
                tracing::info!(
                    context_id = context.id(),
                    paths = %paths.join(";"),
                    "created loader context"
                );
                metrics::counter!("driver_loader_contexts_created_total").increment(1);
                Ok(e.insert(context).value().clone())
            }
        }
    }
}
