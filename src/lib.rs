//! Driver Loader
//!
//! Runtime loading of database-client driver archives for foreign-data
//! wrappers that front Hive- and Athena-like services. The driver path is
//! configuration, not a build input: each foreign server names its archives
//! and entry-point class, and the host loads them on first connect.
//!
//! # Isolation
//!
//! - Every distinct driver path set gets its own [`LoaderContext`]
//! - A class loaded by one context is never the same handle as a class
//!   loaded by another, even from identical bytes
//! - Archives are opened and closed within a single load; only the cache
//!   outlives a call
//! - Resolution is first-match-wins over locations in append order
//!
//! # Layers
//!
//! - [`loader`]: contexts, locations, class-file linking
//! - [`registry`]: driver factories and the explicit driver manager
//! - [`host`]: connection setup tying the two together
//! - [`config`], [`telemetry`]: ambient configuration and logging

pub mod config;
pub mod host;
pub mod loader;
pub mod registry;
pub mod telemetry;

pub use host::{DriverBinding, DriverHost, DriverOptions, HostError};
pub use loader::{ClassHandle, LinkPolicy, LoadError, LoaderContext, ResourceLocation};
pub use registry::{Driver, DriverFactories, DriverManager, RegistryError};
