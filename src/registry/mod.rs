//! Driver registration: factories that turn loaded classes into drivers, and
//! the manager that maps connection strings to registered drivers.

mod driver;
mod manager;

use thiserror::Error;

pub use driver::{Driver, DriverFactories, DriverFactory, PrefixDriver, KNOWN_DRIVERS};
pub use manager::DriverManager;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Driver {class} from loader context {context_id} is already registered")]
    AlreadyRegistered { class: String, context_id: u64 },

    #[error("No suitable driver for {0}")]
    NoSuitableDriver(String),

    #[error("No driver factory for class {0}")]
    NoFactory(String),

    #[error("Failed to instantiate {class}: {reason}")]
    Instantiation { class: String, reason: String },
}
