//! Host-side connection setup.
//!
//! Turns a foreign server's driver options into a registered driver, keeping
//! one loader context per distinct driver path set for the process lifetime.

mod options;
mod setup;

use thiserror::Error;

use crate::loader::LoadError;
use crate::registry::RegistryError;

pub use options::{split_driver_path, DriverOptions, DRIVER_CLASS_OPTION, DRIVER_PATH_OPTION};
pub use setup::{DriverBinding, DriverHost};

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    #[error("Failed to load driver {class} from '{paths}': {source}")]
    Load {
        class: String,
        paths: String,
        #[source]
        source: LoadError,
    },

    #[error("Driver registration failed: {0}")]
    Registry(#[from] RegistryError),
}
