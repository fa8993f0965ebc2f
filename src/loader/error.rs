//! Loader error taxonomy.

use thiserror::Error;

/// Errors reported by a [`LoaderContext`](super::LoaderContext).
///
/// Errors are `Clone` so a single in-flight load can hand the same failure
/// to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    #[error("Class not found: {class} (searched {searched} location(s))")]
    ClassNotFound { class: String, searched: usize },

    #[error("Malformed class {class} in {location}: {reason}")]
    MalformedClass {
        class: String,
        location: String,
        reason: String,
    },
}

impl LoadError {
    pub(crate) fn invalid_location(location: &str, reason: impl Into<String>) -> Self {
        Self::InvalidLocation {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    /// The class name this error concerns, if any.
    pub fn class(&self) -> Option<&str> {
        match self {
            Self::InvalidLocation { .. } => None,
            Self::ClassNotFound { class, .. } | Self::MalformedClass { class, .. } => Some(class),
        }
    }
}
