//! Isolated driver loading.
//!
//! A [`LoaderContext`] resolves driver classes against its own ordered list of
//! archives and directories and caches what it links. Contexts share nothing:
//! the same class loaded by two contexts yields two distinct handles.
//!
//! The loader never logs. Failures are reported through [`LoadError`] only.

pub mod class_file;

mod context;
mod error;
mod handle;
mod location;
mod source;

pub use class_file::{ClassFileInfo, LinkError, LinkPolicy};
pub use context::{Delegation, LoaderContext};
pub use error::LoadError;
pub use handle::ClassHandle;
pub use location::ResourceLocation;
pub use source::{ClassSource, SourceError};

pub(crate) use location::url_scheme;
