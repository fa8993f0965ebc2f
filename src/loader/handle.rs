//! Loaded class handles.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::class_file::ClassFileInfo;

#[derive(Debug)]
struct LoadedClass {
    info: ClassFileInfo,
    origin: String,
    sha256: String,
    context_id: u64,
}

/// Shared reference to a class linked by one loader context.
///
/// Equality and hashing use identity: two handles are equal only if they
/// came from the same load in the same context, whatever their bytes.
#[derive(Debug, Clone)]
pub struct ClassHandle(Arc<LoadedClass>);

impl ClassHandle {
    pub(crate) fn new(info: ClassFileInfo, origin: String, bytes: &[u8], context_id: u64) -> Self {
        let sha256 = hex::encode(Sha256::digest(bytes));
        Self(Arc::new(LoadedClass {
            info,
            origin,
            sha256,
            context_id,
        }))
    }

    /// Fully-qualified binary name, e.g. `org.apache.hive.jdbc.HiveDriver`.
    pub fn name(&self) -> &str {
        &self.0.info.name
    }

    pub fn super_name(&self) -> Option<&str> {
        self.0.info.super_name.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.0.info.interfaces
    }

    /// Whether the class declares `interface` directly.
    pub fn implements(&self, interface: &str) -> bool {
        self.0.info.interfaces.iter().any(|i| i == interface)
    }

    /// Class-file `(major, minor)` version.
    pub fn version(&self) -> (u16, u16) {
        (self.0.info.major_version, self.0.info.minor_version)
    }

    /// Location the class was read from.
    pub fn origin(&self) -> &str {
        &self.0.origin
    }

    /// Hex SHA-256 of the class-file bytes.
    pub fn sha256(&self) -> &str {
        &self.0.sha256
    }

    /// Id of the loader context that owns this class.
    pub fn context_id(&self) -> u64 {
        self.0.context_id
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for ClassHandle {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl Eq for ClassHandle {}

impl Hash for ClassHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}
