//! Loader contexts: the unit of driver isolation.
//!
//! A context owns an append-only list of class sources and an append-only
//! cache of linked classes. Classes never move between contexts; a
//! parent-delegating context may hand out a class its parent already holds,
//! but it does not cache it as its own.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, RwLock};

use super::class_file::{self, LinkPolicy};
use super::error::LoadError;
use super::handle::ClassHandle;
use super::location::ResourceLocation;
use super::source::ClassSource;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Where a context may look for classes it has not loaded itself.
#[derive(Debug, Clone, Default)]
pub enum Delegation {
    /// Only this context's own cache and sources.
    #[default]
    Isolated,
    /// Classes already resident in the parent chain are returned as-is.
    Parent(Arc<LoaderContext>),
}

/// An isolated, incrementally configured class namespace.
pub struct LoaderContext {
    id: u64,
    delegation: Delegation,
    policy: LinkPolicy,
    sources: RwLock<Vec<Arc<dyn ClassSource>>>,
    cache: RwLock<HashMap<String, ClassHandle>>,
    in_flight: Mutex<HashMap<String, Arc<PendingLoad>>>,
}

impl LoaderContext {
    /// Create an isolated context seeded with `locations`.
    ///
    /// Locations are only checked syntactically; nothing is opened.
    pub fn new<I, S>(locations: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_delegation(Delegation::Isolated, locations)
    }

    /// Create a context that delegates to `parent` for resident classes.
    pub fn with_parent<I, S>(parent: Arc<LoaderContext>, locations: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_delegation(Delegation::Parent(parent), locations)
    }

    fn with_delegation<I, S>(delegation: Delegation, locations: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sources: Vec<Arc<dyn ClassSource>> = Vec::new();
        for raw in locations {
            sources.push(Arc::new(ResourceLocation::parse(raw.as_ref())?));
        }

        Ok(Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::SeqCst),
            delegation,
            policy: LinkPolicy::default(),
            sources: RwLock::new(sources),
            cache: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the link policy applied to classes loaded from now on.
    pub fn with_policy(mut self, policy: LinkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn policy(&self) -> &LinkPolicy {
        &self.policy
    }

    pub fn parent(&self) -> Option<&Arc<LoaderContext>> {
        match &self.delegation {
            Delegation::Parent(parent) => Some(parent),
            Delegation::Isolated => None,
        }
    }

    /// Append a location. Duplicates are kept and searched again.
    pub fn add_location(&self, raw: &str) -> Result<(), LoadError> {
        let location = ResourceLocation::parse(raw)?;
        self.sources.write().push(Arc::new(location));
        Ok(())
    }

    /// Append a custom class source after the existing ones.
    pub fn add_source(&self, source: Arc<dyn ClassSource>) {
        self.sources.write().push(source);
    }

    /// Descriptions of all sources, in search order.
    pub fn locations(&self) -> Vec<String> {
        self.sources.read().iter().map(|s| s.describe()).collect()
    }

    /// Return the cached handle for `name`, if this context has loaded it.
    ///
    /// Never performs I/O and never consults the parent.
    pub fn is_loaded(&self, name: &str) -> Option<ClassHandle> {
        self.cache.read().get(name).cloned()
    }

    /// Names of all classes in the cache, sorted.
    pub fn loaded_classes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Resolve `name`: cache, then resident parent classes, then sources in
    /// append order.
    ///
    /// Concurrent calls for the same name share one scan.
    pub fn load_class(&self, name: &str) -> Result<ClassHandle, LoadError> {
        if let Some(handle) = self.is_loaded(name) {
            return Ok(handle);
        }
        if let Some(handle) = self.delegate(name) {
            return Ok(handle);
        }
        if !class_file::is_valid_binary_name(name) {
            return Err(LoadError::ClassNotFound {
                class: name.to_string(),
                searched: 0,
            });
        }

        let pending = {
            let mut in_flight = self.in_flight.lock();
            // A load may have completed between the first check and this lock.
            if let Some(handle) = self.is_loaded(name) {
                return Ok(handle);
            }
            if let Some(pending) = in_flight.get(name).cloned() {
                drop(in_flight);
                return pending.wait();
            }
            let pending = Arc::new(PendingLoad::new());
            in_flight.insert(name.to_string(), pending.clone());
            pending
        };

        let mut guard = LeaderGuard {
            context: self,
            name,
            pending,
            finished: false,
        };
        let result = self.scan(name);
        if let Ok(handle) = &result {
            self.cache.write().insert(name.to_string(), handle.clone());
        }
        guard.finish(result.clone());
        result
    }

    fn resident(&self, name: &str) -> Option<ClassHandle> {
        self.is_loaded(name).or_else(|| self.delegate(name))
    }

    fn delegate(&self, name: &str) -> Option<ClassHandle> {
        self.parent().and_then(|parent| parent.resident(name))
    }

    fn scan(&self, name: &str) -> Result<ClassHandle, LoadError> {
        let entry = class_file::entry_name(name);
        // Snapshot so no lock is held during I/O.
        let sources: Vec<Arc<dyn ClassSource>> = self.sources.read().clone();

        let mut first_failure: Option<LoadError> = None;
        for source in &sources {
            let bytes = match source.find_entry(&entry, self.policy.max_entry_bytes) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => {
                    first_failure.get_or_insert_with(|| malformed(name, source.as_ref(), e.to_string()));
                    continue;
                }
            };

            match class_file::link(&bytes, name, &self.policy) {
                Ok(info) => return Ok(ClassHandle::new(info, source.describe(), &bytes, self.id)),
                Err(e) => {
                    first_failure.get_or_insert_with(|| malformed(name, source.as_ref(), e.to_string()));
                }
            }
        }

        Err(first_failure.unwrap_or_else(|| LoadError::ClassNotFound {
            class: name.to_string(),
            searched: sources.len(),
        }))
    }
}

impl fmt::Debug for LoaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderContext")
            .field("id", &self.id)
            .field("parent", &self.parent().map(|p| p.id()))
            .field("locations", &self.locations())
            .field("loaded", &self.loaded_classes())
            .finish()
    }
}

fn malformed(name: &str, source: &dyn ClassSource, reason: String) -> LoadError {
    LoadError::MalformedClass {
        class: name.to_string(),
        location: source.describe(),
        reason,
    }
}

/// A load in progress that other callers can wait on.
struct PendingLoad {
    outcome: Mutex<Option<Result<ClassHandle, LoadError>>>,
    done: Condvar,
}

impl PendingLoad {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    fn wait(&self) -> Result<ClassHandle, LoadError> {
        let mut outcome = self.outcome.lock();
        loop {
            if let Some(result) = outcome.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut outcome);
        }
    }

    fn complete(&self, result: Result<ClassHandle, LoadError>) {
        *self.outcome.lock() = Some(result);
        self.done.notify_all();
    }
}

/// Clears the in-flight entry and wakes waiters, even if a source panics.
struct LeaderGuard<'a> {
    context: &'a LoaderContext,
    name: &'a str,
    pending: Arc<PendingLoad>,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(&mut self, result: Result<ClassHandle, LoadError>) {
        self.context.in_flight.lock().remove(self.name);
        self.pending.complete(result);
        self.finished = true;
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.context.in_flight.lock().remove(self.name);
            self.pending.complete(Err(LoadError::MalformedClass {
                class: self.name.to_string(),
                location: "<in-flight load>".to_string(),
                reason: "load aborted by a panicking class source".to_string(),
            }));
        }
    }
}
