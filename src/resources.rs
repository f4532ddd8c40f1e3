//! Named exclusive resources
//!
//! Backends wrapping libraries that are not thread-safe declare a
//! resource name. Everything declaring the same name is serialized
//! through one lock.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

static UNIQUE_RESOURCES: AtomicUsize = AtomicUsize::new(0);

/// A resource name nothing else uses
pub fn unique_shared_resource_name() -> String {
    let n = UNIQUE_RESOURCES.fetch_add(1, Ordering::Relaxed);
    format!("__unique{}", n)
}

#[derive(Debug, Default)]
pub struct SharedResourcesRegistry {
    resources: Mutex<BTreeMap<String, Arc<Mutex<()>>>>,
}

impl SharedResourcesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock set for a module declaring `names`
    pub fn acquirer<S: AsRef<str>>(&self, names: &[S]) -> SharedResourcesAcquirer {
        let mut resources = self.resources.lock();
        let mut locks: BTreeMap<String, Arc<Mutex<()>>> = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let lock = resources.entry(name.to_owned()).or_default();
            locks.insert(name.to_owned(), Arc::clone(lock));
        }
        SharedResourcesAcquirer {
            locks: locks.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Locks for a fixed set of resources, taken in name order
#[derive(Debug, Clone)]
pub struct SharedResourcesAcquirer {
    locks: Vec<(String, Arc<Mutex<()>>)>,
}

/// Holds all resources of an acquirer until dropped
#[must_use]
pub struct SharedResourcesGuard<'a> {
    _guards: Vec<MutexGuard<'a, ()>>,
}

impl SharedResourcesAcquirer {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locks.iter().map(|(name, _)| name.as_str())
    }

    pub fn lock(&self) -> SharedResourcesGuard<'_> {
        SharedResourcesGuard {
            _guards: self.locks.iter().map(|(_, lock)| lock.lock()).collect(),
        }
    }

    /// Take all locks, or none if any of them is held elsewhere
    pub fn try_lock(&self) -> Option<SharedResourcesGuard<'_>> {
        let mut guards = Vec::with_capacity(self.locks.len());
        for (_, lock) in &self.locks {
            guards.push(lock.try_lock()?);
        }
        Some(SharedResourcesGuard { _guards: guards })
    }
}
