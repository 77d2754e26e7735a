//! Named-instance registries ("dispensers").
//!
//! A dispenser gives many independent call sites persistent, addressable
//! state across telemetry frames without globals: the first `get("x", ctor)`
//! constructs and caches the instance, every later `get("x", ..)` returns the
//! same one, and `dispose`/`clear` tear instances down (releasing hardware
//! resources for types that hold them).
//!
//! The registry lock protects only the map; instances are handed out as
//! `Arc<Mutex<T>>`, each logically owned by one telemetry-processing call
//! path at a time. Registries are plain owned values: construct one per
//! session and drop it when the session ends.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Types that hold an external resource which must be released explicitly.
///
/// Purely in-memory registry entries (filters, accumulators) implement this
/// as a no-op so they can share the dispenser machinery.
pub trait Destroyable {
    fn destroy(&mut self);
}

/// Shared handle to one dispensed instance.
pub type Dispensed<T> = Arc<Mutex<T>>;

/// Name-keyed lazy factory and cache.
pub struct Dispenser<T> {
    entries: Mutex<HashMap<String, Dispensed<T>>>,
}

impl<T> Dispenser<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached instance for `name`, constructing it on first use.
    ///
    /// The constructor runs at most once per name until the entry is
    /// disposed.
    pub fn get(&self, name: &str, ctor: impl FnOnce() -> T) -> Dispensed<T> {
        let mut entries = self.entries.lock();
        entries
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ctor())))
            .clone()
    }

    /// The instance for `name`, if it was ever dispensed.
    pub fn lookup(&self, name: &str) -> Option<Dispensed<T>> {
        self.entries.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Snapshot of all live instances, for bulk operations such as
    /// "stop every effect on telemetry timeout".
    pub fn values(&self) -> Vec<Dispensed<T>> {
        self.entries.lock().values().cloned().collect()
    }

    /// Runs `f` against every live instance.
    pub fn for_each(&self, mut f: impl FnMut(&mut T)) {
        for entry in self.values() {
            f(&mut entry.lock());
        }
    }
}

impl<T: Destroyable> Dispenser<T> {
    /// Destroys and removes the named instance; absent names are a no-op.
    pub fn dispose(&self, name: &str) {
        let removed = self.entries.lock().remove(name);
        if let Some(entry) = removed {
            entry.lock().destroy();
        }
    }

    /// Destroys and removes every instance.
    pub fn clear(&self) {
        let drained: Vec<_> = self.entries.lock().drain().collect();
        for (_, entry) in drained {
            entry.lock().destroy();
        }
    }
}

impl<T> Default for Dispenser<T> {
    fn default() -> Self {
        Self::new()
    }
}
