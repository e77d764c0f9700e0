use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::{InvalidationDomain, ModificationTracker, Stamp};

enum Slot<V> {
    Computing { stamp: Stamp },
    Ready { value: Arc<V>, stamp: Stamp },
}

/// Observable state of a single cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Missing,
    Fresh,
    /// A dependency was bumped; the next lookup recomputes.
    Stale,
    Computing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub computations: u64,
    /// Results computed against a stamp that went stale before publishing.
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    computations: AtomicU64,
    discarded: AtomicU64,
}

/// Single-flight cache whose entries are valid for one [`Stamp`].
///
/// Concurrent callers for the same key and stamp wait for one computation and
/// share its `Arc`. If a dependency is bumped while a value is being computed,
/// the value is handed to the computing caller but never published.
pub struct VersionedCache<K, V> {
    name: &'static str,
    slots: Mutex<HashMap<K, Slot<V>>>,
    published: Condvar,
    counters: Counters,
}

impl<K, V> fmt::Debug for VersionedCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedCache")
            .field("name", &self.name)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<K, V> VersionedCache<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Mutex::new(HashMap::new()),
            published: Condvar::new(),
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the cached value for `key` if it is current for `deps`,
    /// otherwise computes it exactly once across concurrent callers.
    pub fn get_or_compute(
        &self,
        key: &K,
        tracker: &ModificationTracker,
        deps: &[InvalidationDomain],
        compute: impl FnOnce() -> V,
    ) -> Arc<V> {
        let stamp = {
            let mut slots = self.slots.lock();
            loop {
                let stamp = tracker.stamp(deps);
                let in_flight = match slots.get(key) {
                    Some(Slot::Ready { value, stamp: stored }) if *stored == stamp => {
                        self.counters.hits.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(target: "beanscope.cache", cache = self.name, ?key, "cache hit");
                        return Arc::clone(value);
                    }
                    Some(Slot::Computing { stamp: stored }) => *stored == stamp,
                    _ => false,
                };
                if in_flight {
                    self.published.wait(&mut slots);
                    continue;
                }

                tracing::debug!(target: "beanscope.cache", cache = self.name, ?key, "cache miss");
                slots.insert(
                    key.clone(),
                    Slot::Computing {
                        stamp: stamp.clone(),
                    },
                );
                break stamp;
            }
        };

        let mut guard = ComputeGuard {
            cache: self,
            key,
            stamp: &stamp,
            armed: true,
        };
        let value = Arc::new(compute());
        guard.armed = false;
        drop(guard);
        self.counters.computations.fetch_add(1, Ordering::Relaxed);

        let mut slots = self.slots.lock();
        let ours = matches!(slots.get(key), Some(Slot::Computing { stamp: s }) if *s == stamp);
        if stamp.is_current(tracker) {
            if ours {
                slots.insert(
                    key.clone(),
                    Slot::Ready {
                        value: Arc::clone(&value),
                        stamp,
                    },
                );
            }
        } else {
            self.counters.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                target: "beanscope.cache",
                cache = self.name,
                ?key,
                "dependency changed during computation; result not published"
            );
            if ours {
                slots.remove(key);
            }
        }
        drop(slots);
        self.published.notify_all();
        value
    }

    /// The cached value for `key`, only if it is fresh.
    pub fn get_fresh(&self, key: &K, tracker: &ModificationTracker) -> Option<Arc<V>> {
        match self.slots.lock().get(key) {
            Some(Slot::Ready { value, stamp }) if stamp.is_current(tracker) => {
                Some(Arc::clone(value))
            }
            _ => None,
        }
    }

    pub fn entry_state(&self, key: &K, tracker: &ModificationTracker) -> EntryState {
        match self.slots.lock().get(key) {
            None => EntryState::Missing,
            Some(Slot::Computing { .. }) => EntryState::Computing,
            Some(Slot::Ready { stamp, .. }) if stamp.is_current(tracker) => EntryState::Fresh,
            Some(Slot::Ready { .. }) => EntryState::Stale,
        }
    }

    /// Drops published entries that are no longer current. Returns how many
    /// entries were removed.
    pub fn evict_stale(&self, tracker: &ModificationTracker) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|_, slot| match slot {
            Slot::Ready { stamp, .. } => stamp.is_current(tracker),
            Slot::Computing { .. } => true,
        });
        let evicted = before - slots.len();
        if evicted > 0 {
            tracing::debug!(target: "beanscope.cache", cache = self.name, evicted, "evicted stale entries");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            computations: self.counters.computations.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Releases a `Computing` slot if the computation unwinds, so waiters retry.
struct ComputeGuard<'a, K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    cache: &'a VersionedCache<K, V>,
    key: &'a K,
    stamp: &'a Stamp,
    armed: bool,
}

impl<K, V> Drop for ComputeGuard<'_, K, V>
where
    K: Clone + Eq + Hash + fmt::Debug,
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = self.cache.slots.lock();
        if matches!(slots.get(self.key), Some(Slot::Computing { stamp }) if stamp == self.stamp) {
            slots.remove(self.key);
        }
        drop(slots);
        tracing::warn!(
            target: "beanscope.cache",
            cache = self.cache.name,
            key = ?self.key,
            "computation panicked; releasing slot"
        );
        self.cache.published.notify_all();
    }
}
