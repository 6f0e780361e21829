// src/cache.rs
//! In-memory TTL cache with FIFO eviction and single-flight fill.
//!
//! Each key maps to a slot holding a `tokio::sync::OnceCell`. The first caller
//! for a key creates the slot and runs the supplier; concurrent callers for the
//! same key await the same cell, so the supplier runs once per slot lifetime.
//! TTL is absolute (no sliding refresh on hits).

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell as SyncOnceCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

fn ensure_metrics_described() {
    static ONCE: SyncOnceCell<()> = SyncOnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("result_cache_hits_total", "Result cache lookups served from a live slot.");
        describe_counter!("result_cache_misses_total", "Result cache lookups that ran the supplier.");
    });
}

struct Slot<V> {
    cell: Arc<OnceCell<V>>,
    inserted_at: Instant,
}

impl<V> Slot<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

struct Inner<K, V> {
    slots: HashMap<K, Slot<V>>,
    order: VecDeque<K>,
}

pub struct ResultCache<K, V> {
    ttl: Duration,
    max_entries: usize,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// `max_entries` is at least 1.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        ensure_metrics_described();
        Self {
            ttl,
            max_entries: max_entries.max(1),
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Live (unexpired) entries, in-flight ones included.
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        self.purge_expired(&mut inner);
        inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.slots.clear();
        inner.order.clear();
    }

    /// Completed value for `key`, if live. Never runs a supplier.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        self.purge_expired(&mut inner);
        inner.slots.get(key).and_then(|s| s.cell.get().cloned())
    }

    /// Return the cached value for `key`, or run `supplier` to produce it.
    pub async fn get_or_compute<F, Fut>(&self, key: K, supplier: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let (cell, created) = self.slot_for(key);
        if created {
            counter!("result_cache_misses_total").increment(1);
            tracing::debug!(target: "cache", "miss");
        } else {
            counter!("result_cache_hits_total").increment(1);
            tracing::debug!(target: "cache", "hit");
        }
        cell.get_or_init(supplier).await.clone()
    }

    /// Live slot for `key`, creating one (and evicting oldest) when missing.
    fn slot_for(&self, key: K) -> (Arc<OnceCell<V>>, bool) {
        let mut inner = self.lock();
        self.purge_expired(&mut inner);

        if let Some(slot) = inner.slots.get(&key) {
            return (Arc::clone(&slot.cell), false);
        }

        let cell = Arc::new(OnceCell::new());
        inner.slots.insert(
            key.clone(),
            Slot {
                cell: Arc::clone(&cell),
                inserted_at: Instant::now(),
            },
        );
        inner.order.push_back(key);

        while inner.slots.len() > self.max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.slots.remove(&oldest);
            tracing::debug!(target: "cache", "evicted oldest entry");
        }
        (cell, true)
    }

    fn purge_expired(&self, inner: &mut Inner<K, V>) {
        let ttl = self.ttl;
        let before = inner.slots.len();
        inner.slots.retain(|_, s| !s.is_expired(ttl));
        if inner.slots.len() != before {
            let Inner { slots, order } = inner;
            order.retain(|k| slots.contains_key(k));
        }
    }
}
