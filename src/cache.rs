//! Caller-owned extraction cache with single-flight coalescing
//!
//! The first caller for an uncached key runs the extraction; concurrent callers
//! for the same key block until it finishes and share the result. A leader
//! whose [`CancelToken`] fired before completion does not commit, and the
//! waiters then elect a new leader.

use crate::analysis::{Extraction, ExtractionConfig};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Cache key: md5 of the source identifier and the configuration fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn new(source_id: &str, config: &ExtractionConfig) -> Self {
        let digest = md5::compute(format!("{}\n{}", source_id, config.fingerprint()));
        Self(format!("{:x}", digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Still-wanted flag shared between a consumer and an in-flight extraction
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<SourceKey, Arc<Extraction>>,
    in_flight: HashSet<SourceKey>,
}

/// Memoized extractions keyed by [`SourceKey`]
#[derive(Default)]
pub struct MarkerCache {
    state: Mutex<CacheState>,
    ready: Condvar,
}

impl MarkerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached extraction for `key`, running `compute` at most once across
    /// concurrent callers
    ///
    /// Returns `None` only when `cancel` fired; nothing is committed then.
    pub fn get_or_extract<F>(
        &self,
        key: &SourceKey,
        cancel: &CancelToken,
        compute: F,
    ) -> Option<Arc<Extraction>>
    where
        F: FnOnce() -> Extraction,
    {
        let mut state = self.lock();
        loop {
            if let Some(hit) = state.entries.get(key) {
                log::trace!("Cache hit for {}", key);
                return Some(Arc::clone(hit));
            }
            if cancel.is_cancelled() {
                return None;
            }
            if !state.in_flight.contains(key) {
                break;
            }
            state = self.ready.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        state.in_flight.insert(key.clone());
        drop(state);

        // Released on every exit path, including a panicking `compute`
        let flight = Flight { cache: self, key };

        let extraction = Arc::new(compute());

        if cancel.is_cancelled() {
            log::debug!("Extraction for {} no longer wanted, discarding", key);
            return None;
        }

        flight.commit(Arc::clone(&extraction));
        Some(extraction)
    }

    pub fn get(&self, key: &SourceKey) -> Option<Arc<Extraction>> {
        self.lock().entries.get(key).cloned()
    }

    /// Drop the entry for `key`; returns whether one existed
    pub fn invalidate(&self, key: &SourceKey) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-flight marker for one key; dropping it wakes the waiters
struct Flight<'a> {
    cache: &'a MarkerCache,
    key: &'a SourceKey,
}

impl Flight<'_> {
    fn commit(self, extraction: Arc<Extraction>) {
        self.cache
            .lock()
            .entries
            .insert(self.key.clone(), extraction);
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.cache.lock().in_flight.remove(self.key);
        self.cache.ready.notify_all();
    }
}
