//! In-process result cache with per-key coalescing

use crate::cache::{CacheKey, ResultCache};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One entry; `None` until the first successful computation
type Slot = Arc<Mutex<Option<String>>>;

/// Concurrent map from cache key to transformed output.
///
/// Each key owns a slot with its own lock. The map lock is only held long
/// enough to find or create the slot, so different keys compute in parallel
/// while callers asking for the same key queue up on its slot and pick up
/// the first result instead of recomputing it.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

/// Where a value returned by [`MemoryCache::get_or_try_insert_with`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Served from the cache
    Hit,
    /// Computed by this call
    Computed,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(*key).or_default())
    }

    /// Return the cached value for `key`, computing it with `f` on a miss.
    ///
    /// `f` runs at most once per key as long as it succeeds; a failed
    /// computation is not stored and the next caller tries again.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &CacheKey,
        f: impl FnOnce() -> std::result::Result<String, E>,
    ) -> std::result::Result<(String, Lookup), E> {
        let slot = self.slot(key);
        let mut value = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = value.as_ref() {
            return Ok((cached.clone(), Lookup::Hit));
        }

        let computed = match f() {
            Ok(computed) => computed,
            Err(e) => {
                drop(value);
                self.discard_if_unused(key, &slot);
                return Err(e);
            }
        };
        *value = Some(computed.clone());
        Ok((computed, Lookup::Computed))
    }

    /// Drop an empty slot nobody else is waiting on
    fn discard_if_unused(&self, key: &CacheKey, slot: &Slot) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under the map lock: one in the map, one here
        let unused = slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot))
            && Arc::strong_count(slot) == 2
            && slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_none();
        if unused {
            slots.remove(key);
        }
    }

    /// Number of populated entries
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<String> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(key).cloned()?
        };
        let value = slot.lock().unwrap_or_else(PoisonError::into_inner);
        value.clone()
    }

    fn put(&self, key: &CacheKey, content: &str) -> Result<()> {
        let slot = self.slot(key);
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(content.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
