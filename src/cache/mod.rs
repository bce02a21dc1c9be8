//! Result caching for transformed files
//!
//! Outputs are cached under a content-addressed key derived from the
//! transform identity, the per-file options and the file content. Entries
//! are written once and never updated: a changed input produces a new key.

mod key;
mod memory;
mod storage;

use crate::error::Result;

pub use key::{filter_cache_key, CacheKey, CacheKeyDeriver};
pub use memory::{Lookup, MemoryCache};
pub use storage::{clear_cache, DiskCache};

/// Key-value store of transformed outputs
pub trait ResultCache: Send + Sync {
    /// Previously stored output for `key`
    fn get(&self, key: &CacheKey) -> Option<String>;

    /// Store `content` under `key`
    fn put(&self, key: &CacheKey, content: &str) -> Result<()>;

    /// Drop every entry
    fn clear(&self) -> Result<()>;
}
