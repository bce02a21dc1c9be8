//! On-disk cache storage

use crate::cache::{CacheKey, ResultCache};
use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Current cache format version
const CACHE_VERSION: u32 = 1;

/// Cache entry for a single transformed file
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Cache format version
    version: u32,
    /// Key the entry was stored under
    key: CacheKey,
    /// Transformed output
    output: String,
}

/// Persistent result cache, one JSON file per key
#[derive(Debug, Clone)]
pub struct DiskCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Open (and create if needed) a cache in `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();

        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| {
                FilterError::CacheError(format!(
                    "Failed to create cache directory '{}': {}",
                    cache_dir.display(),
                    e
                ))
            })?;
        }

        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.cache", key))
    }
}

impl ResultCache for DiskCache {
    /// Returns None if the entry is missing, unreadable or from another format version
    fn get(&self, key: &CacheKey) -> Option<String> {
        let cache_path = self.cache_path(key);

        if !cache_path.exists() {
            return None;
        }

        let file = File::open(&cache_path).ok()?;
        let reader = BufReader::new(file);
        let entry: CacheEntry = match serde_json::from_reader(reader) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(
                    path = %cache_path.display(),
                    error = %e,
                    "ignoring corrupt cache entry"
                );
                return None;
            }
        };

        if entry.version != CACHE_VERSION || entry.key != *key {
            return None;
        }

        Some(entry.output)
    }

    fn put(&self, key: &CacheKey, content: &str) -> Result<()> {
        let cache_path = self.cache_path(key);

        let entry = CacheEntry {
            version: CACHE_VERSION,
            key: *key,
            output: content.to_string(),
        };

        let file = File::create(&cache_path).map_err(|e| {
            FilterError::CacheError(format!(
                "Failed to create cache file '{}': {}",
                cache_path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &entry)
            .map_err(|e| FilterError::CacheError(format!("Failed to write cache entry: {}", e)))?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        clear_cache(&self.cache_dir)
    }
}

/// Remove every cache file in `cache_dir`
pub fn clear_cache(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(cache_dir).map_err(|e| {
        FilterError::CacheError(format!(
            "Failed to read cache directory '{}': {}",
            cache_dir.display(),
            e
        ))
    })? {
        let entry = entry
            .map_err(|e| FilterError::CacheError(format!("Failed to read cache entry: {}", e)))?;

        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "cache") {
            fs::remove_file(&path).map_err(|e| {
                FilterError::CacheError(format!(
                    "Failed to remove cache file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
    }

    Ok(())
}
