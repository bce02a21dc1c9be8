//! Per-file cache-and-transform filter

use crate::cache::{
    filter_cache_key, CacheKey, CacheKeyDeriver, DiskCache, Lookup, MemoryCache, ResultCache,
};
use crate::config::{FilterOptions, TransformOptions};
use crate::core::invoker::invoke;
use crate::core::selection::ExtensionPolicy;
use crate::error::{FilterError, Result};
use crate::transform::Transform;

/// How the output of one file was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Extension not selected; content copied unchanged
    PassedThrough,
    /// Served from the in-process or on-disk cache
    CacheHit,
    /// The transform ran
    Transformed,
}

/// Result of running one file through the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Path the output belongs at (extension possibly renamed)
    pub output_path: String,
    /// Output text
    pub content: String,
    pub status: ProcessStatus,
    /// Cache key of the output; `None` for passed-through files
    pub key: Option<CacheKey>,
}

/// Caches and transforms files one at a time.
///
/// The filter owns its options from construction on, so nothing the caller
/// does afterwards can change what it produces. The transform is injected;
/// any [`Transform`] works.
pub struct TranspileFilter<T: Transform> {
    transform: T,
    options: TransformOptions,
    policy: ExtensionPolicy,
    deriver: CacheKeyDeriver,
    memory: MemoryCache,
    disk: Option<DiskCache>,
}

impl<T: Transform> TranspileFilter<T> {
    /// Build a filter. Fails if the options cannot be serialized or the
    /// transform rejects them; both are fatal for the run.
    pub fn new(options: FilterOptions, transform: T) -> Result<Self> {
        let FilterOptions {
            extensions,
            target_extension,
            transform: transform_options,
        } = options;

        transform
            .validate(&transform_options)
            .map_err(FilterError::InvalidConfig)?;
        let deriver = CacheKeyDeriver::new(&transform_options, &transform)?;

        Ok(Self {
            policy: ExtensionPolicy::new(&extensions, &target_extension),
            options: transform_options,
            deriver,
            transform,
            memory: MemoryCache::new(),
            disk: None,
        })
    }

    /// Back the in-process cache with a persistent store
    pub fn with_disk_cache(mut self, disk: DiskCache) -> Self {
        self.disk = Some(disk);
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn policy(&self) -> &ExtensionPolicy {
        &self.policy
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    /// Run-level key naming this filter's implementation and transform
    pub fn cache_key(&self) -> CacheKey {
        filter_cache_key(&self.transform)
    }

    /// Cache key for one file's content
    pub fn cache_key_for(&self, relative_path: &str, content: &str) -> Result<CacheKey> {
        self.deriver.key_for(relative_path, content)
    }

    /// Whether `relative_path` goes through the transform
    pub fn can_process(&self, relative_path: &str) -> bool {
        self.policy.can_process(relative_path)
    }

    /// Process the content of one file.
    ///
    /// Files whose extension is not selected come back unchanged without
    /// touching the cache or the transform. Everything else is served from
    /// the cache when possible and transformed otherwise.
    pub fn process(&self, relative_path: &str, content: &str) -> Result<Processed> {
        if !self.can_process(relative_path) {
            tracing::trace!(path = relative_path, "passing through");
            return Ok(Processed {
                output_path: relative_path.to_string(),
                content: content.to_string(),
                status: ProcessStatus::PassedThrough,
                key: None,
            });
        }

        let key = self.cache_key_for(relative_path, content)?;
        let mut from_disk = false;

        let (output, lookup) = self.memory.get_or_try_insert_with(&key, || {
            if let Some(cached) = self.disk.as_ref().and_then(|disk| disk.get(&key)) {
                from_disk = true;
                return Ok(cached);
            }

            let output = invoke(&self.transform, &self.options, relative_path, content)?;
            if let Some(disk) = &self.disk {
                if let Err(e) = disk.put(&key, &output) {
                    tracing::warn!(
                        path = relative_path,
                        error = %e,
                        "failed to persist cache entry"
                    );
                }
            }
            Ok::<_, FilterError>(output)
        })?;

        let status = if lookup == Lookup::Hit || from_disk {
            ProcessStatus::CacheHit
        } else {
            ProcessStatus::Transformed
        };
        tracing::debug!(path = relative_path, key = %key, ?status, "processed");

        Ok(Processed {
            output_path: self.policy.output_path(relative_path),
            content: output,
            status,
            key: Some(key),
        })
    }

    /// Drop all cached outputs, in memory and on disk
    pub fn clear_cache(&self) -> Result<()> {
        self.memory.clear()?;
        if let Some(disk) = &self.disk {
            disk.clear()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::transform::{EsTranspiler, FnTransform};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    type CountingFn =
        Box<dyn Fn(&str, &TransformOptions) -> std::result::Result<String, BoxError> + Send + Sync>;

    fn counting_filter(
        options: FilterOptions,
    ) -> (TranspileFilter<FnTransform<CountingFn>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let f: CountingFn = Box::new(move |content: &str, _: &TransformOptions| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(content.to_uppercase())
        });
        let filter = TranspileFilter::new(options, FnTransform::new("upper", "1", f)).unwrap();
        (filter, calls)
    }

    #[test]
    fn test_cache_hit_skips_transform() {
        let (filter, calls) = counting_filter(FilterOptions::default());

        let first = filter.process("a.js", "abc").unwrap();
        let second = filter.process("a.js", "abc").unwrap();

        assert_eq!(first.content, "ABC");
        assert_eq!(first.status, ProcessStatus::Transformed);
        assert_eq!(second.content, "ABC");
        assert_eq!(second.status, ProcessStatus::CacheHit);
        assert_eq!(first.key, second.key);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unselected_extension_bypasses_transform() {
        let (filter, calls) = counting_filter(FilterOptions::default());

        let processed = filter.process("notes.txt", "keep me").unwrap();

        assert_eq!(processed.content, "keep me");
        assert_eq!(processed.output_path, "notes.txt");
        assert_eq!(processed.status, ProcessStatus::PassedThrough);
        assert_eq!(processed.key, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_output_extension_renamed() {
        let options = FilterOptions {
            extensions: vec!["es6".to_string()],
            ..FilterOptions::default()
        };
        let (filter, _) = counting_filter(options);

        let processed = filter.process("lib/a.es6", "x").unwrap();
        assert_eq!(processed.output_path, "lib/a.js");
    }

    #[test]
    fn test_disk_cache_serves_new_instance() {
        let temp = TempDir::new().unwrap();

        let (filter1, calls1) = counting_filter(FilterOptions::default());
        let filter1 = filter1.with_disk_cache(DiskCache::new(temp.path()).unwrap());
        filter1.process("a.js", "abc").unwrap();
        assert_eq!(calls1.load(Ordering::SeqCst), 1);

        let (filter2, calls2) = counting_filter(FilterOptions::default());
        let filter2 = filter2.with_disk_cache(DiskCache::new(temp.path()).unwrap());
        let processed = filter2.process("a.js", "abc").unwrap();

        assert_eq!(processed.content, "ABC");
        assert_eq!(processed.status, ProcessStatus::CacheHit);
        assert_eq!(calls2.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_clear_cache_forces_recompute() {
        let (filter, calls) = counting_filter(FilterOptions::default());
        filter.process("a.js", "abc").unwrap();
        filter.clear_cache().unwrap();
        filter.process("a.js", "abc").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_transformer_is_fatal() {
        let mut options = FilterOptions::default();
        options.transform.whitelist.insert("es6.classes".to_string());

        let result = TranspileFilter::new(options, EsTranspiler);
        assert!(matches!(result, Err(FilterError::InvalidConfig(_))));
    }

    #[test]
    fn test_options_snapshot_isolated_from_caller() {
        let mut options = FilterOptions::default();
        let filter = TranspileFilter::new(options.clone(), EsTranspiler).unwrap();
        let before = filter.process("a.js", "let a = 1;").unwrap();

        options.transform.blacklist.insert("strict".to_string());
        let after = filter.process("a.js", "let a = 1;").unwrap();

        assert_eq!(before.content, after.content);
        assert!(after.content.starts_with("\"use strict\";"));
    }
}
