//! Batch processing of a file list through a filter

use crate::cache::CacheKey;
use crate::config::Config;
use crate::core::filter::{ProcessStatus, Processed, TranspileFilter};
use crate::error::{FilterError, Result};
use crate::transform::Transform;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Outcome for a single listed file
#[derive(Debug)]
pub struct FileOutcome {
    /// Path as listed, relative to the root
    pub relative_path: String,
    pub result: Result<Processed>,
}

/// Result of a batch run
#[derive(Debug)]
pub struct BatchResult {
    /// One outcome per listed file, in list order
    pub outcomes: Vec<FileOutcome>,
    /// Run-level key of the filter that produced the outcomes
    pub filter_key: CacheKey,
    /// Files the transform ran on
    pub transformed: usize,
    /// Files served from cache
    pub cache_hits: usize,
    /// Files copied through unchanged
    pub passed_through: usize,
    /// Files that failed
    pub failed: usize,
}

impl BatchResult {
    fn from_outcomes(outcomes: Vec<FileOutcome>, filter_key: CacheKey) -> Self {
        let mut result = Self {
            outcomes: Vec::new(),
            filter_key,
            transformed: 0,
            cache_hits: 0,
            passed_through: 0,
            failed: 0,
        };

        for outcome in &outcomes {
            match &outcome.result {
                Ok(processed) => match processed.status {
                    ProcessStatus::Transformed => result.transformed += 1,
                    ProcessStatus::CacheHit => result.cache_hits += 1,
                    ProcessStatus::PassedThrough => result.passed_through += 1,
                },
                Err(_) => result.failed += 1,
            }
        }

        result.outcomes = outcomes;
        result
    }

    /// Whether any file failed
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Load file list from path (or stdin if "-")
pub fn load_file_list(path: &str) -> Result<Vec<String>> {
    let lines = if path == "-" {
        let stdin = std::io::stdin();
        stdin.lock().lines().collect::<std::io::Result<Vec<_>>>()?
    } else {
        let file = File::open(path).map_err(|e| FilterError::FileNotFound {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?
    };

    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Read, process and optionally write one file
fn process_one<T: Transform>(
    relative_path: &str,
    root: &Path,
    out_dir: Option<&Path>,
    filter: &TranspileFilter<T>,
) -> Result<Processed> {
    let source_path = root.join(relative_path);
    let content = fs::read_to_string(&source_path).map_err(|e| FilterError::FileNotFound {
        path: relative_path.to_string(),
        reason: e.to_string(),
    })?;

    let processed = filter.process(relative_path, &content)?;

    if let Some(out_dir) = out_dir {
        let target = out_dir.join(&processed.output_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &processed.content)?;
    }

    Ok(processed)
}

/// Process every file in `file_list` through `filter`.
///
/// Per-file failures are recorded in the result and never stop the other
/// files. Only failing to set up the thread pool is an error here.
pub fn process_files<T: Transform>(
    file_list: &[String],
    config: &Config,
    filter: &TranspileFilter<T>,
    progress: impl Fn(&str) + Send + Sync,
) -> Result<BatchResult> {
    progress(&format!("Processing {} files...", file_list.len()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build()
        .map_err(|e| FilterError::Other(format!("Failed to create thread pool: {}", e)))?;

    let out_dir = config.out_dir.as_deref();
    let outcomes: Vec<FileOutcome> = pool.install(|| {
        file_list
            .par_iter()
            .map(|relative_path| {
                let result = process_one(relative_path, &config.root, out_dir, filter);
                if let Err(e) = &result {
                    progress(&format!("Error: {}", e));
                }
                FileOutcome {
                    relative_path: relative_path.clone(),
                    result,
                }
            })
            .collect()
    });

    let result = BatchResult::from_outcomes(outcomes, filter.cache_key());
    progress(&format!(
        "Cache: {} hits, {} misses",
        result.cache_hits, result.transformed
    ));

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterOptions;
    use crate::transform::EsTranspiler;
    use std::io::Write;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> Config {
        Config {
            root: root.to_path_buf(),
            num_threads: 2,
            ..Config::default()
        }
    }

    #[test]
    fn test_load_file_list_skips_blank_lines() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        writeln!(list, "a.js").unwrap();
        writeln!(list, "   ").unwrap();
        writeln!(list, "  lib/b.js  ").unwrap();

        let files = load_file_list(list.path().to_str().unwrap()).unwrap();
        assert_eq!(files, vec!["a.js".to_string(), "lib/b.js".to_string()]);
    }

    #[test]
    fn test_load_missing_file_list() {
        let result = load_file_list("/nonexistent/list.txt");
        assert!(matches!(result, Err(FilterError::FileNotFound { .. })));
    }

    #[test]
    fn test_failure_does_not_stop_siblings() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("good.js"), "const x = 1;").unwrap();
        fs::write(temp.path().join("bad.js"), "function f() {").unwrap();
        fs::write(temp.path().join("notes.txt"), "plain").unwrap();

        let config = config_for(temp.path());
        let filter = TranspileFilter::new(FilterOptions::default(), EsTranspiler).unwrap();
        let files: Vec<String> = ["good.js", "bad.js", "notes.txt", "missing.js"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let result = process_files(&files, &config, &filter, |_| {}).unwrap();

        assert_eq!(result.outcomes.len(), 4);
        assert_eq!(result.transformed, 1);
        assert_eq!(result.passed_through, 1);
        assert_eq!(result.failed, 2);
        assert!(result.has_failures());

        let bad = &result.outcomes[1];
        assert_eq!(bad.relative_path, "bad.js");
        let err = bad.result.as_ref().unwrap_err();
        assert_eq!(err.path(), Some("bad.js"));
    }

    #[test]
    fn test_outputs_written_with_renamed_extension() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("out");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("lib/a.es6"), "let a = 1;").unwrap();
        fs::write(src.join("README.txt"), "docs").unwrap();

        let mut config = config_for(&src);
        config.out_dir = Some(out.clone());
        let options = FilterOptions {
            extensions: vec!["es6".to_string()],
            ..FilterOptions::default()
        };
        let filter = TranspileFilter::new(options, EsTranspiler).unwrap();
        let files = vec!["lib/a.es6".to_string(), "README.txt".to_string()];

        let result = process_files(&files, &config, &filter, |_| {}).unwrap();
        assert!(!result.has_failures());

        assert_eq!(
            fs::read_to_string(out.join("lib/a.js")).unwrap(),
            "\"use strict\";\nvar a = 1;\n"
        );
        assert_eq!(fs::read_to_string(out.join("README.txt")).unwrap(), "docs");
        assert!(!out.join("lib/a.es6").exists());
    }

    #[test]
    fn test_second_pass_hits_cache() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "let a;").unwrap();
        fs::write(temp.path().join("b.js"), "let b;").unwrap();

        let config = config_for(temp.path());
        let filter = TranspileFilter::new(FilterOptions::default(), EsTranspiler).unwrap();
        let files = vec!["a.js".to_string(), "b.js".to_string()];

        let first = process_files(&files, &config, &filter, |_| {}).unwrap();
        let second = process_files(&files, &config, &filter, |_| {}).unwrap();

        assert_eq!(first.transformed, 2);
        assert_eq!(second.cache_hits, 2);
        assert_eq!(second.transformed, 0);
    }
}
