//! Configuration types for transpile-filter

use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Output format for the batch report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable console output
    #[default]
    Console,
    /// JSON output with structured data
    Json,
}

/// Options handed to the transform.
///
/// This is the value that gets serialized into every cache key, so it has
/// to serialize deterministically: fields keep declaration order, the
/// transformer lists are sorted sets and extra options live in a sorted map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// When non-empty, only these transformers may run
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub whitelist: BTreeSet<String>,

    /// Transformers that must not run
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub blacklist: BTreeSet<String>,

    /// Opt-in transformers that are off by default
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub optional: BTreeSet<String>,

    /// Accept non-standard syntax such as decorators
    pub non_standard: bool,

    /// Colorize code frames in syntax errors
    pub highlight_code: bool,

    /// Keep comments in the output
    pub comments: bool,

    /// Append a `//# sourceURL=` trailer naming the source file
    pub source_url: bool,

    /// Path of the file being transformed; set per call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Source map name; set per call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map_name: Option<String>,

    /// Source file name; set per call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file_name: Option<String>,

    /// Transform-specific options not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            whitelist: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            optional: BTreeSet::new(),
            non_standard: true,
            highlight_code: true,
            comments: true,
            source_url: false,
            filename: None,
            source_map_name: None,
            source_file_name: None,
            extra: BTreeMap::new(),
        }
    }
}

impl TransformOptions {
    /// Load options from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FilterError::OptionsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| FilterError::OptionsFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Per-call view with the path-derived fields pointing at `relative_path`.
    /// The receiver is left untouched.
    pub fn for_file(&self, relative_path: &str) -> Self {
        let mut options = self.clone();
        options.filename = Some(relative_path.to_string());
        options.source_map_name = Some(relative_path.to_string());
        options.source_file_name = Some(relative_path.to_string());
        options
    }

    /// Deterministic JSON rendering used for cache keys
    pub fn to_canonical_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| FilterError::ConfigSerialization(e.to_string()))
    }
}

/// Options for a single filter instance
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOptions {
    /// Extensions eligible for transformation (without leading dot)
    pub extensions: Vec<String>,

    /// Extension given to transformed files
    pub target_extension: String,

    /// Options passed through to the transform
    pub transform: TransformOptions,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            extensions: vec![String::from("js")],
            target_extension: String::from("js"),
            transform: TransformOptions::default(),
        }
    }
}

/// Configuration for a batch run
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to input file list (or "-" for stdin)
    pub list_filename: String,

    /// Directory the listed relative paths are resolved against
    pub root: PathBuf,

    /// Directory transformed files are written to (none = report only)
    pub out_dir: Option<PathBuf>,

    /// Number of threads for parallel processing (default: num_cpus)
    pub num_threads: usize,

    /// Report format (console or json)
    pub output_format: OutputFormat,

    /// Enable verbose logging
    pub verbose: bool,

    // === Persistent Cache ===
    /// Enable the on-disk result cache
    pub cache_enabled: bool,

    /// Cache directory (default: .transpile-cache)
    pub cache_dir: Option<PathBuf>,

    /// Clear the cache before running
    pub clear_cache: bool,

    // === Filter ===
    /// Filter and transform options
    pub filter: FilterOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            list_filename: String::from("-"),
            root: PathBuf::from("."),
            out_dir: None,
            num_threads: num_cpus::get(),
            output_format: OutputFormat::Console,
            verbose: false,
            cache_enabled: false,
            cache_dir: None,
            clear_cache: false,
            filter: FilterOptions::default(),
        }
    }
}

impl Config {
    /// Cache directory, falling back to the default location
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".transpile-cache"))
    }
}
