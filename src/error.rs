//! Error types for transpile-filter

use thiserror::Error;

/// Result type alias for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Boxed error returned by pluggable transforms
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for filter operations
#[derive(Error, Debug)]
pub enum FilterError {
    /// The configuration could not be serialized for cache key derivation.
    /// Fatal to the whole run.
    #[error("Cannot serialize transform options: {0}")]
    ConfigSerialization(String),

    /// Invalid configuration provided (unknown transformer, bad flag combination)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Options file could not be read or parsed
    #[error("Cannot load options file '{path}': {reason}")]
    OptionsFile { path: String, reason: String },

    /// The transform rejected a single file
    #[error("{path}: {message}")]
    Transform {
        path: String,
        message: String,
        #[source]
        source: BoxError,
    },

    /// File could not be opened or read
    #[error("Cannot open file '{path}': {reason}")]
    FileNotFound { path: String, reason: String },

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache error
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

impl FilterError {
    /// Whether this error is scoped to a single file rather than the run
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            FilterError::Transform { .. } | FilterError::FileNotFound { .. }
        )
    }

    /// Relative path of the offending file, for per-file errors
    pub fn path(&self) -> Option<&str> {
        match self {
            FilterError::Transform { path, .. } | FilterError::FileNotFound { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}
