//! transpile-filter - incremental per-file JavaScript transpilation
//!
//! A filter runs each file through a pluggable [`transform::Transform`]
//! and caches the output under an MD5 key of the transform identity, the
//! per-file options and the file content. Files whose extension is not
//! selected pass through untouched.
//!
//! ```no_run
//! use transpile_filter::config::FilterOptions;
//! use transpile_filter::core::TranspileFilter;
//! use transpile_filter::transform::EsTranspiler;
//!
//! let filter = TranspileFilter::new(FilterOptions::default(), EsTranspiler)?;
//! let processed = filter.process("lib/a.js", "const x = 1;")?;
//! assert_eq!(processed.content, "\"use strict\";\nvar x = 1;\n");
//! # Ok::<(), transpile_filter::error::FilterError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod transform;

pub use crate::config::{Config, FilterOptions, TransformOptions};
pub use crate::core::{ProcessStatus, Processed, TranspileFilter};
pub use crate::error::{FilterError, Result};
