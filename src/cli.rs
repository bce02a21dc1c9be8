//! CLI argument parsing using clap

use crate::config::{Config, FilterOptions, OutputFormat, TransformOptions};
use crate::error::{FilterError, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Incremental JavaScript transpile filter
#[derive(Parser, Debug)]
#[command(name = "transpile-filter")]
#[command(version)]
#[command(about = "Transpile JavaScript files with a content-addressed result cache", long_about = None)]
pub struct Cli {
    /// Input file containing relative paths of the files to process (one per line).
    /// Use "-" to read from stdin
    #[arg(value_name = "FILE_LIST")]
    pub file_list: String,

    /// Directory the listed paths are relative to
    #[arg(short = 'r', long = "root", value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Directory to write outputs to (omit to only report)
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// JSON file with transform options
    #[arg(long = "options", value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Extension eligible for transformation (repeatable)
    #[arg(short = 'e', long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Extension given to transformed files
    #[arg(long = "target-extension", value_name = "EXT", default_value = "js")]
    pub target_extension: String,

    /// Only run these transformers (comma separated)
    #[arg(long = "whitelist", value_name = "NAMES", value_delimiter = ',')]
    pub whitelist: Vec<String>,

    /// Never run these transformers (comma separated)
    #[arg(long = "blacklist", value_name = "NAMES", value_delimiter = ',')]
    pub blacklist: Vec<String>,

    /// Enable these optional transformers (comma separated)
    #[arg(long = "optional", value_name = "NAMES", value_delimiter = ',')]
    pub optional: Vec<String>,

    /// Accept non-standard syntax such as decorators
    #[arg(long = "non-standard", value_name = "BOOL", action = ArgAction::Set)]
    pub non_standard: Option<bool>,

    /// Colorize code frames in syntax errors
    #[arg(long = "highlight-code", value_name = "BOOL", action = ArgAction::Set)]
    pub highlight_code: Option<bool>,

    /// Strip comments from the output
    #[arg(long = "no-comments")]
    pub no_comments: bool,

    /// Append a sourceURL comment to every output
    #[arg(long = "source-url")]
    pub source_url: bool,

    /// Number of threads for parallel processing
    #[arg(short = 'j', long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Enable the persistent result cache
    #[arg(long = "cache")]
    pub cache: bool,

    /// Cache directory (default: .transpile-cache)
    #[arg(long = "cache-dir", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Clear the cache before running
    #[arg(long = "clear-cache")]
    pub clear_cache: bool,

    /// Output the report in JSON format
    #[arg(long = "json")]
    pub json: bool,

    /// Log cache lookups and per-file decisions
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments into a Config.
    ///
    /// Flags are layered over the options file, which is layered over the
    /// defaults.
    pub fn into_config(self) -> Result<Config> {
        if self.threads == Some(0) {
            return Err(FilterError::InvalidConfig(
                "--threads must be at least 1".to_string(),
            ));
        }

        let mut transform = match &self.options {
            Some(path) => TransformOptions::from_file(path)?,
            None => TransformOptions::default(),
        };
        transform.whitelist.extend(self.whitelist);
        transform.blacklist.extend(self.blacklist);
        transform.optional.extend(self.optional);
        if let Some(non_standard) = self.non_standard {
            transform.non_standard = non_standard;
        }
        if let Some(highlight_code) = self.highlight_code {
            transform.highlight_code = highlight_code;
        }
        if self.no_comments {
            transform.comments = false;
        }
        if self.source_url {
            transform.source_url = true;
        }

        let extensions = if self.extensions.is_empty() {
            FilterOptions::default().extensions
        } else {
            self.extensions
        };

        let output_format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Console
        };

        Ok(Config {
            list_filename: self.file_list,
            root: self.root,
            out_dir: self.out_dir,
            num_threads: self.threads.unwrap_or_else(num_cpus::get),
            output_format,
            verbose: self.verbose,
            cache_enabled: self.cache || self.cache_dir.is_some(),
            cache_dir: self.cache_dir,
            clear_cache: self.clear_cache,
            filter: FilterOptions {
                extensions,
                target_extension: self.target_extension,
                transform,
            },
        })
    }
}
