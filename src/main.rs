//! transpile-filter - Incremental JavaScript transpile filter
//!
//! Runs a list of files through the built-in ES transpiler, serving
//! unchanged inputs from a content-addressed result cache.

use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use transpile_filter::cache::{clear_cache, DiskCache};
use transpile_filter::cli::Cli;
use transpile_filter::core::{load_file_list, process_files, TranspileFilter};
use transpile_filter::export::{create_exporter, get_output_writer};
use transpile_filter::transform::EsTranspiler;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Convert to config
    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    // Progress callback for logging
    let progress = |msg: &str| {
        tracing::info!("{}", msg);
    };

    // === Phase 0: Handle --clear-cache ===
    if config.clear_cache {
        progress("Clearing cache...");
        if let Err(e) = clear_cache(&config.effective_cache_dir()) {
            tracing::warn!("Failed to clear cache: {}", e);
        }
    }

    // === Phase 1: Build the filter ===
    let filter = match TranspileFilter::new(config.filter.clone(), EsTranspiler::new()) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let filter = if config.cache_enabled {
        match DiskCache::new(config.effective_cache_dir()) {
            Ok(disk) => {
                progress(&format!("Caching enabled in '{}'", disk.dir().display()));
                filter.with_disk_cache(disk)
            }
            Err(e) => {
                tracing::warn!("Failed to initialize cache: {}", e);
                filter
            }
        }
    } else {
        filter
    };

    // === Phase 2: Load File List ===
    let file_list = match load_file_list(&config.list_filename) {
        Ok(files) => files,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    // === Phase 3: Process Files ===
    let result = match process_files(&file_list, &config, &filter, progress) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    // === Phase 4: Report ===
    let exporter = create_exporter(config.output_format);
    let mut writer = get_output_writer();

    if let Err(e) = exporter.export(&result, &config, &mut *writer) {
        tracing::error!("Error writing output: {}", e);
        return ExitCode::from(2);
    }

    if let Err(e) = writer.flush() {
        tracing::error!("Error flushing output: {}", e);
        return ExitCode::from(2);
    }

    // === Phase 5: Exit Code ===
    if result.has_failures() {
        ExitCode::from(1) // Some files failed to transform
    } else {
        ExitCode::SUCCESS
    }
}
