//! Console (human-readable) exporter

use crate::config::Config;
use crate::core::{BatchResult, ProcessStatus};
use crate::error::{FilterError, Result};
use crate::export::Exporter;
use crate::transform::SyntaxError;
use std::io::Write;

/// Human-readable console output exporter
pub struct ConsoleExporter;

impl Exporter for ConsoleExporter {
    fn export(&self, result: &BatchResult, config: &Config, writer: &mut dyn Write) -> Result<()> {
        for outcome in &result.outcomes {
            match &outcome.result {
                Ok(processed) => {
                    let label = match processed.status {
                        ProcessStatus::Transformed => "transformed",
                        ProcessStatus::CacheHit => "cached",
                        ProcessStatus::PassedThrough => "copied",
                    };
                    if processed.output_path == outcome.relative_path {
                        writeln!(writer, "{:<12}{}", label, outcome.relative_path)?;
                    } else {
                        writeln!(
                            writer,
                            "{:<12}{} -> {}",
                            label, outcome.relative_path, processed.output_path
                        )?;
                    }
                }
                Err(e) => {
                    writeln!(writer, "{:<12}{}", "failed", e)?;
                    // Show the code frame for syntax errors
                    if let FilterError::Transform { source, .. } = e {
                        if let Some(syntax) = source.downcast_ref::<SyntaxError>() {
                            for line in syntax.frame.lines() {
                                writeln!(writer, "    {}", line)?;
                            }
                        }
                    }
                }
            }
        }
        writeln!(writer)?;

        writeln!(writer, "Configuration:")?;
        writeln!(
            writer,
            "  Extensions: {}",
            config.filter.extensions.join(", ")
        )?;
        writeln!(
            writer,
            "  Target extension: {}",
            config.filter.target_extension
        )?;
        writeln!(writer, "  Filter key: {}", result.filter_key)?;
        writeln!(writer)?;

        writeln!(writer, "Summary:")?;
        writeln!(writer, "  Files: {}", result.outcomes.len())?;
        writeln!(writer, "  Transformed: {}", result.transformed)?;
        writeln!(writer, "  Cache hits: {}", result.cache_hits)?;
        writeln!(writer, "  Passed through: {}", result.passed_through)?;
        writeln!(writer, "  Failed: {}", result.failed)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterOptions;
    use crate::core::{process_files, TranspileFilter};
    use crate::transform::EsTranspiler;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_console_export() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.js"), "let a;").unwrap();
        fs::write(temp.path().join("b.js"), "if (a) {").unwrap();

        let mut config = Config::default();
        config.root = temp.path().to_path_buf();
        config.num_threads = 1;
        let mut options = FilterOptions::default();
        options.transform.highlight_code = false;
        let filter = TranspileFilter::new(options, EsTranspiler).unwrap();
        let files = vec!["a.js".to_string(), "b.js".to_string()];
        let result = process_files(&files, &config, &filter, |_| {}).unwrap();

        let mut output = Vec::new();
        ConsoleExporter
            .export(&result, &config, &mut output)
            .unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("transformed a.js"));
        assert!(output_str.contains("failed      b.js: Unclosed `{` (1:8)"));
        assert!(output_str.contains("> 1 | if (a) {"));
        assert!(output_str.contains("Failed: 1"));
    }
}
