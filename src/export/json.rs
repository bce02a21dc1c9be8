//! JSON exporter

use crate::config::Config;
use crate::core::{BatchResult, ProcessStatus};
use crate::error::{FilterError, Result};
use crate::export::Exporter;
use crate::transform::SyntaxError;
use serde::Serialize;
use std::io::Write;

/// JSON output exporter
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonOutput {
    filter_key: String,
    files: Vec<JsonFile>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFile {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<ProcessStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonError>,
}

#[derive(Serialize)]
struct JsonError {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

#[derive(Serialize)]
struct JsonSummary {
    files: usize,
    transformed: usize,
    cache_hits: usize,
    passed_through: usize,
    failed: usize,
}

fn json_error(err: &FilterError) -> JsonError {
    let syntax = match err {
        FilterError::Transform { source, .. } => source.downcast_ref::<SyntaxError>(),
        _ => None,
    };

    JsonError {
        message: err.to_string(),
        line: syntax.map(|s| s.line),
        column: syntax.map(|s| s.column),
    }
}

impl Exporter for JsonExporter {
    fn export(&self, result: &BatchResult, _config: &Config, writer: &mut dyn Write) -> Result<()> {
        let files: Vec<JsonFile> = result
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(processed) => JsonFile {
                    path: outcome.relative_path.clone(),
                    output_path: Some(processed.output_path.clone()),
                    status: Some(processed.status),
                    key: processed.key.map(|k| k.to_hex()),
                    error: None,
                },
                Err(e) => JsonFile {
                    path: outcome.relative_path.clone(),
                    output_path: None,
                    status: None,
                    key: None,
                    error: Some(json_error(e)),
                },
            })
            .collect();

        let output = JsonOutput {
            filter_key: result.filter_key.to_hex(),
            files,
            summary: JsonSummary {
                files: result.outcomes.len(),
                transformed: result.transformed,
                cache_hits: result.cache_hits,
                passed_through: result.passed_through,
                failed: result.failed,
            },
        };

        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| FilterError::Other(e.to_string()))?;
        writeln!(writer, "{}", json)?;

        Ok(())
    }
}
