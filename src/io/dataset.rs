use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::ScrapeError;
use crate::models::Dataset;
use crate::stages::validate::{TranscriptValidator, ValidationReport};

/// Read a dataset file as raw JSON, for validation and re-ingestion
pub fn read_json_file(path: &Path) -> Result<Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in {:?}", path))
}

/// Write any serializable document as pretty JSON, creating parent directories
pub fn write_json_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, value).context("Failed to write JSON")?;
    Ok(())
}

/// Validate a dataset and write it only if it has no errors.
///
/// Warnings are logged and do not block the write.
pub fn save_dataset(
    dataset: &Dataset,
    path: &Path,
    validator: &TranscriptValidator,
) -> Result<ValidationReport> {
    let value = serde_json::to_value(dataset).context("Failed to serialize dataset")?;
    let report = validator.validate(&value);

    for warning in &report.warnings {
        warn!("Warning: {}", warning);
    }
    if !report.is_valid {
        error!("Data validation failed:");
        for e in &report.errors {
            error!("Error: {}", e);
        }
        return Err(ScrapeError::Validation(report.errors).into());
    }

    write_json_file(&value, path)?;
    info!(
        "Saved {} episodes ({} lines) to {:?}",
        dataset.metadata.total_episodes, dataset.metadata.total_dialogue_lines, path
    );
    Ok(report)
}
