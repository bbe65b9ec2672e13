//! CSV export of surviving evidence rows.
//!
//! The column set is configurable; [`DEFAULT_CSV_FIELDS`] lists every known
//! column in default order. Run metadata (model ids, pipeline version,
//! timestamp) is stamped onto every row rather than written as a sidecar, so
//! each exported file is self-describing.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ExportError;

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::info;

use crate::constants::PIPELINE_VERSION;

/// Every exportable column, in default output order.
pub const DEFAULT_CSV_FIELDS: [&str; 19] = [
    "criterion_id",
    "criterion_label",
    "subcriterion_id",
    "subcriterion_label",
    "doc_id",
    "source_path",
    "page",
    "char_start",
    "char_end",
    "excerpt",
    "retrieval_method",
    "score",
    "ce_score",
    "verified",
    "verify_note",
    "model_embed",
    "model_generate",
    "pipeline_version",
    "run_timestamp",
];

/// One surviving excerpt for one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRow {
    pub criterion_id: String,
    pub criterion_label: String,
    pub subcriterion_id: String,
    pub subcriterion_label: String,
    pub doc_id: String,
    pub source_path: String,
    pub page: u32,
    pub char_start: usize,
    pub char_end: usize,
    pub excerpt: String,
    pub retrieval_method: String,
    pub score: f32,
    pub ce_score: f32,
    /// Set only when the verification pass ran for this row.
    pub verified: Option<bool>,
    /// Raw verifier response, truncated. Set only alongside `verified`.
    pub verify_note: Option<String>,
}

/// Run-level metadata stamped onto every exported row.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMeta {
    pub embed_model: String,
    pub gen_model: String,
    pub pipeline_version: String,
    /// UTC, second precision, RFC 3339.
    pub run_timestamp: String,
}

impl RunMeta {
    /// Captures metadata for the current run at the current instant.
    pub fn new(embed_model: &str, gen_model: &str) -> Self {
        Self {
            embed_model: embed_model.to_string(),
            gen_model: gen_model.to_string(),
            pipeline_version: PIPELINE_VERSION.to_string(),
            run_timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }
}

/// Returns the default column list as owned strings.
pub fn default_fields() -> Vec<String> {
    DEFAULT_CSV_FIELDS.iter().map(|f| f.to_string()).collect()
}

/// Checks every configured field name against [`DEFAULT_CSV_FIELDS`].
///
/// Callers that configure the column list should validate before starting
/// retrieval work, not at write time.
pub fn validate_fields(fields: &[String]) -> Result<(), ExportError> {
    match fields
        .iter()
        .find(|f| !DEFAULT_CSV_FIELDS.contains(&f.as_str()))
    {
        Some(unknown) => Err(ExportError::UnknownField {
            field: unknown.clone(),
        }),
        None => Ok(()),
    }
}

/// Writes `rows` to `path` as CSV with the given column list.
///
/// Parent directories are created as needed. Field names are validated
/// against [`DEFAULT_CSV_FIELDS`] before anything is written.
pub fn write_rows(
    path: &Path,
    rows: &[EvidenceRow],
    fields: &[String],
    meta: &RunMeta,
) -> Result<(), ExportError> {
    validate_fields(fields)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| write_failed(path, e))?;
        }
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| write_failed(path, e))?;
    writer
        .write_record(fields)
        .map_err(|e| write_failed(path, e))?;

    for row in rows {
        let record: Vec<String> = fields
            .iter()
            .map(|f| field_value(row, meta, f).unwrap_or_default())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| write_failed(path, e))?;
    }

    writer.flush().map_err(|e| write_failed(path, e))?;
    info!(rows = rows.len(), path = %path.display(), "Wrote evidence CSV");
    Ok(())
}

fn field_value(row: &EvidenceRow, meta: &RunMeta, field: &str) -> Option<String> {
    let value = match field {
        "criterion_id" => row.criterion_id.clone(),
        "criterion_label" => row.criterion_label.clone(),
        "subcriterion_id" => row.subcriterion_id.clone(),
        "subcriterion_label" => row.subcriterion_label.clone(),
        "doc_id" => row.doc_id.clone(),
        "source_path" => row.source_path.clone(),
        "page" => row.page.to_string(),
        "char_start" => row.char_start.to_string(),
        "char_end" => row.char_end.to_string(),
        "excerpt" => row.excerpt.clone(),
        "retrieval_method" => row.retrieval_method.clone(),
        "score" => row.score.to_string(),
        "ce_score" => row.ce_score.to_string(),
        "verified" => row.verified.map(|v| v.to_string()).unwrap_or_default(),
        "verify_note" => row.verify_note.clone().unwrap_or_default(),
        "model_embed" => meta.embed_model.clone(),
        "model_generate" => meta.gen_model.clone(),
        "pipeline_version" => meta.pipeline_version.clone(),
        "run_timestamp" => meta.run_timestamp.clone(),
        _ => return None,
    };
    Some(value)
}

fn write_failed(path: &Path, source: impl fmt::Display) -> ExportError {
    ExportError::WriteFailed {
        path: path.display().to_string(),
        message: source.to_string(),
    }
}
