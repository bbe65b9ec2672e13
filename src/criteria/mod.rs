//! Criteria sheet loading.
//!
//! Criteria arrive as CSV with one row per sub-criterion. The schema is
//! validated up front so a bad sheet aborts the run before any retrieval
//! work begins.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod error;


pub use error::CriteriaError;

/// Columns the criteria sheet must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "criterion_id",
    "criterion_label",
    "subcriterion_id",
    "subcriterion_label",
    "guidance_prompt",
];

/// One sub-criterion row from the criteria sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub criterion_id: String,
    pub criterion_label: String,
    pub subcriterion_id: String,
    pub subcriterion_label: String,
    pub guidance_prompt: String,
}

impl Criterion {
    /// The retrieval query for this sub-criterion.
    pub fn query_text(&self) -> &str {
        self.guidance_prompt.trim()
    }
}

/// Loads and validates the criteria sheet.
///
/// A missing required column, an unreadable file, a malformed row, or an
/// empty `guidance_prompt` all fail the load.
pub fn load_criteria(path: &Path) -> Result<Vec<Criterion>, CriteriaError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| CriteriaError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let headers = reader
        .headers()
        .map_err(|e| CriteriaError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .clone();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(CriteriaError::MissingColumn { column: required });
        }
    }

    let mut criteria = Vec::new();
    for (i, result) in reader.deserialize::<Criterion>().enumerate() {
        // Header occupies line 1; the first record is line 2.
        let row = i + 2;
        let criterion = result.map_err(|e| CriteriaError::MalformedRow {
            row,
            message: e.to_string(),
        })?;
        if criterion.guidance_prompt.trim().is_empty() {
            return Err(CriteriaError::EmptyGuidance { row });
        }
        criteria.push(criterion);
    }

    info!(count = criteria.len(), path = %path.display(), "Loaded criteria");
    Ok(criteria)
}
