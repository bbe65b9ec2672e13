//! Document ingestion and on-disk staging.
//!
//! Plain-text and markdown files are read whole; form feeds mark page
//! boundaries. Cleaning collapses whitespace within lines but keeps the
//! line structure, since downstream segmentation splits paragraphs on
//! blank lines. Each document's cleaned pages are staged as one JSONL
//! file keyed by the document's content hash.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::hashing;
use crate::segment::Page;

pub mod error;

#[cfg(test)]
mod tests;

pub use error::DocumentError;

/// File extensions the reader accepts.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// A source document read and cleaned, ready for segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Content hash of the raw file bytes.
    pub doc_id: String,
    pub source_path: String,
    pub pages: Vec<Page>,
}

/// One staged page record, one JSON object per JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRecord {
    pub doc_id: String,
    pub source_path: String,
    pub page: u32,
    pub text: String,
}

/// Collapses horizontal whitespace within each line, keeping line breaks.
pub fn clean_page(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads one document, splitting pages on form feeds. Page numbers are
/// positional and 1-based; pages that clean down to nothing are dropped
/// without renumbering the rest.
pub fn read_document(path: &Path) -> Result<Document, DocumentError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(DocumentError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        });
    }

    let bytes = std::fs::read(path).map_err(|e| DocumentError::ReadFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let doc_id = hashing::doc_id_for_bytes(&bytes);

    let raw = String::from_utf8_lossy(&bytes);
    let pages: Vec<Page> = raw
        .split('\u{000C}')
        .enumerate()
        .map(|(i, page_text)| Page {
            number: (i + 1) as u32,
            text: clean_page(page_text),
        })
        .filter(|page| !page.text.trim().is_empty())
        .collect();

    debug!(doc_id = %doc_id, pages = pages.len(), path = %path.display(), "Read document");
    Ok(Document {
        doc_id,
        source_path: path.display().to_string(),
        pages,
    })
}

/// Lists regular files in `dir`, sorted for a deterministic ingest order.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DocumentError::ScanFailed {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DocumentError::ScanFailed {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Stages a document's pages as `{staging_dir}/{doc_id}.jsonl` and returns
/// the staging path. Re-staging the same content overwrites in place.
pub fn stage_pages(staging_dir: &Path, document: &Document) -> Result<PathBuf, DocumentError> {
    std::fs::create_dir_all(staging_dir).map_err(|e| DocumentError::StageFailed {
        path: staging_dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let out_path = staging_dir.join(format!("{}.jsonl", document.doc_id));
    let file = std::fs::File::create(&out_path).map_err(|e| DocumentError::StageFailed {
        path: out_path.clone(),
        message: e.to_string(),
    })?;
    let mut writer = std::io::BufWriter::new(file);

    for page in &document.pages {
        let record = StagedRecord {
            doc_id: document.doc_id.clone(),
            source_path: document.source_path.clone(),
            page: page.number,
            text: page.text.clone(),
        };
        serde_json::to_writer(&mut writer, &record).map_err(|e| DocumentError::StageFailed {
            path: out_path.clone(),
            message: e.to_string(),
        })?;
        writer.write_all(b"\n").map_err(|e| DocumentError::StageFailed {
            path: out_path.clone(),
            message: e.to_string(),
        })?;
    }
    writer.flush().map_err(|e| DocumentError::StageFailed {
        path: out_path.clone(),
        message: e.to_string(),
    })?;

    info!(doc_id = %document.doc_id, pages = document.pages.len(), "Staged document");
    Ok(out_path)
}
