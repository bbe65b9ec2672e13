use thiserror::Error;

/// Errors surfaced while writing the evidence CSV.
///
/// Fatal to the run: rows exist only in memory, so a failed write loses the
/// extraction output.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output file or its parent directory could not be created or written.
    #[error("failed to write CSV to '{path}': {message}")]
    WriteFailed { path: String, message: String },

    /// A configured field name matches no row or run-metadata column.
    #[error("unknown CSV field '{field}'")]
    UnknownField { field: String },
}
