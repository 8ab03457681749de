use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the ingestion and statistics pipeline.
///
/// Unrecognized log lines are not an error (they are silently dropped), and a
/// missing metadata value is an absent `Option` on `RunParams`, never an error.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A numeric token could not be parsed into a finite value.
    #[error("malformed numeric token '{token}'")]
    MalformedNumber { token: String },

    /// A scalar series yielded zero usable samples after the burn-in window.
    #[error("series {path} produced no usable samples")]
    EmptySeries { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
