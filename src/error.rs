use std::path::PathBuf;

use crate::validate::ValidationError;

/// All errors that can occur while fetching, extracting, validating or storing MTB data.
#[derive(thiserror::Error, Debug)]
pub enum MtbError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// A URL (plus query parameters) could not be assembled.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// An expected HTML element was not found on the page.
    #[error("expected element not found: {context}")]
    ElementNotFound { context: &'static str },

    /// A detailed results table whose body rows cannot be split into overall/detail pairs.
    #[error("{context}: {rows} body rows cannot be paired into overall/detail rows")]
    OddRowCount { context: &'static str, rows: usize },

    /// A table row whose cell count does not line up with the header row.
    #[error("{context}: row {row} has {cells} cells but the header has {headers} columns")]
    ColumnMismatch {
        context: &'static str,
        row: usize,
        headers: usize,
        cells: usize,
    },

    /// Two order-aligned sequences that must be paired have different lengths.
    #[error("{context}: cannot pair {left} entries with {right} entries")]
    LengthMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },

    /// An extracted record failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Reading or writing an output file failed.
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serializing a record to JSON failed.
    #[error("failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

impl MtbError {
    /// Whether the error stems from the page structure or its contents rather than from
    /// fetching or storing it.
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            MtbError::ElementNotFound { .. }
                | MtbError::OddRowCount { .. }
                | MtbError::ColumnMismatch { .. }
                | MtbError::LengthMismatch { .. }
                | MtbError::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MtbError>;
