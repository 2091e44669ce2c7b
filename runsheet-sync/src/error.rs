//! Error types for runsheet-sync.

use thiserror::Error;

use runsheet_core::{CrawlError, FormatError, ParseError};

/// Failures reported by a tabular store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body was not the expected JSON.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// A cell address outside the grid.
    #[error("cell ({row}, {col}) is outside the worksheet")]
    OutOfRange { row: usize, col: usize },

    /// A transient failure; callers may retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// All errors that can arise from a sync invocation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing spreadsheet key or token, or an ambiguous worksheet name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `initial_push` refused because the sheet already holds data rows.
    #[error("spreadsheet already populated ({rows} rows); run an update instead")]
    AlreadyPopulated { rows: usize },

    /// A cell write failed on every attempt allowed by the retry policy.
    #[error("writing row {row}, column {col} failed after {attempts} attempts: {source}")]
    StoreWrite {
        row: usize,
        col: usize,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("metadata error: {0}")]
    Parse(#[from] ParseError),

    #[error("row format error: {0}")]
    Format(#[from] FormatError),
}
