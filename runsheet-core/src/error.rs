//! Error types for runsheet-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a single run's metadata document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The metadata file could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON, or a required field is missing or has the wrong type.
    #[error("failed to parse run metadata at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A time field held something that is not a number.
    #[error("{field} in {path} is not a number: {value}")]
    InvalidNumber {
        path: PathBuf,
        field: &'static str,
        value: String,
    },

    /// `session.finish` is set but `session.start` is not.
    #[error("session.finish is set but session.start is missing in {path}")]
    MissingStart { path: PathBuf },

    /// A tile entry has no usable `vetoed` flag.
    #[error("tile {index} in {path} has no boolean or list `vetoed` flag")]
    InvalidTile { path: PathBuf, index: usize },
}

/// Errors raised while deriving a row from a parsed record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The save directory has fewer than three `/`-separated components.
    #[error("save directory '{path}' has no emlode/tank segment")]
    MissingSegment { path: String },

    /// The first `_` token of the segment is not `...emlode<digits>`.
    #[error("improper formatting of emlode field in '{path}'")]
    MissingEmlode { path: String },

    /// The last `_` token of the segment is not `...tank<digits>`.
    #[error("improper formatting of tank field in '{path}'")]
    MissingTank { path: String },

    /// Neither the session name nor the run directory carries an ordinal.
    #[error("cannot derive a run number from '{name}'")]
    MissingNumber { name: String },

    /// The run number does not fit a signed 64-bit sheet cell.
    #[error("run number {number} of '{name}' is too large for the sheet")]
    NumberOutOfRange { name: String, number: u64 },
}

/// Errors that abort a crawl before any run is parsed.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("no such directory: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn crawl_io(path: impl Into<PathBuf>, source: std::io::Error) -> CrawlError {
    CrawlError::Io {
        path: path.into(),
        source,
    }
}
