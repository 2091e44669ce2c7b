//! Sync configuration and tunables.
//!
//! The spreadsheet key and the API access token come from the environment.
//! [`SyncConfig::from_env`] delegates to [`SyncConfig::from_lookup`]; tests
//! pass their own lookup and never touch the process environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SyncError;
use crate::retry::RetryPolicy;

// ============================================================================
// Environment
// ============================================================================

/// Key of the spreadsheet rows are pushed to. Required.
pub const SPREADSHEET_KEY_ENV: &str = "TEMCA_GOOGLE_SPREADSHEET_KEY";

/// OAuth bearer token for the Sheets API, obtained outside this tool
/// (e.g. `gcloud auth application-default print-access-token`).
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

// ============================================================================
// Store I/O
// ============================================================================

/// Attempts per cell write, including the first.
pub const CELL_WRITE_ATTEMPTS: u32 = 2;

/// Wait before retrying a failed cell write.
pub const CELL_RETRY_DELAY: Duration = Duration::from_secs(10);

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

// ============================================================================
// SyncConfig
// ============================================================================

/// Everything a sync invocation needs besides the store itself.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub spreadsheet_key: String,
    /// Only needed by the Sheets backend.
    pub access_token: Option<String>,
    /// Exact title of the worksheet to write.
    pub sheet_name: String,
    /// Root directory holding run folders.
    pub source: PathBuf,
    /// Substring a run folder name must contain.
    pub keyword: String,
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Build from the process environment.
    pub fn from_env(
        source: impl Into<PathBuf>,
        sheet_name: impl Into<String>,
        keyword: impl Into<String>,
    ) -> Result<Self, SyncError> {
        Self::from_lookup(source, sheet_name, keyword, |name| std::env::var(name).ok())
    }

    /// Build with an explicit variable lookup. Empty values count as unset.
    pub fn from_lookup(
        source: impl Into<PathBuf>,
        sheet_name: impl Into<String>,
        keyword: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SyncError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let spreadsheet_key = get(SPREADSHEET_KEY_ENV).ok_or_else(|| {
            SyncError::Configuration(format!("spreadsheet key not set; export {SPREADSHEET_KEY_ENV}"))
        })?;

        Ok(Self {
            spreadsheet_key,
            access_token: get(ACCESS_TOKEN_ENV),
            sheet_name: sheet_name.into(),
            source: source.into(),
            keyword: keyword.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
