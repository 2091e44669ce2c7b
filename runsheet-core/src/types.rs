//! Domain types shared by the parser, crawler and sync engine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Ordinals
// ---------------------------------------------------------------------------

/// Integer after the last `_` of a run name (`run_emlode3_005` → `5`).
///
/// Returns `None` when the name has no `_` or the suffix is not an integer.
pub fn trailing_ordinal(name: &str) -> Option<u64> {
    let (_, suffix) = name.rsplit_once('_')?;
    suffix.parse().ok()
}

/// Lower bound for an incremental crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LastMarker {
    /// A run name, typically read back from the store's first column.
    Name(String),
    /// An ordinal given directly.
    Ordinal(u64),
}

impl LastMarker {
    /// Resolve to an ordinal; a name without a parsable suffix means no filter.
    pub fn ordinal(&self) -> Option<u64> {
        match self {
            LastMarker::Name(name) => trailing_ordinal(name),
            LastMarker::Ordinal(n) => Some(*n),
        }
    }
}

impl fmt::Display for LastMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastMarker::Name(name) => name.fmt(f),
            LastMarker::Ordinal(n) => n.fmt(f),
        }
    }
}

impl From<&str> for LastMarker {
    fn from(s: &str) -> Self {
        Self::Name(s.to_owned())
    }
}

impl From<String> for LastMarker {
    fn from(s: String) -> Self {
        Self::Name(s)
    }
}

impl From<u64> for LastMarker {
    fn from(n: u64) -> Self {
        Self::Ordinal(n)
    }
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// One entry of `session.tiles`. Only the `vetoed` flag is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileRecord(pub Value);

impl TileRecord {
    /// `Some(true)` when the tile's `vetoed` flag is set.
    ///
    /// The flag is either a boolean or a list of flags, any of which may be
    /// truthy. Returns `None` when the field is missing or of another type.
    pub fn vetoed(&self) -> Option<bool> {
        match self.0.get("vetoed")? {
            Value::Bool(b) => Some(*b),
            Value::Array(flags) => Some(flags.iter().any(truthy)),
            _ => None,
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ---------------------------------------------------------------------------
// Raw record
// ---------------------------------------------------------------------------

/// Flat record extracted from one run's metadata file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub name: String,
    pub notes: String,
    /// `finish - start` in seconds; absent when the run has no finish time.
    pub elapsed_time: Option<f64>,
    pub save_directory: String,
    pub tiles: Option<Vec<TileRecord>>,
    pub veto_count: Option<usize>,
    pub rois: Value,
    /// Ordinal of the run directory the record came from, if it has one.
    pub ordinal: Option<u64>,
    /// Metadata file the record was parsed from.
    pub source: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailing_ordinal_takes_text_after_last_underscore() {
        assert_eq!(trailing_ordinal("run_emlode3_tank7_005"), Some(5));
        assert_eq!(trailing_ordinal("run_10"), Some(10));
        assert_eq!(trailing_ordinal("name"), None);
        assert_eq!(trailing_ordinal("run_abc"), None);
        assert_eq!(trailing_ordinal("run_"), None);
    }

    #[test]
    fn marker_resolution() {
        assert_eq!(LastMarker::from("run_042").ordinal(), Some(42));
        assert_eq!(LastMarker::from("Name").ordinal(), None);
        assert_eq!(LastMarker::from(7u64).ordinal(), Some(7));
    }

    #[test]
    fn vetoed_accepts_bool_and_flag_lists() {
        assert_eq!(TileRecord(json!({"vetoed": true})).vetoed(), Some(true));
        assert_eq!(TileRecord(json!({"vetoed": false})).vetoed(), Some(false));
        assert_eq!(TileRecord(json!({"vetoed": [0, "", false]})).vetoed(), Some(false));
        assert_eq!(TileRecord(json!({"vetoed": [false, "focus"]})).vetoed(), Some(true));
        assert_eq!(TileRecord(json!({"vetoed": []})).vetoed(), Some(false));
        assert_eq!(TileRecord(json!({"other": 1})).vetoed(), None);
        assert_eq!(TileRecord(json!({"vetoed": "yes"})).vetoed(), None);
    }
}
