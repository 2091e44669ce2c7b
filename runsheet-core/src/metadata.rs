//! Run metadata parser.
//!
//! Each run directory holds one JSON document describing the session:
//!
//! ```text
//! {
//!   "session": { "name": "...", "start": 100.0, "finish": 120.5, "tiles": [...] },
//!   "save":    { "directory": "/volume/emlode3_..._tank7/..." },
//!   "montage": { "rois": ... }
//! }
//! ```
//!
//! The document is decoded into explicit structs so a missing or mistyped
//! required field surfaces as a [`ParseError`] rather than a silent default.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ParseError;
use crate::types::{RawRecord, TileRecord};

#[derive(Debug, Deserialize)]
struct MetadataDocument {
    session: SessionSection,
    save: SaveSection,
    montage: MontageSection,
}

#[derive(Debug, Deserialize)]
struct SessionSection {
    name: String,
    /// Free-form; only a string is used as notes.
    #[serde(default)]
    notes: Option<Value>,
    #[serde(default)]
    start: Option<TimeValue>,
    #[serde(default)]
    finish: Option<TimeValue>,
    #[serde(default)]
    tiles: Option<Vec<TileRecord>>,
}

#[derive(Debug, Deserialize)]
struct SaveSection {
    directory: String,
}

#[derive(Debug, Deserialize)]
struct MontageSection {
    rois: Value,
}

/// Timestamps are written either as JSON numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeValue {
    Number(f64),
    Text(String),
}

impl TimeValue {
    fn seconds(&self, path: &Path, field: &'static str) -> Result<f64, ParseError> {
        match self {
            TimeValue::Number(n) => Ok(*n),
            TimeValue::Text(s) => s.trim().parse().map_err(|_| ParseError::InvalidNumber {
                path: path.to_path_buf(),
                field,
                value: s.clone(),
            }),
        }
    }
}

/// Parse one run's metadata file into a [`RawRecord`].
///
/// `ordinal` is left unset; the crawler fills it from the run directory name.
pub fn parse(path: &Path) -> Result<RawRecord, ParseError> {
    tracing::info!(path = %path.display(), "parsing run metadata");

    let contents = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&contents, path)
}

/// Parse an already-loaded document. `path` is only used in errors.
pub fn parse_str(contents: &str, path: &Path) -> Result<RawRecord, ParseError> {
    let doc: MetadataDocument =
        serde_json::from_str(contents).map_err(|source| ParseError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let session = doc.session;

    let elapsed_time = match (&session.finish, &session.start) {
        (None, _) => None,
        (Some(_), None) => {
            return Err(ParseError::MissingStart {
                path: path.to_path_buf(),
            })
        }
        (Some(finish), Some(start)) => {
            Some(finish.seconds(path, "session.finish")? - start.seconds(path, "session.start")?)
        }
    };

    let veto_count = match &session.tiles {
        Some(tiles) => Some(count_vetoed(tiles, path)?),
        None => None,
    };

    Ok(RawRecord {
        notes: match session.notes {
            Some(Value::String(notes)) => notes,
            _ => session.name.clone(),
        },
        name: session.name,
        elapsed_time,
        save_directory: doc.save.directory,
        tiles: session.tiles,
        veto_count,
        rois: doc.montage.rois,
        ordinal: None,
        source: path.to_path_buf(),
    })
}

fn count_vetoed(tiles: &[TileRecord], path: &Path) -> Result<usize, ParseError> {
    let mut count = 0;
    for (index, tile) in tiles.iter().enumerate() {
        match tile.vetoed() {
            Some(true) => count += 1,
            Some(false) => {}
            None => {
                return Err(ParseError::InvalidTile {
                    path: path.to_path_buf(),
                    index,
                })
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(session: Value) -> String {
        json!({
            "session": session,
            "save": { "directory": "/data/emlode3_x_tank7/run_005" },
            "montage": { "rois": [[0, 0, 10, 10]] },
        })
        .to_string()
    }

    fn parse_doc(contents: &str) -> Result<RawRecord, ParseError> {
        parse_str(contents, Path::new("run_005/run_005.json"))
    }

    #[test]
    fn elapsed_time_is_finish_minus_start() {
        let rec = parse_doc(&doc(json!({"name": "run_005", "start": 100.0, "finish": 120.5})))
            .expect("parse");
        assert_eq!(rec.elapsed_time, Some(20.5));
    }

    #[test]
    fn numeric_strings_are_accepted_for_times() {
        let rec = parse_doc(&doc(json!({"name": "run_005", "start": "10", "finish": "12.5"})))
            .expect("parse");
        assert_eq!(rec.elapsed_time, Some(2.5));
    }

    #[test]
    fn missing_finish_means_no_elapsed_time() {
        let rec = parse_doc(&doc(json!({"name": "run_005", "start": 100.0}))).expect("parse");
        assert_eq!(rec.elapsed_time, None);
    }

    #[test]
    fn null_finish_counts_as_absent() {
        let rec = parse_doc(&doc(json!({"name": "run_005", "finish": null}))).expect("parse");
        assert_eq!(rec.elapsed_time, None);
    }

    #[test]
    fn finish_without_start_is_an_error() {
        let err = parse_doc(&doc(json!({"name": "run_005", "finish": 5.0}))).unwrap_err();
        assert!(matches!(err, ParseError::MissingStart { .. }), "got: {err}");
    }

    #[test]
    fn garbage_time_is_invalid_number() {
        let err = parse_doc(&doc(json!({"name": "run_005", "start": "soon", "finish": 5.0})))
            .unwrap_err();
        match err {
            ParseError::InvalidNumber { field, value, .. } => {
                assert_eq!(field, "session.start");
                assert_eq!(value, "soon");
            }
            other => panic!("expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn veto_count_only_with_tiles() {
        let without = parse_doc(&doc(json!({"name": "run_005"}))).expect("parse");
        assert!(without.tiles.is_none());
        assert!(without.veto_count.is_none());

        let with = parse_doc(&doc(json!({
            "name": "run_005",
            "tiles": [{"vetoed": []}, {"vetoed": ["focus"]}, {"vetoed": true}],
        })))
        .expect("parse");
        assert_eq!(with.tiles.as_ref().map(Vec::len), Some(3));
        assert_eq!(with.veto_count, Some(2));
    }

    #[test]
    fn tile_without_flag_is_rejected() {
        let err = parse_doc(&doc(json!({"name": "run_005", "tiles": [{"vetoed": true}, {}]})))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidTile { index: 1, .. }), "got: {err}");
    }

    #[test]
    fn notes_fall_back_to_name() {
        let rec = parse_doc(&doc(json!({"name": "run_005"}))).expect("parse");
        assert_eq!(rec.notes, "run_005");

        let rec = parse_doc(&doc(json!({"name": "run_005", "notes": "refocused twice"})))
            .expect("parse");
        assert_eq!(rec.notes, "refocused twice");
    }

    #[test]
    fn non_string_notes_fall_back_to_name() {
        for notes in [json!(42), json!(["a", "b"]), json!({"text": "x"}), json!(null)] {
            let rec = parse_doc(&doc(json!({"name": "run_005", "notes": notes})))
                .expect("parse");
            assert_eq!(rec.notes, "run_005");
        }
    }

    #[test]
    fn missing_required_fields_are_json_errors() {
        let no_rois = json!({
            "session": {"name": "run_005"},
            "save": {"directory": "/a/b/c"},
            "montage": {},
        })
        .to_string();
        assert!(matches!(parse_doc(&no_rois), Err(ParseError::Json { .. })));

        let no_save = json!({"session": {"name": "run_005"}, "montage": {"rois": []}}).to_string();
        assert!(matches!(parse_doc(&no_save), Err(ParseError::Json { .. })));

        let bad_name = doc(json!({"name": 5}));
        assert!(matches!(parse_doc(&bad_name), Err(ParseError::Json { .. })));
    }

    #[test]
    fn explicit_null_rois_is_kept() {
        let contents = json!({
            "session": {"name": "run_005"},
            "save": {"directory": "/a/b/c"},
            "montage": {"rois": null},
        })
        .to_string();
        let rec = parse_doc(&contents).expect("parse");
        assert_eq!(rec.rois, Value::Null);
    }
}
