//! Normalized spreadsheet rows.
//!
//! # Save directory grammar
//!
//! ```text
//! /<volume>/<first>_<...>_<last>/...
//!           └─ segment (third `/` component)
//! first := <any>emlode<digits>
//! last  := <any>tank<digits>
//! ```
//!
//! The digits must run to the end of their token. With a single-token
//! segment the same token must satisfy both rules, which it cannot.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::FormatError;
use crate::types::{trailing_ordinal, RawRecord};

/// One cell written to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(n) => n.fmt(f),
            CellValue::Float(x) => x.fmt(f),
            CellValue::Text(s) => s.fmt(f),
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(CellValue::Empty, CellValue::Float)
    }
}

impl From<Option<usize>> for CellValue {
    fn from(v: Option<usize>) -> Self {
        v.map_or(CellValue::Empty, |n| {
            i64::try_from(n).map_or_else(|_| CellValue::Text(n.to_string()), CellValue::Int)
        })
    }
}

/// One row of the worksheet, derived from a crawled run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionRow {
    pub name: String,
    pub number: u64,
    pub emlode: u32,
    pub tank: u32,
    pub notes: String,
    pub elapsed_time: Option<f64>,
    pub rois: Value,
    pub tile_count: Option<usize>,
    pub veto_count: Option<usize>,
    pub veto_percent: Option<f64>,
}

impl SectionRow {
    /// Column titles, in the order of [`SectionRow::cells`].
    pub const HEADER: [&'static str; 10] = [
        "name",
        "number",
        "emlode",
        "tank",
        "notes",
        "time",
        "rois",
        "tiles",
        "vetos",
        "veto %",
    ];

    pub fn from_record(record: RawRecord) -> Result<Self, FormatError> {
        let number = trailing_ordinal(&record.name)
            .or(record.ordinal)
            .ok_or_else(|| FormatError::MissingNumber {
                name: record.name.clone(),
            })?;
        if i64::try_from(number).is_err() {
            return Err(FormatError::NumberOutOfRange {
                name: record.name,
                number,
            });
        }
        let (emlode, tank) = parse_emlode_tank(&record.save_directory)?;

        let tile_count = record.tiles.as_ref().map(Vec::len);
        let veto_percent = match (record.veto_count, tile_count) {
            (Some(vetos), Some(tiles)) if tiles > 0 => Some(vetos as f64 / tiles as f64),
            _ => None,
        };

        Ok(Self {
            name: record.name,
            number,
            emlode,
            tank,
            notes: record.notes,
            elapsed_time: record.elapsed_time,
            rois: record.rois,
            tile_count,
            veto_count: record.veto_count,
            veto_percent,
        })
    }

    /// The row's cells in column order. Absent values are empty cells.
    pub fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Text(self.name.clone()),
            i64::try_from(self.number)
                .map_or_else(|_| CellValue::Text(self.number.to_string()), CellValue::Int),
            CellValue::Int(i64::from(self.emlode)),
            CellValue::Int(i64::from(self.tank)),
            CellValue::Text(self.notes.clone()),
            self.elapsed_time.into(),
            CellValue::Text(self.rois.to_string()),
            self.tile_count.into(),
            self.veto_count.into(),
            self.veto_percent.into(),
        ]
    }

    pub fn header_cells() -> Vec<CellValue> {
        Self::HEADER
            .iter()
            .map(|h| CellValue::Text((*h).to_string()))
            .collect()
    }
}

/// Extract `(emlode, tank)` from a save directory path.
pub fn parse_emlode_tank(save_directory: &str) -> Result<(u32, u32), FormatError> {
    let segment = save_directory
        .split('/')
        .nth(2)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FormatError::MissingSegment {
            path: save_directory.to_string(),
        })?;

    let first = segment.split('_').next().unwrap_or(segment);
    let last = segment.rsplit('_').next().unwrap_or(segment);

    let emlode = digits_after(first, "emlode").ok_or_else(|| FormatError::MissingEmlode {
        path: save_directory.to_string(),
    })?;
    let tank = digits_after(last, "tank").ok_or_else(|| FormatError::MissingTank {
        path: save_directory.to_string(),
    })?;
    Ok((emlode, tank))
}

fn digits_after(token: &str, literal: &str) -> Option<u32> {
    let (_, digits) = token.rsplit_once(literal)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
