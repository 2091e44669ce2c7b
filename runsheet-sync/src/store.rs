//! Abstract tabular store.
//!
//! Rows and columns are 1-based, as in a spreadsheet UI. Row 1 holds the
//! header.

pub use runsheet_core::CellValue;

use crate::error::StoreError;

/// One named grid inside a spreadsheet.
pub trait Worksheet {
    fn title(&self) -> &str;

    /// Number of rows the grid currently has, filled or not.
    fn row_capacity(&self) -> usize;

    /// Cell texts of column `col`, top to bottom. Trailing empty cells may be
    /// omitted.
    fn column_values(&self, col: usize) -> Result<Vec<String>, StoreError>;

    fn update_cell(&mut self, row: usize, col: usize, value: &CellValue)
        -> Result<(), StoreError>;

    /// Add a row below the grid, growing its capacity by one.
    fn append_row(&mut self, values: &[CellValue]) -> Result<(), StoreError>;
}

/// A service holding spreadsheets addressed by key.
pub trait TabularStore {
    type Sheet: Worksheet;

    /// Open the spreadsheet `key` and list its worksheets.
    fn open(&mut self, key: &str) -> Result<Vec<Self::Sheet>, StoreError>;
}
