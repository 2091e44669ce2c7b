//! In-process tabular store.
//!
//! [`MemorySheet`] is a cheap handle onto shared grid state: keep a clone
//! before handing the store to the engine and inspect it afterwards. Failures
//! can be injected to exercise the retry path.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StoreError;
use crate::store::{CellValue, TabularStore, Worksheet};

#[derive(Debug, Default)]
struct SheetState {
    capacity: usize,
    rows: Vec<Vec<CellValue>>,
    writes: usize,
    failing_updates: usize,
    failing_appends: bool,
}

impl SheetState {
    fn row_mut(&mut self, row: usize) -> &mut Vec<CellValue> {
        if self.rows.len() < row {
            self.rows.resize_with(row, Vec::new);
        }
        &mut self.rows[row - 1]
    }
}

/// A worksheet held in memory.
#[derive(Debug, Clone)]
pub struct MemorySheet {
    title: String,
    state: Rc<RefCell<SheetState>>,
}

impl MemorySheet {
    /// Empty sheet with `capacity` rows.
    pub fn new(title: impl Into<String>, capacity: usize) -> Self {
        Self {
            title: title.into(),
            state: Rc::new(RefCell::new(SheetState {
                capacity,
                ..SheetState::default()
            })),
        }
    }

    /// Sheet pre-filled with `rows` from row 1 down. Capacity grows to fit.
    pub fn with_rows(title: impl Into<String>, capacity: usize, rows: Vec<Vec<CellValue>>) -> Self {
        let sheet = Self::new(title, capacity.max(rows.len()));
        sheet.state.borrow_mut().rows = rows;
        sheet
    }

    pub fn cell(&self, row: usize, col: usize) -> CellValue {
        self.state
            .borrow()
            .rows
            .get(row.wrapping_sub(1))
            .and_then(|r| r.get(col.wrapping_sub(1)))
            .cloned()
            .unwrap_or(CellValue::Empty)
    }

    /// Cells of `row`, without trailing empties.
    pub fn row(&self, row: usize) -> Vec<CellValue> {
        let mut cells = self
            .state
            .borrow()
            .rows
            .get(row.wrapping_sub(1))
            .cloned()
            .unwrap_or_default();
        while cells.last().is_some_and(CellValue::is_empty) {
            cells.pop();
        }
        cells
    }

    /// Index of the last row holding any non-empty cell.
    pub fn last_filled_row(&self) -> usize {
        self.state
            .borrow()
            .rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_empty()))
            .map_or(0, |i| i + 1)
    }

    /// Successful `update_cell` and `append_row` calls so far.
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Make the next `n` `update_cell` calls fail with a transient error.
    pub fn fail_next_updates(&self, n: usize) {
        self.state.borrow_mut().failing_updates = n;
    }

    /// Make every `append_row` call fail.
    pub fn fail_appends(&self, fail: bool) {
        self.state.borrow_mut().failing_appends = fail;
    }
}

impl Worksheet for MemorySheet {
    fn title(&self) -> &str {
        &self.title
    }

    fn row_capacity(&self) -> usize {
        self.state.borrow().capacity
    }

    fn column_values(&self, col: usize) -> Result<Vec<String>, StoreError> {
        if col == 0 {
            return Err(StoreError::OutOfRange { row: 1, col });
        }
        let state = self.state.borrow();
        let mut values: Vec<String> = state
            .rows
            .iter()
            .map(|r| r.get(col - 1).map(CellValue::to_string).unwrap_or_default())
            .collect();
        while values.last().is_some_and(String::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    fn update_cell(&mut self, row: usize, col: usize, value: &CellValue) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if row == 0 || col == 0 || row > state.capacity {
            return Err(StoreError::OutOfRange { row, col });
        }
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(StoreError::Unavailable(format!(
                "injected failure at ({row}, {col})"
            )));
        }
        let cells = state.row_mut(row);
        if cells.len() < col {
            cells.resize(col, CellValue::Empty);
        }
        cells[col - 1] = value.clone();
        state.writes += 1;
        Ok(())
    }

    fn append_row(&mut self, values: &[CellValue]) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        if state.failing_appends {
            return Err(StoreError::Unavailable("injected append failure".into()));
        }
        state.capacity += 1;
        let row = state.capacity;
        *state.row_mut(row) = values.to_vec();
        state.writes += 1;
        Ok(())
    }
}

/// Spreadsheets keyed by id, each a list of worksheets.
#[derive(Debug, Default)]
pub struct MemoryStore {
    spreadsheets: HashMap<String, Vec<MemorySheet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `sheet` to spreadsheet `key`, creating the spreadsheet if needed.
    pub fn with_sheet(mut self, key: impl Into<String>, sheet: MemorySheet) -> Self {
        self.spreadsheets.entry(key.into()).or_default().push(sheet);
        self
    }
}

impl TabularStore for MemoryStore {
    type Sheet = MemorySheet;

    fn open(&mut self, key: &str) -> Result<Vec<MemorySheet>, StoreError> {
        self.spreadsheets
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::Http {
                status: 404,
                url: format!("memory://{key}"),
                body: "spreadsheet not found".into(),
            })
    }
}
