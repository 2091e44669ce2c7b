//! Incremental sync of crawled runs into a worksheet.
//!
//! ## Cursor
//!
//! The engine keeps no local state. On connect it reads column 1 of the
//! worksheet: the number of non-empty cells is the row count, the last one is
//! the last-synced marker. An update crawls runs whose ordinal is above that
//! marker, so re-running after a crash or with nothing new is a no-op.
//!
//! ## Writes
//!
//! Section `i` goes to row `start_row + 1 + i`. Rows that exist in the grid
//! are filled cell by cell (each cell through the retry policy); once the
//! grid's capacity is used up the rest are appended as whole rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use runsheet_core::{LastMarker, RunCrawler, SectionRow};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::retry::RetryPolicy;
use crate::store::{CellValue, TabularStore, Worksheet};

/// Position of the last synced row, derived from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncCursor {
    /// First-column text of the last non-empty row.
    pub last_marker: Option<String>,
    /// Number of non-empty cells in column 1, header included.
    pub row_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Initial,
    Update,
}

/// How the rows of one push landed in the sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushOutcome {
    /// Rows written cell by cell into existing grid rows.
    pub updated: usize,
    /// Rows appended past the grid's capacity.
    pub appended: usize,
}

/// Summary of one `initial_push` or `update`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub sheet: String,
    pub rows_updated: usize,
    pub rows_appended: usize,
    pub last_marker: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn rows_written(&self) -> usize {
        self.rows_updated + self.rows_appended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowWrite {
    Updated,
    Appended,
}

/// Pushes crawled runs into one worksheet of a [`TabularStore`].
pub struct SyncEngine<S: TabularStore> {
    store: S,
    config: SyncConfig,
    crawler: RunCrawler,
    sheet: Option<S::Sheet>,
    cursor: SyncCursor,
}

impl<S: TabularStore> SyncEngine<S> {
    pub fn new(store: S, config: SyncConfig) -> Self {
        let crawler = RunCrawler::new(&config.source, config.keyword.clone());
        Self {
            store,
            config,
            crawler,
            sheet: None,
            cursor: SyncCursor::default(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.sheet.is_some()
    }

    pub fn cursor(&self) -> &SyncCursor {
        &self.cursor
    }

    /// Open the spreadsheet, select the worksheet and read the cursor.
    pub fn connect(&mut self) -> Result<(), SyncError> {
        let name = &self.config.sheet_name;
        let mut matching: Vec<S::Sheet> = self
            .store
            .open(&self.config.spreadsheet_key)?
            .into_iter()
            .filter(|s| s.title() == name.as_str())
            .collect();
        if matching.len() != 1 {
            return Err(SyncError::Configuration(format!(
                "could not select worksheet '{name}': {} worksheets match",
                matching.len()
            )));
        }
        let sheet = matching.remove(0);

        let filled: Vec<String> = sheet
            .column_values(1)?
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect();
        self.cursor = SyncCursor {
            row_count: filled.len(),
            last_marker: filled.last().cloned(),
        };
        tracing::info!(
            sheet = %name,
            rows = self.cursor.row_count,
            last = self.cursor.last_marker.as_deref().unwrap_or("-"),
            capacity = sheet.row_capacity(),
            "connected"
        );
        self.sheet = Some(sheet);
        Ok(())
    }

    /// Drop the worksheet handle; the next operation reconnects.
    pub fn disconnect(&mut self) {
        self.sheet = None;
        self.cursor = SyncCursor::default();
    }

    fn ensure_connected(&mut self) -> Result<(), SyncError> {
        if !self.is_connected() {
            self.connect()?;
        }
        Ok(())
    }

    /// Rows an initial push would write. Fails if the sheet already has data.
    pub fn plan_initial(&mut self) -> Result<Vec<SectionRow>, SyncError> {
        self.ensure_connected()?;
        if self.cursor.row_count > 1 {
            return Err(SyncError::AlreadyPopulated {
                rows: self.cursor.row_count,
            });
        }
        self.collect(None, None)
    }

    /// Rows an update would write: runs above the cursor, up to `stop_ordinal`.
    pub fn plan_update(&mut self, stop_ordinal: Option<u64>) -> Result<Vec<SectionRow>, SyncError> {
        self.ensure_connected()?;
        let marker = self.cursor.last_marker.clone().map(LastMarker::Name);
        self.collect(marker.as_ref(), stop_ordinal)
    }

    /// Push every run into an unpopulated sheet, starting at row 2.
    ///
    /// A completely empty sheet gets the header row first.
    pub fn initial_push(&mut self) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let sections = self.plan_initial()?;

        if self.cursor.row_count == 0 {
            self.write_row(1, &SectionRow::header_cells(), SectionRow::HEADER[0])?;
        }
        let outcome = self.push_sections(1, &sections)?;
        Ok(self.report(SyncMode::Initial, outcome, started_at))
    }

    /// Append runs newer than the last synced row.
    pub fn update(&mut self, stop_ordinal: Option<u64>) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let sections = self.plan_update(stop_ordinal)?;
        let outcome = self.push_sections(self.cursor.row_count, &sections)?;
        Ok(self.report(SyncMode::Update, outcome, started_at))
    }

    /// Write `sections` below `start_row`, filling existing rows before
    /// appending new ones. The cursor advances after every row.
    pub fn push_sections(
        &mut self,
        start_row: usize,
        sections: &[SectionRow],
    ) -> Result<PushOutcome, SyncError> {
        self.ensure_connected()?;
        let mut outcome = PushOutcome::default();
        for (i, section) in sections.iter().enumerate() {
            let row = start_row + 1 + i;
            match self.write_row(row, &section.cells(), &section.name)? {
                RowWrite::Updated => outcome.updated += 1,
                RowWrite::Appended => outcome.appended += 1,
            }
            tracing::info!(row, name = %section.name, "pushed run");
        }
        Ok(outcome)
    }

    fn write_row(
        &mut self,
        row: usize,
        cells: &[CellValue],
        marker: &str,
    ) -> Result<RowWrite, SyncError> {
        let Some(sheet) = self.sheet.as_mut() else {
            return Err(SyncError::Configuration("worksheet not connected".into()));
        };
        let written = write_row_to(sheet, &self.config.retry, row, cells)?;
        self.cursor.row_count = self.cursor.row_count.max(row);
        self.cursor.last_marker = Some(marker.to_string());
        Ok(written)
    }

    fn collect(
        &self,
        marker: Option<&LastMarker>,
        stop_ordinal: Option<u64>,
    ) -> Result<Vec<SectionRow>, SyncError> {
        let crawl = self.crawler.crawl(marker, stop_ordinal)?;
        let mut sections = Vec::with_capacity(crawl.len());
        for record in crawl {
            sections.push(SectionRow::from_record(record?)?);
        }
        Ok(sections)
    }

    fn report(&self, mode: SyncMode, outcome: PushOutcome, started_at: DateTime<Utc>) -> SyncReport {
        let report = SyncReport {
            mode,
            sheet: self.config.sheet_name.clone(),
            rows_updated: outcome.updated,
            rows_appended: outcome.appended,
            last_marker: self.cursor.last_marker.clone(),
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            mode = ?report.mode,
            updated = report.rows_updated,
            appended = report.rows_appended,
            "sync finished"
        );
        report
    }
}

fn write_row_to<W: Worksheet>(
    sheet: &mut W,
    retry: &RetryPolicy,
    row: usize,
    cells: &[CellValue],
) -> Result<RowWrite, SyncError> {
    if row > sheet.row_capacity() {
        sheet.append_row(cells)?;
        return Ok(RowWrite::Appended);
    }
    for (i, cell) in cells.iter().enumerate() {
        let col = i + 1;
        retry
            .run(|| sheet.update_cell(row, col, cell))
            .map_err(|e| SyncError::StoreWrite {
                row,
                col,
                attempts: e.attempts,
                source: e.error,
            })?;
    }
    Ok(RowWrite::Updated)
}
