//! Flags and driver for a sync invocation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use runsheet_core::SectionRow;
use runsheet_sync::{SheetsStore, SyncConfig, SyncEngine, SyncMode, SyncReport};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory holding the run folders.
    #[arg(short = 's', long)]
    pub source: PathBuf,

    /// Exact title of the worksheet to write.
    #[arg(short = 'n', long = "sheet_name", visible_alias = "sheet-name")]
    pub sheet_name: String,

    /// Substring a run folder name must contain.
    #[arg(short = 'k', long = "note_keyword", visible_alias = "note-keyword")]
    pub note_keyword: String,

    /// Push every run into an empty sheet.
    #[arg(short = 'i', long)]
    pub initial: bool,

    /// Push runs newer than the last synced row.
    #[arg(short = 'u', long)]
    pub update: bool,

    /// Highest run ordinal an update may push.
    #[arg(long = "stop_number", visible_alias = "stop-number")]
    pub stop_number: Option<u64>,

    /// Read the sheet and crawl, but print the rows instead of writing them.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct PlanTableRow {
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "number")]
    number: u64,
    #[tabled(rename = "emlode")]
    emlode: u32,
    #[tabled(rename = "tank")]
    tank: u32,
    #[tabled(rename = "time")]
    time: String,
    #[tabled(rename = "tiles")]
    tiles: String,
    #[tabled(rename = "vetos")]
    vetos: String,
    #[tabled(rename = "veto %")]
    veto_percent: String,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    mode: SyncMode,
    sheet: &'a str,
    rows: &'a [SectionRow],
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = SyncConfig::from_env(&self.source, &self.sheet_name, &self.note_keyword)
            .context("failed to load configuration")?;

        if !self.initial && !self.update {
            tracing::info!("neither --initial nor --update given; nothing to do");
            return Ok(());
        }

        let store = SheetsStore::from_config(&config).context("failed to set up Sheets client")?;
        let mut engine = SyncEngine::new(store, config);
        engine
            .connect()
            .with_context(|| format!("failed to open worksheet '{}'", self.sheet_name))?;

        if self.dry_run {
            return self.print_dry_run(&mut engine);
        }

        let mut reports = Vec::new();
        if self.initial {
            reports.push(engine.initial_push().context("initial push failed")?);
        }
        if self.update {
            reports.push(engine.update(self.stop_number).context("update failed")?);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        } else {
            for report in &reports {
                print_report(report);
            }
        }
        Ok(())
    }

    fn print_dry_run(&self, engine: &mut SyncEngine<SheetsStore>) -> Result<()> {
        let (mode, rows) = if self.initial {
            (SyncMode::Initial, engine.plan_initial().context("initial plan failed")?)
        } else {
            (
                SyncMode::Update,
                engine.plan_update(self.stop_number).context("update plan failed")?,
            )
        };

        if self.json {
            let plan = PlanJson {
                mode,
                sheet: &self.sheet_name,
                rows: &rows,
            };
            println!("{}", serde_json::to_string_pretty(&plan)?);
            return Ok(());
        }

        print_plan(&self.sheet_name, &rows);
        Ok(())
    }
}

fn print_plan(sheet: &str, rows: &[SectionRow]) {
    if rows.is_empty() {
        println!("[dry-run] {} '{sheet}' is up to date", "✓".green());
        return;
    }

    let table_rows: Vec<PlanTableRow> = rows
        .iter()
        .map(|r| PlanTableRow {
            name: r.name.clone(),
            number: r.number,
            emlode: r.emlode,
            tank: r.tank,
            time: optional(r.elapsed_time),
            tiles: optional(r.tile_count),
            vetos: optional(r.veto_count),
            veto_percent: r
                .veto_percent
                .map(|p| format!("{:.1}", p * 100.0))
                .unwrap_or_default(),
        })
        .collect();

    println!(
        "[dry-run] {} row(s) would be pushed to '{sheet}'",
        rows.len().to_string().bold()
    );
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn print_report(report: &SyncReport) {
    let mode = match report.mode {
        SyncMode::Initial => "initial push",
        SyncMode::Update => "update",
    };
    if report.rows_written() == 0 {
        println!("{} {mode} to '{}': nothing new", "✓".green(), report.sheet);
        return;
    }
    println!(
        "{} {mode} to '{}': {} row(s) ({} updated, {} appended), last {}",
        "✓".green(),
        report.sheet,
        report.rows_written().to_string().bold(),
        report.rows_updated,
        report.rows_appended,
        report.last_marker.as_deref().unwrap_or("-").cyan(),
    );
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
