//! runsheet: push experiment-run metadata into a shared spreadsheet.
//!
//! # Usage
//!
//! ```text
//! runsheet -s <dir> -n <sheet> -k <keyword> --initial
//! runsheet -s <dir> -n <sheet> -k <keyword> --update [--stop_number <n>]
//! runsheet -s <dir> -n <sheet> -k <keyword> --update --dry-run [--json]
//! ```
//!
//! The spreadsheet key is read from `TEMCA_GOOGLE_SPREADSHEET_KEY` and the
//! API token from `GOOGLE_OAUTH_ACCESS_TOKEN`.

mod commands;

use anyhow::Result;
use clap::Parser;

use commands::sync::SyncArgs;

#[derive(Parser, Debug)]
#[command(
    name = "runsheet",
    version,
    about = "Sync experiment run metadata into a spreadsheet",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    sync: SyncArgs,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli.sync.run()
}

/// Logs go to stderr so `--json` output stays clean on stdout.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
