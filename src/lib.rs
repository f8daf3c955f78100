pub mod capture;
pub mod cli;
pub mod db;
pub mod error;
pub mod settings;
pub mod tracker;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;

pub use capture::{CaptureSource, FileSource};
pub use db::{CaptureRecord, CaptureSummary, Database, NewCapture};
pub use error::{EncodeError, TickError};
pub use tracker::{TrackerController, TrackerEvent, TrackerState, TrackerStatus};

pub fn run() -> Result<()> {
    // RUST_LOG wins over the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();
    log::debug!("timetracker {} starting", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(cli::dispatch(cli))
}
