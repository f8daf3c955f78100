use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::{
    capture::{checksum, score, CaptureSource, FileSource},
    db::Database,
    settings::{default_settings_path, SettingsStore, TrackerSettings},
    tracker::{TrackerController, TrackerEvent},
};

pub mod listing;

use listing::{build_listing, format_row, rows_to_fetch};

#[derive(Parser, Debug)]
#[command(name = "timetracker", version, about = "Periodic screen capture tracker")]
pub struct Cli {
    /// Capture database, overriding the settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
    /// Settings file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture on an interval until Ctrl-C
    Track {
        /// Seconds between captures
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
        /// Capture this image file instead of the screen
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
        /// Print stored captures as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// List stored captures, newest first
    List {
        #[arg(long)]
        json: bool,
        /// Show at most this many captures
        #[arg(
            long,
            value_name = "N",
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        limit: Option<usize>,
    },
    /// Write the most recent capture to a file
    Latest {
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Write a stored capture to a file
    Export {
        id: i64,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Similarity of two files, byte for byte
    Score { current: PathBuf, previous: PathBuf },
    /// Show settings, or change them
    Config {
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,
        #[arg(long, value_name = "PATH")]
        database: Option<PathBuf>,
    },
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let settings_path = match cli.config {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let settings = SettingsStore::new(settings_path)?;
    let db_override = cli.db;

    match cli.command {
        Command::Track {
            interval,
            image,
            json,
        } => {
            let db = open_database(db_override, &settings)?;
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| settings.get().interval());
            track(db, capture_source(image)?, interval, json).await
        }
        Command::List { json, limit } => {
            let db = open_database(db_override, &settings)?;
            list(&db, limit, json).await
        }
        Command::Latest { output } => {
            let db = open_database(db_override, &settings)?;
            let image = db
                .latest_image()
                .await?
                .ok_or_else(|| anyhow!("no captures stored yet"))?;
            write_image(&output, &image)
        }
        Command::Export { id, output } => {
            let db = open_database(db_override, &settings)?;
            let record = db
                .get_capture(id)
                .await?
                .ok_or_else(|| anyhow!("no capture with id {id}"))?;
            write_image(&output, &record.image)
        }
        Command::Score { current, previous } => {
            let current = fs::read(&current)
                .with_context(|| format!("failed to read {}", current.display()))?;
            let previous = fs::read(&previous)
                .with_context(|| format!("failed to read {}", previous.display()))?;
            println!("similarity: {}", score(&current, &previous));
            println!("hash sum:   {} / {}", checksum(&current), checksum(&previous));
            Ok(())
        }
        Command::Config { interval, database } => configure(&settings, interval, database),
    }
}

fn open_database(db_override: Option<PathBuf>, settings: &SettingsStore) -> Result<Database> {
    let path = match db_override {
        Some(path) => path,
        None => settings.database_path()?,
    };
    Database::new(path.clone()).map_err(|err| {
        error!("Capture store is not connected: {err:#}");
        err.context(format!("could not open capture store {}", path.display()))
    })
}

fn capture_source(image: Option<PathBuf>) -> Result<Arc<dyn CaptureSource>> {
    if let Some(path) = image {
        return Ok(Arc::new(FileSource::new(path)));
    }

    #[cfg(feature = "screen-capture")]
    {
        Ok(Arc::new(crate::capture::ScreenSource))
    }

    #[cfg(not(feature = "screen-capture"))]
    {
        Err(anyhow!(
            "built without the `screen-capture` feature; pass --image FILE to capture a file"
        ))
    }
}

async fn track(
    db: Database,
    source: Arc<dyn CaptureSource>,
    interval: Duration,
    json: bool,
) -> Result<()> {
    let controller = TrackerController::new(db, source, interval);
    let mut events = controller.subscribe();
    controller.start().await?;
    info!("Press Ctrl-C to stop");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                break;
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event, json)?,
                Err(RecvError::Lagged(skipped)) => warn!("{skipped} tracker events were dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    let state = controller.stop().await?;
    info!(
        "Stored {} captures this run, {} ticks abandoned",
        state.captures_stored, state.ticks_failed
    );
    Ok(())
}

fn print_event(event: &TrackerEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        TrackerEvent::CaptureStored(stored) => println!(
            "#{} {}  similarity with the previous screenshot: {:.3}  hash sum: {}",
            stored.id,
            stored.captured_at.format("%H:%M:%S"),
            stored.similarity,
            stored.checksum
        ),
        TrackerEvent::TickFailed { message } => println!("capture skipped: {message}"),
    }
    Ok(())
}

async fn list(db: &Database, limit: Option<usize>, json: bool) -> Result<()> {
    let summaries = db.list_capture_summaries(rows_to_fetch(limit)).await?;
    let rows = build_listing(&summaries, limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("no captures stored yet");
    } else {
        for row in &rows {
            println!("{}", format_row(row));
        }
    }
    Ok(())
}

fn write_image(output: &Path, image: &[u8]) -> Result<()> {
    fs::write(output, image).with_context(|| format!("failed to write {}", output.display()))?;
    println!("{} bytes written to {}", image.len(), output.display());
    Ok(())
}

fn configure(
    settings: &SettingsStore,
    interval: Option<u64>,
    database: Option<PathBuf>,
) -> Result<()> {
    if interval.is_some() || database.is_some() {
        let current = settings.get();
        settings.update(TrackerSettings {
            interval_secs: interval.unwrap_or(current.interval_secs),
            database_path: database.or(current.database_path),
        })?;
        info!("Settings saved to {}", settings.path().display());
    }

    println!("{}", serde_json::to_string_pretty(&settings.get())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn zero_interval_is_refused_by_the_parser() {
        assert!(Cli::try_parse_from(["timetracker", "track", "--interval", "0"]).is_err());
    }

    #[test]
    fn zero_limit_is_refused_by_the_parser() {
        assert!(Cli::try_parse_from(["timetracker", "list", "--limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["timetracker", "list", "--limit", "1"]).is_ok());
    }

    #[test]
    fn global_db_flag_follows_subcommand() {
        let cli = Cli::try_parse_from(["timetracker", "list", "--limit", "3", "--db", "x.sqlite"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.sqlite")));
        assert!(matches!(
            cli.command,
            Command::List {
                json: false,
                limit: Some(3)
            }
        ));
    }

    #[test]
    fn export_takes_positional_id() {
        let cli = Cli::try_parse_from(["timetracker", "export", "12", "-o", "out.png"]).unwrap();
        match cli.command {
            Command::Export { id, output } => {
                assert_eq!(id, 12);
                assert_eq!(output, PathBuf::from("out.png"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
