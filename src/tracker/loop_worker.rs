use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::{checksum, compute_phash, encode_png, score, CaptureSource},
    db::{Database, NewCapture},
    error::TickError,
};

use super::events::{StoredCapture, TrackerEvent};
use super::state::TrackerState;

// Set to false to silence per-tick logging
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Everything one run of the loop needs; moved into the spawned task.
pub struct LoopContext {
    pub db: Database,
    pub source: Arc<dyn CaptureSource>,
    pub interval: Duration,
    pub state: Arc<Mutex<TrackerState>>,
    pub events: broadcast::Sender<TrackerEvent>,
}

/// Ticks once per interval until cancelled. The first tick comes one full
/// interval after start. A tick always finishes before the next one can
/// begin; ticks that fall due meanwhile are pushed back, not bunched up.
pub async fn tracker_loop(ctx: LoopContext, cancel_token: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + ctx.interval, ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!(
        "tracker loop started: every {:?} from {}",
        ctx.interval,
        ctx.source.describe()
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("tracker loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let event = match perform_tick(&ctx.db, &ctx.source).await {
                    Ok(stored) => {
                        ctx.state.lock().await.record_stored(stored.id);
                        TrackerEvent::CaptureStored(stored)
                    }
                    Err(err) => {
                        log_error!("tick abandoned: {err:#}");
                        ctx.state.lock().await.record_failed();
                        TrackerEvent::TickFailed { message: format!("{err:#}") }
                    }
                };

                // No subscribers is fine.
                let _ = ctx.events.send(event);
            }
        }
    }
}

/// Capture, encode, score against the newest stored capture, persist.
pub async fn perform_tick(
    db: &Database,
    source: &Arc<dyn CaptureSource>,
) -> Result<StoredCapture, TickError> {
    let tick_start = std::time::Instant::now();
    let captured_at = Utc::now();

    let png = tokio::task::spawn_blocking({
        let source = Arc::clone(source);
        move || -> Result<Vec<u8>, TickError> {
            let raster = source.grab().map_err(TickError::Capture)?;
            Ok(encode_png(&raster)?)
        }
    })
    .await
    .map_err(|err| TickError::Worker("capture", err))??;

    let stored = store_encoded(db, png, captured_at).await?;
    log_debug!(
        "capture {} stored in {}ms ({} bytes, similarity {:.3}, checksum {})",
        stored.id,
        tick_start.elapsed().as_millis(),
        stored.size_bytes,
        stored.similarity,
        stored.checksum
    );
    Ok(stored)
}

/// Scores already-encoded bytes against the newest stored capture and
/// appends them. The previous image is read fresh from the store and handed
/// to the scorer by value.
pub async fn store_encoded(
    db: &Database,
    png: Vec<u8>,
    captured_at: DateTime<Utc>,
) -> Result<StoredCapture, TickError> {
    let checksum = checksum(&png);
    let png = Arc::new(png);

    let previous = db.latest_image().await.map_err(TickError::Persistence)?;
    let similarity = match previous {
        Some(previous) => tokio::task::spawn_blocking({
            let current = Arc::clone(&png);
            move || score(&current, &previous)
        })
        .await
        .map_err(|err| TickError::Worker("similarity", err))?,
        None => 0.0,
    };

    let phash = match tokio::task::spawn_blocking({
        let current = Arc::clone(&png);
        move || compute_phash(&current)
    })
    .await
    .map_err(|err| TickError::Worker("phash", err))?
    {
        Ok(hash) => Some(hash),
        Err(err) => {
            log_warn!("perceptual hash skipped: {err:#}");
            None
        }
    };

    let image = Arc::try_unwrap(png).unwrap_or_else(|shared| shared.as_ref().clone());
    let size_bytes = image.len();

    let id = db
        .append_capture(NewCapture {
            image,
            similarity,
            checksum,
            phash,
            captured_at,
        })
        .await
        .map_err(TickError::Persistence)?;

    Ok(StoredCapture {
        id,
        similarity,
        checksum,
        size_bytes,
        captured_at,
    })
}
