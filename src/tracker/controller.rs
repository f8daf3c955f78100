use std::{sync::Arc, time::Instant};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::info;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::CaptureSource,
    db::{CaptureRecord, Database},
};

use super::{
    events::TrackerEvent,
    loop_worker::{tracker_loop, LoopContext},
    TrackerState,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub state: TrackerState,
    pub running_ms: u64,
    pub total_captures: u64,
}

struct RunningLoop {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Start/stop/refresh surface over the capture loop.
#[derive(Clone)]
pub struct TrackerController {
    state: Arc<Mutex<TrackerState>>,
    db: Database,
    source: Arc<dyn CaptureSource>,
    interval: Duration,
    running: Arc<Mutex<Option<RunningLoop>>>,
    events: broadcast::Sender<TrackerEvent>,
}

impl TrackerController {
    pub fn new(db: Database, source: Arc<dyn CaptureSource>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(TrackerState::new())),
            db,
            source,
            interval,
            running: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Receives one event per finished tick from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub async fn get_state(&self) -> TrackerState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> Result<TrackerSnapshot> {
        let total_captures = self.db.count_captures().await?;
        let guard = self.state.lock().await;
        Ok(TrackerSnapshot {
            running_ms: guard.running_ms(),
            state: guard.clone(),
            total_captures,
        })
    }

    pub async fn start(&self) -> Result<TrackerState> {
        if self.interval.is_zero() {
            bail!("capture interval must be greater than zero");
        }

        let mut running = self.running.lock().await;
        if running.is_some() {
            bail!("tracker already running");
        }

        let cancel_token = CancellationToken::new();
        let ctx = LoopContext {
            db: self.db.clone(),
            source: Arc::clone(&self.source),
            interval: self.interval,
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        };

        // Mark running before the task exists so a tick can never observe
        // a stopped state.
        let snapshot = {
            let mut state = self.state.lock().await;
            state.begin(
                u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
                Utc::now(),
                Instant::now(),
            );
            state.clone()
        };

        let handle = tokio::spawn(tracker_loop(ctx, cancel_token.clone()));
        *running = Some(RunningLoop {
            handle,
            cancel_token,
        });

        info!(
            "Tracker started (interval {:?}, source {})",
            self.interval,
            self.source.describe()
        );
        Ok(snapshot)
    }

    /// Cancels future ticks and waits for a tick already in progress to be
    /// stored. No-op when stopped.
    /// The state is stopped even when the loop task ended in a panic.
    pub async fn stop(&self) -> Result<TrackerState> {
        let taken = self.running.lock().await.take();

        let was_running = taken.is_some();
        let joined = match taken {
            Some(RunningLoop {
                handle,
                cancel_token,
            }) => {
                cancel_token.cancel();
                handle.await
            }
            None => Ok(()),
        };

        let state = {
            let mut state = self.state.lock().await;
            state.stop();
            state.clone()
        };

        joined.context("tracker loop task failed to join")?;
        if was_running {
            info!("Tracker stopped");
        }
        Ok(state)
    }

    /// Toggles between running and stopped, returning the new state.
    pub async fn toggle(&self) -> Result<TrackerState> {
        if self.running.lock().await.is_some() {
            self.stop().await
        } else {
            self.start().await
        }
    }

    /// Every stored capture, newest first.
    pub async fn refresh(&self) -> Result<Vec<CaptureRecord>> {
        self.db.list_captures_desc().await
    }
}
