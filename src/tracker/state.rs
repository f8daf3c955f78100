use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    #[default]
    Stopped,
    Running,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    pub status: TrackerStatus,
    pub interval_ms: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub captures_stored: u64,
    pub ticks_failed: u64,
    pub last_capture_id: Option<i64>,
    /// Monotonic start of the current run; `started_at` is for display only.
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.status == TrackerStatus::Running
    }

    /// Counters restart with every run.
    pub fn begin(&mut self, interval_ms: u64, start_at: DateTime<Utc>, now: Instant) {
        *self = Self {
            status: TrackerStatus::Running,
            interval_ms,
            started_at: Some(start_at),
            running_anchor: Some(now),
            ..Self::default()
        };
    }

    /// Keeps the counters of the finished run readable until the next start.
    pub fn stop(&mut self) {
        self.status = TrackerStatus::Stopped;
        self.running_anchor = None;
    }

    pub fn record_stored(&mut self, id: i64) {
        self.captures_stored = self.captures_stored.saturating_add(1);
        self.last_capture_id = Some(id);
    }

    pub fn record_failed(&mut self) {
        self.ticks_failed = self.ticks_failed.saturating_add(1);
    }

    pub fn running_ms(&self) -> u64 {
        match (self.status, self.running_anchor) {
            (TrackerStatus::Running, Some(anchor)) => anchor.elapsed().as_millis() as u64,
            _ => 0,
        }
    }
}
