use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of a capture the loop just stored.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredCapture {
    pub id: i64,
    pub similarity: f64,
    pub checksum: i64,
    pub size_bytes: usize,
    pub captured_at: DateTime<Utc>,
}

/// Broadcast to observers after every tick.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    CaptureStored(StoredCapture),
    TickFailed { message: String },
}
