//! Capture data models.
//!
//! A capture is one encoded screenshot plus what was computed about it at
//! capture time. Rows are append-only; nothing here is ever updated.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A capture that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewCapture {
    pub image: Vec<u8>,
    pub similarity: f64,
    pub checksum: i64,
    pub phash: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// A stored capture, as read back from the `images` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub id: i64,
    #[serde(skip)]
    pub image: Vec<u8>,
    pub similarity: f64,
    pub checksum: i64,
    pub phash: Option<String>,
    /// Absent on rows written before the column existed.
    pub captured_at: Option<DateTime<Utc>>,
}

/// Listing view of a stored capture: the image is reduced to its size and
/// never read from disk.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSummary {
    pub id: i64,
    pub similarity: f64,
    pub checksum: i64,
    pub size_bytes: u64,
    pub phash: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
}
