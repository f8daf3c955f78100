use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::capture::hamming_distance;
use crate::db::CaptureSummary;

/// One line of the newest-first capture listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListingRow {
    /// 1-based position, newest first.
    pub row: usize,
    pub id: i64,
    pub similarity: f64,
    pub checksum: i64,
    pub size_bytes: u64,
    pub captured_at: Option<DateTime<Utc>>,
    pub phash: Option<String>,
    /// Perceptual distance to the capture taken just before this one; `None`
    /// for the oldest stored capture or when either hash is missing.
    pub phash_distance: Option<u32>,
}

/// Rows fetched for a listing of `limit` rows: one extra so the last shown
/// row still has an older neighbour to compare against.
pub fn rows_to_fetch(limit: Option<usize>) -> Option<usize> {
    limit.map(|n| n.saturating_add(1))
}

/// Builds newest-first rows from `summaries` (newest first, possibly holding
/// the extra row from [`rows_to_fetch`]), keeping at most `limit`.
pub fn build_listing(summaries: &[CaptureSummary], limit: Option<usize>) -> Vec<ListingRow> {
    let shown = limit.map_or(summaries.len(), |n| n.min(summaries.len()));

    summaries[..shown]
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let older = summaries.get(index + 1).and_then(|r| r.phash.as_deref());
            let phash_distance = match (record.phash.as_deref(), older) {
                (Some(current), Some(previous)) => hamming_distance(current, previous),
                _ => None,
            };

            ListingRow {
                row: index + 1,
                id: record.id,
                similarity: record.similarity,
                checksum: record.checksum,
                size_bytes: record.size_bytes,
                captured_at: record.captured_at,
                phash: record.phash.clone(),
                phash_distance,
            }
        })
        .collect()
}

pub fn format_row(row: &ListingRow) -> String {
    let captured_at = row
        .captured_at
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".into());
    let distance = row
        .phash_distance
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".into());

    format!(
        "{:>4}  #{:<6} {}  similarity {:>12.3}  hash sum {:>12}  {:>9} B  phash Δ {}",
        row.row, row.id, captured_at, row.similarity, row.checksum, row.size_bytes, distance
    )
}
