use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{parse_checksum, parse_optional_datetime, to_sql_error},
    models::{CaptureRecord, CaptureSummary, NewCapture},
    Database,
};

const SELECT_CAPTURE: &str =
    "SELECT id, image, similarity, hash_sum, phash, captured_at FROM images";
const SELECT_SUMMARY: &str =
    "SELECT id, length(image), similarity, hash_sum, phash, captured_at FROM images";

fn capture_from_row(row: &Row<'_>) -> rusqlite::Result<CaptureRecord> {
    let checksum = parse_checksum(row.get_ref(3)?).map_err(to_sql_error)?;
    let captured_at = parse_optional_datetime(row.get(5)?, "captured_at").map_err(to_sql_error)?;

    Ok(CaptureRecord {
        id: row.get(0)?,
        image: row.get(1)?,
        similarity: row.get(2)?,
        checksum,
        phash: row.get(4)?,
        captured_at,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<CaptureSummary> {
    let checksum = parse_checksum(row.get_ref(3)?).map_err(to_sql_error)?;
    let captured_at = parse_optional_datetime(row.get(5)?, "captured_at").map_err(to_sql_error)?;
    let size_bytes: i64 = row.get(1)?;

    Ok(CaptureSummary {
        id: row.get(0)?,
        size_bytes: u64::try_from(size_bytes).unwrap_or_default(),
        similarity: row.get(2)?,
        checksum,
        phash: row.get(4)?,
        captured_at,
    })
}

/// SQLite reads a negative LIMIT as "no limit".
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX))
}

impl Database {
    /// Appends a capture and returns the id the store assigned to it.
    pub async fn append_capture(&self, capture: NewCapture) -> Result<i64> {
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO images (image, similarity, hash_sum, phash, captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    capture.image,
                    capture.similarity,
                    capture.checksum.to_string(),
                    capture.phash,
                    capture.captured_at.to_rfc3339(),
                ],
            )
            .context("failed to insert capture")?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Image bytes of the newest capture, if any.
    pub async fn latest_image(&self) -> Result<Option<Vec<u8>>> {
        self.execute(|conn| {
            conn.query_row(
                "SELECT image FROM images ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .context("failed to load latest image")
        })
        .await
    }

    /// Every capture, newest first.
    pub async fn list_captures_desc(&self) -> Result<Vec<CaptureRecord>> {
        self.list_recent_captures(None).await
    }

    /// Newest-first listing, cut after `limit` rows when given.
    pub async fn list_recent_captures(&self, limit: Option<usize>) -> Result<Vec<CaptureRecord>> {
        let limit = sql_limit(limit);
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_CAPTURE} ORDER BY id DESC LIMIT ?1"))?;
            let rows = stmt.query_map(params![limit], capture_from_row)?;

            let mut captures = Vec::new();
            for row in rows {
                captures.push(row.context("failed to read capture row")?);
            }
            Ok(captures)
        })
        .await
    }

    /// Newest-first metadata without image bytes.
    pub async fn list_capture_summaries(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<CaptureSummary>> {
        let limit = sql_limit(limit);
        self.execute(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_SUMMARY} ORDER BY id DESC LIMIT ?1"))?;
            let rows = stmt.query_map(params![limit], summary_from_row)?;

            let mut summaries = Vec::new();
            for row in rows {
                summaries.push(row.context("failed to read capture summary")?);
            }
            Ok(summaries)
        })
        .await
    }

    pub async fn get_capture(&self, id: i64) -> Result<Option<CaptureRecord>> {
        self.execute(move |conn| {
            conn.query_row(
                &format!("{SELECT_CAPTURE} WHERE id = ?1"),
                params![id],
                capture_from_row,
            )
            .optional()
            .with_context(|| format!("failed to load capture {id}"))
        })
        .await
    }

    pub async fn count_captures(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))?;
            Ok(u64::try_from(count).unwrap_or_default())
        })
        .await
    }
}
