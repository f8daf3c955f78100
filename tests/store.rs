use chrono::Utc;
use tempfile::TempDir;
use timetracker_lib::{
    db::{Database, NewCapture},
    tracker::loop_worker::store_encoded,
};

fn open_store() -> (Database, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::new(dir.path().join("captures").join("timetracker.sqlite"))
        .expect("open store");
    (db, dir)
}

fn capture(image: &[u8]) -> NewCapture {
    NewCapture {
        image: image.to_vec(),
        similarity: 0.0,
        checksum: 0,
        phash: None,
        captured_at: Utc::now(),
    }
}

#[tokio::test]
async fn ids_start_at_one_and_have_no_gaps() {
    let (db, _dir) = open_store();

    let mut ids = Vec::new();
    for n in 0..5u8 {
        ids.push(db.append_capture(capture(&[n])).await.unwrap());
    }

    assert_eq!(ids, [1, 2, 3, 4, 5]);
    assert_eq!(db.count_captures().await.unwrap(), 5);
}

#[tokio::test]
async fn listing_is_newest_first() {
    let (db, _dir) = open_store();
    for image in [[1u8], [2], [3]] {
        db.append_capture(capture(&image)).await.unwrap();
    }

    let records = db.list_captures_desc().await.unwrap();
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, [3, 2, 1]);
    assert_eq!(records[0].image, [3]);

    let recent = db.list_recent_captures(Some(2)).await.unwrap();
    let ids: Vec<i64> = recent.iter().map(|r| r.id).collect();
    assert_eq!(ids, [3, 2]);
}

#[tokio::test]
async fn summaries_report_sizes_without_image_bytes() {
    let (db, _dir) = open_store();
    for image in [vec![1u8; 3], vec![2u8; 10], vec![3u8; 7]] {
        db.append_capture(NewCapture {
            checksum: -5,
            phash: Some("AAAAAAAAAAA".into()),
            ..capture(&image)
        })
        .await
        .unwrap();
    }

    let summaries = db.list_capture_summaries(None).await.unwrap();
    let sizes: Vec<(i64, u64)> = summaries.iter().map(|s| (s.id, s.size_bytes)).collect();
    assert_eq!(sizes, [(3, 7), (2, 10), (1, 3)]);
    assert_eq!(summaries[0].checksum, -5);
    assert_eq!(summaries[0].phash.as_deref(), Some("AAAAAAAAAAA"));
    assert!(summaries[0].captured_at.is_some());

    let limited = db.list_capture_summaries(Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[1].id, 2);
}

#[tokio::test]
async fn latest_image_tracks_the_newest_row() {
    let (db, _dir) = open_store();
    assert_eq!(db.latest_image().await.unwrap(), None);

    db.append_capture(capture(&[9, 8, 7])).await.unwrap();
    assert_eq!(db.latest_image().await.unwrap(), Some(vec![9, 8, 7]));

    db.append_capture(capture(&[1])).await.unwrap();
    assert_eq!(db.latest_image().await.unwrap(), Some(vec![1]));
}

#[tokio::test]
async fn fields_round_trip_including_negative_checksum() {
    let (db, _dir) = open_store();
    let captured_at = Utc::now();
    let id = db
        .append_capture(NewCapture {
            image: vec![0xFF, 0xFE],
            similarity: -25400.0,
            checksum: -3,
            phash: Some("abc".into()),
            captured_at,
        })
        .await
        .unwrap();

    let record = db.get_capture(id).await.unwrap().expect("stored row");
    assert_eq!(record.image, [0xFF, 0xFE]);
    assert_eq!(record.similarity, -25400.0);
    assert_eq!(record.checksum, -3);
    assert_eq!(record.phash.as_deref(), Some("abc"));
    assert_eq!(record.captured_at, Some(captured_at));

    assert!(db.get_capture(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn first_capture_scores_zero() {
    let (db, _dir) = open_store();
    let stored = store_encoded(&db, vec![10, 10, 10, 10], Utc::now())
        .await
        .unwrap();

    assert_eq!(stored.id, 1);
    assert_eq!(stored.similarity, 0.0);
    assert_eq!(stored.checksum, 40);
}

#[tokio::test]
async fn identical_captures_score_100() {
    let (db, _dir) = open_store();
    store_encoded(&db, vec![10, 10, 10, 10], Utc::now()).await.unwrap();
    let second = store_encoded(&db, vec![10, 10, 10, 10], Utc::now())
        .await
        .unwrap();

    assert_eq!(second.id, 2);
    assert_eq!(second.similarity, 100.0);

    let stored = db.get_capture(2).await.unwrap().unwrap();
    assert_eq!(stored.similarity, 100.0);
    // not a PNG, so no perceptual hash
    assert_eq!(stored.phash, None);
}

#[tokio::test]
async fn opposite_captures_score_below_zero() {
    let (db, _dir) = open_store();
    store_encoded(&db, vec![0, 0, 0, 0], Utc::now()).await.unwrap();
    let second = store_encoded(&db, vec![255, 255, 255, 255], Utc::now())
        .await
        .unwrap();

    assert_eq!(second.similarity, -25400.0);
    assert_eq!(second.checksum, -4);
}

#[tokio::test]
async fn size_change_scores_zero() {
    let (db, _dir) = open_store();
    store_encoded(&db, vec![1, 2, 3], Utc::now()).await.unwrap();
    let second = store_encoded(&db, vec![1, 2, 3, 4], Utc::now())
        .await
        .unwrap();
    assert_eq!(second.similarity, 0.0);
}

#[tokio::test]
async fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timetracker.sqlite");

    {
        let db = Database::new(path.clone()).unwrap();
        db.append_capture(capture(&[4, 2])).await.unwrap();
    }

    let db = Database::new(path).unwrap();
    assert_eq!(db.latest_image().await.unwrap(), Some(vec![4, 2]));
    assert_eq!(db.append_capture(capture(&[1])).await.unwrap(), 2);
}

#[tokio::test]
async fn rows_from_older_builds_are_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE images (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                image BLOB,
                similarity REAL,
                hash_sum TEXT
            );
            INSERT INTO images (image, similarity, hash_sum) VALUES (x'0A0A', 0.0, '20');
            INSERT INTO images (image, similarity, hash_sum) VALUES (x'0A0A', 100.0, 20);",
        )
        .unwrap();
    }

    let db = Database::new(path).unwrap();
    let records = db.list_captures_desc().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, 2);
    assert_eq!(records[0].checksum, 20);
    assert_eq!(records[0].captured_at, None);
    assert_eq!(records[1].similarity, 0.0);
}

#[tokio::test]
async fn in_memory_store_has_no_path() {
    let db = Database::in_memory().unwrap();
    assert!(db.path().is_none());
    assert_eq!(db.append_capture(capture(&[1])).await.unwrap(), 1);
}
