// tests/store_idempotent.rs
//
// Persistence guarantees of the posts table: first write wins, batches are
// atomic, the schema survives reopening, and reads tolerate foreign rows.

use chrono::NaiveDate;
use quant_oracle::store::PostFilter;
use quant_oracle::{ChainSignal, EnrichedRecord, PostStore, WriteOutcome};

fn rec(id: &str, source: &str, sentiment: f64) -> EnrichedRecord {
    EnrichedRecord {
        id: id.into(),
        source: source.into(),
        title: format!("{source} post {id}"),
        score: 10,
        sentiment,
        chain_signal: ChainSignal::Normal,
        ingested_at: None,
    }
}

#[tokio::test]
async fn same_batch_twice_adds_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let store = PostStore::open(&dir.path().join("oracle.db")).await.unwrap();
    let batch = vec![rec("x1", "ethereum", 0.2), rec("x2", "ethereum", -0.1)];

    assert_eq!(
        store.insert_batch(&batch).await,
        WriteOutcome::Written {
            attempted: 2,
            inserted: 2
        }
    );
    assert_eq!(
        store.insert_batch(&batch).await,
        WriteOutcome::Written {
            attempted: 2,
            inserted: 0
        }
    );
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn duplicate_ids_within_a_batch_keep_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = PostStore::open(&dir.path().join("oracle.db")).await.unwrap();

    let out = store
        .insert_batch(&[rec("dup", "quant", 0.9), rec("dup", "python", -0.9)])
        .await;
    assert_eq!(out.inserted(), 1);

    let rows = store.load_posts(PostFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].subreddit, "quant");
    assert_eq!(rows[0].sentiment, 0.9);
}

#[tokio::test]
async fn schema_and_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("oracle.db");

    let store = PostStore::open(&path).await.unwrap();
    store.insert_batch(&[rec("keep", "quant", 0.0)]).await;
    store.close().await;

    let again = PostStore::open(&path).await.unwrap();
    assert_eq!(again.count().await.unwrap(), 1);
}

#[tokio::test]
async fn failed_batch_leaves_no_partial_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = PostStore::open(&dir.path().join("oracle.db")).await.unwrap();

    // Make the last insert fail so the whole transaction must roll back.
    sqlx::query(
        "CREATE TRIGGER reject_poison BEFORE INSERT ON posts \
         WHEN NEW.id = 'poison' BEGIN SELECT RAISE(ABORT, 'poisoned row'); END",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let out = store
        .insert_batch(&[rec("ok1", "quant", 0.1), rec("ok2", "quant", 0.2), rec("poison", "quant", 0.3)])
        .await;
    assert!(!out.is_written());
    match out {
        WriteOutcome::Failed { error } => assert!(error.contains("poisoned row"), "{error}"),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn feed_is_newest_first_and_explicit_timestamps_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store = PostStore::open(&dir.path().join("oracle.db")).await.unwrap();

    let at = |d: u32| {
        NaiveDate::from_ymd_opt(2024, 5, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    };
    let mut old = rec("old", "quant", 0.1);
    old.ingested_at = Some(at(1));
    let mut new = rec("new", "quant", 0.1);
    new.ingested_at = Some(at(3));
    store.insert_batch(&[old, new]).await;

    let rows = store.load_posts(PostFilter::default()).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["new", "old"]);
    assert_eq!(rows[1].timestamp, at(1));
}

#[tokio::test]
async fn rows_with_nulls_and_unknown_labels_still_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = PostStore::open(&dir.path().join("oracle.db")).await.unwrap();

    sqlx::query("INSERT INTO posts (id, chain_signal) VALUES ('legacy', 'MEGA_WHALE')")
        .execute(store.pool())
        .await
        .unwrap();

    let rows = store.load_posts(PostFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "");
    assert_eq!(rows[0].sentiment, 0.0);
    assert_eq!(rows[0].signal(), None);
}
