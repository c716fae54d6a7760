//! Migration loop tests driven through the manager facade

use std::sync::Arc;
use std::time::Duration;

use entryflow::storage::{Dataset, MemoryDataset};
use entryflow::{EngineError, MigrationManager};

use crate::common::fixtures::entry;

fn manager(dataset: Arc<MemoryDataset>) -> MigrationManager {
    MigrationManager::new(dataset as Arc<dyn Dataset>, Duration::from_secs(30))
}

#[tokio::test]
async fn test_backfill_loop_runs_to_completion() {
    let dataset = Arc::new(MemoryDataset::new());
    for _ in 0..250 {
        dataset.insert(entry(1, ""));
    }
    for _ in 0..50 {
        dataset.insert(entry(1, "active"));
    }
    let manager = manager(Arc::clone(&dataset));

    let before = manager
        .get_migration_status("entry_status_backfill")
        .await
        .unwrap();
    assert_eq!(before.total, 300);
    assert_eq!(before.pending, 250);
    assert!(!before.is_complete);

    // Drive the batch loop the way a polling client would.
    let mut batch_number = 1;
    loop {
        let result = manager
            .run_migration("entry_status_backfill", batch_number)
            .await
            .unwrap();
        assert!(result.success);
        if !result.has_more {
            break;
        }
        batch_number += 1;
    }
    // 250 pending rows at the built-in batch size of 200 takes two calls.
    assert_eq!(batch_number, 2);

    let after = manager
        .get_migration_status("entry_status_backfill")
        .await
        .unwrap();
    assert_eq!(after.pending, 0);
    assert!(after.is_complete);
    assert_eq!(after.percent, 100.0);
}

#[tokio::test]
async fn test_exhausted_call_budget_backfills_one_row_per_call() {
    // With a zero budget every call stops after its first row, so the
    // loop still drains the pending set, one entry at a time.
    let dataset = Arc::new(MemoryDataset::new());
    for _ in 0..3 {
        dataset.insert(entry(1, ""));
    }
    let manager = MigrationManager::new(Arc::clone(&dataset) as Arc<dyn Dataset>, Duration::ZERO);

    let mut calls = 0;
    loop {
        let result = manager
            .run_migration("entry_status_backfill", calls + 1)
            .await
            .unwrap();
        calls += 1;
        assert!(result.success);
        assert_eq!(result.processed, 1);
        if !result.has_more {
            break;
        }
        assert!(calls < 10, "backfill failed to terminate");
    }
    assert_eq!(calls, 3);

    let after = manager
        .get_migration_status("entry_status_backfill")
        .await
        .unwrap();
    assert_eq!(after.pending, 0);
    assert!(after.is_complete);
}

#[tokio::test]
async fn test_expansion_precondition_blocks_execution() {
    let dataset = Arc::new(MemoryDataset::without_meta_store());
    dataset.insert(entry(1, "active"));
    let manager = manager(dataset);

    let err = manager
        .can_run_migration("field_meta_expansion")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));

    // Execution performs the same check.
    let err = manager
        .run_migration("field_meta_expansion", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_expansion_quarantines_bad_rows_and_finishes() {
    let dataset = Arc::new(MemoryDataset::new());
    let mut good = entry(1, "active");
    good.raw_fields = Some(r#"{"email":"ada@example.com"}"#.to_string());
    let good_id = dataset.insert(good);

    let mut bad = entry(1, "active");
    bad.raw_fields = Some("{broken".to_string());
    let bad_id = dataset.insert(bad);

    let manager = manager(Arc::clone(&dataset));
    let result = manager
        .run_migration("field_meta_expansion", 1)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.processed, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.has_more);

    let good = dataset.get(good_id).unwrap();
    assert_eq!(good.meta.get("email").unwrap(), "ada@example.com");

    let bad = dataset.get(bad_id).unwrap();
    assert!(bad.meta.contains_key("_expansion_error"));

    // A second run finds nothing left to do.
    let result = manager
        .run_migration("field_meta_expansion", 2)
        .await
        .unwrap();
    assert_eq!(result.processed, 0);
    assert!(!result.has_more);
}

#[tokio::test]
async fn test_unknown_migration_is_not_found() {
    let manager = manager(Arc::new(MemoryDataset::new()));

    let err = manager.get_migration_status("nope").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = manager.run_migration("nope", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn test_listing_is_ordered_for_display() {
    let manager = manager(Arc::new(MemoryDataset::new()));
    let keys: Vec<&str> = manager.get_migrations().iter().map(|d| d.key).collect();
    assert_eq!(keys, vec!["entry_status_backfill", "field_meta_expansion"]);
}
