//! End-to-end tests of the three-phase export protocol

use std::time::Duration;

use entryflow::core::export::{ExportFilter, ExportSettings};
use entryflow::EngineError;

use crate::common::fixtures::{operator, other_operator, seed_entries, ExportRig};

fn settings(batch_size: usize) -> ExportSettings {
    ExportSettings {
        batch_size,
        ..ExportSettings::default()
    }
}

#[tokio::test]
async fn test_full_protocol_over_250_rows() {
    let rig = ExportRig::new(settings(100)).await;
    seed_entries(&rig.dataset, 250);

    let started = rig
        .exporter
        .start(&operator(), ExportFilter::default())
        .await
        .unwrap();
    assert_eq!(started.total, 250);

    let s1 = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
    assert_eq!((s1.processed, s1.done), (100, false));

    let s2 = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
    assert_eq!((s2.processed, s2.done), (200, false));

    let s3 = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
    assert_eq!((s3.processed, s3.done), (250, true));

    // Extra batch calls after completion change nothing.
    let s4 = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
    assert_eq!((s4.processed, s4.done), (250, true));

    let (_, bytes) = rig
        .exporter
        .download(&operator(), &started.job_id)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert_eq!(text.lines().count(), 251); // header + 250 rows
}

#[tokio::test]
async fn test_exhausted_call_budget_stops_after_one_row_per_call() {
    // A zero budget is exhausted before the second row of every call, so
    // the protocol degrades to one row of progress per batch but must
    // still terminate cleanly and produce a duplicate-free artifact.
    let rig = ExportRig::new(ExportSettings {
        call_budget: Duration::ZERO,
        batch_size: 100,
        ..ExportSettings::default()
    })
    .await;
    seed_entries(&rig.dataset, 3);

    let started = rig
        .exporter
        .start(&operator(), ExportFilter::default())
        .await
        .unwrap();

    let mut progress = Vec::new();
    loop {
        let status = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
        progress.push((status.processed, status.done));
        if status.done {
            break;
        }
        assert!(progress.len() < 10, "export failed to terminate");
    }
    assert_eq!(progress, vec![(1, false), (2, false), (3, true)]);

    let (_, bytes) = rig
        .exporter
        .download(&operator(), &started.job_id)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let rows: Vec<&str> = text
        .trim_start_matches('\u{feff}')
        .lines()
        .skip(1)
        .collect();
    assert_eq!(rows.len(), 3);
    let mut unique: Vec<&str> = rows.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 3, "artifact contains duplicate rows");
}

#[tokio::test]
async fn test_empty_result_creates_no_job() {
    let rig = ExportRig::default().await;

    let err = rig
        .exporter
        .start(&operator(), ExportFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyExport(_)));
    assert!(rig.jobs.is_empty());
}

#[tokio::test]
async fn test_expired_job_reads_as_not_found() {
    let rig = ExportRig::new(ExportSettings {
        job_ttl: Duration::ZERO,
        ..ExportSettings::default()
    })
    .await;
    seed_entries(&rig.dataset, 10);

    let started = rig
        .exporter
        .start(&operator(), ExportFilter::default())
        .await
        .unwrap();

    let err = rig
        .exporter
        .batch(&operator(), &started.job_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn test_other_operator_cannot_touch_job() {
    let rig = ExportRig::default().await;
    seed_entries(&rig.dataset, 10);

    let started = rig
        .exporter
        .start(&operator(), ExportFilter::default())
        .await
        .unwrap();

    let err = rig
        .exporter
        .batch(&other_operator(), &started.job_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = rig
        .exporter
        .download(&other_operator(), &started.job_id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    // The owner is unaffected.
    rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
}

#[tokio::test]
async fn test_rows_inserted_mid_export_never_appear() {
    let rig = ExportRig::new(settings(100)).await;
    seed_entries(&rig.dataset, 150);

    let started = rig
        .exporter
        .start(&operator(), ExportFilter::default())
        .await
        .unwrap();

    let s1 = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
    assert_eq!(s1.processed, 100);

    // New submissions arrive while the export is in flight; their ids are
    // above the scan cursor and must not show up.
    seed_entries(&rig.dataset, 50);

    let s2 = rig.exporter.batch(&operator(), &started.job_id).await.unwrap();
    assert_eq!((s2.processed, s2.done), (150, true));

    let (_, bytes) = rig
        .exporter
        .download(&operator(), &started.job_id)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 151);
}

#[tokio::test]
async fn test_form_filter_restricts_rows() {
    let rig = ExportRig::default().await;
    seed_entries(&rig.dataset, 5);
    let mut other = crate::common::fixtures::entry(2, "active");
    other
        .meta
        .insert("email".to_string(), "z@example.com".to_string());
    rig.dataset.insert(other);

    let filter = ExportFilter {
        form_id: Some(2),
        ..ExportFilter::default()
    };
    let started = rig.exporter.start(&operator(), filter).await.unwrap();
    assert_eq!(started.total, 1);
}
