//! Per-analyzer sliding-window rate limits.

use crate::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use verdict_core::RateUnit;
use verdict_engine::{JobError, ServiceConfig};
use verdict_store::{DocStore, Query, JOB_KIND};

const SUCCESS_SCRIPT: &str =
    r#"cat > /dev/null; echo '{"success":true,"full":{"ok":true},"summary":{"tag":"ok"}}'"#;

#[tokio::test]
async fn third_submission_in_the_window_is_rejected() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    let mut analyzer = script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);
    analyzer.rate = Some(2);
    analyzer.rate_unit = Some(RateUnit::Day);
    h.registry.insert_analyzer(analyzer);

    let first = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "1.1.1.1"}))
        .await
        .unwrap();
    let second = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "2.2.2.2"}))
        .await
        .unwrap();

    let err = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "3.3.3.3"}))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::RateLimitExceeded { .. }));

    // No third row was created.
    assert_eq!(h.store.count(JOB_KIND, &Query::All).await.unwrap(), 2);

    wait_terminal(&h, &first.id).await;
    wait_terminal(&h, &second.id).await;
}

#[tokio::test]
async fn unlimited_analyzers_are_never_rejected() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);

    let mut ids = Vec::new();
    for i in 0..4 {
        let job = h
            .service
            .submit(
                USER,
                "ana-a",
                &json!({"dataType": "ip", "data": format!("10.0.0.{i}")}),
            )
            .await
            .unwrap();
        ids.push(job.id);
    }
    for id in ids {
        wait_terminal(&h, &id).await;
    }
}
