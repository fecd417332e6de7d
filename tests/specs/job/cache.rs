//! Similar-job cache reuse and the force bypass.

use crate::prelude::*;
use serde_json::json;
use std::time::Duration;
use tempfile::tempdir;
use verdict_engine::ServiceConfig;
use verdict_store::{DocStore, Query, JOB_KIND};

const SUCCESS_SCRIPT: &str =
    r#"cat > /dev/null; echo '{"success":true,"full":{"ok":true},"summary":{"tag":"ok"}}'"#;

fn cached_config() -> ServiceConfig {
    ServiceConfig {
        cache: Duration::from_secs(3600),
        ..ServiceConfig::default()
    }
}

#[tokio::test]
async fn identical_submission_within_window_is_served_from_cache() {
    let h = harness(cached_config());
    let dir = tempdir().unwrap();
    script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);
    let payload = json!({"dataType": "ip", "data": "1.2.3.4", "tlp": 2, "parameters": {}});

    let first = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    assert!(!first.from_cache);
    wait_terminal(&h, &first.id).await;

    let second = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    assert_eq!(second.id, first.id);
    assert!(second.from_cache);

    // No new store row, and the stored record never carries the flag.
    assert_eq!(h.store.count(JOB_KIND, &Query::All).await.unwrap(), 1);
    let stored = h.store.get(JOB_KIND, &first.id).await.unwrap();
    assert!(stored.data.get("fromCache").is_none());
}

#[tokio::test]
async fn force_bypasses_the_cache() {
    let h = harness(cached_config());
    let dir = tempdir().unwrap();
    script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);

    let first = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "1.2.3.4"}))
        .await
        .unwrap();
    wait_terminal(&h, &first.id).await;

    let second = h
        .service
        .submit(
            USER,
            "ana-a",
            &json!({"dataType": "ip", "data": "1.2.3.4", "force": true}),
        )
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
    assert!(!second.from_cache);
    assert_eq!(h.store.count(JOB_KIND, &Query::All).await.unwrap(), 2);
    wait_terminal(&h, &second.id).await;
}

#[tokio::test]
async fn zero_cache_disables_reuse() {
    let h = harness(ServiceConfig::default()); // cache = 0
    let dir = tempdir().unwrap();
    script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);
    let payload = json!({"dataType": "ip", "data": "1.2.3.4"});

    let first = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    wait_terminal(&h, &first.id).await;
    let second = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    assert_ne!(second.id, first.id);
    wait_terminal(&h, &second.id).await;
}

#[tokio::test]
async fn failed_jobs_are_not_reused() {
    let h = harness(cached_config());
    let dir = tempdir().unwrap();
    script_analyzer(
        &h,
        "ana-a",
        dir.path(),
        r#"cat > /dev/null; echo '{"success":false,"errorMessage":"down"}'"#,
    );
    let payload = json!({"dataType": "ip", "data": "1.2.3.4"});

    let first = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    let done = wait_terminal(&h, &first.id).await;
    assert_eq!(done.status, verdict_core::JobStatus::Failure);

    let second = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    assert_ne!(second.id, first.id);
    wait_terminal(&h, &second.id).await;
}

#[tokio::test]
async fn repeated_submissions_reuse_a_job_that_has_not_finished() {
    // Even if the first job is still Waiting/InProgress, an identical
    // submission must not enqueue a duplicate.
    let h = harness(cached_config());
    let dir = tempdir().unwrap();
    script_analyzer(
        &h,
        "ana-a",
        dir.path(),
        r#"cat > /dev/null; sleep 1; echo '{"success":true,"full":{},"summary":{}}'"#,
    );
    let payload = json!({"dataType": "ip", "data": "1.2.3.4"});

    let first = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    let second = h.service.submit(USER, "ana-a", &payload).await.unwrap();
    assert_eq!(second.id, first.id);
    assert!(second.from_cache);
    assert_eq!(h.store.count(JOB_KIND, &Query::All).await.unwrap(), 1);
    wait_terminal(&h, &first.id).await;
}
