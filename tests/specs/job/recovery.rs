//! Startup recovery: Waiting jobs are re-driven exactly once; jobs
//! interrupted mid-run are failed.

use crate::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use verdict_core::{JobSpec, JobStatus, Observable, Tlp};
use verdict_engine::{RecoveryReport, ServiceConfig};
use verdict_store::{DocStore, JOB_KIND};

const SUCCESS_SCRIPT: &str =
    r#"cat > /dev/null; echo '{"success":true,"full":{"ok":true},"summary":{"tag":"ok"}}'"#;

/// Persist a job row directly, as if a previous incarnation had crashed
/// after creating it.
async fn persist_job(h: &Harness, analyzer: &verdict_core::Analyzer, status: JobStatus) -> String {
    let spec = JobSpec::new(
        analyzer,
        "ip",
        Observable::data("1.2.3.4"),
        Tlp::default(),
        "",
        "{}".to_string(),
    );
    let mut body = serde_json::to_value(&spec).unwrap();
    body["status"] = json!(status);
    if status != JobStatus::Waiting {
        body["startDate"] = json!(1_000u64);
    }
    let doc = h.store.create(JOB_KIND, None, body).await.unwrap();
    doc.id
}

#[tokio::test]
async fn waiting_job_is_driven_to_a_terminal_state_exactly_once() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    let analyzer = script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);
    let job_id = persist_job(&h, &analyzer, JobStatus::Waiting).await;

    let report = h.service.recover().await.unwrap();
    assert_eq!(report, RecoveryReport { interrupted: 0, resumed: 1 });

    let done = wait_terminal(&h, &job_id).await;
    assert_eq!(done.status, JobStatus::Success);

    // Idempotent: a second scan changes nothing.
    let report = h.service.recover().await.unwrap();
    assert_eq!(report, RecoveryReport::default());
    let done_again = wait_terminal(&h, &job_id).await;
    assert_eq!(done_again.end_date, done.end_date);
}

#[tokio::test]
async fn interrupted_job_is_failed_at_startup() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    let analyzer = script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);
    let job_id = persist_job(&h, &analyzer, JobStatus::InProgress).await;

    let report = h.service.recover().await.unwrap();
    assert_eq!(report.interrupted, 1);

    let done = wait_terminal(&h, &job_id).await;
    assert_eq!(done.status, JobStatus::Failure);
    assert_eq!(done.message, "job interrupted by service restart");
}

#[tokio::test]
async fn terminal_jobs_are_left_alone() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    let analyzer = script_analyzer(&h, "ana-a", dir.path(), SUCCESS_SCRIPT);

    let job = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "1.2.3.4"}))
        .await
        .unwrap();
    let done = wait_terminal(&h, &job.id).await;

    let report = h.service.recover().await.unwrap();
    assert_eq!(report, RecoveryReport::default());
    let after = h.service.get_for_user(USER, &job.id).await.unwrap();
    assert_eq!(after.status, done.status);
    assert_eq!(after.end_date, done.end_date);
}
