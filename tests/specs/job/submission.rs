//! String submissions through the full pipeline: stdin document,
//! report ingestion, artifact extraction, and failure recording.

use crate::prelude::*;
use serde_json::{json, Value};
use tempfile::tempdir;
use verdict_engine::ServiceConfig;
use verdict_store::Query;

#[tokio::test]
async fn string_submission_analyzer_success() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    let body = format!(
        r#"cat > "{}/seen-input.json"
echo '{{"success":true,"full":{{"verdict":"clean"}},"summary":{{"tag":"ok"}},"artifacts":[{{"type":"domain","value":"x.example"}}]}}'"#,
        dir.path().display()
    );
    script_analyzer(&h, "ana-a", dir.path(), &body);

    let job = h
        .service
        .submit(
            USER,
            "ana-a",
            &json!({"dataType": "ip", "data": "1.2.3.4", "tlp": 2, "parameters": {}}),
        )
        .await
        .unwrap();

    let done = wait_terminal(&h, &job.id).await;
    assert_eq!(done.status, verdict_core::JobStatus::Success);
    assert!(done.start_date.unwrap() <= done.end_date.unwrap());

    // The analyzer saw exactly the documented stdin shape.
    let seen: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("seen-input.json")).unwrap())
            .unwrap();
    assert_eq!(seen["data"], "1.2.3.4");
    assert_eq!(seen["dataType"], "ip");
    assert_eq!(seen["message"], "");
    assert!(seen["config"].is_object());
    assert!(seen.get("file").is_none());
    assert!(seen.get("filename").is_none());

    // One report, with both documents serialised.
    let report = h.service.get_report(&job.id).await.unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&report.full).unwrap(),
        json!({"verdict": "clean"})
    );
    assert_eq!(
        serde_json::from_str::<Value>(&report.summary).unwrap(),
        json!({"tag": "ok"})
    );

    // One artifact, with keys normalised.
    let (artifacts, total) = h
        .service
        .find_artifacts(USER, &job.id, Query::All, Some("all"), &[])
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(artifacts[0].data_type, "domain");
    assert_eq!(artifacts[0].observable.as_data(), Some("x.example"));
}

#[tokio::test]
async fn analyzer_failure_output_is_recorded() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    script_analyzer(
        &h,
        "ana-a",
        dir.path(),
        r#"cat > /dev/null; echo '{"success":false,"errorMessage":"boom","input":"what it saw"}'"#,
    );

    let job = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "1.2.3.4"}))
        .await
        .unwrap();

    let done = wait_terminal(&h, &job.id).await;
    assert_eq!(done.status, verdict_core::JobStatus::Failure);
    assert_eq!(done.message, "boom");
    assert_eq!(done.input.as_deref(), Some("what it saw"));
    assert!(h.service.get_report(&job.id).await.is_err());
}

#[tokio::test]
async fn unparseable_output_is_recorded_with_diagnostics() {
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    script_analyzer(
        &h,
        "ana-a",
        dir.path(),
        "cat > /dev/null\necho 'not json'\necho 'segfault' >&2",
    );

    let job = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "1.2.3.4"}))
        .await
        .unwrap();

    let done = wait_terminal(&h, &job.id).await;
    assert_eq!(done.status, verdict_core::JobStatus::Failure);
    assert!(done.message.starts_with("Invalid output\n"));
    assert!(done.message.contains("segfault"));
    assert!(done.message.contains("not json"));
    assert!(done.message.len() <= "Invalid output\n".len() + 8192);
}

#[tokio::test]
async fn exit_code_is_not_interpreted() {
    // A nonzero exit with a well-formed success document still succeeds.
    let h = harness(ServiceConfig::default());
    let dir = tempdir().unwrap();
    script_analyzer(
        &h,
        "ana-a",
        dir.path(),
        r#"cat > /dev/null; echo '{"success":true,"full":{},"summary":{}}'; exit 7"#,
    );

    let job = h
        .service
        .submit(USER, "ana-a", &json!({"dataType": "ip", "data": "1.2.3.4"}))
        .await
        .unwrap();
    let done = wait_terminal(&h, &job.id).await;
    assert_eq!(done.status, verdict_core::JobStatus::Success);
}
