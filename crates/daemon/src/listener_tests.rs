// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::ErrorKind;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;
use verdict_engine::ServiceConfig;

fn write_analyzer(dir: &Path, id: &str, script_body: &str) {
    use std::os::unix::fs::PermissionsExt;
    let cmd = dir.join(format!("{id}.sh"));
    std::fs::write(&cmd, format!("#!/bin/sh\n{script_body}\n")).unwrap();
    std::fs::set_permissions(&cmd, std::fs::Permissions::from_mode(0o755)).unwrap();

    let file = json!({
        "analyzer": {
            "id": id,
            "name": format!("{id}-name"),
            "organization": "org-a",
            "analyzerDefinitionId": format!("{id}-def"),
        },
        "definition": {
            "id": format!("{id}-def"),
            "cmd": cmd,
            "baseDirectory": dir,
        }
    });
    std::fs::write(
        dir.join(format!("{id}.json")),
        serde_json::to_string(&file).unwrap(),
    )
    .unwrap();
}

fn service_with(dir: &Path) -> Arc<DaemonService> {
    let registry = FileRegistry::load(dir).unwrap();
    Arc::new(verdict_engine::JobService::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryAttachmentStore::new()),
        Arc::new(registry),
        Arc::new(StaticUsers::new(HashMap::from([(
            "alice".to_string(),
            "org-a".to_string(),
        )]))),
        verdict_core::SystemClock,
        ServiceConfig::default(),
    ))
}

async fn submitted_job_id(service: &DaemonService, data: &str) -> String {
    let response = handle_request(
        Request::Submit {
            user: "alice".to_string(),
            analyzer_id: "echo".to_string(),
            fields: json!({"dataType": "ip", "data": data}),
        },
        service,
    )
    .await;
    match response {
        Response::Job { job } => job["id"].as_str().unwrap().to_string(),
        other => panic!("unexpected response: {other:?}"),
    }
}

async fn wait_success(service: &DaemonService, job_id: &str) {
    for _ in 0..500 {
        let response = handle_request(
            Request::GetJob {
                user: "alice".to_string(),
                job_id: job_id.to_string(),
            },
            service,
        )
        .await;
        if let Response::Job { job } = &response {
            match job["status"].as_str() {
                Some("Success") => return,
                Some("Failure") | Some("Deleted") => {
                    panic!("job ended badly: {job}")
                }
                _ => {}
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never succeeded");
}

#[tokio::test]
async fn ping_pongs_with_a_version() {
    let dir = tempdir().unwrap();
    let service = service_with(dir.path());
    let response = handle_request(Request::Ping, &service).await;
    assert!(matches!(response, Response::Pong { version } if !version.is_empty()));
}

#[tokio::test]
async fn submit_get_report_artifacts_round_trip() {
    let dir = tempdir().unwrap();
    write_analyzer(
        dir.path(),
        "echo",
        r#"cat > /dev/null
echo '{"success":true,"full":{"verdict":"clean"},"summary":{"tag":"ok"},"artifacts":[{"type":"domain","value":"x.example"}]}'"#,
    );
    let service = service_with(dir.path());

    let job_id = submitted_job_id(&service, "1.2.3.4").await;
    wait_success(&service, &job_id).await;

    let response = handle_request(
        Request::GetReport {
            user: "alice".to_string(),
            job_id: job_id.clone(),
        },
        &service,
    )
    .await;
    let Response::Report { report } = response else {
        panic!("expected report");
    };
    assert!(report.full.contains("clean"));

    let response = handle_request(
        Request::ListArtifacts {
            user: "alice".to_string(),
            job_id: job_id.clone(),
            range: Some("all".to_string()),
        },
        &service,
    )
    .await;
    let Response::Artifacts { artifacts, total } = response else {
        panic!("expected artifacts");
    };
    assert_eq!(total, 1);
    assert_eq!(artifacts[0].data_type, "domain");

    let response = handle_request(
        Request::ListJobs {
            user: "alice".to_string(),
            data_type: None,
            data: None,
            analyzer: None,
            range: Some("all".to_string()),
        },
        &service,
    )
    .await;
    let Response::Jobs { jobs, total } = response else {
        panic!("expected jobs");
    };
    assert_eq!(total, 1);
    assert_eq!(jobs[0]["id"].as_str().unwrap(), job_id);
}

#[tokio::test]
async fn unknown_user_maps_to_not_found() {
    let dir = tempdir().unwrap();
    let service = service_with(dir.path());
    let response = handle_request(
        Request::GetJob {
            user: "mallory".to_string(),
            job_id: "whatever".to_string(),
        },
        &service,
    )
    .await;
    assert!(matches!(
        response,
        Response::Error { kind: ErrorKind::NotFound, .. }
    ));
}

#[tokio::test]
async fn bad_submission_maps_to_invalid() {
    let dir = tempdir().unwrap();
    write_analyzer(dir.path(), "echo", "cat > /dev/null");
    let service = service_with(dir.path());

    let response = handle_request(
        Request::Submit {
            user: "alice".to_string(),
            analyzer_id: "echo".to_string(),
            fields: json!({"tlp": 9}),
        },
        &service,
    )
    .await;
    assert!(matches!(
        response,
        Response::Error { kind: ErrorKind::Invalid, .. }
    ));
}

#[tokio::test]
async fn delete_marks_the_job_deleted() {
    let dir = tempdir().unwrap();
    write_analyzer(
        dir.path(),
        "echo",
        r#"cat > /dev/null; echo '{"success":true,"full":{},"summary":{}}'"#,
    );
    let service = service_with(dir.path());
    let job_id = submitted_job_id(&service, "1.2.3.4").await;
    wait_success(&service, &job_id).await;

    let response = handle_request(
        Request::DeleteJob {
            user: "alice".to_string(),
            job_id: job_id.clone(),
        },
        &service,
    )
    .await;
    assert!(matches!(response, Response::Deleted));

    let response = handle_request(
        Request::GetJob {
            user: "alice".to_string(),
            job_id,
        },
        &service,
    )
    .await;
    let Response::Job { job } = response else {
        panic!("expected job");
    };
    assert_eq!(job["status"], "Deleted");
}

#[tokio::test]
async fn connection_handler_serves_one_request() {
    let dir = tempdir().unwrap();
    let service = service_with(dir.path());

    let (client, server) = tokio::net::UnixStream::pair().unwrap();
    let server_task = tokio::spawn(async move {
        handle_connection(server, service.as_ref()).await
    });

    let (mut reader, mut writer) = client.into_split();
    protocol::send(&mut writer, &Request::Ping, IO_DEADLINE)
        .await
        .unwrap();
    let response: Response = protocol::recv(&mut reader, IO_DEADLINE).await.unwrap();
    assert!(matches!(response, Response::Pong { .. }));
    server_task.await.unwrap().unwrap();
}
