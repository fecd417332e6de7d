// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::config::ServiceConfig;
use crate::registry::{FakeRegistry, FakeUserDirectory};
use crate::service::JobService;
use verdict_core::test_support;
use verdict_core::{Analyzer, FakeClock, Job, JobSpec, JobStatus, Observable, SequentialIdGen, Tlp};
use verdict_store::{DocStore, MemoryAttachmentStore, MemoryStore, JOB_KIND};

/// Convenience alias for the fully-typed test service.
pub(crate) type TestService =
    JobService<MemoryStore, MemoryAttachmentStore, FakeRegistry, FakeUserDirectory, FakeClock>;

/// Test context holding the service and its fakes.
pub(crate) struct TestContext {
    pub service: TestService,
    pub store: Arc<MemoryStore>,
    pub attachments: Arc<MemoryAttachmentStore>,
    pub registry: FakeRegistry,
    pub users: FakeUserDirectory,
    pub clock: FakeClock,
}

pub(crate) fn setup() -> TestContext {
    setup_with(ServiceConfig::default())
}

/// Build a service around deterministic fakes; `user-1` belongs to
/// `org-test`, matching [`verdict_core::test_support::analyzer`].
pub(crate) fn setup_with(config: ServiceConfig) -> TestContext {
    let clock = FakeClock::new();
    let store = Arc::new(MemoryStore::deterministic(
        SequentialIdGen::new("doc"),
        clock.clone(),
    ));
    let attachments = Arc::new(MemoryAttachmentStore::new());
    let registry = FakeRegistry::new();
    let users = FakeUserDirectory::new();
    users.insert("user-1", "org-test");

    let service = JobService::new(
        Arc::clone(&store),
        Arc::clone(&attachments),
        Arc::new(registry.clone()),
        Arc::new(users.clone()),
        clock.clone(),
        config,
    );
    TestContext {
        service,
        store,
        attachments,
        registry,
        users,
        clock,
    }
}

/// Write an executable `/bin/sh` analyzer script and return its path.
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Register an analyzer whose definition runs the given script body.
pub(crate) fn register_script_analyzer(
    ctx: &TestContext,
    id: &str,
    dir: &Path,
    script_body: &str,
) -> Analyzer {
    let cmd = write_script(dir, &format!("{id}.sh"), script_body);
    let analyzer = test_support::analyzer(id);
    let definition = test_support::definition(&analyzer.analyzer_definition_id, &cmd);
    ctx.registry.insert_analyzer(analyzer.clone());
    ctx.registry.insert_definition(definition);
    analyzer
}

/// Seed a job row directly in the store, bypassing admission and the
/// execution spawn.
pub(crate) async fn seed_job(
    ctx: &TestContext,
    analyzer: &Analyzer,
    data: &str,
    status: JobStatus,
    start_date: Option<u64>,
) -> Job {
    let spec = JobSpec::new(
        analyzer,
        "ip",
        Observable::data(data),
        Tlp::default(),
        "",
        "{}".to_string(),
    );
    let mut body = serde_json::to_value(&spec).unwrap();
    body["status"] = json!(status);
    if let Some(start) = start_date {
        body["startDate"] = json!(start);
    }
    let doc = ctx.store.create(JOB_KIND, None, body).await.unwrap();
    doc.deserialize().unwrap()
}

/// Poll the store until the job reaches a terminal state.
pub(crate) async fn wait_terminal(ctx: &TestContext, job_id: &str) -> Job {
    for _ in 0..500 {
        let job: Job = ctx
            .store
            .get(JOB_KIND, job_id)
            .await
            .unwrap()
            .deserialize()
            .unwrap();
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state");
}
