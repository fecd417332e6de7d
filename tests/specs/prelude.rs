//! Shared harness for the behavioral specs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use verdict_core::test_support;
use verdict_core::{Analyzer, Job, SystemClock};
use verdict_engine::{FakeRegistry, FakeUserDirectory, JobService, ServiceConfig};
use verdict_store::{MemoryAttachmentStore, MemoryStore};

pub type SpecService =
    JobService<MemoryStore, MemoryAttachmentStore, FakeRegistry, FakeUserDirectory, SystemClock>;

/// The spec user; belongs to `org-test`, as do all analyzers built by
/// `verdict_core::test_support::analyzer`.
pub const USER: &str = "user-1";

pub struct Harness {
    pub service: SpecService,
    pub store: Arc<MemoryStore>,
    pub registry: FakeRegistry,
}

pub fn harness(config: ServiceConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let registry = FakeRegistry::new();
    let users = FakeUserDirectory::new();
    users.insert(USER, "org-test");

    let service = JobService::new(
        Arc::clone(&store),
        Arc::new(MemoryAttachmentStore::new()),
        Arc::new(registry.clone()),
        Arc::new(users),
        SystemClock,
        config,
    );
    Harness {
        service,
        store,
        registry,
    }
}

/// Write an executable `/bin/sh` analyzer script and return its path.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Register an analyzer whose definition runs the given script body.
pub fn script_analyzer(h: &Harness, id: &str, dir: &Path, body: &str) -> Analyzer {
    let cmd = write_script(dir, &format!("{id}.sh"), body);
    let analyzer = test_support::analyzer(id);
    let definition = test_support::definition(&analyzer.analyzer_definition_id, &cmd);
    h.registry.insert_analyzer(analyzer.clone());
    h.registry.insert_definition(definition);
    analyzer
}

/// Poll the read path until the job reaches a terminal state.
pub async fn wait_terminal(h: &Harness, job_id: &str) -> Job {
    for _ in 0..500 {
        let job = h.service.get_for_user(USER, job_id).await.unwrap();
        if job.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not reach a terminal state");
}
