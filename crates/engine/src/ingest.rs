// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses analyzer stdout into a report plus extracted artifacts, and
//! finalises the job accordingly.
//!
//! Exit codes are recorded upstream but not interpreted here: the
//! `success` field of the output document decides.

use serde_json::{json, Map, Value};

use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::runner::RunOutput;
use crate::service::JobService;
use verdict_core::report::normalise_artifact;
use verdict_core::{Clock, Job, JobStatus};
use verdict_store::{AttachmentStore, DocStore, ARTIFACT_KIND, REPORT_KIND};

/// Cap on diagnostic text recorded for unparseable analyzer output.
const DIAGNOSTIC_LIMIT: usize = 8_192;

impl<S, B, R, U, C> JobService<S, B, R, U, C>
where
    S: DocStore,
    B: AttachmentStore,
    R: AnalyzerRegistry,
    U: UserDirectory,
    C: Clock,
{
    /// Consume one run's output and drive the job to Success or Failure.
    ///
    /// Analyzer faults (unparseable output, `success=false`) finalise
    /// the job and return `Ok`; only store faults propagate.
    pub(crate) async fn ingest_output(
        &self,
        job: &Job,
        output: &RunOutput,
    ) -> Result<(), JobError> {
        let parsed: Value = match serde_json::from_str(&output.stdout) {
            Ok(parsed) => parsed,
            Err(_) => {
                let message = invalid_output_message(&output.stderr, &output.stdout);
                self.end_job(&job.id, JobStatus::Failure, Some(message), None)
                    .await?;
                return Ok(());
            }
        };

        let success = parsed
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            let message = parsed
                .get("errorMessage")
                .and_then(Value::as_str)
                .map(str::to_string);
            let input = parsed
                .get("input")
                .and_then(Value::as_str)
                .map(str::to_string);
            self.end_job(&job.id, JobStatus::Failure, message, input)
                .await?;
            return Ok(());
        }

        let (Some(full), Some(summary)) = (
            parsed.get("full").and_then(Value::as_object),
            parsed.get("summary").and_then(Value::as_object),
        ) else {
            let message = invalid_output_message(
                "successful output is missing the full or summary report",
                &output.stdout,
            );
            self.end_job(&job.id, JobStatus::Failure, Some(message), None)
                .await?;
            return Ok(());
        };

        let artifacts: Vec<Map<String, Value>> = parsed
            .get("artifacts")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        match self.persist_report(job, full, summary, artifacts).await {
            Ok(artifact_count) => {
                tracing::info!(job_id = %job.id, artifacts = artifact_count, "report ingested");
                self.end_job(&job.id, JobStatus::Success, None, None).await?;
            }
            Err(e) => {
                self.end_job(
                    &job.id,
                    JobStatus::Failure,
                    Some(JobError::ReportPersistence(e.to_string()).to_string()),
                    None,
                )
                .await?;
            }
        }
        Ok(())
    }

    /// Create the report and its artifacts. Artifact creations run
    /// concurrently; every one must settle before the job finalises.
    async fn persist_report(
        &self,
        job: &Job,
        full: &Map<String, Value>,
        summary: &Map<String, Value>,
        artifacts: Vec<Map<String, Value>>,
    ) -> Result<usize, JobError> {
        let body = json!({
            "full": Value::Object(full.clone()).to_string(),
            "summary": Value::Object(summary.clone()).to_string(),
        });
        let report = self
            .store
            .create(REPORT_KIND, Some(&job.id), body)
            .await?;

        let mut creations = tokio::task::JoinSet::new();
        for raw in &artifacts {
            let store = std::sync::Arc::clone(&self.store);
            let report_id = report.id.clone();
            let body = Value::Object(normalise_artifact(raw));
            creations.spawn(async move {
                store.create(ARTIFACT_KIND, Some(&report_id), body).await
            });
        }

        // Drain every creation before deciding the outcome.
        let mut first_error: Option<JobError> = None;
        while let Some(settled) = creations.join_next().await {
            match settled {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e.into());
                }
                Err(join_err) => {
                    first_error
                        .get_or_insert(JobError::ReportPersistence(join_err.to_string()));
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(artifacts.len()),
        }
    }
}

/// `"Invalid output\n"` followed by up to 8 KiB of stderr and stdout.
fn invalid_output_message(stderr: &str, stdout: &str) -> String {
    let mut diagnostic = String::with_capacity(stderr.len() + stdout.len() + 1);
    diagnostic.push_str(stderr);
    diagnostic.push('\n');
    diagnostic.push_str(stdout);

    if diagnostic.len() > DIAGNOSTIC_LIMIT {
        let mut cut = DIAGNOSTIC_LIMIT;
        while !diagnostic.is_char_boundary(cut) {
            cut -= 1;
        }
        diagnostic.truncate(cut);
    }

    format!("Invalid output\n{diagnostic}")
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
