// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job service: wiring and the execution pipeline.
//!
//! `submit` returns as soon as the Waiting job row exists; execution
//! runs as a supervised detached task whose only observable result is
//! the persisted job state.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ServiceConfig;
use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::runner::{ProcessRunner, RunError};
use verdict_core::{Clock, Job, JobStatus, SubmissionFields};
use verdict_store::{AttachmentStore, DocStore};

/// The submission/execution/read core of the analyzer-dispatch service.
pub struct JobService<S, B, R, U, C> {
    pub(crate) store: Arc<S>,
    pub(crate) attachments: Arc<B>,
    pub(crate) registry: Arc<R>,
    pub(crate) users: Arc<U>,
    pub(crate) clock: C,
    pub(crate) config: ServiceConfig,
    pub(crate) runner: ProcessRunner,
}

impl<S, B, R, U, C: Clone> Clone for JobService<S, B, R, U, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            attachments: Arc::clone(&self.attachments),
            registry: Arc::clone(&self.registry),
            users: Arc::clone(&self.users),
            clock: self.clock.clone(),
            config: self.config.clone(),
            runner: self.runner.clone(),
        }
    }
}

impl<S, B, R, U, C> JobService<S, B, R, U, C>
where
    S: DocStore,
    B: AttachmentStore,
    R: AnalyzerRegistry,
    U: UserDirectory,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        attachments: Arc<B>,
        registry: Arc<R>,
        users: Arc<U>,
        clock: C,
        config: ServiceConfig,
    ) -> Self {
        let runner = ProcessRunner::new(config.pool_size, config.timeout);
        Self {
            store,
            attachments,
            registry,
            users,
            clock,
            config,
            runner,
        }
    }

    /// Submit an observable to an analyzer on behalf of a user.
    ///
    /// Resolves the analyzer within the user's organisation, parses the
    /// submission fields (both accepted shapes), and delegates to
    /// [`create`](Self::create). Errors here are returned to the caller;
    /// once a job exists, every later fault is recorded on it instead.
    pub async fn submit(
        &self,
        user_id: &str,
        analyzer_id: &str,
        fields: &Value,
    ) -> Result<Job, JobError> {
        let organization = self.users.organization(user_id).await?;
        let analyzer = self.registry.get(analyzer_id).await?;
        if analyzer.organization != organization {
            // Out-of-organisation analyzers are invisible, not forbidden.
            return Err(JobError::NotFound(format!("analyzer {analyzer_id}")));
        }
        let fields = SubmissionFields::parse(fields)?;
        self.create(&analyzer, fields).await
    }

    /// Kick off execution of a Waiting job as a supervised detached task.
    ///
    /// The inner task runs the pipeline; the supervisor awaits its join
    /// handle and finalises the job as Failure if the task panicked, so
    /// an admitted job always reaches a terminal state.
    pub(crate) fn spawn_execution(&self, job: Job) {
        let job_id = job.id.clone();
        let inner = {
            let service = self.clone();
            tokio::spawn(async move { service.execute(job).await })
        };

        let service = self.clone();
        tokio::spawn(async move {
            if let Err(join_err) = inner.await {
                tracing::error!(job_id = %job_id, error = %join_err, "job execution task died");
                let end = service
                    .end_job(
                        &job_id,
                        JobStatus::Failure,
                        Some(format!("job execution task died: {join_err}")),
                        None,
                    )
                    .await;
                if let Err(e) = end {
                    tracing::error!(job_id = %job_id, error = %e, "failed to record task death");
                }
            }
        });
    }

    /// Drive one job through claim → input → run → ingest.
    pub(crate) async fn execute(&self, job: Job) {
        let job = match self.start_job(&job.id).await {
            Ok(Some(job)) => job,
            Ok(None) => return, // claimed by another runner, or already past Waiting
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "could not start job");
                return;
            }
        };

        if let Err(e) = self.run_and_ingest(&job).await {
            let message = e.to_string();
            tracing::warn!(job_id = %job.id, error = %message, "job failed");
            if let Err(end_err) = self
                .end_job(&job.id, JobStatus::Failure, Some(message), None)
                .await
            {
                tracing::error!(job_id = %job.id, error = %end_err, "failed to record job failure");
            }
        }
    }

    async fn run_and_ingest(&self, job: &Job) -> Result<(), JobError> {
        let definition = self.registry.definition(&job.analyzer_definition_id).await?;
        let analyzer = self.registry.get(&job.analyzer_id).await?;

        // `staged` owns the materialised attachment file; keep it alive
        // until the analyzer has exited.
        let staged = self.stage_input(job, &analyzer, &definition).await?;
        let input = serde_json::to_string(&staged.doc)
            .map_err(|e| JobError::AnalyzerExecution(format!("input encoding: {e}")))?;

        let output = match self
            .runner
            .run(&definition.cmd, &definition.base_directory, &input)
            .await
        {
            Ok(output) => output,
            Err(RunError::Timeout) => {
                self.end_job(&job.id, JobStatus::Failure, Some("timeout".to_string()), None)
                    .await?;
                return Ok(());
            }
            Err(e) => {
                self.end_job(&job.id, JobStatus::Failure, Some(e.to_string()), None)
                    .await?;
                return Ok(());
            }
        };

        self.ingest_output(job, &output).await
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
