// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state transitions and their persistence.
//!
//! State machine: Waiting → InProgress (claimed exactly once per run);
//! InProgress → Success | Failure; any → Deleted (soft). `start_job`
//! uses a zero-retry compare-and-set so two racing runners cannot both
//! claim the same job.

use serde_json::{json, Map, Value};

use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::service::JobService;
use verdict_core::{canonical_params, Analyzer, Clock, Job, JobSpec, JobStatus, SubmissionFields};
use verdict_store::{AttachmentStore, DocStore, StoreError, UpdateOptions, JOB_KIND};

impl<S, B, R, U, C> JobService<S, B, R, U, C>
where
    S: DocStore,
    B: AttachmentStore,
    R: AnalyzerRegistry,
    U: UserDirectory,
    C: Clock,
{
    /// Admit and persist a new job, or return a cached equivalent.
    ///
    /// Resolves as soon as the job row exists — not when execution
    /// completes; completion is observed through stored status.
    pub async fn create(
        &self,
        analyzer: &Analyzer,
        fields: SubmissionFields,
    ) -> Result<Job, JobError> {
        let parameters = canonical_params(&fields.parameters);

        if !fields.force {
            if let Some(previous) = self.find_similar_job(analyzer, &fields, &parameters).await? {
                tracing::info!(
                    job_id = %previous.id,
                    analyzer = %analyzer.id,
                    "serving similar job from cache"
                );
                return Ok(previous);
            }
        }

        if !self.is_under_rate_limit(analyzer).await? {
            return Err(JobError::RateLimitExceeded {
                analyzer: analyzer.id.clone(),
                rate: analyzer.rate.unwrap_or_default(),
                unit: analyzer.rate_unit.unwrap_or(verdict_core::RateUnit::Day),
            });
        }

        let spec = JobSpec::new(
            analyzer,
            fields.data_type,
            fields.observable,
            fields.tlp,
            fields.message,
            parameters,
        );
        let body =
            serde_json::to_value(&spec).map_err(|e| StoreError::Backend(e.to_string()))?;
        let doc = self.store.create(JOB_KIND, None, body).await?;
        let job: Job = doc.deserialize()?;

        tracing::info!(
            job_id = %job.id,
            analyzer = %analyzer.id,
            data_type = %job.data_type,
            "job created"
        );

        self.spawn_execution(job.clone());
        Ok(job)
    }

    /// Claim a Waiting job: transition to InProgress and stamp
    /// `startDate`. Returns `None` when the job is past Waiting or
    /// another runner won the claim.
    pub async fn start_job(&self, job_id: &str) -> Result<Option<Job>, JobError> {
        let doc = self.store.get(JOB_KIND, job_id).await?;
        let current: Job = doc.deserialize()?;
        if current.status != JobStatus::Waiting {
            return Ok(None);
        }

        let patch = json!({
            "status": JobStatus::InProgress,
            "startDate": self.clock.epoch_ms(),
        });
        match self
            .store
            .update(JOB_KIND, job_id, patch, UpdateOptions::claim(doc.version))
            .await
        {
            Ok(doc) => {
                tracing::debug!(job_id, "job claimed");
                Ok(Some(doc.deserialize()?))
            }
            Err(StoreError::Conflict { .. }) => {
                tracing::debug!(job_id, "job claimed by another runner");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Finalise a job with a terminal status, stamping `endDate` and the
    /// optional diagnostic fields.
    pub async fn end_job(
        &self,
        job_id: &str,
        status: JobStatus,
        message: Option<String>,
        input: Option<String>,
    ) -> Result<Job, JobError> {
        let mut patch = Map::new();
        patch.insert("status".to_string(), json!(status));
        patch.insert("endDate".to_string(), json!(self.clock.epoch_ms()));
        if let Some(message) = message {
            patch.insert("message".to_string(), Value::String(message));
        }
        if let Some(input) = input {
            patch.insert("input".to_string(), Value::String(input));
        }

        let doc = self
            .store
            .update(JOB_KIND, job_id, Value::Object(patch), UpdateOptions::default())
            .await?;
        tracing::info!(job_id, status = %status, "job finished");
        Ok(doc.deserialize()?)
    }

    /// Soft-delete: the row stays, status becomes Deleted.
    pub async fn delete(&self, job_id: &str) -> Result<(), JobError> {
        self.store
            .update(
                JOB_KIND,
                job_id,
                json!({"status": JobStatus::Deleted}),
                UpdateOptions::default(),
            )
            .await?;
        tracing::info!(job_id, "job deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
