// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup recovery of jobs left behind by the previous incarnation.
//!
//! Analyzer subprocesses do not survive a service restart, so an
//! InProgress job found at startup can never finish: it is finalised as
//! Failure. Waiting jobs are re-driven through the normal pipeline,
//! which makes recovery idempotent at the job level.

use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::service::JobService;
use verdict_core::{Clock, Job, JobStatus};
use verdict_store::{AttachmentStore, DocStore, Query, Range, Sort, JOB_KIND};

/// What a recovery scan found and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// InProgress jobs finalised as Failure.
    pub interrupted: usize,
    /// Waiting jobs re-driven through execution.
    pub resumed: usize,
}

impl<S, B, R, U, C> JobService<S, B, R, U, C>
where
    S: DocStore,
    B: AttachmentStore,
    R: AnalyzerRegistry,
    U: UserDirectory,
    C: Clock,
{
    /// Scan all organisations for recoverable jobs and handle them.
    pub async fn recover(&self) -> Result<RecoveryReport, JobError> {
        let mut report = RecoveryReport::default();

        let (interrupted, _) = self
            .store
            .find(
                JOB_KIND,
                &Query::eq("status", "InProgress"),
                Range::ALL,
                &[],
            )
            .await?;
        for doc in interrupted {
            let end = self
                .end_job(
                    &doc.id,
                    JobStatus::Failure,
                    Some("job interrupted by service restart".to_string()),
                    None,
                )
                .await;
            match end {
                Ok(_) => report.interrupted += 1,
                Err(e) => {
                    tracing::error!(job_id = %doc.id, error = %e, "failed to fail interrupted job");
                }
            }
        }

        let (waiting, _) = self
            .store
            .find(
                JOB_KIND,
                &Query::eq("status", "Waiting"),
                Range::ALL,
                &[Sort::Asc("createdAt".to_string())],
            )
            .await?;
        for doc in waiting {
            match doc.deserialize::<Job>() {
                Ok(job) => {
                    tracing::info!(job_id = %job.id, "re-driving waiting job");
                    self.spawn_execution(job);
                    report.resumed += 1;
                }
                Err(e) => {
                    tracing::error!(job_id = %doc.id, error = %e, "unreadable waiting job");
                }
            }
        }

        tracing::info!(
            interrupted = report.interrupted,
            resumed = report.resumed,
            "recovery scan complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
