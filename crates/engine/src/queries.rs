// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Organisation-scoped read paths.
//!
//! Every read resolves the user's organisation first; a job outside it
//! is indistinguishable from a missing one.

use serde_json::Value;

use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::service::JobService;
use verdict_core::{Artifact, Clock, Job, Report};
use verdict_store::{
    Aggregation, AttachmentStore, DocStore, Query, Range, Sort, StoreError, ARTIFACT_KIND,
    JOB_KIND, REPORT_KIND,
};

/// Optional substring filters for job listings.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub data_type: Option<String>,
    pub data: Option<String>,
    /// Matches analyzer id or analyzer name.
    pub analyzer: Option<String>,
}

impl JobFilter {
    fn to_query(&self, organization: &str) -> Query {
        let mut clauses = vec![Query::eq("organization", organization)];
        if let Some(data_type) = &self.data_type {
            clauses.push(Query::like("dataType", data_type.as_str()));
        }
        if let Some(data) = &self.data {
            clauses.push(Query::like("data", data.as_str()));
        }
        if let Some(analyzer) = &self.analyzer {
            clauses.push(Query::or([
                Query::like("analyzerId", analyzer.as_str()),
                Query::like("analyzerName", analyzer.as_str()),
            ]));
        }
        Query::and(clauses)
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
    /// Jobs in the user's organisation, newest first, with the total
    /// match count before paging.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        filter: &JobFilter,
        range: Option<&str>,
    ) -> Result<(Vec<Job>, u64), JobError> {
        let organization = self.users.organization(user_id).await?;
        let range = Range::parse(range)?;
        let (docs, total) = self
            .store
            .find(
                JOB_KIND,
                &filter.to_query(&organization),
                range,
                &[Sort::Desc("createdAt".to_string())],
            )
            .await?;
        let jobs = docs
            .iter()
            .map(|doc| doc.deserialize::<Job>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((jobs, total))
    }

    /// One job, iff it belongs to the user's organisation.
    pub async fn get_for_user(&self, user_id: &str, job_id: &str) -> Result<Job, JobError> {
        let organization = self.users.organization(user_id).await?;
        let job: Job = match self.store.get(JOB_KIND, job_id).await {
            Ok(doc) => doc.deserialize()?,
            Err(StoreError::NotFound { .. }) => {
                return Err(JobError::NotFound(format!("job {job_id}")))
            }
            Err(e) => return Err(e.into()),
        };
        if job.organization != organization {
            return Err(JobError::NotFound(format!("job {job_id}")));
        }
        Ok(job)
    }

    /// The single report of a job.
    pub async fn get_report(&self, job_id: &str) -> Result<Report, JobError> {
        let (docs, _) = self
            .store
            .find(
                REPORT_KIND,
                &Query::with_parent(job_id),
                Range { from: 0, to: 1 },
                &[],
            )
            .await?;
        match docs.first() {
            Some(doc) => Ok(doc.deserialize()?),
            None => Err(JobError::NotFound(format!("report of job {job_id}"))),
        }
    }

    /// Artifacts of a job's report, scoped through the parent chain to
    /// the user's organisation.
    pub async fn find_artifacts(
        &self,
        user_id: &str,
        job_id: &str,
        query: Query,
        range: Option<&str>,
        sort: &[Sort],
    ) -> Result<(Vec<Artifact>, u64), JobError> {
        let job = self.get_for_user(user_id, job_id).await?;
        let report = self.get_report(&job.id).await?;
        let range = Range::parse(range)?;
        let (docs, total) = self
            .store
            .find(
                ARTIFACT_KIND,
                &Query::and([Query::with_parent(&report.id), query]),
                range,
                sort,
            )
            .await?;
        let artifacts = docs
            .iter()
            .map(|doc| doc.deserialize::<Artifact>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((artifacts, total))
    }

    /// Aggregations over jobs, delegated to the store.
    pub async fn stats(
        &self,
        query: &Query,
        aggregations: &[Aggregation],
    ) -> Result<Value, JobError> {
        Ok(self.store.stats(JOB_KIND, query, aggregations).await?)
    }
}

#[cfg(test)]
#[path = "queries_tests.rs"]
mod tests;
