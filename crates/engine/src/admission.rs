// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission control: similar-job cache and per-analyzer rate limits.

use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::service::JobService;
use verdict_core::{Analyzer, Clock, Job, Observable, SubmissionFields};
use verdict_store::{AttachmentStore, DocStore, Query, Range, Sort, JOB_KIND};

impl<S, B, R, U, C> JobService<S, B, R, U, C>
where
    S: DocStore,
    B: AttachmentStore,
    R: AnalyzerRegistry,
    U: UserDirectory,
    C: Clock,
{
    /// Sliding-window rate check. Analyzers without both `rate` and
    /// `rateUnit` are admitted unconditionally. Every job created inside
    /// the window counts, failed ones included — they consumed capacity.
    pub async fn is_under_rate_limit(&self, analyzer: &Analyzer) -> Result<bool, JobError> {
        let (Some(rate), Some(unit)) = (analyzer.rate, analyzer.rate_unit) else {
            return Ok(true);
        };

        let since = self
            .clock
            .epoch_ms()
            .saturating_sub(unit.seconds() * 1_000);
        let query = Query::and([
            Query::eq("analyzerId", analyzer.id.as_str()),
            Query::gte("createdAt", since),
        ]);
        let count = self.store.count(JOB_KIND, &query).await?;

        if count >= u64::from(rate) {
            tracing::warn!(
                analyzer = %analyzer.id,
                count,
                rate,
                unit = %unit,
                "analyzer rate limit reached"
            );
        }
        Ok(count < u64::from(rate))
    }

    /// Most recent reusable job with the same fingerprint, or `None`.
    ///
    /// Matches on analyzer, data type, TLP, data identity, and the
    /// canonical parameter encoding; excludes Failure and Deleted jobs;
    /// requires `startDate` within the cache window. A candidate that
    /// has not started yet (no `startDate`, still Waiting) counts as
    /// recent. The returned job carries a synthesised in-memory
    /// `from_cache` flag; the stored record is untouched.
    pub async fn find_similar_job(
        &self,
        analyzer: &Analyzer,
        fields: &SubmissionFields,
        parameters: &str,
    ) -> Result<Option<Job>, JobError> {
        if self.config.cache.is_zero() {
            return Ok(None);
        }

        let cutoff = self
            .clock
            .epoch_ms()
            .saturating_sub(self.config.cache.as_millis() as u64);
        let identity = match &fields.observable {
            Observable::Data { data } => Query::eq("data", data.as_str()),
            Observable::Attachment { attachment } => {
                Query::eq("attachment.id", attachment.id.as_str())
            }
        };
        let query = Query::and([
            Query::eq("analyzerId", analyzer.id.as_str()),
            Query::not(Query::or([
                Query::eq("status", "Failure"),
                Query::eq("status", "Deleted"),
            ])),
            Query::or([
                Query::gte("startDate", cutoff),
                Query::missing("startDate"),
            ]),
            Query::eq("dataType", fields.data_type.as_str()),
            Query::eq("tlp", fields.tlp.value()),
            identity,
            Query::eq("parameters", parameters),
        ]);

        let (docs, _) = self
            .store
            .find(
                JOB_KIND,
                &query,
                Range { from: 0, to: 1 },
                &[Sort::Desc("createdAt".to_string())],
            )
            .await?;
        match docs.first() {
            Some(doc) => Ok(Some(doc.deserialize::<Job>()?.cached())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
