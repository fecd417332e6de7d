// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and status state machine.

use crate::observable::Observable;
use crate::tlp::Tlp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a job.
///
/// Transitions: Waiting → InProgress (exactly once per run);
/// InProgress → Success | Failure; any → Deleted. No transition
/// out of a terminal state except Deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Waiting,
    InProgress,
    Success,
    Failure,
    Deleted,
}

impl JobStatus {
    /// Success, Failure, and Deleted admit no further run activity.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Success | JobStatus::Failure | JobStatus::Deleted
        )
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (_, JobStatus::Deleted) => true,
            (JobStatus::Waiting, JobStatus::InProgress) => true,
            (JobStatus::InProgress, JobStatus::Success | JobStatus::Failure) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Waiting => write!(f, "waiting"),
            JobStatus::InProgress => write!(f, "in-progress"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failure => write!(f, "failure"),
            JobStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// Creation attributes for a new job, before the store assigns identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub analyzer_definition_id: String,
    pub analyzer_id: String,
    pub analyzer_name: String,
    pub organization: String,
    pub data_type: String,
    pub tlp: Tlp,
    pub message: String,
    /// Canonical JSON encoding of submission parameters
    /// (see [`crate::fields::canonical_params`]).
    pub parameters: String,
    #[serde(flatten)]
    pub observable: Observable,
    pub status: JobStatus,
}

/// One submission: an observable handed to an analyzer, with lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub created_at: u64,
    pub analyzer_definition_id: String,
    pub analyzer_id: String,
    pub analyzer_name: String,
    pub organization: String,
    pub data_type: String,
    #[serde(default)]
    pub tlp: Tlp,
    #[serde(default)]
    pub message: String,
    /// Canonical JSON encoding of submission parameters.
    #[serde(default = "empty_params")]
    pub parameters: String,
    #[serde(flatten)]
    pub observable: Observable,
    pub status: JobStatus,
    /// Epoch ms; set iff status ≠ Waiting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<u64>,
    /// Epoch ms; set iff status ∈ {Success, Failure}.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<u64>,
    /// Diagnostic copy of the analyzer input, recorded on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// True when this job was returned via cache reuse. Never persisted;
    /// synthesised on the read path only.
    #[serde(skip)]
    pub from_cache: bool,
}

fn empty_params() -> String {
    "{}".to_string()
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark this in-memory job as a cache hit. The stored record is
    /// untouched; `from_cache` does not serialize.
    pub fn cached(mut self) -> Self {
        self.from_cache = true;
        self
    }
}

impl JobSpec {
    /// New Waiting job spec with submission defaults applied by the caller.
    pub fn new(
        analyzer: &crate::Analyzer,
        data_type: impl Into<String>,
        observable: Observable,
        tlp: Tlp,
        message: impl Into<String>,
        parameters: String,
    ) -> Self {
        Self {
            analyzer_definition_id: analyzer.analyzer_definition_id.clone(),
            analyzer_id: analyzer.id.clone(),
            analyzer_name: analyzer.name.clone(),
            organization: analyzer.organization.clone(),
            data_type: data_type.into(),
            tlp,
            message: message.into(),
            parameters,
            observable,
            status: JobStatus::Waiting,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
