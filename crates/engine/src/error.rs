// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy of the job service

use thiserror::Error;
use verdict_core::analyzer::RateUnit;
use verdict_core::fields::FieldError;
use verdict_store::{AttachmentError, InvalidRange, StoreError};

/// Errors surfaced by the job service.
///
/// Submission-time errors are returned to the caller; execution-time
/// errors are recorded on the job and never raised to the submitter.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("missing attribute: {0}")]
    MissingAttribute(String),
    #[error("invalid format for attribute {0}")]
    InvalidFormatAttribute(String),
    #[error("attribute check failed: {}", format_field_errors(.0))]
    AttributeChecking(Vec<FieldError>),
    #[error("rate limit exceeded for analyzer {analyzer}: {rate} jobs per {unit}")]
    RateLimitExceeded {
        analyzer: String,
        rate: u32,
        unit: RateUnit,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("analyzer execution error: {0}")]
    AnalyzerExecution(String),
    #[error("Report creation failure: {0}")]
    ReportPersistence(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("attachment error: {0}")]
    Attachment(#[from] AttachmentError),
}

impl From<Vec<FieldError>> for JobError {
    fn from(errors: Vec<FieldError>) -> Self {
        JobError::AttributeChecking(errors)
    }
}

impl From<InvalidRange> for JobError {
    fn from(_: InvalidRange) -> Self {
        JobError::InvalidFormatAttribute("range".to_string())
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
