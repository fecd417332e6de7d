// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The document store contract consumed by the job service.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::document::Document;
use crate::query::{Query, Range, Sort};

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {kind}/{id}")]
    NotFound { kind: String, id: String },
    #[error("version conflict on {kind}/{id}")]
    Conflict { kind: String, id: String },
    #[error("document body must be a JSON object")]
    NotAnObject,
    #[error("corrupt document {id}: {message}")]
    Corrupt { id: String, message: String },
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Options for [`DocStore::update`].
#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    /// How many times to re-read and re-apply the patch when the
    /// document version moved under the caller. Zero makes the update
    /// a single compare-and-set attempt.
    pub retry_on_conflict: u32,
    /// Version the caller observed; the update fails with
    /// [`StoreError::Conflict`] if the stored version differs.
    /// `None` skips the check.
    pub require_version: Option<u64>,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            retry_on_conflict: 5,
            require_version: None,
        }
    }
}

impl UpdateOptions {
    /// Single compare-and-set attempt against an observed version.
    /// Used for claims that must succeed on at most one contender.
    pub fn claim(version: u64) -> Self {
        Self {
            retry_on_conflict: 0,
            require_version: Some(version),
        }
    }
}

/// One aggregation of a stats request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// Number of matching documents, keyed `"count"` in the output.
    Count,
    /// Bucketed document counts per distinct value of `field`.
    Terms { name: String, field: String },
}

/// An indexed document store: parented JSON documents with versioned
/// updates and query/range/sort reads.
#[async_trait]
pub trait DocStore: Send + Sync + 'static {
    /// Fetch one document by kind and id.
    async fn get(&self, kind: &str, id: &str) -> Result<Document, StoreError>;

    /// Persist a new document, optionally parented, assigning id,
    /// creation time, and initial version.
    async fn create(
        &self,
        kind: &str,
        parent: Option<&str>,
        data: Value,
    ) -> Result<Document, StoreError>;

    /// Merge `patch` (top-level keys) into the document's data.
    async fn update(
        &self,
        kind: &str,
        id: &str,
        patch: Value,
        options: UpdateOptions,
    ) -> Result<Document, StoreError>;

    /// Remove a document.
    async fn delete(&self, kind: &str, id: &str) -> Result<(), StoreError>;

    /// Query documents; returns the requested page and the total number
    /// of matches before paging.
    async fn find(
        &self,
        kind: &str,
        query: &Query,
        range: Range,
        sort: &[Sort],
    ) -> Result<(Vec<Document>, u64), StoreError>;

    /// Number of documents matching the query.
    async fn count(&self, kind: &str, query: &Query) -> Result<u64, StoreError>;

    /// Evaluate aggregations over the matching documents.
    async fn stats(
        &self,
        kind: &str,
        query: &Query,
        aggregations: &[Aggregation],
    ) -> Result<Value, StoreError>;
}
