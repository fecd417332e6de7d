// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! verdict-store: the indexed document store contract the job service
//! consumes, plus the in-memory reference implementation.
//!
//! The service persists jobs, reports, and artifacts as parented JSON
//! documents and reads them back through a small query DSL. A production
//! deployment backs this contract with an external index; the in-memory
//! store here carries the same semantics (versioned updates, parent-aware
//! queries, range/sort pagination) for tests and single-process use.

pub mod attachment;
pub mod document;
pub mod memory;
pub mod query;
pub mod store;

pub use attachment::{AttachmentError, AttachmentSource, AttachmentStore, MemoryAttachmentStore};
pub use document::Document;
pub use memory::MemoryStore;
pub use query::{InvalidRange, Query, Range, Sort};
pub use store::{Aggregation, DocStore, StoreError, UpdateOptions};

/// Document kind of jobs.
pub const JOB_KIND: &str = "job";
/// Document kind of reports (parented by a job).
pub const REPORT_KIND: &str = "report";
/// Document kind of artifacts (parented by a report).
pub const ARTIFACT_KIND: &str = "artifact";
