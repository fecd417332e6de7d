// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contracts onto the analyzer registry and the user directory.
//!
//! Both are external collaborators; the job service only needs these
//! narrow read interfaces.

use async_trait::async_trait;

use crate::error::JobError;
use verdict_core::{Analyzer, AnalyzerDefinition};

/// Read access to registered analyzers and their definitions.
#[async_trait]
pub trait AnalyzerRegistry: Send + Sync + 'static {
    async fn get(&self, analyzer_id: &str) -> Result<Analyzer, JobError>;
    async fn definition(&self, definition_id: &str) -> Result<AnalyzerDefinition, JobError>;
}

/// Maps an authenticated user to their organisation.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn organization(&self, user_id: &str) -> Result<String, JobError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::RwLock;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// In-memory analyzer registry for tests.
    #[derive(Clone, Default)]
    pub struct FakeRegistry {
        analyzers: Arc<RwLock<HashMap<String, Analyzer>>>,
        definitions: Arc<RwLock<HashMap<String, AnalyzerDefinition>>>,
    }

    impl FakeRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_analyzer(&self, analyzer: Analyzer) {
            self.analyzers
                .write()
                .insert(analyzer.id.clone(), analyzer);
        }

        pub fn insert_definition(&self, definition: AnalyzerDefinition) {
            self.definitions
                .write()
                .insert(definition.id.clone(), definition);
        }
    }

    #[async_trait]
    impl AnalyzerRegistry for FakeRegistry {
        async fn get(&self, analyzer_id: &str) -> Result<Analyzer, JobError> {
            self.analyzers
                .read()
                .get(analyzer_id)
                .cloned()
                .ok_or_else(|| JobError::NotFound(format!("analyzer {analyzer_id}")))
        }

        async fn definition(&self, definition_id: &str) -> Result<AnalyzerDefinition, JobError> {
            self.definitions
                .read()
                .get(definition_id)
                .cloned()
                .ok_or_else(|| JobError::NotFound(format!("analyzer definition {definition_id}")))
        }
    }

    /// In-memory user→organisation table for tests.
    #[derive(Clone, Default)]
    pub struct FakeUserDirectory {
        users: Arc<RwLock<HashMap<String, String>>>,
    }

    impl FakeUserDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, user_id: &str, organization: &str) {
            self.users
                .write()
                .insert(user_id.to_string(), organization.to_string());
        }
    }

    #[async_trait]
    impl UserDirectory for FakeUserDirectory {
        async fn organization(&self, user_id: &str) -> Result<String, JobError> {
            self.users
                .read()
                .get(user_id)
                .cloned()
                .ok_or_else(|| JobError::NotFound(format!("user {user_id}")))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRegistry, FakeUserDirectory};
