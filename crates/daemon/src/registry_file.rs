// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry and user directory backed by operator-edited files.
//!
//! Each analyzer ships as one JSON file in the analyzers directory,
//! holding both the registry entry and its invocation definition:
//!
//! ```json
//! {
//!   "analyzer":   { "id": "...", "name": "...", "organization": "...", ... },
//!   "definition": { "id": "...", "cmd": "...", "baseDirectory": "...", ... }
//! }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use verdict_core::{Analyzer, AnalyzerDefinition};
use verdict_engine::{AnalyzerRegistry, JobError, UserDirectory};

#[derive(Debug, Deserialize)]
struct AnalyzerFile {
    analyzer: Analyzer,
    definition: AnalyzerDefinition,
}

/// Immutable registry loaded once at startup.
#[derive(Default)]
pub struct FileRegistry {
    analyzers: HashMap<String, Analyzer>,
    definitions: HashMap<String, AnalyzerDefinition>,
}

impl FileRegistry {
    /// Read every `*.json` file in `dir`. Unreadable entries are logged
    /// and skipped so one bad file does not take the service down.
    pub fn load(dir: &Path) -> std::io::Result<FileRegistry> {
        let mut registry = FileRegistry::default();
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "analyzers directory does not exist");
            return Ok(registry);
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<AnalyzerFile>(&text) {
                Ok(file) => {
                    tracing::info!(
                        analyzer = %file.analyzer.id,
                        definition = %file.definition.id,
                        "analyzer registered"
                    );
                    registry
                        .definitions
                        .insert(file.definition.id.clone(), file.definition);
                    registry
                        .analyzers
                        .insert(file.analyzer.id.clone(), file.analyzer);
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "skipping bad analyzer file");
                }
            }
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

#[async_trait]
impl AnalyzerRegistry for FileRegistry {
    async fn get(&self, analyzer_id: &str) -> Result<Analyzer, JobError> {
        self.analyzers
            .get(analyzer_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(format!("analyzer {analyzer_id}")))
    }

    async fn definition(&self, definition_id: &str) -> Result<AnalyzerDefinition, JobError> {
        self.definitions
            .get(definition_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(format!("analyzer definition {definition_id}")))
    }
}

/// User→organisation table from the daemon config.
#[derive(Default)]
pub struct StaticUsers {
    users: HashMap<String, String>,
}

impl StaticUsers {
    pub fn new(users: HashMap<String, String>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for StaticUsers {
    async fn organization(&self, user_id: &str) -> Result<String, JobError> {
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(format!("user {user_id}")))
    }
}

#[cfg(test)]
#[path = "registry_file_tests.rs"]
mod tests;
