// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored document with identity and version metadata.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreError;

/// One stored JSON document.
///
/// `id`, `parent`, `created_at_ms`, and `version` are store-assigned
/// metadata; `data` is the caller's object. Reads may address metadata
/// through the virtual fields `id` and `createdAt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub created_at_ms: u64,
    /// Bumped on every update; drives optimistic-concurrency checks.
    pub version: u64,
    pub data: Value,
}

impl Document {
    /// Read a field by dotted path, resolving metadata virtual fields
    /// (`id`, `createdAt`) before descending into `data`.
    pub fn field(&self, path: &str) -> Option<Value> {
        match path {
            "id" | "_id" => Some(Value::String(self.id.clone())),
            "createdAt" => Some(Value::from(self.created_at_ms)),
            _ => {
                let mut current = &self.data;
                for segment in path.split('.') {
                    current = current.as_object()?.get(segment)?;
                }
                Some(current.clone())
            }
        }
    }

    /// Deserialize the document into an entity type, injecting `id`,
    /// `createdAt`, and `parent` from metadata so entity structs can
    /// carry them as plain fields.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut data = self.data.clone();
        if let Some(map) = data.as_object_mut() {
            map.insert("id".to_string(), Value::String(self.id.clone()));
            map.insert("createdAt".to_string(), Value::from(self.created_at_ms));
            if let Some(parent) = &self.parent {
                map.insert("parent".to_string(), Value::String(parent.clone()));
            }
        }
        serde_json::from_value(data).map_err(|e| StoreError::Corrupt {
            id: self.id.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
