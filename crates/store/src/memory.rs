// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference implementation of the store contract.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use verdict_core::{Clock, IdGen, SequentialIdGen, SystemClock, UuidIdGen};

use crate::document::Document;
use crate::query::{Query, Range, Sort};
use crate::store::{Aggregation, DocStore, StoreError, UpdateOptions};

/// Documents of one kind, in insertion order.
type Shelf = Vec<Document>;

/// Thread-safe in-memory document store.
///
/// Documents live in per-kind insertion-ordered shelves; `find` without
/// an explicit sort returns insertion order. Updates bump the document
/// version and honor compare-and-set options.
#[derive(Clone)]
pub struct MemoryStore {
    shelves: Arc<RwLock<HashMap<String, Shelf>>>,
    idgen: IdSource,
    clock: TimeSource,
}

#[derive(Clone)]
enum IdSource {
    Uuid(UuidIdGen),
    Sequential(SequentialIdGen),
}

#[derive(Clone)]
enum TimeSource {
    System(SystemClock),
    Fake(verdict_core::FakeClock),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shelves: Arc::new(RwLock::new(HashMap::new())),
            idgen: IdSource::Uuid(UuidIdGen),
            clock: TimeSource::System(SystemClock),
        }
    }

    /// Deterministic ids and controllable time, for tests.
    pub fn deterministic(idgen: SequentialIdGen, clock: verdict_core::FakeClock) -> Self {
        Self {
            shelves: Arc::new(RwLock::new(HashMap::new())),
            idgen: IdSource::Sequential(idgen),
            clock: TimeSource::Fake(clock),
        }
    }

    fn next_id(&self) -> String {
        match &self.idgen {
            IdSource::Uuid(g) => g.next(),
            IdSource::Sequential(g) => g.next(),
        }
    }

    fn epoch_ms(&self) -> u64 {
        match &self.clock {
            TimeSource::System(c) => c.epoch_ms(),
            TimeSource::Fake(c) => c.epoch_ms(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_patch(data: &mut Value, patch: &Map<String, Value>) {
    if let Some(map) = data.as_object_mut() {
        for (key, value) in patch {
            map.insert(key.clone(), value.clone());
        }
    }
}

#[async_trait]
impl DocStore for MemoryStore {
    async fn get(&self, kind: &str, id: &str) -> Result<Document, StoreError> {
        let shelves = self.shelves.read();
        shelves
            .get(kind)
            .and_then(|shelf| shelf.iter().find(|d| d.id == id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })
    }

    async fn create(
        &self,
        kind: &str,
        parent: Option<&str>,
        data: Value,
    ) -> Result<Document, StoreError> {
        if !data.is_object() {
            return Err(StoreError::NotAnObject);
        }
        let doc = Document {
            id: self.next_id(),
            parent: parent.map(str::to_string),
            created_at_ms: self.epoch_ms(),
            version: 1,
            data,
        };
        let mut shelves = self.shelves.write();
        shelves.entry(kind.to_string()).or_default().push(doc.clone());
        tracing::debug!(kind, id = %doc.id, "document created");
        Ok(doc)
    }

    async fn update(
        &self,
        kind: &str,
        id: &str,
        patch: Value,
        options: UpdateOptions,
    ) -> Result<Document, StoreError> {
        let Value::Object(patch) = patch else {
            return Err(StoreError::NotAnObject);
        };
        let mut shelves = self.shelves.write();
        let doc = shelves
            .get_mut(kind)
            .and_then(|shelf| shelf.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            })?;

        if let Some(required) = options.require_version {
            // The whole shelf is behind one write lock, so a conflicting
            // writer has fully finished; retrying would re-read the same
            // moved version. Retries only make sense with retry budget
            // left, which re-applies the patch on the current version.
            if doc.version != required && options.retry_on_conflict == 0 {
                return Err(StoreError::Conflict {
                    kind: kind.to_string(),
                    id: id.to_string(),
                });
            }
        }

        merge_patch(&mut doc.data, &patch);
        doc.version += 1;
        tracing::debug!(kind, id, version = doc.version, "document updated");
        Ok(doc.clone())
    }

    async fn delete(&self, kind: &str, id: &str) -> Result<(), StoreError> {
        let mut shelves = self.shelves.write();
        let shelf = shelves.get_mut(kind).ok_or_else(|| StoreError::NotFound {
            kind: kind.to_string(),
            id: id.to_string(),
        })?;
        let before = shelf.len();
        shelf.retain(|d| d.id != id);
        if shelf.len() == before {
            return Err(StoreError::NotFound {
                kind: kind.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn find(
        &self,
        kind: &str,
        query: &Query,
        range: Range,
        sort: &[Sort],
    ) -> Result<(Vec<Document>, u64), StoreError> {
        let shelves = self.shelves.read();
        let mut matches: Vec<Document> = shelves
            .get(kind)
            .map(|shelf| shelf.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();

        for key in sort.iter().rev() {
            matches.sort_by(|a, b| key.compare(a, b));
        }

        let total = matches.len() as u64;
        let from = range.from.min(matches.len());
        let to = range.to.min(matches.len());
        Ok((matches[from..to].to_vec(), total))
    }

    async fn count(&self, kind: &str, query: &Query) -> Result<u64, StoreError> {
        let shelves = self.shelves.read();
        let count = shelves
            .get(kind)
            .map(|shelf| shelf.iter().filter(|d| query.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn stats(
        &self,
        kind: &str,
        query: &Query,
        aggregations: &[Aggregation],
    ) -> Result<Value, StoreError> {
        let shelves = self.shelves.read();
        let matches: Vec<&Document> = shelves
            .get(kind)
            .map(|shelf| shelf.iter().filter(|d| query.matches(d)).collect())
            .unwrap_or_default();

        let mut out = Map::new();
        for agg in aggregations {
            match agg {
                Aggregation::Count => {
                    out.insert("count".to_string(), Value::from(matches.len()));
                }
                Aggregation::Terms { name, field } => {
                    let mut buckets: Map<String, Value> = Map::new();
                    for doc in &matches {
                        let Some(value) = doc.field(field) else {
                            continue;
                        };
                        let key = match value {
                            Value::String(s) => s,
                            other => other.to_string(),
                        };
                        let count = buckets.get(&key).and_then(Value::as_u64).unwrap_or(0);
                        buckets.insert(key, Value::from(count + 1));
                    }
                    out.insert(name.clone(), Value::Object(buckets));
                }
            }
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
