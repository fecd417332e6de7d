// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query DSL, pagination ranges, and sort specifications.
//!
//! Queries are built with the combinator constructors and evaluated
//! against [`Document`]s. Field paths are dotted (`attachment.id`);
//! `id` and `createdAt` resolve to document metadata.

use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

use crate::document::Document;

/// A filter over stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Matches every document.
    All,
    And(Vec<Query>),
    Or(Vec<Query>),
    Not(Box<Query>),
    /// Field equals value (numbers compare numerically).
    Eq(String, Value),
    Ne(String, Value),
    /// Field is greater than or equal to value.
    Gte(String, Value),
    /// Field is strictly less than value.
    Lt(String, Value),
    /// Field contains the given substring.
    Like(String, String),
    /// Document id is one of the given ids.
    WithId(Vec<String>),
    /// Document parent equals the given id.
    WithParent(String),
    /// Field is absent (or null).
    Missing(String),
}

impl Query {
    pub fn and(queries: impl IntoIterator<Item = Query>) -> Query {
        Query::And(queries.into_iter().collect())
    }

    pub fn or(queries: impl IntoIterator<Item = Query>) -> Query {
        Query::Or(queries.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(query: Query) -> Query {
        Query::Not(Box::new(query))
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Query {
        Query::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Query {
        Query::Ne(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Query {
        Query::Gte(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Query {
        Query::Lt(field.into(), value.into())
    }

    pub fn like(field: impl Into<String>, needle: impl Into<String>) -> Query {
        Query::Like(field.into(), needle.into())
    }

    pub fn with_id(ids: impl IntoIterator<Item = impl Into<String>>) -> Query {
        Query::WithId(ids.into_iter().map(Into::into).collect())
    }

    pub fn with_parent(id: impl Into<String>) -> Query {
        Query::WithParent(id.into())
    }

    pub fn missing(field: impl Into<String>) -> Query {
        Query::Missing(field.into())
    }

    /// Reference evaluation semantics, used by the in-memory store.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Query::All => true,
            Query::And(qs) => qs.iter().all(|q| q.matches(doc)),
            Query::Or(qs) => qs.iter().any(|q| q.matches(doc)),
            Query::Not(q) => !q.matches(doc),
            Query::Eq(field, value) => doc
                .field(field)
                .is_some_and(|v| values_equal(&v, value)),
            Query::Ne(field, value) => doc
                .field(field)
                .is_none_or(|v| !values_equal(&v, value)),
            Query::Gte(field, value) => doc
                .field(field)
                .and_then(|v| compare_values(&v, value))
                .is_some_and(Ordering::is_ge),
            Query::Lt(field, value) => doc
                .field(field)
                .and_then(|v| compare_values(&v, value))
                .is_some_and(Ordering::is_lt),
            Query::Like(field, needle) => doc
                .field(field)
                .as_ref()
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(needle.as_str())),
            Query::WithId(ids) => ids.iter().any(|id| *id == doc.id),
            Query::WithParent(id) => doc.parent.as_deref() == Some(id.as_str()),
            Query::Missing(field) => doc.field(field).is_none_or(|v| v.is_null()),
        }
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y)),
    }
}

/// Pagination range error
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid range: {0:?} (expected \"all\" or \"from-to\")")]
pub struct InvalidRange(pub String);

/// A pagination window over find results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: usize,
    /// End index, exclusive. `usize::MAX` means unbounded.
    pub to: usize,
}

impl Range {
    pub const ALL: Range = Range {
        from: 0,
        to: usize::MAX,
    };

    /// Parse `"all"` or `"from-to"` (end-exclusive). `None` gives the
    /// default first page of ten.
    pub fn parse(spec: Option<&str>) -> Result<Range, InvalidRange> {
        match spec {
            None => Ok(Range { from: 0, to: 10 }),
            Some("all") => Ok(Range::ALL),
            Some(s) => {
                let (from, to) = s
                    .split_once('-')
                    .ok_or_else(|| InvalidRange(s.to_string()))?;
                let from: usize = from.parse().map_err(|_| InvalidRange(s.to_string()))?;
                let to: usize = to.parse().map_err(|_| InvalidRange(s.to_string()))?;
                if to < from {
                    return Err(InvalidRange(s.to_string()));
                }
                Ok(Range { from, to })
            }
        }
    }
}

/// Sort direction for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sort {
    Asc(String),
    Desc(String),
}

impl Sort {
    /// Parse `"+field"` / `"-field"` specs; a bare name sorts ascending.
    pub fn parse(specs: &[String]) -> Vec<Sort> {
        specs
            .iter()
            .filter_map(|s| {
                if let Some(field) = s.strip_prefix('-') {
                    (!field.is_empty()).then(|| Sort::Desc(field.to_string()))
                } else if let Some(field) = s.strip_prefix('+') {
                    (!field.is_empty()).then(|| Sort::Asc(field.to_string()))
                } else {
                    (!s.is_empty()).then(|| Sort::Asc(s.clone()))
                }
            })
            .collect()
    }

    pub fn field(&self) -> &str {
        match self {
            Sort::Asc(f) | Sort::Desc(f) => f,
        }
    }

    /// Order two documents under this sort key; missing fields sort last.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let av = a.field(self.field());
        let bv = b.field(self.field());
        let ord = match (av, bv) {
            (Some(x), Some(y)) => compare_values(&x, &y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        match self {
            Sort::Asc(_) => ord,
            Sort::Desc(_) => ord.reverse(),
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
