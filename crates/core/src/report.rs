// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report and extracted-artifact records, children of a job.

use crate::observable::Observable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured success output of one job: full and summary documents,
/// both held as serialised JSON strings opaque to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    /// Parent job id.
    #[serde(rename = "parent")]
    pub job_id: String,
    pub full: String,
    pub summary: String,
}

/// A sub-observable extracted from a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    /// Parent report id.
    #[serde(rename = "parent")]
    pub report_id: String,
    pub data_type: String,
    #[serde(flatten)]
    pub observable: Observable,
}

/// Normalise an analyzer-emitted artifact object for storage.
///
/// Analyzers emit either `{type, value}` or `{dataType, data}`; both map
/// to the stored keys `dataType`/`data`. Other keys pass through.
pub fn normalise_artifact(raw: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in raw {
        let key = match key.as_str() {
            "value" => "data",
            "type" => "dataType",
            other => other,
        };
        out.insert(key.to_string(), value.clone());
    }
    out
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
