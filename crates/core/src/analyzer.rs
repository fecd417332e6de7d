// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analyzer registry entities, consumed by the job service.
//!
//! An analyzer is an external executable owned by an organisation; its
//! definition describes how to invoke it and which configuration items
//! the invocation document must carry.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// Window unit for per-analyzer rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateUnit {
    Day,
    Month,
}

impl RateUnit {
    /// Length of the sliding window in seconds (a month counts as 30 days).
    pub fn seconds(self) -> u64 {
        match self {
            RateUnit::Day => 86_400,
            RateUnit::Month => 2_592_000,
        }
    }
}

impl fmt::Display for RateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateUnit::Day => write!(f, "day"),
            RateUnit::Month => write!(f, "month"),
        }
    }
}

/// A registered analyzer instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analyzer {
    pub id: String,
    pub name: String,
    /// Owning organisation; submitters must belong to it.
    pub organization: String,
    /// Max admitted jobs per sliding window; absent means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_unit: Option<RateUnit>,
    /// Operator-set configuration, merged under job parameters.
    #[serde(default)]
    pub config: Map<String, Value>,
    pub analyzer_definition_id: String,
}

/// Value kind of a configuration item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigItemKind {
    String,
    Number,
    Boolean,
}

impl fmt::Display for ConfigItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigItemKind::String => write!(f, "string"),
            ConfigItemKind::Number => write!(f, "number"),
            ConfigItemKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// One typed entry of an analyzer definition's configuration schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConfigItemKind,
    /// Accepts a list of values of `kind` instead of a single value.
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl ConfigItem {
    pub fn new(name: impl Into<String>, kind: ConfigItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            multi: false,
            required: false,
            default_value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Invocation metadata for an analyzer: executable, working directory,
/// configuration schema, and shipped defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerDefinition {
    pub id: String,
    /// Filesystem path of the analyzer executable.
    pub cmd: PathBuf,
    /// Working directory the analyzer runs in.
    pub base_directory: PathBuf,
    #[serde(default)]
    pub configuration_items: Vec<ConfigItem>,
    /// Analyzer-shipped configuration defaults.
    #[serde(default)]
    pub configuration: Map<String, Value>,
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
