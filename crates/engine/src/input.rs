// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the JSON document delivered to the analyzer's stdin.
//!
//! Configuration precedence, lowest to highest: analyzer-definition
//! defaults, operator analyzer config, job parameters. The merged
//! object is validated against the union of the global base schema and
//! the definition's configuration items, accumulating every fault.

use serde_json::{Map, Value};
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;

use crate::error::JobError;
use crate::registry::{AnalyzerRegistry, UserDirectory};
use crate::service::JobService;
use verdict_core::{
    Analyzer, AnalyzerDefinition, Attachment, Clock, ConfigItem, ConfigItemKind, FieldError, Job,
    Observable,
};
use verdict_store::{AttachmentStore, DocStore};

/// Analyzer input staged for one run. `file` owns the materialised
/// attachment and deletes it on drop; hold it until the analyzer exits.
#[derive(Debug)]
pub(crate) struct StagedInput {
    pub doc: Value,
    #[allow(dead_code)] // held for its Drop
    pub file: Option<TempPath>,
}

/// Configuration schema applied to every analyzer, regardless of its
/// definition's own items.
fn base_schema() -> Vec<ConfigItem> {
    vec![
        ConfigItem::new("proxy_http", ConfigItemKind::String),
        ConfigItem::new("proxy_https", ConfigItemKind::String),
        ConfigItem::new("auto_extract_artifacts", ConfigItemKind::Boolean)
            .with_default(Value::Bool(false)),
    ]
}

/// Deep merge `overlay` into `base`; overlay wins, objects merge
/// recursively.
pub(crate) fn deep_merge(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Validate a merged configuration against the base schema plus the
/// definition's items. Each item reads its key with type coercion and
/// default; all faults are accumulated.
pub(crate) fn validate_config(
    effective: &Map<String, Value>,
    items: &[ConfigItem],
) -> Result<Map<String, Value>, Vec<FieldError>> {
    let mut out = effective.clone();
    let mut errors = Vec::new();

    for item in base_schema().iter().chain(items) {
        match effective.get(&item.name) {
            None | Some(Value::Null) => match &item.default_value {
                Some(default) => {
                    out.insert(item.name.clone(), default.clone());
                }
                None if item.required => {
                    errors.push(FieldError::Missing(item.name.clone()));
                }
                None => {
                    out.remove(&item.name);
                }
            },
            Some(value) => match coerce_item(item, value) {
                Ok(coerced) => {
                    out.insert(item.name.clone(), coerced);
                }
                Err(expected) => {
                    errors.push(FieldError::InvalidFormat {
                        field: item.name.clone(),
                        expected,
                    });
                }
            },
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

fn coerce_item(item: &ConfigItem, value: &Value) -> Result<Value, String> {
    if item.multi {
        let elements = match value {
            Value::Array(elements) => elements.clone(),
            single => vec![single.clone()],
        };
        elements
            .iter()
            .map(|v| coerce_scalar(item.kind, v))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
            .map_err(|_| format!("list of {}", item.kind))
    } else {
        coerce_scalar(item.kind, value).map_err(|_| item.kind.to_string())
    }
}

fn coerce_scalar(kind: ConfigItemKind, value: &Value) -> Result<Value, ()> {
    match (kind, value) {
        (ConfigItemKind::String, Value::String(_)) => Ok(value.clone()),
        (ConfigItemKind::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (ConfigItemKind::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (ConfigItemKind::Number, Value::Number(_)) => Ok(value.clone()),
        (ConfigItemKind::Number, Value::String(s)) => {
            if let Ok(i) = s.parse::<i64>() {
                Ok(Value::from(i))
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or(())
            } else {
                Err(())
            }
        }
        (ConfigItemKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (ConfigItemKind::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(()),
        },
        _ => Err(()),
    }
}

impl<S, B, R, U, C> JobService<S, B, R, U, C>
where
    S: DocStore,
    B: AttachmentStore,
    R: AnalyzerRegistry,
    U: UserDirectory,
    C: Clock,
{
    /// Produce the analyzer's stdin document, materialising the
    /// attachment to a temp file when the job carries one.
    pub(crate) async fn stage_input(
        &self,
        job: &Job,
        analyzer: &Analyzer,
        definition: &AnalyzerDefinition,
    ) -> Result<StagedInput, JobError> {
        let parameters: Map<String, Value> =
            serde_json::from_str(&job.parameters).unwrap_or_default();

        let mut effective = analyzer.config.clone();
        deep_merge(&mut effective, &parameters);
        let validated = validate_config(&effective, &definition.configuration_items)?;
        let mut config = definition.configuration.clone();
        deep_merge(&mut config, &validated);

        let mut doc = Map::new();
        let file = match &job.observable {
            Observable::Data { data } => {
                doc.insert("data".to_string(), Value::String(data.clone()));
                None
            }
            Observable::Attachment { attachment } => {
                let path = self.materialise(attachment).await?;
                doc.insert(
                    "file".to_string(),
                    Value::String(path.display().to_string()),
                );
                doc.insert(
                    "filename".to_string(),
                    Value::String(attachment.name.clone()),
                );
                doc.insert(
                    "contentType".to_string(),
                    Value::String(attachment.content_type.clone()),
                );
                Some(path)
            }
        };
        doc.insert("dataType".to_string(), Value::String(job.data_type.clone()));
        doc.insert("message".to_string(), Value::String(job.message.clone()));
        doc.insert("config".to_string(), Value::Object(config));

        Ok(StagedInput {
            doc: Value::Object(doc),
            file,
        })
    }

    /// Stream the attachment blob to a fresh temp file. A stream error
    /// fails the job before the analyzer is spawned.
    async fn materialise(&self, attachment: &Attachment) -> Result<TempPath, JobError> {
        let mut source = self.attachments.source(&attachment.id).await?;
        let path = NamedTempFile::new()?.into_temp_path();
        let mut file = tokio::fs::File::create(&path).await?;
        tokio::io::copy(&mut source, &mut file).await?;
        file.flush().await?;
        tracing::debug!(
            attachment = %attachment.id,
            path = %path.display(),
            "attachment materialised"
        );
        Ok(path)
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
