// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The submitted datum: a raw string or an uploaded attachment.

use serde::{Deserialize, Serialize};

/// Reference to a blob held by the attachment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    /// SHA-256 hex digest of the blob content
    pub hash: String,
}

/// Exactly one of a raw data string or an attachment reference.
///
/// The wire shape keeps these as two optional fields (`data` /
/// `attachment`); in memory the invariant is carried by the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observable {
    Data { data: String },
    Attachment { attachment: Attachment },
}

impl Observable {
    pub fn data(value: impl Into<String>) -> Self {
        Observable::Data { data: value.into() }
    }

    pub fn attachment(attachment: Attachment) -> Self {
        Observable::Attachment { attachment }
    }

    pub fn as_data(&self) -> Option<&str> {
        match self {
            Observable::Data { data } => Some(data),
            Observable::Attachment { .. } => None,
        }
    }

    pub fn as_attachment(&self) -> Option<&Attachment> {
        match self {
            Observable::Data { .. } => None,
            Observable::Attachment { attachment } => Some(attachment),
        }
    }

    /// Identity used for similar-job matching: the data string itself,
    /// or the attachment's blob id.
    pub fn identity(&self) -> &str {
        match self {
            Observable::Data { data } => data,
            Observable::Attachment { attachment } => &attachment.id,
        }
    }
}

#[cfg(test)]
#[path = "observable_tests.rs"]
mod tests;
