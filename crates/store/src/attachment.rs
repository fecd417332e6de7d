// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob storage for submitted attachments.

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncRead;

use verdict_core::{Attachment, IdGen, UuidIdGen};

/// Errors from attachment storage
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment not found: {0}")]
    NotFound(String),
    #[error("attachment stream error: {0}")]
    Stream(String),
}

/// Byte stream handed back by [`AttachmentStore::source`].
pub type AttachmentSource = Box<dyn AsyncRead + Send + Unpin>;

/// Blob store holding attachment content addressed by id.
#[async_trait]
pub trait AttachmentStore: Send + Sync + 'static {
    /// Persist a blob and return its reference, including the SHA-256
    /// hex digest of the content.
    async fn save(
        &self,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<Attachment, AttachmentError>;

    /// Open the blob content as a byte stream.
    async fn source(&self, id: &str) -> Result<AttachmentSource, AttachmentError>;
}

/// In-memory blob store.
#[derive(Clone, Default)]
pub struct MemoryAttachmentStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    idgen: UuidIdGen,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn save(
        &self,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<Attachment, AttachmentError> {
        let id = self.idgen.next();
        let hash = format!("{:x}", Sha256::digest(&content));
        let size = content.len() as u64;
        self.blobs.write().insert(id.clone(), content);
        Ok(Attachment {
            id,
            name: name.to_string(),
            content_type: content_type.to_string(),
            size,
            hash,
        })
    }

    async fn source(&self, id: &str) -> Result<AttachmentSource, AttachmentError> {
        let content = self
            .blobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AttachmentError::NotFound(id.to_string()))?;
        Ok(Box::new(std::io::Cursor::new(content)))
    }
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;
