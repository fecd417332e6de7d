// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-socket protocol.
//!
//! A frame is a 4-byte big-endian payload length followed by that many
//! bytes of JSON. Each connection carries one request frame in and one
//! response frame out.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use verdict_core::{Artifact, Job, Report};
use verdict_engine::JobError;

/// Faults on the control socket
#[derive(Debug, Error)]
pub enum WireError {
    #[error("peer closed the connection")]
    Closed,

    #[error("frame of {0} bytes exceeds the {MAX_FRAME}-byte limit")]
    Oversized(usize),

    #[error("peer idle past {0:?}")]
    Deadline(Duration),

    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Frame payload cap (16 MB) — submissions are references, not blobs.
pub const MAX_FRAME: usize = 16 * 1024 * 1024;

/// How long one side may sit idle inside a single exchange.
pub const IO_DEADLINE: Duration = Duration::from_secs(5);

/// A request from a client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Ping,
    Submit {
        user: String,
        analyzer_id: String,
        fields: Value,
    },
    GetJob {
        user: String,
        job_id: String,
    },
    ListJobs {
        user: String,
        #[serde(default)]
        data_type: Option<String>,
        #[serde(default)]
        data: Option<String>,
        #[serde(default)]
        analyzer: Option<String>,
        #[serde(default)]
        range: Option<String>,
    },
    GetReport {
        user: String,
        job_id: String,
    },
    ListArtifacts {
        user: String,
        job_id: String,
        #[serde(default)]
        range: Option<String>,
    },
    DeleteJob {
        user: String,
        job_id: String,
    },
}

/// A response to a client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong {
        version: String,
    },
    Job {
        job: Value,
    },
    Jobs {
        jobs: Vec<Value>,
        total: u64,
    },
    Report {
        report: Report,
    },
    Artifacts {
        artifacts: Vec<Artifact>,
        total: u64,
    },
    Deleted,
    Error {
        kind: ErrorKind,
        message: String,
    },
}

/// Client-facing error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    RateLimited,
    Invalid,
    Internal,
}

/// Serialize a job for the wire, synthesising the read-side `fromCache`
/// flag the stored record never carries.
pub fn job_value(job: &Job) -> Value {
    let mut value = serde_json::to_value(job).unwrap_or(Value::Null);
    if job.from_cache {
        if let Some(map) = value.as_object_mut() {
            map.insert("fromCache".to_string(), Value::Bool(true));
        }
    }
    value
}

impl Response {
    pub fn job(job: &Job) -> Response {
        Response::Job {
            job: job_value(job),
        }
    }

    pub fn error(e: &JobError) -> Response {
        let kind = match e {
            JobError::NotFound(_) => ErrorKind::NotFound,
            JobError::RateLimitExceeded { .. } => ErrorKind::RateLimited,
            JobError::MissingAttribute(_)
            | JobError::InvalidFormatAttribute(_)
            | JobError::AttributeChecking(_) => ErrorKind::Invalid,
            _ => ErrorKind::Internal,
        };
        Response::Error {
            kind,
            message: e.to_string(),
        }
    }
}

/// Fill `buf` from the reader, folding an EOF anywhere in the frame
/// into [`WireError::Closed`].
async fn read_to<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), WireError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(WireError::Closed),
        Err(e) => Err(WireError::Socket(e)),
    }
}

/// Receive and decode one frame, bounded by `deadline`.
pub async fn recv<T, R>(reader: &mut R, deadline: Duration) -> Result<T, WireError>
where
    T: DeserializeOwned,
    R: tokio::io::AsyncReadExt + Unpin,
{
    let frame = async {
        let mut header = [0u8; 4];
        read_to(reader, &mut header).await?;
        let len = u32::from_be_bytes(header) as usize;
        if len > MAX_FRAME {
            return Err(WireError::Oversized(len));
        }
        let mut payload = vec![0u8; len];
        read_to(reader, &mut payload).await?;
        Ok(payload)
    };
    let payload = tokio::time::timeout(deadline, frame)
        .await
        .map_err(|_| WireError::Deadline(deadline))??;
    Ok(serde_json::from_slice(&payload)?)
}

/// Encode and send one frame, bounded by `deadline`.
///
/// The header and payload go out as a single buffer so a frame is never
/// visible half-written.
pub async fn send<T, W>(writer: &mut W, message: &T, deadline: Duration) -> Result<(), WireError>
where
    T: Serialize,
    W: tokio::io::AsyncWriteExt + Unpin,
{
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_FRAME {
        return Err(WireError::Oversized(payload.len()));
    }
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);

    tokio::time::timeout(deadline, async {
        writer.write_all(&frame).await?;
        writer.flush().await?;
        Ok(())
    })
    .await
    .map_err(|_| WireError::Deadline(deadline))?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
