// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for the control socket.
//!
//! Accepts connections and handles each in a spawned task so a slow
//! client never blocks submissions from others.

use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info};

use crate::protocol::{self, Request, Response, IO_DEADLINE};
use crate::registry_file::{FileRegistry, StaticUsers};
use verdict_core::SystemClock;
use verdict_engine::{JobFilter, JobService};
use verdict_store::{MemoryAttachmentStore, MemoryStore};

/// The concrete service type the daemon wires together.
pub type DaemonService =
    JobService<MemoryStore, MemoryAttachmentStore, FileRegistry, StaticUsers, SystemClock>;

/// Accept loop; runs until the socket is dropped.
pub async fn run(socket: UnixListener, service: Arc<DaemonService>) {
    loop {
        match socket.accept().await {
            Ok((stream, _)) => {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, service.as_ref()).await {
                        match e {
                            protocol::WireError::Closed => debug!("client disconnected"),
                            protocol::WireError::Deadline(_) => debug!("client timed out"),
                            _ => error!(error = %e, "connection error"),
                        }
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "accept error");
            }
        }
    }
}

/// One request, one response, per connection.
async fn handle_connection(
    stream: UnixStream,
    service: &DaemonService,
) -> Result<(), protocol::WireError> {
    let (mut reader, mut writer) = stream.into_split();
    let request: Request = protocol::recv(&mut reader, IO_DEADLINE).await?;
    info!(request = ?request, "received request");
    let response = handle_request(request, service).await;
    protocol::send(&mut writer, &response, IO_DEADLINE).await
}

pub(crate) async fn handle_request(request: Request, service: &DaemonService) -> Response {
    match request {
        Request::Ping => Response::Pong {
            version: env!("CARGO_PKG_VERSION").to_string(),
        },

        Request::Submit {
            user,
            analyzer_id,
            fields,
        } => match service.submit(&user, &analyzer_id, &fields).await {
            Ok(job) => Response::job(&job),
            Err(e) => Response::error(&e),
        },

        Request::GetJob { user, job_id } => match service.get_for_user(&user, &job_id).await {
            Ok(job) => Response::job(&job),
            Err(e) => Response::error(&e),
        },

        Request::ListJobs {
            user,
            data_type,
            data,
            analyzer,
            range,
        } => {
            let filter = JobFilter {
                data_type,
                data,
                analyzer,
            };
            match service.list_for_user(&user, &filter, range.as_deref()).await {
                Ok((jobs, total)) => Response::Jobs {
                    jobs: jobs.iter().map(protocol::job_value).collect(),
                    total,
                },
                Err(e) => Response::error(&e),
            }
        }

        Request::GetReport { user, job_id } => {
            // Organisation scoping happens on the job lookup.
            match service.get_for_user(&user, &job_id).await {
                Ok(job) => match service.get_report(&job.id).await {
                    Ok(report) => Response::Report { report },
                    Err(e) => Response::error(&e),
                },
                Err(e) => Response::error(&e),
            }
        }

        Request::ListArtifacts {
            user,
            job_id,
            range,
        } => {
            match service
                .find_artifacts(
                    &user,
                    &job_id,
                    verdict_store::Query::All,
                    range.as_deref(),
                    &[],
                )
                .await
            {
                Ok((artifacts, total)) => Response::Artifacts { artifacts, total },
                Err(e) => Response::error(&e),
            }
        }

        Request::DeleteJob { user, job_id } => {
            match service.get_for_user(&user, &job_id).await {
                Ok(job) => match service.delete(&job.id).await {
                    Ok(()) => Response::Deleted,
                    Err(e) => Response::error(&e),
                },
                Err(e) => Response::error(&e),
            }
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
