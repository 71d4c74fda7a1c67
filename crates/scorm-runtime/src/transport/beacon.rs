// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Beacon-style transport.
//!
//! Dispatch pushes the request onto an unbounded queue and returns. A single
//! background task drains the queue and POSTs each body; responses are never
//! read back. On shutdown the worker delivers whatever is still queued before
//! exiting, so commits made right before unload are not dropped.

use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

use super::http::post_commit;
use super::{CommitRequest, CommitTransport, TransportKind};
use crate::error::{AdapterError, Result};

pub struct BeaconTransport {
    queue: mpsc::UnboundedSender<CommitRequest>,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl BeaconTransport {
    /// Start the delivery worker on the current tokio runtime.
    pub fn spawn(client: Client) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| {
            AdapterError::Config("beacon transport requires a tokio runtime".to_string())
        })?;

        let (queue, mut pending) = mpsc::unbounded_channel::<CommitRequest>();
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        let worker_cancel = cancel.clone();
        tracker.spawn_on(
            async move {
                debug!("Beacon worker started");

                loop {
                    tokio::select! {
                        biased;

                        _ = worker_cancel.cancelled() => break,

                        next = pending.recv() => match next {
                            Some(request) => deliver(&client, request).await,
                            None => break,
                        },
                    }
                }

                // Unload: refuse new beacons, flush what was already queued.
                pending.close();
                while let Ok(request) = pending.try_recv() {
                    deliver(&client, request).await;
                }

                debug!("Beacon worker stopped");
            },
            &handle,
        );
        tracker.close();

        Ok(Self {
            queue,
            cancel,
            tracker,
        })
    }

    /// Stop accepting beacons and wait until the queue is delivered.
    ///
    /// Safe to call more than once.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.wait().await;
    }
}

impl CommitTransport for BeaconTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Beacon
    }

    fn is_available(&self) -> bool {
        !self.cancel.is_cancelled() && !self.queue.is_closed()
    }

    fn dispatch(&self, request: CommitRequest) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AdapterError::Transport("beacon queue is shut down".to_string()));
        }
        self.queue
            .send(request)
            .map_err(|_| AdapterError::Transport("beacon queue is closed".to_string()))
    }
}

async fn deliver(client: &Client, request: CommitRequest) {
    let endpoint = request.endpoint.clone();
    match post_commit(client, request).await {
        Ok(status) => trace!(%endpoint, %status, "Beacon delivered"),
        Err(e) => debug!(%endpoint, error = %e, "Beacon delivery failed"),
    }
}
