// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Keepalive transport: one detached POST per commit.
//!
//! The request task outlives the call that spawned it. Rejections and
//! network failures are logged and otherwise swallowed; the caller has
//! already been told the commit succeeded.

use reqwest::Client;
use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use super::http::post_commit;
use super::{CommitRequest, CommitTransport, TransportKind};
use crate::error::{AdapterError, Result};

pub struct KeepaliveTransport {
    client: Client,
    handle: Handle,
    tracker: TaskTracker,
}

impl KeepaliveTransport {
    /// Create a transport spawning onto the current tokio runtime.
    pub fn new(client: Client) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| {
            AdapterError::Config("keepalive transport requires a tokio runtime".to_string())
        })?;
        Ok(Self {
            client,
            handle,
            tracker: TaskTracker::new(),
        })
    }

    /// Number of requests still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every in-flight request to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl CommitTransport for KeepaliveTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Keepalive
    }

    fn dispatch(&self, request: CommitRequest) -> Result<()> {
        let client = self.client.clone();
        self.tracker.spawn_on(
            async move {
                let endpoint = request.endpoint.clone();
                match post_commit(&client, request).await {
                    Ok(status) if status.is_success() => {
                        debug!(%endpoint, %status, "SCORM commit delivered");
                    }
                    Ok(status) => warn!(%endpoint, %status, "SCORM commit rejected"),
                    Err(e) => warn!(%endpoint, error = %e, "SCORM commit failed"),
                }
            },
            &self.handle,
        );
        Ok(())
    }
}
