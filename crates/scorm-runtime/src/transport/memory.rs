// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory transport: records every dispatched commit.

use parking_lot::Mutex;

use super::{CommitRequest, CommitTransport, TransportKind};
use crate::error::{AdapterError, Result};
use crate::types::CommitPayload;

#[derive(Debug, Default)]
struct Recorder {
    requests: Vec<CommitRequest>,
    reject_dispatch: bool,
    unavailable: bool,
}

/// Transport that keeps dispatched requests in memory.
///
/// Can be told to reject dispatch synchronously, which is how the adapter's
/// "dispatch failed, keep the pending writes" path is exercised.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inner: Mutex<Recorder>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent dispatches fail (or succeed again).
    pub fn set_reject_dispatch(&self, reject: bool) {
        self.inner.lock().reject_dispatch = reject;
    }

    /// Report the transport as unavailable. Dispatch fails while unavailable.
    pub fn set_available(&self, available: bool) {
        self.inner.lock().unavailable = !available;
    }

    /// Raw requests in dispatch order.
    pub fn requests(&self) -> Vec<CommitRequest> {
        self.inner.lock().requests.clone()
    }

    /// Decoded payloads in dispatch order.
    pub fn payloads(&self) -> Vec<CommitPayload> {
        self.inner
            .lock()
            .requests
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    pub fn dispatch_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn clear(&self) {
        self.inner.lock().requests.clear();
    }
}

impl CommitTransport for MemoryTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Memory
    }

    fn is_available(&self) -> bool {
        !self.inner.lock().unavailable
    }

    fn dispatch(&self, request: CommitRequest) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.unavailable {
            return Err(AdapterError::Transport("transport unavailable".to_string()));
        }
        if inner.reject_dispatch {
            return Err(AdapterError::Transport("dispatch rejected".to_string()));
        }
        inner.requests.push(request);
        Ok(())
    }
}
