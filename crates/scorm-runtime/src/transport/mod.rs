// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Commit transports.
//!
//! This module provides different ways to deliver a commit payload:
//! - `beacon`: queued, send-and-don't-wait delivery that survives unload
//! - `keepalive`: one detached request per commit, failures only logged
//! - `memory`: in-process recorder for tests and offline hosts
//!
//! A transport only *initiates* delivery. `dispatch` returns as soon as the
//! request is handed off and never waits for the network.

#[cfg(feature = "http")]
pub mod beacon;
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub mod keepalive;
pub mod memory;

#[cfg(feature = "http")]
use std::sync::Arc;

#[cfg(feature = "http")]
use tracing::debug;
use url::Url;

#[cfg(feature = "http")]
use crate::config::AdapterConfig;
use crate::error::Result;
use crate::types::CommitPayload;

#[cfg(feature = "http")]
use self::beacon::BeaconTransport;
#[cfg(feature = "http")]
use self::keepalive::KeepaliveTransport;

/// Content type of every commit body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// A serialized commit ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub endpoint: Url,
    pub body: Vec<u8>,
}

impl CommitRequest {
    /// Serialize the whole payload into one JSON body.
    pub fn new(endpoint: Url, payload: &CommitPayload) -> Result<Self> {
        let body = serde_json::to_vec(payload)?;
        Ok(Self { endpoint, body })
    }
}

/// Which delivery mechanism a transport uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Beacon,
    Keepalive,
    Memory,
}

/// Transport trait for commit delivery.
///
/// Implementations must not block on network completion. An `Err` from
/// `dispatch` means the request was never handed off; the adapter keeps the
/// pending writes for the next commit in that case.
pub trait CommitTransport: Send + Sync {
    /// Delivery mechanism, used for logging.
    fn kind(&self) -> TransportKind;

    /// Whether `dispatch` can currently accept requests.
    fn is_available(&self) -> bool {
        true
    }

    /// Hand the request off for delivery.
    fn dispatch(&self, request: CommitRequest) -> Result<()>;
}

/// Beacon when available, keepalive otherwise.
#[cfg(feature = "http")]
pub struct PreferredTransport {
    beacon: Option<BeaconTransport>,
    keepalive: KeepaliveTransport,
}

#[cfg(feature = "http")]
impl PreferredTransport {
    pub fn new(beacon: Option<BeaconTransport>, keepalive: KeepaliveTransport) -> Self {
        Self { beacon, keepalive }
    }

    fn select(&self) -> &dyn CommitTransport {
        match &self.beacon {
            Some(beacon) if beacon.is_available() => beacon as &dyn CommitTransport,
            _ => &self.keepalive,
        }
    }

    /// Page unload: deliver queued beacons and wait for in-flight requests.
    pub async fn shutdown(&self) {
        if let Some(beacon) = &self.beacon {
            beacon.shutdown().await;
        }
        self.keepalive.drain().await;
    }
}

#[cfg(feature = "http")]
impl CommitTransport for PreferredTransport {
    fn kind(&self) -> TransportKind {
        self.select().kind()
    }

    fn is_available(&self) -> bool {
        self.select().is_available()
    }

    fn dispatch(&self, request: CommitRequest) -> Result<()> {
        self.select().dispatch(request)
    }
}

/// Build the network transport described by `config`.
///
/// Must be called from within a tokio runtime; delivery tasks are spawned
/// onto it.
#[cfg(feature = "http")]
pub fn connect(config: &AdapterConfig) -> Result<Arc<PreferredTransport>> {
    let client = http::build_client(config)?;
    let beacon = if config.use_beacon {
        Some(BeaconTransport::spawn(client.clone())?)
    } else {
        None
    };
    let keepalive = KeepaliveTransport::new(client)?;

    debug!(beacon = config.use_beacon, "Commit transport ready");
    Ok(Arc::new(PreferredTransport::new(beacon, keepalive)))
}
