// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SCORM Runtime - the run-time API that SCORM content packages call.
//!
//! This crate provides the adapter object SCORM content looks for when it
//! starts: `API` (SCORM 1.2) or `API_1484_11` (SCORM 2004). Both surfaces are
//! one state machine parameterized by a method-name table.
//!
//! # Features
//!
//! - **Session lifecycle**: `Initialize` → `Terminate`, no reset path
//! - **CMI buffering**: full snapshot plus a delta of uncommitted writes
//! - **Best-effort commits**: the whole delta is posted as one JSON payload
//!   through a beacon queue or a detached keepalive request
//! - **SCORM error codes**: failures are reported through `GetLastError`,
//!   never as panics or `Err` values
//!
//! # Quick Start
//!
//! ```ignore
//! use scorm_runtime::{install, transport, AdapterConfig, ScormSession};
//!
//! #[tokio::main]
//! async fn main() -> scorm_runtime::Result<()> {
//!     let config = AdapterConfig::for_launch_url("https://lms.example/play/index.html?attempt=abc")?;
//!     let transport = transport::connect(&config)?;
//!
//!     let api = install(ScormSession::scorm12(&config, transport.clone()))?;
//!
//!     // What content does:
//!     api.call("LMSInitialize", &[""]);
//!     api.call("LMSSetValue", &["cmi.core.lesson_status", "incomplete"]);
//!     api.call("LMSCommit", &[""]);
//!     api.call("LMSFinish", &[""]);
//!
//!     // Page unload: deliver anything still queued.
//!     transport.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Commit payload
//!
//! ```json
//! { "attemptToken": "abc", "version": "SCORM_12", "cmi": { "cmi.core.lesson_status": "incomplete" } }
//! ```
//!
//! Delivery is at-most-once. Once a request has been handed to the
//! transport the pending writes are dropped; only a failure to hand it off
//! keeps them for the next commit.
//!
//! # Configuration
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `SCORM_LAUNCH_URL` | No | - | Hosting document URL (`?attempt=` supplies the token) |
//! | `SCORM_ATTEMPT_TOKEN` | No | - | Attempt token override |
//! | `SCORM_COMMIT_ENDPOINT` | No | `/api/scorm/commit` | Commit endpoint |
//! | `SCORM_REQUEST_TIMEOUT_MS` | No | `10000` | Keepalive request timeout |
//! | `SCORM_USE_BEACON` | No | `true` | Offer the beacon transport |

mod config;
mod error;
mod registry;
mod session;
pub mod transport;
mod types;
mod variant;

pub use config::{ATTEMPT_QUERY_PARAM, AdapterConfig, DEFAULT_COMMIT_ENDPOINT};
pub use error::{AdapterError, Result};
pub use registry::{InstalledApi, api, api_1484_11, install, lookup};
pub use session::ScormSession;
pub use transport::memory::MemoryTransport;
pub use transport::{CommitRequest, CommitTransport, TransportKind};
pub use types::{CmiMap, CommitPayload, ErrorCode, LaunchDescriptor, ScormVersion, SessionPhase};
pub use variant::{API_12, API_2004, ApiDescriptor, ApiMethod};

#[cfg(feature = "http")]
pub use transport::PreferredTransport;
