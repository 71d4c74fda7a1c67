// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Adapter error types.
//!
//! These errors are for the host embedding the adapter (configuration,
//! transport construction, installation). SCORM content never sees them:
//! the public run-time operations translate failures into an [`ErrorCode`].
//!
//! [`ErrorCode`]: crate::ErrorCode

use thiserror::Error;

/// Errors that can occur while configuring or wiring the adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Configuration error (missing or invalid setting)
    #[error("configuration error: {0}")]
    Config(String),

    /// Launch or endpoint URL could not be parsed
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Commit dispatch could not be initiated
    #[error("transport error: {0}")]
    Transport(String),

    /// Commit payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A session is already installed under this global name
    #[error("{0} is already installed")]
    AlreadyInstalled(&'static str),
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Serialization(err.to_string())
    }
}

/// Type alias for adapter results.
pub type Result<T> = std::result::Result<T, AdapterError>;
