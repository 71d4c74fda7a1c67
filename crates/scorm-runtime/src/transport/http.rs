// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared HTTP plumbing for the network transports.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};

use super::{CONTENT_TYPE_JSON, CommitRequest};
use crate::config::AdapterConfig;
use crate::error::{AdapterError, Result};

pub(crate) fn build_client(config: &AdapterConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .map_err(|e| AdapterError::Config(format!("failed to build http client: {}", e)))
}

/// POST one commit body. Returns the response status; the body is ignored.
pub(crate) async fn post_commit(
    client: &Client,
    request: CommitRequest,
) -> reqwest::Result<StatusCode> {
    let response = client
        .post(request.endpoint)
        .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
        .body(request.body)
        .send()
        .await?;
    Ok(response.status())
}
