// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Adapter configuration: where commits go and which attempt they belong to.

use std::env;

use tracing::warn;
use url::Url;

use crate::error::{AdapterError, Result};
use crate::types::LaunchDescriptor;

/// Default commit endpoint, relative to the launch URL.
pub const DEFAULT_COMMIT_ENDPOINT: &str = "/api/scorm/commit";

/// Query parameter carrying the attempt token on the launch URL.
pub const ATTEMPT_QUERY_PARAM: &str = "attempt";

/// Adapter configuration.
///
/// The attempt token is resolved once, when the configuration is built:
/// an explicit override wins, otherwise the `attempt` query parameter of the
/// launch URL is used. An empty token counts as absent.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// URL of the document hosting the content (default: none)
    pub launch_url: Option<Url>,
    /// Commit endpoint, absolute or relative to `launch_url` (default: "/api/scorm/commit")
    pub commit_endpoint: String,
    /// Attempt token, if one could be resolved
    pub attempt_token: Option<String>,
    /// Keepalive request timeout in milliseconds (default: 10_000)
    pub request_timeout_ms: u64,
    /// Offer the beacon transport (default: true)
    pub use_beacon: bool,
}

impl AdapterConfig {
    /// Load configuration from environment variables.
    ///
    /// # Optional Environment Variables
    /// - `SCORM_LAUNCH_URL` - Hosting document URL; `?attempt=` supplies the token
    /// - `SCORM_ATTEMPT_TOKEN` - Attempt token override (wins over the query parameter)
    /// - `SCORM_COMMIT_ENDPOINT` - Commit endpoint (default: "/api/scorm/commit")
    /// - `SCORM_REQUEST_TIMEOUT_MS` - Keepalive request timeout (default: 10000)
    /// - `SCORM_USE_BEACON` - Offer the beacon transport (default: true)
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("SCORM_LAUNCH_URL") {
            Ok(launch_url) if !launch_url.trim().is_empty() => Self::for_launch_url(&launch_url)
                .map_err(|e| AdapterError::Config(format!("invalid SCORM_LAUNCH_URL: {}", e)))?,
            _ => Self::new(),
        };

        if let Ok(token) = env::var("SCORM_ATTEMPT_TOKEN") {
            config = config.with_attempt_token(token);
        }

        if let Some(endpoint) = env::var("SCORM_COMMIT_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            config.commit_endpoint = endpoint;
        }

        config.request_timeout_ms = env::var("SCORM_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000);

        config.use_beacon = env::var("SCORM_USE_BEACON")
            .map(|v| !(v == "false" || v == "0"))
            .unwrap_or(true);

        Ok(config)
    }

    /// Create a configuration with no launch URL and no attempt token.
    pub fn new() -> Self {
        Self {
            launch_url: None,
            commit_endpoint: DEFAULT_COMMIT_ENDPOINT.to_string(),
            attempt_token: None,
            request_timeout_ms: 10_000,
            use_beacon: true,
        }
    }

    /// Create a configuration for content hosted at `launch_url`.
    ///
    /// The attempt token is taken from the `attempt` query parameter.
    pub fn for_launch_url(launch_url: &str) -> Result<Self> {
        let url = Url::parse(launch_url)?;
        let attempt_token = url
            .query_pairs()
            .find(|(key, _)| key == ATTEMPT_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty());

        Ok(Self {
            launch_url: Some(url),
            attempt_token,
            ..Self::new()
        })
    }

    /// Create a configuration from a launch response.
    pub fn from_launch(launch: &LaunchDescriptor) -> Result<Self> {
        if launch.is_expired() {
            warn!(
                expires_at = %launch.expires_at,
                "Launching with an expired attempt; commits may be rejected"
            );
        }
        Ok(Self::for_launch_url(&launch.launch_url)?.with_attempt_token(&launch.attempt_token))
    }

    /// Override the attempt token. An empty override is ignored.
    pub fn with_attempt_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if !token.is_empty() {
            self.attempt_token = Some(token);
        }
        self
    }

    /// Set the commit endpoint.
    pub fn with_commit_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.commit_endpoint = endpoint.into();
        self
    }

    /// Set the keepalive request timeout.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable the beacon transport.
    pub fn with_beacon(mut self, use_beacon: bool) -> Self {
        self.use_beacon = use_beacon;
        self
    }

    /// Absolute commit URL.
    ///
    /// A relative endpoint is joined onto the launch URL, the same way a
    /// browser resolves it against the hosting document.
    pub fn commit_url(&self) -> Result<Url> {
        resolve_commit_url(self.launch_url.as_ref(), &self.commit_endpoint)
    }
}

pub(crate) fn resolve_commit_url(launch_url: Option<&Url>, endpoint: &str) -> Result<Url> {
    match Url::parse(endpoint) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = launch_url.ok_or_else(|| {
                AdapterError::Config(format!(
                    "commit endpoint '{}' is relative but no launch url is set",
                    endpoint
                ))
            })?;
            Ok(base.join(endpoint)?)
        }
        Err(e) => Err(e.into()),
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}
