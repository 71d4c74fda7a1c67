// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! High-level types shared by the adapter variants.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::variant::{API_12, API_2004, ApiDescriptor};

/// CMI data-model elements keyed by dot-path (`cmi.core.lesson_status`).
pub type CmiMap = BTreeMap<String, String>;

/// SCORM run-time flavour. Fixed per adapter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScormVersion {
    /// SCORM 1.2 (`window.API`, `LMS*` methods)
    #[serde(rename = "SCORM_12")]
    Scorm12,
    /// SCORM 2004 (`window.API_1484_11`)
    #[serde(rename = "SCORM_2004")]
    Scorm2004,
}

impl ScormVersion {
    /// Tag sent as `version` in every commit payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scorm12 => "SCORM_12",
            Self::Scorm2004 => "SCORM_2004",
        }
    }

    /// Method-name table for this variant.
    pub fn descriptor(&self) -> &'static ApiDescriptor {
        match self {
            Self::Scorm12 => &API_12,
            Self::Scorm2004 => &API_2004,
        }
    }

    /// Name of the global object content looks for.
    pub fn global_name(&self) -> &'static str {
        self.descriptor().global_name
    }
}

impl fmt::Display for ScormVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SCORM error codes used by the adapter.
///
/// SCORM error codes are string-typed on the wire; [`ErrorCode::as_str`]
/// gives the exact value content reads back from `GetLastError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// "0" - no error
    #[default]
    NoError,
    /// "101" - general failure, commit dispatch failure or double initialize
    GeneralException,
    /// "201" - terminate in the wrong state, or attempt token missing
    InvalidState,
    /// "301" - data access or commit while not initialized
    NotInitialized,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "0",
            Self::GeneralException => "101",
            Self::InvalidState => "201",
            Self::NotInitialized => "301",
        }
    }

    /// Human-readable text for the code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoError => "No error",
            Self::GeneralException => "General exception",
            Self::InvalidState => "Invalid state for this call",
            Self::NotInitialized => "Not initialized",
        }
    }

    /// Parse a wire code. Only the four codes the adapter emits are known.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(Self::NoError),
            "101" => Some(Self::GeneralException),
            "201" => Some(Self::InvalidState),
            "301" => Some(Self::NotInitialized),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        *self != Self::NoError
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one adapter instance.
///
/// `Terminated` is final: there is no path back to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Loaded, waiting for `Initialize`
    #[default]
    Uninitialized,
    /// Between a successful `Initialize` and `Terminate`
    Active,
    /// `Terminate` succeeded
    Terminated,
}

impl SessionPhase {
    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

/// JSON body posted to the commit endpoint.
///
/// ```json
/// { "attemptToken": "...", "version": "SCORM_12", "cmi": { "cmi.core.lesson_status": "incomplete" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitPayload {
    /// Identifies the enrollment attempt server-side
    pub attempt_token: String,
    /// Variant that produced the writes
    pub version: ScormVersion,
    /// Pending writes, last value per element
    pub cmi: CmiMap,
}

/// Launch response handed out by the LMS when a learner opens a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchDescriptor {
    /// URL of the package entry point
    pub launch_url: String,
    /// Token used to authenticate CMI commits
    pub attempt_token: String,
    /// Attempt expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Package version as detected from the manifest (free text)
    pub version: String,
}

impl LaunchDescriptor {
    /// Whether the attempt has expired at `now`.
    ///
    /// The adapter only logs this; the commit endpoint decides what an
    /// expired token means.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}
