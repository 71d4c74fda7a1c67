// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The SCORM run-time session: one per content window.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::{AdapterConfig, resolve_commit_url};
use crate::error::Result;
use crate::transport::{CommitRequest, CommitTransport};
use crate::types::{CmiMap, CommitPayload, ErrorCode, ScormVersion, SessionPhase};
use crate::variant::ApiMethod;

/// Run-time state machine shared by the SCORM 1.2 and 2004 surfaces.
///
/// `Uninitialized -> Active -> Terminated`. Writes accumulate in `state`
/// (full snapshot) and `delta` (not yet committed); `Commit` and `Terminate`
/// send the whole delta as one payload through the transport.
///
/// None of the run-time operations return errors or panic. Failures are
/// reported through the return value (`false` / empty string) and the last
/// error code, which content polls with `GetLastError`.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use scorm_runtime::{AdapterConfig, MemoryTransport, ScormSession, ScormVersion};
///
/// let config = AdapterConfig::for_launch_url("https://lms.example/play?attempt=abc")?;
/// let mut session = ScormSession::new(ScormVersion::Scorm12, &config, Arc::new(MemoryTransport::new()));
///
/// assert_eq!(session.call("LMSInitialize", &[""]), "true");
/// session.call("LMSSetValue", &["cmi.core.lesson_status", "incomplete"]);
/// assert_eq!(session.call("LMSCommit", &[""]), "true");
/// ```
pub struct ScormSession {
    version: ScormVersion,
    launch_url: Option<Url>,
    commit_endpoint: String,
    attempt_token: Option<String>,
    transport: Arc<dyn CommitTransport>,
    phase: SessionPhase,
    last_error: ErrorCode,
    diagnostic: Option<String>,
    state: CmiMap,
    delta: CmiMap,
    /// Number of dispatched commits
    commits: u64,
}

impl ScormSession {
    /// Create a session for `version`.
    ///
    /// The endpoint and attempt token are copied from `config` here and never
    /// re-read. Neither is checked at this point: a missing token makes every
    /// commit fail with "201", an endpoint that cannot be resolved makes every
    /// commit fail with "101".
    pub fn new(
        version: ScormVersion,
        config: &AdapterConfig,
        transport: Arc<dyn CommitTransport>,
    ) -> Self {
        debug!(
            %version,
            commit_endpoint = %config.commit_endpoint,
            has_attempt_token = config.attempt_token.is_some(),
            "SCORM adapter loaded"
        );

        Self {
            version,
            launch_url: config.launch_url.clone(),
            commit_endpoint: config.commit_endpoint.clone(),
            attempt_token: config.attempt_token.clone(),
            transport,
            phase: SessionPhase::Uninitialized,
            last_error: ErrorCode::NoError,
            diagnostic: None,
            state: CmiMap::new(),
            delta: CmiMap::new(),
            commits: 0,
        }
    }

    /// SCORM 1.2 session (`API`).
    pub fn scorm12(config: &AdapterConfig, transport: Arc<dyn CommitTransport>) -> Self {
        Self::new(ScormVersion::Scorm12, config, transport)
    }

    /// SCORM 2004 session (`API_1484_11`).
    pub fn scorm2004(config: &AdapterConfig, transport: Arc<dyn CommitTransport>) -> Self {
        Self::new(ScormVersion::Scorm2004, config, transport)
    }

    // ========== Run-time operations ==========

    /// `Initialize` / `LMSInitialize`.
    pub fn initialize(&mut self) -> bool {
        self.clear_error();
        match self.phase {
            SessionPhase::Uninitialized => {
                self.phase = SessionPhase::Active;
                info!(version = %self.version, "SCORM session initialized");
                true
            }
            SessionPhase::Active => self.fail(ErrorCode::GeneralException, "already initialized"),
            SessionPhase::Terminated => {
                self.fail(ErrorCode::GeneralException, "session already terminated")
            }
        }
    }

    /// `Terminate` / `LMSFinish`.
    ///
    /// Flushes the delta best-effort. A failed flush is logged but does not
    /// fail the call; unsent writes stay visible through [`Self::pending`].
    pub fn terminate(&mut self) -> bool {
        self.clear_error();
        if !self.phase.is_initialized() {
            return self.fail(ErrorCode::InvalidState, "not initialized");
        }

        if !self.flush() {
            warn!(
                version = %self.version,
                error = %self.last_error,
                pending = self.delta.len(),
                "Final commit failed; pending writes were not sent"
            );
        }

        self.phase = SessionPhase::Terminated;
        self.clear_error();
        info!(version = %self.version, commits = self.commits, "SCORM session terminated");
        true
    }

    /// `GetValue` / `LMSGetValue`. Unknown elements read as `""`.
    pub fn get_value(&mut self, element: &str) -> String {
        self.clear_error();
        if !self.phase.is_initialized() {
            self.fail(ErrorCode::NotInitialized, "not initialized");
            return String::new();
        }
        self.state.get(element).cloned().unwrap_or_default()
    }

    /// `SetValue` / `LMSSetValue`. Last write per element wins.
    pub fn set_value(&mut self, element: &str, value: &str) -> bool {
        self.clear_error();
        if !self.phase.is_initialized() {
            return self.fail(ErrorCode::NotInitialized, "not initialized");
        }
        self.state.insert(element.to_string(), value.to_string());
        self.delta.insert(element.to_string(), value.to_string());
        true
    }

    /// `Commit` / `LMSCommit`.
    pub fn commit(&mut self) -> bool {
        self.clear_error();
        if !self.phase.is_initialized() {
            return self.fail(ErrorCode::NotInitialized, "not initialized");
        }
        self.flush()
    }

    /// `GetLastError` / `LMSGetLastError`.
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Human-readable text for a wire error code; empty for unknown codes.
    pub fn error_string(&self, code: &str) -> &'static str {
        ErrorCode::parse(code)
            .map(|code| code.description())
            .unwrap_or_default()
    }

    /// Most specific reason for the last failure.
    pub fn diagnostic(&self) -> String {
        self.diagnostic
            .clone()
            .unwrap_or_else(|| self.last_error.description().to_string())
    }

    // ========== String surface ==========

    /// Invoke a SCORM method by the name content uses on this variant.
    ///
    /// Returns exactly what the run-time API returns: `"true"`/`"false"`,
    /// the element value, or the error code. The three error accessors all
    /// return the current error code. Unknown names and missing arguments
    /// set "101".
    pub fn call(&mut self, method: &str, args: &[&str]) -> String {
        let Some(api_method) = self.version.descriptor().resolve(method) else {
            self.clear_error();
            self.fail(ErrorCode::GeneralException, format!("unknown method {}", method));
            return String::new();
        };

        match api_method {
            ApiMethod::Initialize => scorm_bool(self.initialize()),
            ApiMethod::Terminate => scorm_bool(self.terminate()),
            ApiMethod::GetValue => match args {
                [element, ..] => self.get_value(element),
                [] => {
                    self.missing_argument(method);
                    String::new()
                }
            },
            ApiMethod::SetValue => match args {
                [element, value, ..] => scorm_bool(self.set_value(element, value)),
                _ => {
                    self.missing_argument(method);
                    scorm_bool(false)
                }
            },
            ApiMethod::Commit => scorm_bool(self.commit()),
            ApiMethod::GetLastError | ApiMethod::GetErrorString | ApiMethod::GetDiagnostic => {
                self.last_error.as_str().to_string()
            }
        }
    }

    // ========== Inspection ==========

    pub fn version(&self) -> ScormVersion {
        self.version
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn attempt_token(&self) -> Option<&str> {
        self.attempt_token.as_deref()
    }

    /// Absolute commit URL, resolved against the launch URL.
    pub fn endpoint(&self) -> Result<Url> {
        resolve_commit_url(self.launch_url.as_ref(), &self.commit_endpoint)
    }

    /// Writes not yet handed to the transport.
    pub fn pending(&self) -> &CmiMap {
        &self.delta
    }

    /// Every element set during the session.
    pub fn snapshot(&self) -> &CmiMap {
        &self.state
    }

    /// Number of commits dispatched so far.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    // ========== Internals ==========

    /// Send the current delta. Shared by `Commit` and `Terminate`.
    #[instrument(skip(self), fields(version = %self.version, pending = self.delta.len()))]
    fn flush(&mut self) -> bool {
        let Some(attempt_token) = self.attempt_token.clone() else {
            warn!("SCORM adapter: attempt token missing");
            return self.fail(ErrorCode::InvalidState, "attempt token missing");
        };

        let payload = CommitPayload {
            attempt_token,
            version: self.version,
            cmi: self.delta.clone(),
        };

        let dispatched = self
            .endpoint()
            .and_then(|endpoint| CommitRequest::new(endpoint, &payload))
            .and_then(|request| self.transport.dispatch(request));

        match dispatched {
            Ok(()) => {
                // Only drop what was actually sent.
                for (element, value) in &payload.cmi {
                    if self.delta.get(element) == Some(value) {
                        self.delta.remove(element);
                    }
                }
                self.commits += 1;
                debug!(
                    sequence = self.commits,
                    elements = payload.cmi.len(),
                    transport = ?self.transport.kind(),
                    "SCORM commit dispatched"
                );
                self.clear_error();
                true
            }
            Err(e) => {
                error!(error = %e, "SCORM commit error");
                self.fail(ErrorCode::GeneralException, e.to_string())
            }
        }
    }

    fn missing_argument(&mut self, method: &str) {
        self.clear_error();
        if !self.phase.is_initialized() {
            self.fail(ErrorCode::NotInitialized, "not initialized");
            return;
        }
        self.fail(
            ErrorCode::GeneralException,
            format!("{} called without required arguments", method),
        );
    }

    fn clear_error(&mut self) {
        self.last_error = ErrorCode::NoError;
        self.diagnostic = None;
    }

    fn fail(&mut self, code: ErrorCode, diagnostic: impl Into<String>) -> bool {
        self.last_error = code;
        self.diagnostic = Some(diagnostic.into());
        false
    }
}

impl Drop for ScormSession {
    fn drop(&mut self) {
        if self.phase.is_initialized() && !self.delta.is_empty() {
            warn!(
                version = %self.version,
                pending = self.delta.len(),
                "SCORM session dropped without Terminate; pending writes discarded"
            );
        }
    }
}

fn scorm_bool(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::transport::memory::MemoryTransport;

    const LAUNCH: &str = "https://lms.example/content/pkg/index.html?attempt=attempt-1";

    fn session_with(config: AdapterConfig) -> (ScormSession, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new());
        let session = ScormSession::scorm12(&config, transport.clone());
        (session, transport)
    }

    fn active_session() -> (ScormSession, Arc<MemoryTransport>) {
        let (mut session, transport) = session_with(AdapterConfig::for_launch_url(LAUNCH).unwrap());
        assert!(session.initialize());
        (session, transport)
    }

    #[test]
    fn test_last_write_wins() {
        let (mut session, _) = active_session();
        session.set_value("cmi.core.lesson_location", "page-1");
        session.set_value("cmi.core.lesson_location", "page-2");
        session.set_value("cmi.core.score.raw", "50");

        assert_eq!(session.get_value("cmi.core.lesson_location"), "page-2");
        assert_eq!(session.get_value("cmi.core.score.raw"), "50");
        assert_eq!(session.pending().len(), 2);
    }

    #[test]
    fn test_unknown_element_reads_empty() {
        let (mut session, _) = active_session();
        assert_eq!(session.get_value("cmi.suspend_data"), "");
        assert_eq!(session.last_error(), ErrorCode::NoError);
    }

    #[test]
    fn test_double_initialize() {
        let (mut session, _) = active_session();
        assert!(!session.initialize());
        assert_eq!(session.last_error(), ErrorCode::GeneralException);
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.set_value("cmi.core.exit", "suspend"));
    }

    #[test]
    fn test_use_before_initialize() {
        let (mut session, transport) = session_with(AdapterConfig::for_launch_url(LAUNCH).unwrap());

        assert_eq!(session.get_value("cmi.core.lesson_status"), "");
        assert_eq!(session.last_error(), ErrorCode::NotInitialized);

        assert!(!session.set_value("cmi.core.lesson_status", "passed"));
        assert_eq!(session.last_error(), ErrorCode::NotInitialized);

        assert!(!session.commit());
        assert_eq!(session.last_error(), ErrorCode::NotInitialized);

        assert!(session.snapshot().is_empty());
        assert_eq!(transport.dispatch_count(), 0);
    }

    #[test]
    fn test_error_resets_on_next_call() {
        let (mut session, _) = session_with(AdapterConfig::for_launch_url(LAUNCH).unwrap());
        session.commit();
        assert_eq!(session.last_error(), ErrorCode::NotInitialized);

        assert!(session.initialize());
        assert_eq!(session.last_error(), ErrorCode::NoError);
        assert_eq!(session.diagnostic(), "No error");
    }

    #[test]
    fn test_commit_sends_delta_and_clears_it() {
        let (mut session, transport) = active_session();
        session.set_value("cmi.core.lesson_status", "incomplete");

        assert!(session.commit());
        assert!(session.pending().is_empty());
        assert_eq!(
            session.snapshot().get("cmi.core.lesson_status").map(String::as_str),
            Some("incomplete")
        );

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].attempt_token, "attempt-1");
        assert_eq!(payloads[0].version, ScormVersion::Scorm12);
        assert_eq!(payloads[0].cmi["cmi.core.lesson_status"], "incomplete");
    }

    #[test]
    fn test_empty_commit_sends_empty_cmi() {
        let (mut session, transport) = active_session();
        session.set_value("cmi.core.lesson_status", "incomplete");
        session.commit();

        assert!(session.commit());
        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 2);
        assert!(payloads[1].cmi.is_empty());
        assert_eq!(session.commit_count(), 2);
    }

    #[test]
    fn test_terminate_flushes_once() {
        let (mut session, transport) = active_session();
        session.set_value("cmi.score.raw", "80");

        assert!(session.terminate());
        assert_eq!(transport.dispatch_count(), 1);
        assert_eq!(transport.payloads()[0].cmi["cmi.score.raw"], "80");

        assert_eq!(session.get_value("cmi.score.raw"), "");
        assert_eq!(session.last_error(), ErrorCode::NotInitialized);
    }

    #[test]
    fn test_terminate_twice() {
        let (mut session, transport) = active_session();
        assert!(session.terminate());
        assert!(!session.terminate());
        assert_eq!(session.last_error(), ErrorCode::InvalidState);
        assert_eq!(transport.dispatch_count(), 1);
    }

    #[test]
    fn test_terminate_before_initialize() {
        let (mut session, transport) = session_with(AdapterConfig::for_launch_url(LAUNCH).unwrap());
        assert!(!session.terminate());
        assert_eq!(session.last_error(), ErrorCode::InvalidState);
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert_eq!(transport.dispatch_count(), 0);
    }

    #[test]
    fn test_no_reinitialize_after_terminate() {
        let (mut session, _) = active_session();
        session.terminate();

        assert!(!session.initialize());
        assert_eq!(session.last_error(), ErrorCode::GeneralException);
        assert_eq!(session.phase(), SessionPhase::Terminated);
    }

    #[test]
    fn test_missing_token_keeps_delta() {
        let (mut session, transport) = session_with(
            AdapterConfig::for_launch_url("https://lms.example/content/index.html").unwrap(),
        );
        assert!(session.initialize());
        session.set_value("cmi.core.lesson_status", "completed");

        assert!(!session.commit());
        assert_eq!(session.last_error(), ErrorCode::InvalidState);
        assert_eq!(session.diagnostic(), "attempt token missing");
        assert_eq!(session.pending().len(), 1);
        assert_eq!(transport.dispatch_count(), 0);
    }

    #[test]
    fn test_terminate_without_token_still_succeeds() {
        let (mut session, transport) = session_with(
            AdapterConfig::for_launch_url("https://lms.example/content/index.html").unwrap(),
        );
        session.initialize();
        session.set_value("cmi.core.exit", "logout");

        assert!(session.terminate());
        assert_eq!(session.last_error(), ErrorCode::NoError);
        assert_eq!(session.phase(), SessionPhase::Terminated);
        assert_eq!(session.pending().len(), 1);
        assert_eq!(transport.dispatch_count(), 0);
    }

    #[test]
    fn test_dispatch_failure_keeps_delta_for_retry() {
        let (mut session, transport) = active_session();
        session.set_value("cmi.suspend_data", "abc");

        transport.set_reject_dispatch(true);
        assert!(!session.commit());
        assert_eq!(session.last_error(), ErrorCode::GeneralException);
        assert_eq!(session.pending()["cmi.suspend_data"], "abc");

        transport.set_reject_dispatch(false);
        session.set_value("cmi.core.lesson_location", "7");
        assert!(session.commit());

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].cmi.len(), 2);
        assert_eq!(payloads[0].cmi["cmi.suspend_data"], "abc");
        assert!(session.pending().is_empty());
    }

    #[test]
    fn test_string_surface() {
        let (mut session, transport) = session_with(AdapterConfig::for_launch_url(LAUNCH).unwrap());

        assert_eq!(session.call("LMSInitialize", &[""]), "true");
        assert_eq!(
            session.call("LMSSetValue", &["cmi.core.lesson_status", "incomplete"]),
            "true"
        );
        assert_eq!(
            session.call("LMSGetValue", &["cmi.core.lesson_status"]),
            "incomplete"
        );
        assert_eq!(session.call("LMSCommit", &[""]), "true");
        assert_eq!(session.call("LMSInitialize", &[""]), "false");
        assert_eq!(session.call("LMSGetLastError", &[]), "101");
        assert_eq!(session.call("LMSGetErrorString", &["101"]), "101");
        assert_eq!(session.call("LMSGetDiagnostic", &[""]), "101");
        assert_eq!(session.call("LMSFinish", &[""]), "true");
        assert_eq!(transport.dispatch_count(), 2);
    }

    #[test]
    fn test_string_surface_rejects_other_variant_names() {
        let (mut session, _) = active_session();
        assert_eq!(session.call("Initialize", &[""]), "");
        assert_eq!(session.last_error(), ErrorCode::GeneralException);
        assert_eq!(session.phase(), SessionPhase::Active);
    }

    #[test]
    fn test_string_surface_missing_arguments() {
        let (mut session, _) = active_session();
        assert_eq!(session.call("LMSSetValue", &["cmi.core.exit"]), "false");
        assert_eq!(session.call("LMSGetLastError", &[]), "101");
        assert!(session.snapshot().is_empty());
    }

    #[test]
    fn test_error_string_helper() {
        let (session, _) = active_session();
        assert_eq!(session.error_string("301"), "Not initialized");
        assert_eq!(session.error_string("999"), "");
    }

    #[test]
    fn test_session_without_launch_url_loads() {
        let transport = Arc::new(MemoryTransport::new());
        let mut session =
            ScormSession::scorm12(&AdapterConfig::new().with_attempt_token("tok"), transport.clone());
        assert_eq!(session.attempt_token(), Some("tok"));
        assert!(matches!(session.endpoint(), Err(AdapterError::Config(_))));

        assert!(session.initialize());
        assert!(session.set_value("cmi.core.lesson_status", "incomplete"));
        assert_eq!(session.get_value("cmi.core.lesson_status"), "incomplete");

        assert!(!session.commit());
        assert_eq!(session.last_error(), ErrorCode::GeneralException);
        assert_eq!(session.pending().len(), 1);
        assert_eq!(transport.dispatch_count(), 0);
    }

    #[test]
    fn test_endpoint_resolves_against_launch_url() {
        let (session, _) = active_session();
        assert_eq!(session.attempt_token(), Some("attempt-1"));
        assert_eq!(
            session.endpoint().unwrap().as_str(),
            "https://lms.example/api/scorm/commit"
        );
    }

    #[test]
    fn test_absolute_endpoint_without_launch_url() {
        let config = AdapterConfig::new()
            .with_attempt_token("tok")
            .with_commit_endpoint("https://tracking.example/commit");
        let transport = Arc::new(MemoryTransport::new());
        let mut session = ScormSession::scorm2004(&config, transport.clone());

        session.initialize();
        session.set_value("cmi.location", "4");
        assert!(session.commit());
        assert_eq!(
            transport.requests()[0].endpoint.as_str(),
            "https://tracking.example/commit"
        );
    }

    #[test]
    fn test_terminate_with_rejected_dispatch_still_succeeds() {
        let (mut session, transport) = active_session();
        session.set_value("cmi.core.lesson_status", "completed");
        transport.set_reject_dispatch(true);

        assert!(session.terminate());
        assert_eq!(session.last_error(), ErrorCode::NoError);
        assert_eq!(session.phase(), SessionPhase::Terminated);
        assert_eq!(session.pending()["cmi.core.lesson_status"], "completed");
        assert_eq!(transport.dispatch_count(), 0);
    }

    #[test]
    fn test_missing_arguments_before_initialize() {
        let (mut session, _) = session_with(AdapterConfig::for_launch_url(LAUNCH).unwrap());
        assert_eq!(session.call("LMSGetValue", &[]), "");
        assert_eq!(session.call("LMSGetLastError", &[]), "301");
        assert_eq!(session.call("LMSSetValue", &[]), "false");
        assert_eq!(session.last_error(), ErrorCode::NotInitialized);
    }
}
