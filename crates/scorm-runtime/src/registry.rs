// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Global installation points for the run-time API.
//!
//! Content discovers the adapter by name: `API` for SCORM 1.2 and
//! `API_1484_11` for SCORM 2004. Each name holds at most one session for the
//! lifetime of the process (the native equivalent of one page load).

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{AdapterError, Result};
use crate::session::ScormSession;
use crate::types::ScormVersion;
use crate::variant::ApiDescriptor;

/// Global storage for the SCORM 1.2 adapter.
static API: OnceCell<InstalledApi> = OnceCell::new();

/// Global storage for the SCORM 2004 adapter.
static API_1484_11: OnceCell<InstalledApi> = OnceCell::new();

/// A session exposed under its variant's global name.
pub struct InstalledApi {
    descriptor: &'static ApiDescriptor,
    session: Mutex<ScormSession>,
}

impl InstalledApi {
    pub fn new(session: ScormSession) -> Self {
        Self {
            descriptor: session.version().descriptor(),
            session: Mutex::new(session),
        }
    }

    pub fn descriptor(&self) -> &'static ApiDescriptor {
        self.descriptor
    }

    /// Invoke a method by its SCORM name, e.g. `call("LMSSetValue", &[k, v])`.
    pub fn call(&self, method: &str, args: &[&str]) -> String {
        self.session.lock().call(method, args)
    }

    /// Run `f` with exclusive access to the session.
    pub fn with_session<R>(&self, f: impl FnOnce(&mut ScormSession) -> R) -> R {
        f(&mut self.session.lock())
    }
}

fn slot(version: ScormVersion) -> &'static OnceCell<InstalledApi> {
    match version {
        ScormVersion::Scorm12 => &API,
        ScormVersion::Scorm2004 => &API_1484_11,
    }
}

/// Install `session` under its variant's global name.
///
/// This should be called once at startup, after the session is created.
/// Installing a second session under the same name fails with
/// [`AdapterError::AlreadyInstalled`]; the rejected session is dropped.
///
/// # Example
///
/// ```ignore
/// use scorm_runtime::{install, AdapterConfig, ScormSession};
///
/// let config = AdapterConfig::from_env()?;
/// let transport = scorm_runtime::transport::connect(&config)?;
/// let api = install(ScormSession::scorm2004(&config, transport))?;
///
/// assert_eq!(api.call("Initialize", &[""]), "true");
/// ```
pub fn install(session: ScormSession) -> Result<&'static InstalledApi> {
    let version = session.version();
    let name = version.global_name();

    match slot(version).try_insert(InstalledApi::new(session)) {
        Ok(api) => {
            debug!(global = name, "SCORM API installed");
            Ok(api)
        }
        Err(_) => Err(AdapterError::AlreadyInstalled(name)),
    }
}

/// The installed SCORM 1.2 adapter (`API`), if any.
pub fn api() -> Option<&'static InstalledApi> {
    API.get()
}

/// The installed SCORM 2004 adapter (`API_1484_11`), if any.
pub fn api_1484_11() -> Option<&'static InstalledApi> {
    API_1484_11.get()
}

/// Look an adapter up by the global name content searches for.
pub fn lookup(global_name: &str) -> Option<&'static InstalledApi> {
    [ScormVersion::Scorm12, ScormVersion::Scorm2004]
        .into_iter()
        .find(|version| version.global_name() == global_name)
        .and_then(|version| slot(version).get())
}
