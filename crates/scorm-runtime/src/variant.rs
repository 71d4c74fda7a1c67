// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Method-name tables for the two SCORM API surfaces.
//!
//! Both variants share one state machine; they only differ in the global
//! object name, the method names content calls and the wire version tag.

use crate::types::ScormVersion;

/// The eight operations of the run-time API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Initialize,
    Terminate,
    GetValue,
    SetValue,
    Commit,
    GetLastError,
    GetErrorString,
    GetDiagnostic,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 8] = [
        ApiMethod::Initialize,
        ApiMethod::Terminate,
        ApiMethod::GetValue,
        ApiMethod::SetValue,
        ApiMethod::Commit,
        ApiMethod::GetLastError,
        ApiMethod::GetErrorString,
        ApiMethod::GetDiagnostic,
    ];
}

/// Variant descriptor: global name plus one method name per [`ApiMethod`].
#[derive(Debug)]
pub struct ApiDescriptor {
    pub version: ScormVersion,
    pub global_name: &'static str,
    pub initialize: &'static str,
    pub terminate: &'static str,
    pub get_value: &'static str,
    pub set_value: &'static str,
    pub commit: &'static str,
    pub get_last_error: &'static str,
    pub get_error_string: &'static str,
    pub get_diagnostic: &'static str,
}

/// SCORM 1.2 surface, installed as `API`.
pub static API_12: ApiDescriptor = ApiDescriptor {
    version: ScormVersion::Scorm12,
    global_name: "API",
    initialize: "LMSInitialize",
    terminate: "LMSFinish",
    get_value: "LMSGetValue",
    set_value: "LMSSetValue",
    commit: "LMSCommit",
    get_last_error: "LMSGetLastError",
    get_error_string: "LMSGetErrorString",
    get_diagnostic: "LMSGetDiagnostic",
};

/// SCORM 2004 surface, installed as `API_1484_11`.
pub static API_2004: ApiDescriptor = ApiDescriptor {
    version: ScormVersion::Scorm2004,
    global_name: "API_1484_11",
    initialize: "Initialize",
    terminate: "Terminate",
    get_value: "GetValue",
    set_value: "SetValue",
    commit: "Commit",
    get_last_error: "GetLastError",
    get_error_string: "GetErrorString",
    get_diagnostic: "GetDiagnostic",
};

impl ApiDescriptor {
    /// Name content uses for `method` on this surface.
    pub fn name_of(&self, method: ApiMethod) -> &'static str {
        match method {
            ApiMethod::Initialize => self.initialize,
            ApiMethod::Terminate => self.terminate,
            ApiMethod::GetValue => self.get_value,
            ApiMethod::SetValue => self.set_value,
            ApiMethod::Commit => self.commit,
            ApiMethod::GetLastError => self.get_last_error,
            ApiMethod::GetErrorString => self.get_error_string,
            ApiMethod::GetDiagnostic => self.get_diagnostic,
        }
    }

    /// Resolve a method name. Names are case-sensitive and only match
    /// this surface (`LMSCommit` does not resolve on `API_1484_11`).
    pub fn resolve(&self, name: &str) -> Option<ApiMethod> {
        ApiMethod::ALL
            .into_iter()
            .find(|method| self.name_of(*method) == name)
    }

    /// Exact method set exposed by the installed global.
    pub fn methods(&self) -> [&'static str; 8] {
        ApiMethod::ALL.map(|method| self.name_of(method))
    }
}
