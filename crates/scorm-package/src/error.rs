// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Package inspection errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    /// No imsmanifest.xml anywhere in the archive
    #[error("imsmanifest.xml not found in SCORM package")]
    ManifestNotFound,

    /// Manifest is not valid XML or lacks a usable entry point
    #[error("manifest parse error: {0}")]
    ManifestParse(String),

    /// Archive could not be opened or read
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PackageError>;
