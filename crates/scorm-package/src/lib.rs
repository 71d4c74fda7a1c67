// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SCORM package inspection.
//!
//! Locates `imsmanifest.xml` inside a zipped package and extracts what is
//! needed to launch it: the entry point and the declared SCORM version.
//!
//! ```ignore
//! let bytes = std::fs::read("course.zip")?;
//! let details = scorm_package::read_manifest(&bytes)?;
//! println!("{} ({:?})", details.entry_point, details.runtime_version());
//! ```

mod error;
mod manifest;

pub use error::{PackageError, Result};
pub use manifest::{
    DEFAULT_VERSION, MANIFEST_FILE, ManifestDetails, parse_manifest, read_manifest,
    read_manifest_from,
};
