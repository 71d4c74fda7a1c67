// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! imsmanifest.xml discovery and parsing.
//!
//! Element matching is by tag-name suffix, case-insensitive, so namespaced
//! and prefixed manifests (`adlcp:schemaversion`) parse the same way.

use std::io::{Cursor, Read, Seek};

use roxmltree::{Document, Node, ParsingOptions};
use scorm_runtime::ScormVersion;
use serde::Serialize;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{PackageError, Result};

pub const MANIFEST_FILE: &str = "imsmanifest.xml";

/// Archive directories never searched for a manifest.
const IGNORED_DIRS: [&str; 1] = ["__MACOSX"];

/// Version reported when the manifest does not declare one.
pub const DEFAULT_VERSION: &str = "SCORM 1.2";

/// What the LMS needs to launch a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDetails {
    /// Launch file, relative to the archive root
    pub entry_point: String,
    /// Declared schema version, free text (`"1.2"`, `"2004 4th Edition"`)
    pub version: String,
    /// Archive path of the manifest itself
    pub manifest_path: String,
    /// Raw manifest, lossily decoded as UTF-8
    pub manifest_xml: String,
}

impl ManifestDetails {
    /// Run-time API the package expects, if the declared version is known.
    pub fn runtime_version(&self) -> Option<ScormVersion> {
        let version = self.version.to_ascii_lowercase();
        if version.contains("2004") || version.contains("cam 1.3") {
            Some(ScormVersion::Scorm2004)
        } else if version.contains("1.2") {
            Some(ScormVersion::Scorm12)
        } else {
            None
        }
    }
}

/// Inspect a zipped SCORM package.
pub fn read_manifest(package: &[u8]) -> Result<ManifestDetails> {
    let mut archive = ZipArchive::new(Cursor::new(package))?;
    read_manifest_from(&mut archive)
}

/// Inspect an already opened archive.
pub fn read_manifest_from<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<ManifestDetails> {
    let manifest_path = find_manifest(archive).ok_or(PackageError::ManifestNotFound)?;

    let mut raw = Vec::new();
    archive.by_name(&manifest_path)?.read_to_end(&mut raw)?;
    let manifest_xml = String::from_utf8_lossy(&raw).into_owned();

    debug!(manifest = %manifest_path, bytes = raw.len(), "Found SCORM manifest");
    parse_manifest(&manifest_path, manifest_xml)
}

/// Parse manifest text found at `manifest_path` inside a package.
pub fn parse_manifest(manifest_path: &str, manifest_xml: String) -> Result<ManifestDetails> {
    let (entry_point, version) = {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(&manifest_xml, options).map_err(|e| {
            PackageError::ManifestParse(format!("unable to parse {}: {}", MANIFEST_FILE, e))
        })?;

        let entry_point = extract_entry_point(&doc).ok_or_else(|| {
            PackageError::ManifestParse("unable to determine entry point from manifest".to_string())
        })?;
        (entry_point, extract_version(&doc))
    };

    let entry_point = match manifest_path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => normalize_path(&format!("{}/{}", dir, entry_point))?,
        _ => normalize_path(&entry_point)?,
    };

    Ok(ManifestDetails {
        entry_point,
        version,
        manifest_path: manifest_path.to_string(),
        manifest_xml,
    })
}

fn find_manifest<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .filter(|name| !name.split('/').any(|part| IGNORED_DIRS.contains(&part)))
        .find(|name| name.to_ascii_lowercase().ends_with(MANIFEST_FILE))
        .map(str::to_string)
}

fn elements_with_suffix<'a, 'input: 'a>(
    root: Node<'a, 'input>,
    suffix: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    root.descendants().filter(move |node| {
        node.is_element() && node.tag_name().name().to_ascii_lowercase().ends_with(suffix)
    })
}

fn non_empty_attribute<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name).filter(|value| !value.is_empty())
}

/// First `item` with an `identifierref`, resolved through the first matching
/// `resource` that names a launch file.
fn extract_entry_point(doc: &Document) -> Option<String> {
    let root = doc.root_element();
    let identifier_ref = elements_with_suffix(root, "item")
        .find_map(|item| non_empty_attribute(&item, "identifierref"))?;

    elements_with_suffix(root, "resource")
        .filter(|resource| resource.attribute("identifier") == Some(identifier_ref))
        .find_map(|resource| {
            non_empty_attribute(&resource, "href").or_else(|| {
                elements_with_suffix(resource, "file")
                    .find_map(|file| non_empty_attribute(&file, "href"))
            })
        })
        .map(str::to_string)
}

fn extract_version(doc: &Document) -> String {
    let root = doc.root_element();

    let declared = elements_with_suffix(root, "schemaversion")
        .next()
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty());
    if let Some(version) = declared {
        return version.to_string();
    }

    root.attribute("version")
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .unwrap_or(DEFAULT_VERSION)
        .to_string()
}

/// Collapse `.`, `..` and empty segments. Paths escaping the package root
/// are rejected.
fn normalize_path(path: &str) -> Result<String> {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last().copied() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    if parts.first() == Some(&"..") {
        return Err(PackageError::ManifestParse(
            "manifest references parent directories, which is not allowed".to_string(),
        ));
    }

    let joined = parts.join("/");
    Ok(match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    })
}
