// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! SCORM package inspector
//!
//! Prints the launch details of a zipped SCORM package as JSON.
//!
//! Usage:
//!   scorm-inspect <package.zip> [--with-xml] [--compact]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use scorm_package::read_manifest;

#[derive(Debug, Parser)]
#[command(name = "scorm-inspect", version, about = "Inspect a SCORM package")]
struct Args {
    /// Path to the zipped package
    package: PathBuf,

    /// Include the raw manifest XML in the output
    #[arg(long)]
    with_xml: bool,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scorm_package=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let bytes = std::fs::read(&args.package)
        .with_context(|| format!("failed to read {}", args.package.display()))?;
    let details = read_manifest(&bytes)
        .with_context(|| format!("failed to inspect {}", args.package.display()))?;

    info!(
        package = %args.package.display(),
        entry_point = %details.entry_point,
        version = %details.version,
        "Package inspected"
    );

    let mut output = serde_json::to_value(&details)?;
    if let Some(object) = output.as_object_mut() {
        if !args.with_xml {
            object.remove("manifestXml");
        }
        object.insert(
            "runtimeVersion".to_string(),
            details
                .runtime_version()
                .map(|version| serde_json::Value::from(version.as_str()))
                .unwrap_or(serde_json::Value::Null),
        );
    }

    let rendered = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);

    Ok(())
}
