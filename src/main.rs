// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
mod args;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use args::Args;
use linkage_scanner::{CachedLookup, LooksUpProviders, ScanReport, Scanner};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level());

    let classifier = args.file();
    let inspector = args.ldd();
    let lookup: Box<dyn LooksUpProviders> = if args.no_cache {
        Box::new(args.nix_locate())
    } else {
        Box::new(CachedLookup::new(args.nix_locate()))
    };
    let patcher = args.patchelf();

    let mut scanner = Scanner::new(&classifier, &inspector, &*lookup, io::stdout().lock());
    if let Some(library_dir) = &args.set_rpath {
        scanner = scanner.with_remediation(&patcher, library_dir);
    }

    let report = scanner
        .scan(&args.directory)
        .with_context(|| format!("Failed to scan directory: {}", args.directory.display()))?;

    if args.summary {
        scanner
            .console()
            .summary(&report)
            .with_context(|| "Failed to write summary")?;
    }
    if let Some(dest) = &args.report {
        write_report_to_file(&report, dest)?;
    }
    Ok(())
}

/// Log to stderr so stdout carries only the scan output.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Write the report to a file.
///
/// # Errors
/// Returns an error if the report cannot be serialized to JSON or if the file cannot be created.
fn write_report_to_file(report: &ScanReport, dest: &Path) -> Result<()> {
    tracing::info!(file = %dest.display(), "Writing report to file");
    let file = File::create(dest)
        .with_context(|| format!("Failed to create JSON output file: {}", dest.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("Failed to serialize report to JSON: {}", dest.display()))?;
    Ok(())
}
