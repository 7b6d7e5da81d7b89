// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Classifies files as native binaries using the `file` type detector.

use std::path::Path;
use tracing::warn;

use super::{ToolCommand, ToolResult, DEFAULT_TOOL_TIMEOUT};

// Substrings of the detector's report that mark a file worth inspecting.
const BINARY_MARKERS: [&str; 2] = ["ELF", "executable"];

/// Capability to describe the type of a file.
pub trait ClassifiesFiles {
    /// Return the detector's textual report for `path`.
    ///
    /// # Errors
    /// Returns an error if the detector cannot be run or fails.
    fn describe(&self, path: &Path) -> ToolResult<String>;
}

/// Runs `file <path>`.
#[derive(Debug, Clone)]
pub struct FileCommand {
    command: ToolCommand,
}

impl FileCommand {
    pub const PROGRAM: &'static str = "file";

    #[must_use]
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Default for FileCommand {
    fn default() -> Self {
        Self::new(ToolCommand::new(Self::PROGRAM, Some(DEFAULT_TOOL_TIMEOUT)))
    }
}

impl ClassifiesFiles for FileCommand {
    fn describe(&self, path: &Path) -> ToolResult<String> {
        self.command
            .output([path.as_os_str()], &path.display().to_string())
    }
}

/// Check whether a detector report marks an ELF object or an executable.
///
/// `file` echoes the inspected path before the description (`<path>: ELF 64-bit ...`).
/// That prefix is dropped when present so a file named `executable.txt` stays a text file.
#[must_use]
pub fn is_binary_marker(path: &Path, report: &str) -> bool {
    let prefix = format!("{}:", path.display());
    let description = report.strip_prefix(prefix.as_str()).unwrap_or(report);
    BINARY_MARKERS
        .iter()
        .any(|marker| description.contains(marker))
}

/// Decide whether `path` is a native executable or shared library.
///
/// A detector failure is logged and treated as "not a binary", it never aborts a scan.
pub fn is_binary_or_library(classifier: &dyn ClassifiesFiles, path: &Path) -> bool {
    match classifier.describe(path) {
        Ok(report) => is_binary_marker(path, &report),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to determine file type");
            false
        }
    }
}
