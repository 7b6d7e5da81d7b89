// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Parses `ldd` reports into resolved and unresolved dependencies.

use std::path::{Path, PathBuf};

use super::{ToolCommand, ToolResult, DEFAULT_TOOL_TIMEOUT};

/// Capability to report the dynamic linkage of a binary.
pub trait InspectsLinkage {
    /// Return the inspector's raw report for `path`.
    ///
    /// # Errors
    /// Returns an error if the inspector cannot be run or rejects the file
    /// (not a dynamic executable, permission denied, ...).
    fn inspect(&self, path: &Path) -> ToolResult<String>;
}

/// Runs `ldd <path>`.
#[derive(Debug, Clone)]
pub struct Ldd {
    command: ToolCommand,
}

impl Ldd {
    pub const PROGRAM: &'static str = "ldd";

    #[must_use]
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Default for Ldd {
    fn default() -> Self {
        Self::new(ToolCommand::new(Self::PROGRAM, Some(DEFAULT_TOOL_TIMEOUT)))
    }
}

impl InspectsLinkage for Ldd {
    fn inspect(&self, path: &Path) -> ToolResult<String> {
        self.command
            .output([path.as_os_str()], &path.display().to_string())
    }
}

/// One dependency line of a linkage report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedDependency {
    name: String,
    /// Where the loader found the library, if anywhere.
    path: Option<PathBuf>,
    unresolved: bool,
    /// The trimmed report line this record was parsed from.
    line: String,
}

impl LinkedDependency {
    /// Get the requested library name (e.g. `libfoo.so.1`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the inspector reported the library as not found.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.unresolved
    }

    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }
}

/// Ordered dependencies of a single binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkageReport {
    dependencies: Vec<LinkedDependency>,
}

impl LinkageReport {
    /// Parse the inspector's output line by line.
    ///
    /// Recognized shapes:
    /// - `libfoo.so.1 => not found` is unresolved. This is the only shape that is.
    /// - `libc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x...)` is resolved.
    /// - `/lib64/ld-linux-x86-64.so.2 (0x...)` and `linux-vdso.so.1 (0x...)` are resolved
    ///   without a `=>` mapping.
    ///
    /// Anything else (headers, `statically linked`, ...) is ignored.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        Self {
            dependencies: output.lines().filter_map(Self::parse_line).collect(),
        }
    }

    fn parse_line(line: &str) -> Option<LinkedDependency> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (name, path, unresolved) = match tokens.as_slice() {
            [name, "=>", "not", ..] => (*name, None, true),
            [name, "=>", target, ..] => (*name, absolute(target), false),
            [name, address] if address.starts_with("(0x") => (*name, absolute(name), false),
            _ => return None,
        };
        Some(LinkedDependency {
            name: name.to_string(),
            path,
            unresolved,
            line: line.trim().to_string(),
        })
    }

    #[must_use]
    pub fn dependencies(&self) -> &[LinkedDependency] {
        &self.dependencies
    }

    /// Iterate over the dependencies the inspector could not find, in report order.
    pub fn unresolved(&self) -> impl Iterator<Item = &LinkedDependency> {
        self.dependencies.iter().filter(|d| d.unresolved)
    }
}

fn absolute(token: &str) -> Option<PathBuf> {
    token.starts_with('/').then(|| PathBuf::from(token))
}
