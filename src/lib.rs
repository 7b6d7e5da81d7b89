// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! A tool for finding binaries with shared libraries the dynamic linker cannot resolve.
//!
//! This crate provides functionality to:
//! - Classify files as native executables or shared libraries (`file`)
//! - Extract unresolved dependencies from the dynamic linker's report (`ldd`)
//! - Look up the packages that provide a missing library (`nix-locate`)
//! - Point a binary's runtime search path at a library directory (`patchelf`)

pub mod report;
pub mod scan;
pub mod tools;

// Re-export key types for convenience
pub use report::{Console, FileReport, LibraryMap, ScanReport, ScanTotals};
pub use scan::{get_linked_libraries, LinkageError, ScanError, Scanner};
pub use tools::{
    is_binary_or_library, patch_binary, CachedLookup, ClassifiesFiles, FileCommand,
    InspectsLinkage, Ldd, LinkageReport, LinkedDependency, LookupError, LooksUpProviders,
    NixLocate, PatchError, Patchelf, PatchesBinaries, ToolCommand, ToolError, ToolResult,
};
