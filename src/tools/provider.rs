// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Looks up the packages providing a library file with `nix-locate`.

use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

use super::{ToolCommand, ToolError, DEFAULT_TOOL_TIMEOUT};

/// Errors that can occur when looking up providers for a library.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("error when locating package for {library}")]
    Locate {
        library: String,
        #[source]
        source: ToolError,
    },
    // The tool ran but printed nothing at all.
    #[error("no results found for {library}")]
    NoResults { library: String },
}

/// Capability to list candidate packages for a library file name.
pub trait LooksUpProviders {
    /// Return the raw candidate listing for `library`.
    ///
    /// # Errors
    /// Returns an error if the lookup tool fails or produces no output at all.
    fn lookup(&self, library: &str) -> Result<String, LookupError>;
}

/// Runs `nix-locate --top-level --minimal <library>`.
#[derive(Debug, Clone)]
pub struct NixLocate {
    command: ToolCommand,
}

impl NixLocate {
    pub const PROGRAM: &'static str = "nix-locate";

    #[must_use]
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Default for NixLocate {
    fn default() -> Self {
        Self::new(ToolCommand::new(Self::PROGRAM, Some(DEFAULT_TOOL_TIMEOUT)))
    }
}

impl LooksUpProviders for NixLocate {
    fn lookup(&self, library: &str) -> Result<String, LookupError> {
        let output = self
            .command
            .output(["--top-level", "--minimal", library], library)
            .map_err(|source| LookupError::Locate {
                library: library.to_string(),
                source,
            })?;
        if output.is_empty() {
            return Err(LookupError::NoResults {
                library: library.to_string(),
            });
        }
        Ok(output)
    }
}

/// Remembers successful lookups for the lifetime of a scan.
///
/// Failures are not cached, the next request for the same library asks the inner lookup again.
pub struct CachedLookup<L> {
    inner: L,
    cache: RefCell<HashMap<String, String>>,
}

impl<L: LooksUpProviders> CachedLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of libraries with a cached result.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<L: LooksUpProviders> LooksUpProviders for CachedLookup<L> {
    fn lookup(&self, library: &str) -> Result<String, LookupError> {
        if let Some(candidates) = self.cache.borrow().get(library) {
            return Ok(candidates.clone());
        }
        let candidates = self.inner.lookup(library)?;
        self.cache
            .borrow_mut()
            .insert(library.to_string(), candidates.clone());
        Ok(candidates)
    }
}
