// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Walks a directory tree and reports binaries whose shared libraries cannot be resolved.

mod linkage;

pub use linkage::{get_linked_libraries, LinkageError};

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::report::{Console, FileReport, ScanReport};
use crate::tools::{
    is_binary_or_library, patch_binary, ClassifiesFiles, InspectsLinkage, LooksUpProviders,
    PatchError, PatchesBinaries,
};

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to read directory: {path:?}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to write scan output")]
    Output(#[from] io::Error),
}

/// Patches affected binaries after they have been reported.
struct Remediation<'a> {
    patcher: &'a dyn PatchesBinaries,
    library_dir: PathBuf,
}

/// Drives classification, linkage inspection and provider lookup over a directory tree.
///
/// Entries are processed one at a time, in lexical order, and output is written as soon as
/// it is known.
pub struct Scanner<'a, W: Write> {
    classifier: &'a dyn ClassifiesFiles,
    inspector: &'a dyn InspectsLinkage,
    lookup: &'a dyn LooksUpProviders,
    remediation: Option<Remediation<'a>>,
    console: Console<W>,
}

impl<'a, W: Write> Scanner<'a, W> {
    pub fn new(
        classifier: &'a dyn ClassifiesFiles,
        inspector: &'a dyn InspectsLinkage,
        lookup: &'a dyn LooksUpProviders,
        out: W,
    ) -> Self {
        Self {
            classifier,
            inspector,
            lookup,
            remediation: None,
            console: Console::new(out),
        }
    }

    /// Point every affected binary at `library_dir` once it has been reported.
    #[must_use]
    pub fn with_remediation(
        mut self,
        patcher: &'a dyn PatchesBinaries,
        library_dir: impl Into<PathBuf>,
    ) -> Self {
        self.remediation = Some(Remediation {
            patcher,
            library_dir: library_dir.into(),
        });
        self
    }

    /// Get the console the scan writes to.
    pub fn console(&mut self) -> &mut Console<W> {
        &mut self.console
    }

    pub fn into_console(self) -> Console<W> {
        self.console
    }

    /// Scan every non-directory entry below `root`.
    ///
    /// Per-file failures are logged and the file is skipped.
    ///
    /// # Errors
    /// Returns an error if an entry cannot be read (including `root` itself) or if the
    /// output cannot be written.
    pub fn scan(&mut self, root: &Path) -> Result<ScanReport, ScanError> {
        info!(root = %root.display(), "Scanning directory");
        let mut report = ScanReport::new(root);

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| {
                let path = source.path().unwrap_or(root).to_path_buf();
                error!(path = %path.display(), error = %source, "Failed to access file");
                ScanError::Walk { path, source }
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            report.totals.entries += 1;
            if let Some(file) = self.process_file(entry.path(), &mut report)? {
                report.push(file);
            }
        }

        report.finish();
        info!(
            files = report.totals().entries,
            affected = report.totals().affected,
            "Scan completed"
        );
        Ok(report)
    }

    fn process_file(
        &mut self,
        path: &Path,
        report: &mut ScanReport,
    ) -> Result<Option<FileReport>, ScanError> {
        if !is_binary_or_library(self.classifier, path) {
            return Ok(None);
        }
        report.totals.binaries += 1;

        let libraries =
            match get_linked_libraries(path, self.inspector, self.lookup, &mut self.console) {
                Ok(libraries) => libraries,
                Err(LinkageError::Output(e)) => return Err(ScanError::Output(e)),
                Err(e @ LinkageError::Inspect { .. }) => {
                    debug!(path = %path.display(), error = %e, "Skipping file");
                    report.totals.skipped += 1;
                    return Ok(None);
                }
                Err(e @ LinkageError::Lookup { .. }) => {
                    warn!(path = %path.display(), error = %e, "Skipping file");
                    report.totals.skipped += 1;
                    return Ok(None);
                }
            };
        report.totals.inspected += 1;

        if libraries.is_empty() {
            return Ok(None);
        }
        self.console.affected_file(path, &libraries)?;

        Ok(Some(FileReport {
            path: path.to_path_buf(),
            libraries,
            patched_rpath: self.remediate(path)?,
        }))
    }

    fn remediate(&mut self, path: &Path) -> Result<Option<PathBuf>, ScanError> {
        let Some(remediation) = &self.remediation else {
            return Ok(None);
        };
        match patch_binary(
            remediation.patcher,
            path,
            &remediation.library_dir,
            &mut self.console,
        ) {
            Ok(()) => Ok(Some(remediation.library_dir.clone())),
            Err(PatchError::Output(e)) => Err(ScanError::Output(e)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to patch binary");
                Ok(None)
            }
        }
    }
}
