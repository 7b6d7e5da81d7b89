// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Scan results and the console they are written to.

mod console;
mod totals;
mod utils;

pub use console::Console;
pub use totals::ScanTotals;

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::tools::LinkedDependency;

/// Third token of an inspector line for a library that was not found.
pub const UNRESOLVED_MARKER: &str = "not";

/// One unresolved dependency of a binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryMap {
    pub library: String,
    // Resolution status marker, not a filesystem path.
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub line: String,
}

impl LibraryMap {
    #[must_use]
    pub fn unresolved(dependency: &LinkedDependency) -> Self {
        Self {
            library: dependency.name().to_string(),
            status: UNRESOLVED_MARKER.to_string(),
            line: dependency.line().to_string(),
        }
    }
}

/// A binary with at least one unresolved dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub libraries: Vec<LibraryMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patched_rpath: Option<PathBuf>,
}

/// Everything a scan found, in traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    root: PathBuf,
    pub(crate) totals: ScanTotals,
    files: Vec<FileReport>,
}

impl ScanReport {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            totals: ScanTotals::default(),
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn totals(&self) -> &ScanTotals {
        &self.totals
    }

    /// Get the affected files.
    #[must_use]
    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub(crate) fn push(&mut self, file: FileReport) {
        self.totals.affected += 1;
        self.totals.missing += file.libraries.len();
        if file.patched_rpath.is_some() {
            self.totals.patched += 1;
        }
        self.files.push(file);
    }

    /// Distinct missing library names across all files, sorted.
    #[must_use]
    pub fn missing_libraries(&self) -> BTreeSet<&str> {
        self.files
            .iter()
            .flat_map(|file| file.libraries.iter().map(|lib| lib.library.as_str()))
            .collect()
    }

    pub(crate) fn finish(&mut self) {
        self.totals.missing_unique = self.missing_libraries().len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(name: &str) -> LibraryMap {
        LibraryMap {
            library: name.to_string(),
            status: UNRESOLVED_MARKER.to_string(),
            line: format!("{name} => not found"),
        }
    }

    fn file(path: &str, libraries: &[&str], patched: bool) -> FileReport {
        FileReport {
            path: PathBuf::from(path),
            libraries: libraries.iter().map(|name| library(name)).collect(),
            patched_rpath: patched.then(|| PathBuf::from("/opt/lib")),
        }
    }

    #[test]
    fn test_push_updates_totals() {
        let mut report = ScanReport::new(Path::new("/opt/app"));
        report.push(file("/opt/app/bin/a", &["libfoo.so.1", "libbar.so"], false));
        report.push(file("/opt/app/bin/b", &["libfoo.so.1"], true));
        report.finish();

        let totals = report.totals();
        assert_eq!(totals.affected, 2);
        assert_eq!(totals.missing, 3);
        assert_eq!(totals.missing_unique, 2);
        assert_eq!(totals.patched, 1);
        assert_eq!(
            report.missing_libraries().into_iter().collect::<Vec<_>>(),
            vec!["libbar.so", "libfoo.so.1"]
        );
    }

    #[test]
    fn test_json_shape() {
        let mut report = ScanReport::new(Path::new("/opt/app"));
        report.push(file("/opt/app/bin/a", &["libfoo.so.1"], false));
        report.finish();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["root"], "/opt/app");
        assert_eq!(json["totals"]["affected"], 1);
        let entry = &json["files"][0];
        assert_eq!(entry["path"], "/opt/app/bin/a");
        assert_eq!(entry["libraries"][0]["library"], "libfoo.so.1");
        assert_eq!(entry["libraries"][0]["status"], "not");
        assert_eq!(entry["libraries"][0]["line"], "libfoo.so.1 => not found");
        assert!(entry.get("patched_rpath").is_none());
    }

    #[test]
    fn test_unresolved_from_dependency() {
        let report = crate::tools::LinkageReport::parse("\tlibfoo.so.1 => not found\n");
        let dependency = report.unresolved().next().unwrap();
        let map = LibraryMap::unresolved(dependency);
        assert_eq!(map, library("libfoo.so.1"));
    }
}
