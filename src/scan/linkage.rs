// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Extracts the unresolved dependencies of a binary and reports their providers as they are found.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::report::{Console, LibraryMap};
use crate::tools::{InspectsLinkage, LinkageReport, LookupError, LooksUpProviders, ToolError};

/// Errors that end the inspection of a single binary.
#[derive(Debug, Error)]
pub enum LinkageError {
    #[error("Failed to inspect linkage: {path:?}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: ToolError,
    },
    #[error("Failed to look up providers of {library} (file: {path:?})")]
    Lookup {
        path: PathBuf,
        library: String,
        #[source]
        source: LookupError,
    },
    #[error("Failed to write missing library diagnostic")]
    Output(#[from] io::Error),
}

/// Inspect `path` and return one `LibraryMap` per unresolved dependency.
///
/// Each unresolved dependency is looked up and announced on the console immediately,
/// before the next line of the inspector's report is processed.
///
/// # Errors
/// Returns an error if the inspector fails, if a lookup fails (the remaining
/// dependencies are not processed), or if the console cannot be written.
pub fn get_linked_libraries<W: Write>(
    path: &Path,
    inspector: &dyn InspectsLinkage,
    lookup: &dyn LooksUpProviders,
    console: &mut Console<W>,
) -> Result<Vec<LibraryMap>, LinkageError> {
    let output = inspector
        .inspect(path)
        .map_err(|source| LinkageError::Inspect {
            path: path.to_path_buf(),
            source,
        })?;

    let report = LinkageReport::parse(&output);
    let mut libraries = Vec::new();
    for dependency in report.unresolved() {
        let candidates =
            lookup
                .lookup(dependency.name())
                .map_err(|source| LinkageError::Lookup {
                    path: path.to_path_buf(),
                    library: dependency.name().to_string(),
                    source,
                })?;
        console.missing_library(dependency.name(), &candidates)?;
        libraries.push(LibraryMap::unresolved(dependency));
    }
    Ok(libraries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolResult;
    use std::cell::RefCell;

    struct FixedInspector(&'static str);

    impl InspectsLinkage for FixedInspector {
        fn inspect(&self, _path: &Path) -> ToolResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingInspector;

    impl InspectsLinkage for FailingInspector {
        fn inspect(&self, path: &Path) -> ToolResult<String> {
            Err(ToolError::NonZeroExit {
                command: "ldd".to_string(),
                target: path.display().to_string(),
                code: 1,
                stderr: "not a dynamic executable".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingLookup {
        calls: RefCell<Vec<String>>,
        missing: Option<&'static str>,
    }

    impl LooksUpProviders for RecordingLookup {
        fn lookup(&self, library: &str) -> Result<String, LookupError> {
            self.calls.borrow_mut().push(library.to_string());
            if self.missing == Some(library) {
                return Err(LookupError::NoResults {
                    library: library.to_string(),
                });
            }
            Ok(format!("{library}-provider.out\n"))
        }
    }

    fn text(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_one_map_and_lookup_per_unresolved_line() {
        let inspector = FixedInspector(
            "\tlibfoo.so.1 => not found\n\
             \tlibc.so.6 => /lib/libc.so.6 (0x00007f0000000000)\n\
             \tlibbar.so => not found\n",
        );
        let lookup = RecordingLookup::default();
        let mut console = Console::new(Vec::new());

        let libraries =
            get_linked_libraries(Path::new("/opt/app"), &inspector, &lookup, &mut console)
                .unwrap();

        let names: Vec<&str> = libraries.iter().map(|l| l.library.as_str()).collect();
        assert_eq!(names, vec!["libfoo.so.1", "libbar.so"]);
        assert!(libraries.iter().all(|l| l.status == "not"));
        assert_eq!(*lookup.calls.borrow(), vec!["libfoo.so.1", "libbar.so"]);

        let output = text(console);
        assert!(output.contains("Library libfoo.so.1 is missing from your project."));
        assert!(output.contains("libfoo.so.1-provider.out"));
        assert!(output.contains("Library libbar.so is missing from your project."));
    }

    #[test]
    fn test_resolved_only_yields_nothing() {
        let inspector = FixedInspector(
            "\tlinux-vdso.so.1 (0x00007ffd4b5f2000)\n\
             \tlibc.so.6 => /lib/libc.so.6 (0x00007f0000000000)\n",
        );
        let lookup = RecordingLookup::default();
        let mut console = Console::new(Vec::new());

        let libraries =
            get_linked_libraries(Path::new("/opt/app"), &inspector, &lookup, &mut console)
                .unwrap();
        assert!(libraries.is_empty());
        assert!(lookup.calls.borrow().is_empty());
        assert!(text(console).is_empty());
    }

    #[test]
    fn test_inspection_failure() {
        let lookup = RecordingLookup::default();
        let mut console = Console::new(Vec::new());
        let err =
            get_linked_libraries(Path::new("/opt/run.sh"), &FailingInspector, &lookup, &mut console)
                .unwrap_err();
        assert!(matches!(err, LinkageError::Inspect { .. }));
        assert!(text(console).is_empty());
    }

    #[test]
    fn test_lookup_failure_stops_remaining_lines() {
        let inspector = FixedInspector(
            "\tlibfoo.so.1 => not found\n\
             \tlibbar.so => not found\n\
             \tlibbaz.so => not found\n",
        );
        let lookup = RecordingLookup {
            missing: Some("libbar.so"),
            ..Default::default()
        };
        let mut console = Console::new(Vec::new());

        let err = get_linked_libraries(Path::new("/opt/app"), &inspector, &lookup, &mut console)
            .unwrap_err();
        assert!(matches!(
            err,
            LinkageError::Lookup { ref library, .. } if library == "libbar.so"
        ));
        assert_eq!(*lookup.calls.borrow(), vec!["libfoo.so.1", "libbar.so"]);
    }
}
