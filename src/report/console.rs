// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Writes scan output: per-file blocks, missing library diagnostics and summary tables.

use comfy_table::{Cell, Table};
use std::io::{self, Write};
use std::path::Path;

use super::utils::find_common_prefix;
use super::{LibraryMap, ScanReport};

/// Human-readable output sink of a scan.
pub struct Console<W: Write> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the console and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Announce a missing library together with the packages that would provide it.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn missing_library(&mut self, library: &str, candidates: &str) -> io::Result<()> {
        write!(
            self.out,
            "Library {library} is missing from your project.\n\
             You can add it by installing one of the following packages: {candidates}"
        )?;
        if !candidates.ends_with('\n') {
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Print the block for a binary with unresolved dependencies.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn affected_file(&mut self, path: &Path, libraries: &[LibraryMap]) -> io::Result<()> {
        write!(self.out, "\n\nFile: {}\n", path.display())?;
        for library in libraries {
            writeln!(
                self.out,
                "  Linked Library: {} => {}",
                library.library, library.status
            )?;
        }
        Ok(())
    }

    /// Confirm that a binary now loads its libraries from `library_dir`.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn patched(&mut self, path: &Path, library_dir: &Path) -> io::Result<()> {
        writeln!(
            self.out,
            "Patched binary {} to use library path {}",
            path.display(),
            library_dir.display()
        )
    }

    /// Print the totals of the scan and, if any, a table of affected files.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn summary(&mut self, report: &ScanReport) -> io::Result<()> {
        writeln!(self.out, "\nScanned: {}", report.root().display())?;
        writeln!(self.out, "{}\n", totals_table(report))?;

        if !report.files().is_empty() {
            writeln!(self.out, "{}", affected_files_table(report))?;
            writeln!(
                self.out,
                "\nTotal: {} file(s) with missing libraries",
                report.files().len()
            )?;
        }
        self.out.flush()
    }
}

/// Create a table with the default preset styling.
fn default_table_preset() -> Table {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}

fn totals_table(report: &ScanReport) -> Table {
    let totals = report.totals();
    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("Scan").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Count").add_attribute(comfy_table::Attribute::Bold),
    ]);
    for (label, count) in [
        ("Files", totals.entries),
        ("Binaries", totals.binaries),
        ("Inspected", totals.inspected),
        ("Skipped", totals.skipped),
        ("Affected", totals.affected),
        ("Missing libraries", totals.missing),
        ("Unique missing libraries", totals.missing_unique),
        ("Patched", totals.patched),
    ] {
        table.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    table
}

/// Create a table showing the missing libraries of each affected file.
fn affected_files_table(report: &ScanReport) -> Table {
    // Strip the common prefix for cleaner display
    let paths: Vec<&Path> = report.files().iter().map(|f| f.path.as_path()).collect();
    let common_prefix = find_common_prefix(&paths);

    let mut table = default_table_preset();
    table.set_header(vec![
        Cell::new("File").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Missing Libraries").add_attribute(comfy_table::Attribute::Bold),
    ]);

    for file in report.files() {
        let display_path = match &common_prefix {
            // A single affected file would otherwise be stripped to nothing.
            Some(prefix) if paths.len() > 1 => {
                file.path.strip_prefix(prefix).unwrap_or(file.path.as_path())
            }
            _ => file.path.as_path(),
        };
        let libraries: Vec<&str> = file.libraries.iter().map(|l| l.library.as_str()).collect();
        table.add_row(vec![
            Cell::new(display_path.to_string_lossy()),
            Cell::new(libraries.join(", ")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FileReport, UNRESOLVED_MARKER};
    use std::path::PathBuf;

    fn text(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    fn library(name: &str) -> LibraryMap {
        LibraryMap {
            library: name.to_string(),
            status: UNRESOLVED_MARKER.to_string(),
            line: String::new(),
        }
    }

    #[test]
    fn test_missing_library_keeps_tool_newline() {
        let mut console = Console::new(Vec::new());
        console
            .missing_library("libfoo.so.1", "foo.out\nfoo-legacy.out\n")
            .unwrap();
        assert_eq!(
            text(console),
            "Library libfoo.so.1 is missing from your project.\n\
             You can add it by installing one of the following packages: foo.out\nfoo-legacy.out\n"
        );
    }

    #[test]
    fn test_missing_library_terminates_line() {
        let mut console = Console::new(Vec::new());
        console.missing_library("libfoo.so.1", "").unwrap();
        assert_eq!(
            text(console),
            "Library libfoo.so.1 is missing from your project.\n\
             You can add it by installing one of the following packages: \n"
        );
    }

    #[test]
    fn test_affected_file_block() {
        let mut console = Console::new(Vec::new());
        console
            .affected_file(
                Path::new("/opt/app/bin/app"),
                &[library("libfoo.so.1"), library("libbar.so")],
            )
            .unwrap();
        assert_eq!(
            text(console),
            "\n\nFile: /opt/app/bin/app\n  Linked Library: libfoo.so.1 => not\n  Linked Library: libbar.so => not\n"
        );
    }

    #[test]
    fn test_summary_lists_affected_files() {
        let mut report = ScanReport::new(Path::new("/opt/app"));
        report.totals.entries = 3;
        report.totals.binaries = 2;
        report.push(FileReport {
            path: PathBuf::from("/opt/app/bin/tool"),
            libraries: vec![library("libfoo.so.1")],
            patched_rpath: None,
        });
        report.push(FileReport {
            path: PathBuf::from("/opt/app/lib/libplugin.so"),
            libraries: vec![library("libbar.so"), library("libbaz.so.2")],
            patched_rpath: None,
        });
        report.finish();

        let mut console = Console::new(Vec::new());
        console.summary(&report).unwrap();
        let output = text(console);
        assert!(output.contains("Scanned: /opt/app"));
        assert!(output.contains("Unique missing libraries"));
        assert!(output.contains("bin/tool"));
        assert!(output.contains("libbar.so, libbaz.so.2"));
        assert!(output.contains("Total: 2 file(s) with missing libraries"));
    }

    #[test]
    fn test_summary_without_affected_files() {
        let report = ScanReport::new(Path::new("/opt/app"));
        let mut console = Console::new(Vec::new());
        console.summary(&report).unwrap();
        let output = text(console);
        assert!(output.contains("Binaries"));
        assert!(!output.contains("Missing Libraries"));
    }
}
