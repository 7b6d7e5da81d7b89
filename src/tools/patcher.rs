// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Rewrites the runtime search path of a binary with `patchelf`.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{ToolCommand, ToolError, ToolResult, DEFAULT_TOOL_TIMEOUT};
use crate::report::Console;

/// Errors that can occur when patching a binary.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to set rpath of {path:?} to {library_dir:?}")]
    SetRpath {
        path: PathBuf,
        library_dir: PathBuf,
        #[source]
        source: ToolError,
    },
    #[error("Failed to write patch confirmation")]
    Output(#[from] io::Error),
}

/// Capability to point a binary at a library directory.
pub trait PatchesBinaries {
    /// Set the runtime search path of `path` to `library_dir`.
    ///
    /// # Errors
    /// Returns an error if the patching tool fails.
    fn set_rpath(&self, path: &Path, library_dir: &Path) -> ToolResult<()>;
}

/// Runs `patchelf --set-rpath <library_dir> <path>`. Only the exit status is consumed.
#[derive(Debug, Clone)]
pub struct Patchelf {
    command: ToolCommand,
}

impl Patchelf {
    pub const PROGRAM: &'static str = "patchelf";

    #[must_use]
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }
}

impl Default for Patchelf {
    fn default() -> Self {
        Self::new(ToolCommand::new(Self::PROGRAM, Some(DEFAULT_TOOL_TIMEOUT)))
    }
}

impl PatchesBinaries for Patchelf {
    fn set_rpath(&self, path: &Path, library_dir: &Path) -> ToolResult<()> {
        self.command
            .output(
                [
                    OsStr::new("--set-rpath"),
                    library_dir.as_os_str(),
                    path.as_os_str(),
                ],
                &path.display().to_string(),
            )
            .map(|_| ())
    }
}

/// Patch `path` to load its libraries from `library_dir` and confirm on the console.
///
/// # Errors
/// Returns an error if patching fails or the confirmation cannot be written.
pub fn patch_binary<W: Write>(
    patcher: &dyn PatchesBinaries,
    path: &Path,
    library_dir: &Path,
    console: &mut Console<W>,
) -> Result<(), PatchError> {
    patcher
        .set_rpath(path, library_dir)
        .map_err(|source| PatchError::SetRpath {
            path: path.to_path_buf(),
            library_dir: library_dir.to_path_buf(),
            source,
        })?;
    console.patched(path, library_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(console: Console<Vec<u8>>) -> String {
        String::from_utf8(console.into_inner()).unwrap()
    }

    #[test]
    fn test_patch_success_prints_confirmation() {
        let patcher = Patchelf::new(ToolCommand::new("true", Some(DEFAULT_TOOL_TIMEOUT)));
        let mut console = Console::new(Vec::new());
        patch_binary(
            &patcher,
            Path::new("/opt/app/bin/app"),
            Path::new("/nix/store/abc-foo/lib"),
            &mut console,
        )
        .unwrap();
        assert_eq!(
            output(console),
            "Patched binary /opt/app/bin/app to use library path /nix/store/abc-foo/lib\n"
        );
    }

    #[test]
    fn test_patch_failure_is_wrapped() {
        let patcher = Patchelf::new(ToolCommand::new("false", Some(DEFAULT_TOOL_TIMEOUT)));
        let mut console = Console::new(Vec::new());
        let err = patch_binary(
            &patcher,
            Path::new("/opt/app/bin/app"),
            Path::new("/opt/lib"),
            &mut console,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PatchError::SetRpath {
                source: ToolError::NonZeroExit { .. },
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to set rpath"));
        assert!(output(console).is_empty());
    }
}
