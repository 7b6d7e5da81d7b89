// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use linkage_scanner::{FileCommand, Ldd, NixLocate, Patchelf, ToolCommand};

#[derive(Parser)]
#[command(name = "linkage_scanner")]
#[command(version)]
#[command(
    about = "Finds binaries with unresolvable shared libraries and the packages that provide them"
)]
pub(crate) struct Args {
    /// Root directory to scan.
    pub directory: PathBuf,

    /// Path to the file to write the scan results in JSON format.
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Print a summary table after the scan.
    #[arg(long)]
    pub summary: bool,

    #[arg(
        long,
        value_name = "DIR",
        long_help = "Set the RUNPATH of every affected binary to DIR.\n\
                The binary is reported first, then patched with patchelf.\n\
                A failed patch is logged and the scan continues."
    )]
    pub set_rpath: Option<PathBuf>,

    /// Look up every missing library again instead of reusing earlier results.
    #[arg(long)]
    pub no_cache: bool,

    /// Timeout in seconds for each external tool invocation (0 disables the timeout).
    #[arg(long, value_name = "SECS", env = "LINKAGE_SCANNER_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// File type detector.
    #[arg(long, env = "LINKAGE_SCANNER_FILE", default_value = FileCommand::PROGRAM)]
    pub file_command: String,

    /// Dynamic linker inspector.
    #[arg(long, env = "LINKAGE_SCANNER_LDD", default_value = Ldd::PROGRAM)]
    pub ldd_command: String,

    /// Package index lookup tool.
    #[arg(long, env = "LINKAGE_SCANNER_LOCATE", default_value = NixLocate::PROGRAM)]
    pub locate_command: String,

    /// Binary patching tool.
    #[arg(long, env = "LINKAGE_SCANNER_PATCHELF", default_value = Patchelf::PROGRAM)]
    pub patchelf_command: String,

    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    fn tool(&self, program: &str) -> ToolCommand {
        let timeout = (self.timeout > 0).then(|| Duration::from_secs(self.timeout));
        ToolCommand::new(program, timeout)
    }

    pub fn file(&self) -> FileCommand {
        FileCommand::new(self.tool(&self.file_command))
    }

    pub fn ldd(&self) -> Ldd {
        Ldd::new(self.tool(&self.ldd_command))
    }

    pub fn nix_locate(&self) -> NixLocate {
        NixLocate::new(self.tool(&self.locate_command))
    }

    pub fn patchelf(&self) -> Patchelf {
        Patchelf::new(self.tool(&self.patchelf_command))
    }

    /// Default log filter derived from `-v`.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
