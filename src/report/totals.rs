// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.
use serde::Serialize;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTotals {
    /// Non-directory entries visited.
    pub entries: usize,
    /// Entries the classifier accepted.
    pub binaries: usize,
    /// Binaries whose linkage was fully processed.
    pub inspected: usize,
    /// Binaries dropped after an inspection or lookup failure.
    pub skipped: usize,
    pub affected: usize,
    pub missing: usize,
    pub missing_unique: usize,
    pub patched: usize,
}
