// Copyright (C) 2026 Checkmk GmbH - License: GNU General Public License v2
// This file is part of Checkmk (https://checkmk.com). It is subject to the terms and
// conditions defined in the file COPYING, which is part of this source code package.

//! Path helpers for the summary tables.

use std::path::{Path, PathBuf};

/// Find the deepest directory shared by all given paths.
///
/// Returns `None` if the slice is empty or the paths have nothing in common.
#[must_use]
pub(crate) fn find_common_prefix(paths: &[&Path]) -> Option<PathBuf> {
    let (first, rest) = paths.split_first()?;

    let mut common = first.to_path_buf();
    for path in rest {
        common = common
            .components()
            .zip(path.components())
            .take_while(|(c1, c2)| c1 == c2)
            .map(|(c, _)| c)
            .collect();
    }

    (!common.as_os_str().is_empty()).then_some(common)
}
