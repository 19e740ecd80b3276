// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::cmp::Ordering;

use crate::record::Stamp;

/// Per-namespace rule for ordering two versions of the same record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConflictPolicy {
    /// Compare generations, ties broken by last-update-time.
    Generation,
    /// Compare last-update-times, ties broken by generation.
    LastUpdateTime,
}

impl ConflictPolicy {
    /// Total order over version stamps: `Greater` means `a` wins, `Less`
    /// means `b` wins, `Equal` is a tie the caller must break.
    ///
    /// Generations compare as plain `u16` (not wrap-aware), so that
    /// mixed-version clusters break ties identically.
    pub fn resolve(self, a: Stamp, b: Stamp) -> Ordering {
        match self {
            Self::Generation => a.gen.cmp(&b.gen).then(a.lut.cmp(&b.lut)),
            Self::LastUpdateTime => a.lut.cmp(&b.lut).then(a.gen.cmp(&b.gen)),
        }
    }
}
