// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

/// Per-node counters. Nothing in duplicate resolution is fatal; everything
/// that goes sideways ends up here instead.
#[derive(Debug, Default)]
pub struct Stats {
    bad_probes: AtomicU64,
    bad_acks: AtomicU64,
    stray_acks: AtomicU64,
    restarts: AtomicU64,
    completions: AtomicU64,
    rejected_pickles: AtomicU64,
}

impl Stats {
    pub(crate) fn bad_probe(&self) {
        self.bad_probes.fetch_add(1, Relaxed);
    }

    pub(crate) fn bad_ack(&self) {
        self.bad_acks.fetch_add(1, Relaxed);
    }

    pub(crate) fn stray_ack(&self) {
        self.stray_acks.fetch_add(1, Relaxed);
    }

    pub(crate) fn restart(&self) {
        self.restarts.fetch_add(1, Relaxed);
    }

    pub(crate) fn completion(&self) {
        self.completions.fetch_add(1, Relaxed);
    }

    pub(crate) fn rejected_pickle(&self) {
        self.rejected_pickles.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bad_probes: self.bad_probes.load(Relaxed),
            bad_acks: self.bad_acks.load(Relaxed),
            stray_acks: self.stray_acks.load(Relaxed),
            restarts: self.restarts.load(Relaxed),
            completions: self.completions.load(Relaxed),
            rejected_pickles: self.rejected_pickles.load(Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub bad_probes: u64,
    pub bad_acks: u64,
    pub stray_acks: u64,
    pub restarts: u64,
    pub completions: u64,
    pub rejected_pickles: u64,
}
