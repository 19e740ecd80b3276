// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{record::RecordId, request::Request, Host};

/// The inflight table: at most one active resolution per record identity.
///
/// Sharded by [`DashMap`]; the lock order everywhere is bucket before
/// request, so nothing in here may be called with a request lock held.
pub(crate) struct Table<H: Host>(DashMap<RecordId, Arc<Request<H>>>);

impl<H: Host> Table<H> {
    pub fn new() -> Self {
        Self(DashMap::new())
    }

    /// Insert-if-absent, with the request constructed only once the slot is
    /// known to be free. On an occupied key the input comes back untouched,
    /// so the caller keeps ownership of everything it meant to hand over.
    pub fn begin<T>(
        &self,
        key: RecordId,
        txn: T,
        build: impl FnOnce(T) -> Arc<Request<H>>,
    ) -> Result<Arc<Request<H>>, T> {
        match self.0.entry(key) {
            Entry::Occupied(_) => Err(txn),
            Entry::Vacant(entry) => {
                let req = build(txn);
                entry.insert(Arc::clone(&req));
                Ok(req)
            },
        }
    }

    /// Look up and acquire a reference. The clone happens inside the bucket
    /// guard, so the reference is held before the bucket lock is released.
    pub fn lookup(&self, key: &RecordId) -> Option<Arc<Request<H>>> {
        self.0.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove `req` from the table, if it is still the occupant. Idempotent,
    /// and a no-op if the slot has since been reused by a newer request.
    pub fn remove(&self, key: &RecordId, req: &Arc<Request<H>>) -> bool {
        self.0
            .remove_if(key, |_, stored| Arc::ptr_eq(stored, req))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
