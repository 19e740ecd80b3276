// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! Seams towards the partition map and the storage engine.
//!
//! Handles returned by these traits are RAII: dropping a reservation
//! releases the partition, dropping a read descriptor closes the record.
//! That is what makes "released exactly once on every exit path" hold by
//! construction.

use bytes::Bytes;

use crate::{
    policy::ConflictPolicy,
    proto::ResultCode,
    record::{Digest, NsId, Stamp},
};

/// A pickle smaller than this cannot even hold the pickled header.
pub const MIN_PICKLE_LEN: usize = 2;

/// Partition ownership, as decided elsewhere.
pub trait Partitions {
    /// Scoped assertion of the right to touch a partition. Released on
    /// drop; acquisition pins cluster state for the holder's duration.
    type Reservation: Send + Sync;

    fn reserve(&self, ns: NsId, digest: &Digest) -> Result<Self::Reservation, ResultCode>;

    /// Current cluster epoch key. Only carried on the wire for peers old
    /// enough to demand it.
    fn cluster_key(&self) -> u64;
}

/// Index metadata of a record, readable without opening storage.
pub trait RecordMeta {
    fn stamp(&self) -> Stamp;

    /// Expiry timestamp; `None` means the record does not expire.
    fn void_time(&self) -> Option<u32>;
}

/// An open storage read descriptor.
pub trait RecordRead {
    fn n_bins(&self) -> Result<u16, ResultCode>;

    /// Load the bins and serialize the record into its opaque pickled form.
    fn pickle(&mut self) -> Result<Bytes, ResultCode>;

    fn set_name(&self) -> Option<&[u8]>;

    fn key(&self) -> Option<&[u8]>;
}

/// The storage engine, consumed as a black box.
pub trait Store: Partitions {
    type Record: RecordMeta;
    type Read: RecordRead;

    fn record_get(&self, rsv: &Self::Reservation, digest: &Digest) -> Option<Self::Record>;

    fn record_open(
        &self,
        rsv: &Self::Reservation,
        record: &Self::Record,
    ) -> Result<Self::Read, ResultCode>;

    /// Atomically replace the local record iff `remote` beats it under
    /// `policy`. The returned code reflects storage's own re-evaluation:
    /// `RecordExists` / `Generation` mean the local copy was kept.
    fn replace_if_better(
        &self,
        remote: RemoteRecord<'_, Self::Reservation>,
        policy: ConflictPolicy,
        allow_expunge: bool,
        is_migration: bool,
    ) -> ResultCode;
}

/// A duplicate received off the wire, reconstructed for storage.
pub struct RemoteRecord<'a, R> {
    pub reservation: &'a R,
    pub digest: &'a Digest,
    pub stamp: Stamp,
    pub void_time: Option<u32>,
    pub set_name: Option<Bytes>,
    pub key: Option<Bytes>,
    pub pickle: Bytes,
}
