// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! The answering side: a peer asked us for our copy of a record.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::{
    fabric::{self, Fabric as _, NodeId},
    namespace::Namespace,
    proto::{info, Msg, Op, ResultCode},
    record::{Digest, Stamp},
    resolver::Resolver,
    store::{Partitions as _, RecordMeta as _, RecordRead as _, Store},
    Host,
};

/// A probe arrived. Look the record up locally and answer.
///
/// Takes ownership of `m` and reuses it as the ack: identity fields stay,
/// the rest is rewritten. Every exit sends (or reclaims) exactly that one
/// message, and partition/record handles release on scope exit.
pub(crate) fn handle_probe<H: Host>(rv: &Resolver<H>, from: NodeId, mut m: Msg) {
    let ns = m
        .namespace
        .as_ref()
        .and_then(|name| rv.namespaces().by_name(name));
    let digest = m.digest;

    // a hint means the originator has a copy of this version already
    let hint = match (m.generation, m.last_update_time) {
        (Some(gen), Some(lut)) => Some(Stamp {
            gen: gen as u16,
            lut,
        }),
        _ => None,
    };

    m.preserve_identity();
    m.op = Some(Op::DupAck);

    let result = match (ns, digest, m.ns_id) {
        (Some(ns), Some(digest), Some(_)) => read_local(rv.host(), ns, &digest, hint, &mut m),
        _ => {
            tracing::warn!(node = %from, "malformed dup-res probe");
            rv.stats().bad_probe();
            ResultCode::Unknown
        },
    };

    m.result = Some(result);
    fabric::send_or_reclaim(rv.host(), from, m);
}

fn read_local<H: Host>(
    host: &H,
    ns: &Namespace,
    digest: &Digest,
    hint: Option<Stamp>,
    m: &mut Msg,
) -> ResultCode {
    let rsv = match host.reserve(ns.id, digest) {
        Ok(rsv) => rsv,
        Err(rc) => return rc,
    };

    let record = match host.record_get(&rsv, digest) {
        Some(record) => record,
        None => return ResultCode::NotFound,
    };

    let local = record.stamp();
    if let Some(hint) = hint {
        // nothing better here than what the originator already holds
        match ns.policy.resolve(local, hint) {
            Ordering::Equal => return ResultCode::RecordExists,
            Ordering::Less => return ResultCode::Generation,
            Ordering::Greater => (),
        }
    }

    let mut read = match host.record_open(&rsv, &record) {
        Ok(read) => read,
        Err(rc) => return rc,
    };

    let n_bins = match read.n_bins() {
        Ok(n) => n,
        Err(rc) => return rc,
    };

    let pickle = match read.pickle() {
        Ok(pickle) => pickle,
        Err(rc) => return rc,
    };

    m.generation = Some(u32::from(local.gen));
    m.last_update_time = Some(local.lut);
    m.record = Some(pickle);
    m.void_time = record.void_time();
    m.set_name = read.set_name().map(Bytes::copy_from_slice);
    m.key = read.key().map(Bytes::copy_from_slice);
    if n_bins == 0 {
        m.info = Some(info::NO_BINS);
    }

    ResultCode::Ok
}
