// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! Inflight-table lifecycle, exercised through the resolver surface.

use pretty_assertions::assert_eq;
use shale_resolve::{ConflictPolicy, ResultCode, Stamp};

use crate::{
    logging,
    resolve::{self, A, B},
};

#[test]
fn slot_frees_up_after_completion() {
    logging::init();
    let (host, rv) = resolve::resolver(ConflictPolicy::Generation);
    let digest = resolve::digest(20);

    let first = rv
        .start(resolve::txn(&host, digest, vec![A], 7, None))
        .unwrap();
    let (_, probe_a) = host.take_sent().remove(0);
    rv.handle_ack(A, resolve::fail_ack(probe_a, ResultCode::NotFound));
    assert_eq!(rv.inflight(), 0);

    let second = rv
        .start(resolve::txn(&host, digest, vec![A, B], 8, None))
        .unwrap();
    assert_eq!(rv.inflight(), 1);
    // a new attempt, distinguishable by tag
    assert_ne!(first.tid(), second.tid());
}

#[test]
fn abandon_is_idempotent() {
    logging::init();
    let (host, rv) = resolve::resolver(ConflictPolicy::Generation);
    let digest = resolve::digest(21);

    let req = rv
        .start(resolve::txn(&host, digest, vec![A], 7, None))
        .unwrap();

    assert!(rv.abandon(&req));
    assert!(!rv.abandon(&req));
    assert_eq!(rv.inflight(), 0);
}

#[test]
fn stale_handle_cannot_evict_a_reused_slot() {
    logging::init();
    let (host, rv) = resolve::resolver(ConflictPolicy::Generation);
    let digest = resolve::digest(22);

    let old = rv
        .start(resolve::txn(&host, digest, vec![A], 7, None))
        .unwrap();
    rv.abandon(&old);

    let new = rv
        .start(resolve::txn(&host, digest, vec![A], 8, None))
        .unwrap();

    // the old holder's late abandon must not touch the new occupant
    assert!(!rv.abandon(&old));
    assert_eq!(rv.inflight(), 1);

    rv.abandon(&new);
    assert_eq!(rv.inflight(), 0);
}

#[test]
fn straggling_ack_after_removal_keeps_the_request_alive() {
    logging::init();
    let (host, rv) = resolve::resolver(ConflictPolicy::Generation);
    let digest = resolve::digest(23);

    let req = rv
        .start(resolve::txn(&host, digest, vec![A], 7, None))
        .unwrap();
    let (_, probe_a) = host.take_sent().remove(0);
    rv.abandon(&req);

    // the ack finds no table entry; it is dropped and returned to the pool
    rv.handle_ack(A, resolve::ok_ack(probe_a, Stamp::new(9, 900), b"too-late"));
    assert_eq!(rv.stats().snapshot().stray_acks, 1);
    assert!(host.replaced().is_empty());
    assert!(!req.is_complete());

    drop(req);
    assert_eq!(host.msg_gets(), host.msg_puts());
    assert_eq!(host.released_reservations(), 1);
}
