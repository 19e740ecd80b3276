// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! Fixtures for driving a [`Resolver`] against a scripted host.

use std::time::{Duration, Instant};

use bytes::Bytes;
use nonempty::NonEmpty;
use shale_resolve::{
    ConflictPolicy,
    Digest,
    Fabric as _,
    Msg,
    NodeId,
    Op,
    Partitions as _,
    Request,
    Resolver,
    ResultCode,
    Stamp,
    Transaction,
};

pub mod gen;

pub use host::{namespaces, LocalRecord, MockHost, Replaced, CLUSTER_KEY, TEST_NS};

pub const A: NodeId = NodeId(0xa);
pub const B: NodeId = NodeId(0xb);
pub const C: NodeId = NodeId(0xc);

pub const MSGP: &[u8] = b"client-request";

pub fn resolver(policy: ConflictPolicy) -> (MockHost, Resolver<MockHost>) {
    let host = MockHost::default();
    (host.clone(), Resolver::new(host, namespaces(policy)))
}

pub fn digest(seed: u8) -> Digest {
    Digest::from([seed; 20])
}

/// A transaction as the layer above would hand it over, probing `peers`.
pub fn txn(
    host: &MockHost,
    digest: Digest,
    peers: Vec<NodeId>,
    origin: u64,
    local: Option<Stamp>,
) -> Transaction<MockHost> {
    let mut peers = peers.into_iter();
    let head = peers.next().expect("at least one duplicate holder");

    Transaction {
        ns: TEST_NS,
        digest,
        reservation: host
            .reserve(TEST_NS, &digest)
            .expect("test host always reserves"),
        peers: NonEmpty::from((head, peers.collect())),
        origin,
        msgp: Bytes::from_static(MSGP),
        deadline: Instant::now() + Duration::from_millis(500),
        local,
    }
}

/// Turn a captured probe into a failure ack, the way a responder would:
/// identity preserved, everything else rewritten.
pub fn fail_ack(mut probe: Msg, result: ResultCode) -> Msg {
    probe.preserve_identity();
    probe.op = Some(Op::DupAck);
    probe.result = Some(result);
    probe
}

/// Turn a captured probe into a successful ack shipping `pickle`.
pub fn ok_ack(probe: Msg, stamp: Stamp, pickle: &'static [u8]) -> Msg {
    let mut m = fail_ack(probe, ResultCode::Ok);
    m.generation = Some(u32::from(stamp.gen));
    m.last_update_time = Some(stamp.lut);
    m.record = Some(Bytes::from_static(pickle));
    m
}

/// An ack crafted from a fresh pool message, for peers whose probe the test
/// did not bother capturing.
pub fn blank_ack(host: &MockHost, req: &Request<MockHost>, result: ResultCode) -> Msg {
    let mut m = host.msg_get();
    m.ns_id = Some(TEST_NS);
    m.digest = Some(req.key().digest);
    m.tid = Some(req.tid());
    m.op = Some(Op::DupAck);
    m.result = Some(result);
    m
}
