// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use bytes::Bytes;
use pretty_assertions::assert_eq;
use shale_resolve::{
    proto::{field, info},
    Msg,
    NsId,
    Op,
    ResultCode,
};

use crate::{resolve, roundtrip};

fn full_ack() -> Msg {
    Msg {
        op: Some(Op::DupAck),
        result: Some(ResultCode::Ok),
        ns_id: Some(NsId(1)),
        generation: Some(7),
        digest: Some(resolve::digest(1)),
        record: Some(Bytes::from_static(b"pickled")),
        tid: Some(42),
        void_time: Some(1234),
        info: Some(info::NO_BINS),
        last_update_time: Some(200),
        set_name: Some(Bytes::from_static(b"users")),
        key: Some(Bytes::from_static(b"alice")),
        ..Msg::default()
    }
}

#[test]
fn roundtrip_ack() {
    roundtrip::cbor(full_ack())
}

#[test]
fn roundtrip_probe() {
    roundtrip::cbor(Msg {
        op: Some(Op::Dup),
        namespace: Some(Bytes::from_static(b"test")),
        ns_id: Some(NsId(1)),
        digest: Some(resolve::digest(2)),
        tid: Some(7),
        cluster_key: Some(0xfeed),
        generation: Some(5),
        last_update_time: Some(100),
        ..Msg::default()
    })
}

#[test]
fn roundtrip_empty() {
    roundtrip::cbor(Msg::default())
}

// A peer running newer software may send tags we have never heard of;
// decoding skips them and keeps what it knows.
#[test]
fn unknown_tags_are_skipped() {
    let mut buf = Vec::new();
    let mut e = minicbor::Encoder::new(&mut buf);
    e.map(3)
        .unwrap()
        .u32(999)
        .unwrap()
        .str("from the future")
        .unwrap()
        .u32(field::TID)
        .unwrap()
        .u32(5)
        .unwrap()
        .u32(998)
        .unwrap()
        .u64(0xdead)
        .unwrap();

    let msg: Msg = minicbor::decode(&buf).unwrap();
    assert_eq!(
        msg,
        Msg {
            tid: Some(5),
            ..Msg::default()
        }
    );
}

#[test]
fn indefinite_maps_are_rejected() {
    let mut buf = Vec::new();
    let mut e = minicbor::Encoder::new(&mut buf);
    e.begin_map().unwrap().end().unwrap();

    assert!(minicbor::decode::<Msg>(&buf).is_err());
}

#[test]
fn impossible_digest_size_is_rejected() {
    let mut buf = Vec::new();
    let mut e = minicbor::Encoder::new(&mut buf);
    e.map(1)
        .unwrap()
        .u32(field::DIGEST)
        .unwrap()
        .bytes(&[1, 2, 3])
        .unwrap();

    assert!(minicbor::decode::<Msg>(&buf).is_err());
}

#[test]
fn unknown_opcode_is_rejected() {
    let mut buf = Vec::new();
    let mut e = minicbor::Encoder::new(&mut buf);
    e.map(1).unwrap().u32(field::OP).unwrap().u32(77).unwrap();

    assert!(minicbor::decode::<Msg>(&buf).is_err());
}

#[test]
fn preserve_identity_drops_everything_else() {
    let mut m = full_ack();
    m.preserve_identity();

    assert_eq!(
        m,
        Msg {
            ns_id: Some(NsId(1)),
            digest: Some(resolve::digest(1)),
            tid: Some(42),
            ..Msg::default()
        }
    );
}

#[test]
fn identity_requires_all_three_fields() {
    let mut m = full_ack();
    assert!(m.identity().is_some());

    m.tid = None;
    assert!(m.identity().is_none());
}
