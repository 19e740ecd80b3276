// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use bytes::Bytes;
use proptest::prelude::*;
use shale_resolve::{ConflictPolicy, Digest, Msg, NsId, Op, ResultCode, Stamp};

pub fn gen_policy() -> impl Strategy<Value = ConflictPolicy> {
    prop_oneof![
        Just(ConflictPolicy::Generation),
        Just(ConflictPolicy::LastUpdateTime)
    ]
}

pub fn gen_digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 20]>().prop_map(Digest::from)
}

pub fn gen_stamp() -> impl Strategy<Value = Stamp> {
    (any::<u16>(), any::<u64>()).prop_map(|(gen, lut)| Stamp { gen, lut })
}

/// Stamps from a tiny domain, so ties actually happen.
pub fn gen_small_stamp() -> impl Strategy<Value = Stamp> {
    (0u16..3, 0u64..3).prop_map(|(gen, lut)| Stamp { gen, lut })
}

pub fn gen_result_code() -> impl Strategy<Value = ResultCode> {
    prop::sample::select(vec![
        ResultCode::Ok,
        ResultCode::Unknown,
        ResultCode::NotFound,
        ResultCode::Generation,
        ResultCode::Parameter,
        ResultCode::RecordExists,
        ResultCode::OutOfSpace,
        ResultCode::Timeout,
        ResultCode::Unavailable,
        ResultCode::DeviceOverload,
    ])
}

pub fn gen_msg() -> impl Strategy<Value = Msg> {
    let bytes = || {
        prop::option::of(prop::collection::vec(any::<u8>(), 0..24).prop_map(Bytes::from))
    };

    (
        (
            prop::option::of(prop_oneof![Just(Op::Dup), Just(Op::DupAck)]),
            prop::option::of(gen_result_code()),
            bytes(),
            prop::option::of(any::<u32>().prop_map(NsId)),
            prop::option::of(any::<u32>()),
            prop::option::of(gen_digest()),
            prop::option::of(any::<u64>()),
        ),
        (
            bytes(),
            prop::option::of(any::<u32>()),
            prop::option::of(any::<u32>()),
            prop::option::of(any::<u32>()),
            prop::option::of(any::<u64>()),
            bytes(),
            bytes(),
        ),
    )
        .prop_map(
            |(
                (op, result, namespace, ns_id, generation, digest, cluster_key),
                (record, tid, void_time, info, last_update_time, set_name, key),
            )| Msg {
                op,
                result,
                namespace,
                ns_id,
                generation,
                digest,
                cluster_key,
                record,
                tid,
                void_time,
                info,
                last_update_time,
                set_name,
                key,
            },
        )
}
