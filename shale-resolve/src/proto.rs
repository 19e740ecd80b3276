// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! The duplicate-resolution wire protocol.
//!
//! Messages on the `Rw` fabric channel are flat tables of numerically-tagged
//! fields ([`field`]). A field a given exchange does not use is simply
//! absent, which is what allows the responder to reuse an inbound probe as
//! its ack: preserve the identity fields, everything else is free real
//! estate.

use std::{convert::TryFrom, fmt};

use bytes::Bytes;
use thiserror::Error;

use crate::record::{Digest, NsId};

mod wire;

/// Field tags, as they appear on the wire.
///
/// These are pinned forever: peers of any software version must agree on
/// them. Add, never renumber.
pub mod field {
    pub const OP: u32 = 0;
    pub const RESULT: u32 = 1;
    pub const NAMESPACE: u32 = 2;
    pub const NS_ID: u32 = 3;
    pub const GENERATION: u32 = 4;
    pub const DIGEST: u32 = 5;
    pub const CLUSTER_KEY: u32 = 6;
    pub const RECORD: u32 = 7;
    pub const TID: u32 = 8;
    pub const VOID_TIME: u32 = 9;
    pub const INFO: u32 = 10;
    pub const LAST_UPDATE_TIME: u32 = 11;
    pub const SET_NAME: u32 = 12;
    pub const KEY: u32 = 13;
}

/// Bits of the `INFO` flag word, describing the shape of the pickle
/// shipped in `RECORD`.
pub mod info {
    /// The pickle carries no bins. Such a pickle must never overwrite a
    /// live record.
    pub const NO_BINS: u32 = 0x0001;
}

/// Message opcodes on the `Rw` channel.
///
/// The lower opcodes belong to the replica-write exchange and are not part
/// of this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Op {
    Dup = 2,
    DupAck = 3,
}

impl From<Op> for u32 {
    fn from(op: Op) -> Self {
        op as u32
    }
}

#[derive(Debug, Error)]
#[error("unknown opcode {0}")]
pub struct UnknownOp(pub u32);

impl TryFrom<u32> for Op {
    type Error = UnknownOp;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            2 => Ok(Self::Dup),
            3 => Ok(Self::DupAck),
            x => Err(UnknownOp(x)),
        }
    }
}

/// Operation result codes, shared across the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Ok = 0,
    Unknown = 1,
    NotFound = 2,
    Generation = 3,
    Parameter = 4,
    RecordExists = 5,
    OutOfSpace = 8,
    Timeout = 9,
    Unavailable = 11,
    DeviceOverload = 18,
}

impl ResultCode {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<ResultCode> for u32 {
    fn from(rc: ResultCode) -> Self {
        rc as u32
    }
}

#[derive(Debug, Error)]
#[error("unknown result code {0}")]
pub struct UnknownResultCode(pub u32);

impl TryFrom<u32> for ResultCode {
    type Error = UnknownResultCode;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Unknown),
            2 => Ok(Self::NotFound),
            3 => Ok(Self::Generation),
            4 => Ok(Self::Parameter),
            5 => Ok(Self::RecordExists),
            8 => Ok(Self::OutOfSpace),
            9 => Ok(Self::Timeout),
            11 => Ok(Self::Unavailable),
            18 => Ok(Self::DeviceOverload),
            x => Err(UnknownResultCode(x)),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A fabric message: every protocol field, each optional.
///
/// Fresh messages come out of the fabric pool with no fields set
/// ([`crate::fabric::Fabric::msg_get`]), and every message has exactly one
/// owner at any point: whoever holds it either stores it, sends it, or
/// returns it to the pool.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Msg {
    pub op: Option<Op>,
    pub result: Option<ResultCode>,
    pub namespace: Option<Bytes>,
    pub ns_id: Option<NsId>,
    pub generation: Option<u32>,
    pub digest: Option<Digest>,
    pub cluster_key: Option<u64>,
    pub record: Option<Bytes>,
    pub tid: Option<u32>,
    pub void_time: Option<u32>,
    pub info: Option<u32>,
    pub last_update_time: Option<u64>,
    pub set_name: Option<Bytes>,
    pub key: Option<Bytes>,
}

impl Msg {
    /// The identity triple an ack echoes verbatim, if complete.
    pub fn identity(&self) -> Option<(NsId, Digest, u32)> {
        Some((self.ns_id?, self.digest?, self.tid?))
    }

    /// Keep only the identity fields; everything else reverts to free real
    /// estate. This is how a responder turns a request into its reply.
    pub fn preserve_identity(&mut self) {
        *self = Self {
            ns_id: self.ns_id,
            digest: self.digest,
            tid: self.tid,
            ..Self::default()
        };
    }

    fn num_fields(&self) -> u64 {
        self.op.is_some() as u64
            + self.result.is_some() as u64
            + self.namespace.is_some() as u64
            + self.ns_id.is_some() as u64
            + self.generation.is_some() as u64
            + self.digest.is_some() as u64
            + self.cluster_key.is_some() as u64
            + self.record.is_some() as u64
            + self.tid.is_some() as u64
            + self.void_time.is_some() as u64
            + self.info.is_some() as u64
            + self.last_update_time.is_some() as u64
            + self.set_name.is_some() as u64
            + self.key.is_some() as u64
    }
}
