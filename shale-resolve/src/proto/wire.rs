// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! CBOR form of [`Msg`]: a definite-length map of integer tags.
//!
//! Decoding skips tags it does not know, so a newer peer can grow the
//! protocol table without breaking us.

use std::convert::TryFrom as _;

use minicbor::{decode, encode, Decoder, Encoder};

use super::{field, Msg, Op, ResultCode};
use crate::record::{Digest, NsId};

impl minicbor::Encode for Msg {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
    ) -> Result<(), encode::Error<W::Error>> {
        e.map(self.num_fields())?;

        if let Some(op) = self.op {
            e.u32(field::OP)?.u32(op.into())?;
        }
        if let Some(result) = self.result {
            e.u32(field::RESULT)?.u32(result.into())?;
        }
        if let Some(namespace) = &self.namespace {
            e.u32(field::NAMESPACE)?.bytes(namespace)?;
        }
        if let Some(ns_id) = self.ns_id {
            e.u32(field::NS_ID)?.u32(ns_id.0)?;
        }
        if let Some(generation) = self.generation {
            e.u32(field::GENERATION)?.u32(generation)?;
        }
        if let Some(digest) = &self.digest {
            e.u32(field::DIGEST)?.bytes(digest.as_bytes())?;
        }
        if let Some(cluster_key) = self.cluster_key {
            e.u32(field::CLUSTER_KEY)?.u64(cluster_key)?;
        }
        if let Some(record) = &self.record {
            e.u32(field::RECORD)?.bytes(record)?;
        }
        if let Some(tid) = self.tid {
            e.u32(field::TID)?.u32(tid)?;
        }
        if let Some(void_time) = self.void_time {
            e.u32(field::VOID_TIME)?.u32(void_time)?;
        }
        if let Some(info) = self.info {
            e.u32(field::INFO)?.u32(info)?;
        }
        if let Some(lut) = self.last_update_time {
            e.u32(field::LAST_UPDATE_TIME)?.u64(lut)?;
        }
        if let Some(set_name) = &self.set_name {
            e.u32(field::SET_NAME)?.bytes(set_name)?;
        }
        if let Some(key) = &self.key {
            e.u32(field::KEY)?.bytes(key)?;
        }

        Ok(())
    }
}

impl<'b> minicbor::Decode<'b> for Msg {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, decode::Error> {
        let len = d
            .map()?
            .ok_or(decode::Error::Message("expected definite-length map"))?;

        let mut msg = Self::default();
        for _ in 0..len {
            decode_field(d, &mut msg)?
        }

        Ok(msg)
    }
}

fn decode_field(d: &mut Decoder, msg: &mut Msg) -> Result<(), decode::Error> {
    match d.u32()? {
        field::OP => {
            let raw = d.u32()?;
            msg.op = Some(Op::try_from(raw).or(Err(decode::Error::UnknownVariant(raw)))?)
        },
        field::RESULT => {
            let raw = d.u32()?;
            msg.result =
                Some(ResultCode::try_from(raw).or(Err(decode::Error::UnknownVariant(raw)))?)
        },
        field::NAMESPACE => msg.namespace = Some(d.bytes()?.to_vec().into()),
        field::NS_ID => msg.ns_id = Some(NsId(d.u32()?)),
        field::GENERATION => msg.generation = Some(d.u32()?),
        field::DIGEST => {
            msg.digest = Some(
                Digest::from_slice(d.bytes()?)
                    .ok_or(decode::Error::Message("digest of impossible size"))?,
            )
        },
        field::CLUSTER_KEY => msg.cluster_key = Some(d.u64()?),
        field::RECORD => msg.record = Some(d.bytes()?.to_vec().into()),
        field::TID => msg.tid = Some(d.u32()?),
        field::VOID_TIME => msg.void_time = Some(d.u32()?),
        field::INFO => msg.info = Some(d.u32()?),
        field::LAST_UPDATE_TIME => msg.last_update_time = Some(d.u64()?),
        field::SET_NAME => msg.set_name = Some(d.bytes()?.to_vec().into()),
        field::KEY => msg.key = Some(d.bytes()?.to_vec().into()),

        // a peer newer than us; not our problem
        _ => d.skip()?,
    }

    Ok(())
}
