// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::fmt;

use thiserror::Error;

use crate::proto::Msg;

/// Fabric-level identity of a cluster node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NodeId({})", self)
    }
}

/// Logical fabric channels. Duplicate resolution rides the read-write
/// channel exclusively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Rw,
}

/// A message that could not be handed to the transport. The message comes
/// back with the error: the caller still owes it to the pool.
#[derive(Debug, Error)]
#[error("fabric send to {node} failed")]
pub struct SendError {
    pub node: NodeId,
    pub returned: Msg,
}

/// The message transport, as seen by this crate.
///
/// Messages are pooled: [`Fabric::msg_get`] hands out a message with no
/// fields set, and every message must eventually make its way back via
/// [`Fabric::msg_put`] or be consumed by a successful [`Fabric::send`].
/// Inbound messages are delivered by the host calling
/// [`crate::Resolver::handle_probe`] / [`crate::Resolver::handle_ack`] from
/// its receive path, transferring ownership to the resolver.
pub trait Fabric {
    fn msg_get(&self) -> Msg;

    fn msg_put(&self, msg: Msg);

    fn send(&self, to: NodeId, msg: Msg, channel: Channel) -> Result<(), SendError>;
}

/// Send, or return the message to the pool. Failure here is routine (the
/// peer may be gone); the retransmit timer will try again if it matters.
pub(crate) fn send_or_reclaim<F: Fabric>(fabric: &F, to: NodeId, msg: Msg) -> bool {
    match fabric.send(to, msg, Channel::Rw) {
        Ok(()) => true,
        Err(SendError { node, returned }) => {
            tracing::warn!(node = %node, "dup-res send failed");
            fabric.msg_put(returned);
            false
        },
    }
}
