// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::time::Instant;

use bytes::Bytes;
use nonempty::NonEmpty;
use parking_lot::{Mutex, MutexGuard};

use crate::{
    fabric::{Fabric as _, NodeId},
    policy::ConflictPolicy,
    proto::{Msg, ResultCode},
    record::{RecordId, Stamp},
    Host,
};

/// One active resolution.
///
/// Shared between the inflight table, the upstream/retransmit holder, and
/// any ack currently being processed, via `Arc`. The immutable part is
/// readable without the lock; everything that moves is behind [`Mutex`].
/// When the last reference drops, the partition reservation is released and
/// a still-held best reply goes back to the fabric pool.
pub struct Request<H: Host> {
    host: H,
    key: RecordId,
    tid: u32,
    deadline: Instant,
    peers: NonEmpty<NodeId>,
    ns_name: Bytes,
    policy: ConflictPolicy,
    local: Option<Stamp>,
    reservation: H::Reservation,
    state: Mutex<State<H>>,
}

impl<H: Host> std::fmt::Debug for Request<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("key", &self.key)
            .field("tid", &self.tid)
            .field("deadline", &self.deadline)
            .field("peers", &self.peers)
            .field("ns_name", &self.ns_name)
            .field("policy", &self.policy)
            .field("local", &self.local)
            .finish_non_exhaustive()
    }
}

pub(crate) struct State<H: Host> {
    /// One slot per peer, set on the first matching ack. Never cleared.
    pub peer_complete: Vec<bool>,
    pub best: Option<Best>,
    /// Latched by the restart and completion paths; acks arriving after
    /// this are dropped.
    pub complete: bool,
    pub result: ResultCode,
    pub origin: Option<H::Origin>,
    /// The original client request. Moves out exactly once: into a
    /// restarted transaction, or into the completion continuation.
    pub msgp: Option<Bytes>,
}

/// The running best duplicate. Owns the winning ack until a strictly
/// better one displaces it (the old one goes back to the pool) or the
/// request is destroyed.
pub(crate) struct Best {
    pub msg: Msg,
    pub result: ResultCode,
    pub stamp: Stamp,
}

impl<H: Host> Request<H> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        host: H,
        key: RecordId,
        tid: u32,
        deadline: Instant,
        peers: NonEmpty<NodeId>,
        ns_name: Bytes,
        policy: ConflictPolicy,
        local: Option<Stamp>,
        reservation: H::Reservation,
        origin: H::Origin,
        msgp: Bytes,
    ) -> Self {
        let state = State {
            peer_complete: vec![false; peers.len()],
            best: None,
            complete: false,
            result: ResultCode::Unknown,
            origin: Some(origin),
            msgp: Some(msgp),
        };

        Self {
            host,
            key,
            tid,
            deadline,
            peers,
            ns_name,
            policy,
            local,
            reservation,
            state: Mutex::new(state),
        }
    }

    pub fn key(&self) -> RecordId {
        self.key
    }

    /// Tag distinguishing this attempt from earlier uses of the same slot.
    pub fn tid(&self) -> u32 {
        self.tid
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn peers(&self) -> &NonEmpty<NodeId> {
        &self.peers
    }

    pub fn ns_name(&self) -> &Bytes {
        &self.ns_name
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Version of the originator's local copy, if it has one.
    pub fn local(&self) -> Option<Stamp> {
        self.local
    }

    pub fn reservation(&self) -> &H::Reservation {
        &self.reservation
    }

    /// Whether the state machine has run to its end (completion or
    /// restart). Straggler acks observe this and drop.
    pub fn is_complete(&self) -> bool {
        self.state.lock().complete
    }

    /// The request's final result code; meaningful once complete.
    pub fn result(&self) -> ResultCode {
        self.state.lock().result
    }

    /// The timeout path calls this to signal "the client already got an
    /// answer". Work in flight continues, but nothing further is delivered
    /// upstream. Returns whether the origin was still attached.
    pub fn detach_origin(&self) -> bool {
        self.state.lock().origin.take().is_some()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State<H>> {
        self.state.lock()
    }
}

impl<H: Host> Drop for Request<H> {
    fn drop(&mut self) {
        if let Some(best) = self.state.get_mut().best.take() {
            self.host.msg_put(best.msg)
        }
        // dropping `self.reservation` releases the partition
    }
}
