// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! The originating side of a resolution: probe fan-out and the ack-driven
//! state machine.

use std::{cmp::Ordering, fmt, sync::Arc, time::Instant};

use bytes::Bytes;
use nonempty::NonEmpty;
use thiserror::Error;

use crate::{
    apply,
    fabric::{self, Fabric as _, NodeId},
    proto::{Msg, Op, ResultCode},
    record::{Digest, NsId, RecordId, Stamp},
    request::{Best, Request},
    resolver::Resolver,
    store::Partitions as _,
    upstream::Upstream as _,
    Host,
};

/// Everything the transaction layer hands over to begin a resolution.
///
/// Ownership of the reservation, the origin handle and the client payload
/// moves into the inflight request; on [`StartError`] the whole transaction
/// comes back.
pub struct Transaction<H: Host> {
    pub ns: NsId,
    pub digest: Digest,
    /// Pre-reserved partition handle, listing `peers` as the duplicates.
    pub reservation: H::Reservation,
    pub peers: NonEmpty<NodeId>,
    pub origin: H::Origin,
    /// The original client request bytes.
    pub msgp: Bytes,
    pub deadline: Instant,
    /// Version of the local copy, if there is one. Probes carry it so
    /// peers with nothing better can skip shipping bytes.
    pub local: Option<Stamp>,
}

#[derive(Error)]
pub enum StartError<H: Host> {
    /// At most one resolution per record: callers get the transaction back
    /// and decide whether to retry.
    #[error("duplicate resolution already in flight for {}:{}", .txn.ns, .txn.digest)]
    Busy { txn: Transaction<H> },

    #[error("namespace {} is not configured", .txn.ns)]
    UnknownNamespace { txn: Transaction<H> },
}

impl<H: Host> fmt::Debug for StartError<H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Busy { txn } => write!(f, "Busy({}:{})", txn.ns, txn.digest),
            Self::UnknownNamespace { txn } => write!(f, "UnknownNamespace({})", txn.ns),
        }
    }
}

pub(crate) fn start<H: Host>(
    rv: &Resolver<H>,
    txn: Transaction<H>,
) -> Result<Arc<Request<H>>, StartError<H>> {
    let (ns_name, policy) = match rv.namespaces().by_id(txn.ns) {
        Some(ns) => (ns.name.clone(), ns.policy),
        None => return Err(StartError::UnknownNamespace { txn }),
    };

    let key = RecordId {
        ns: txn.ns,
        digest: txn.digest,
    };
    let tid = rv.next_tid();
    let host = rv.host().clone();

    let req = rv
        .table()
        .begin(key, txn, |txn| {
            Arc::new(Request::new(
                host,
                key,
                tid,
                txn.deadline,
                txn.peers,
                ns_name,
                policy,
                txn.local,
                txn.reservation,
                txn.origin,
                txn.msgp,
            ))
        })
        .map_err(|txn| StartError::Busy { txn })?;

    send_probes(rv, &req);

    Ok(req)
}

/// Build one probe for `req`. Pool discipline: the caller owns the result
/// and must send it or put it back.
pub(crate) fn make_probe<H: Host>(host: &H, req: &Request<H>) -> Msg {
    let mut m = host.msg_get();
    m.op = Some(Op::Dup);
    m.namespace = Some(req.ns_name().clone());
    m.ns_id = Some(req.key().ns);
    m.digest = Some(req.key().digest);
    m.tid = Some(req.tid());
    // legacy peers refuse probes without an epoch key; harmless to newer ones
    m.cluster_key = Some(host.cluster_key());
    if let Some(local) = req.local() {
        m.generation = Some(u32::from(local.gen));
        m.last_update_time = Some(local.lut);
    }

    m
}

/// (Re-)send probes to every peer that has not answered yet. Called once
/// from [`start`] and again by the retransmit worker on its interval.
pub(crate) fn send_probes<H: Host>(rv: &Resolver<H>, req: &Request<H>) {
    let pending = {
        let state = req.lock();
        if state.complete {
            return;
        }

        req.peers()
            .iter()
            .zip(state.peer_complete.iter())
            .filter(|(_, done)| !**done)
            .map(|(node, _)| *node)
            .collect::<Vec<_>>()
    };

    for node in pending {
        let probe = make_probe(rv.host(), req);
        fabric::send_or_reclaim(rv.host(), node, probe);
    }
}

/// What an ack tells us, however little.
struct AckMeta {
    result: ResultCode,
    stamp: Stamp,
}

impl AckMeta {
    fn parse(m: &Msg) -> Self {
        Self {
            result: m.result.unwrap_or(ResultCode::Unknown),
            stamp: Stamp {
                // the wire widens the generation; compare narrow
                gen: m.generation.unwrap_or(0) as u16,
                lut: m.last_update_time.unwrap_or(0),
            },
        }
    }
}

/// An ack from a duplicate-holding peer re-enters the state machine here.
///
/// Takes ownership of `m`: it ends up either stored as the running best or
/// back in the fabric pool, on every path.
pub(crate) fn handle_ack<H: Host>(rv: &Resolver<H>, from: NodeId, m: Msg) {
    let (ns_id, digest, tid) = match m.identity() {
        Some(identity) => identity,
        None => {
            tracing::warn!(node = %from, "dup-res ack missing identity fields");
            rv.stats().bad_ack();
            rv.host().msg_put(m);
            return;
        },
    };

    let key = RecordId { ns: ns_id, digest };
    let req = match rv.table().lookup(&key) {
        Some(req) => req,
        // resolution finished or timed out while this ack was in flight
        None => {
            rv.stats().stray_ack();
            rv.host().msg_put(m);
            return;
        },
    };

    let mut state = req.lock();

    if tid != req.tid() || state.complete {
        drop(state);
        rv.stats().stray_ack();
        rv.host().msg_put(m);
        return;
    }

    let peer = match req.peers().iter().position(|node| *node == from) {
        Some(i) => i,
        None => {
            drop(state);
            tracing::warn!(node = %from, record = %key, "dup-res ack from a node we never asked");
            rv.stats().stray_ack();
            rv.host().msg_put(m);
            return;
        },
    };

    if state.peer_complete[peer] {
        drop(state);
        rv.stats().stray_ack();
        rv.host().msg_put(m);
        return;
    }
    state.peer_complete[peer] = true;

    let meta = AckMeta::parse(&m);

    if rv.host().must_restart(meta.result) {
        match state.origin.take() {
            Some(origin) => {
                let msgp = state.msgp.take();
                state.complete = true;
                drop(state);

                rv.host().msg_put(m);
                if let Some(msgp) = msgp {
                    rv.host().restart(origin, msgp);
                }
                rv.table().remove(&key, &req);
                rv.stats().restart();
            },
            // timed out from under us; the client has its answer already
            None => {
                drop(state);
                rv.host().msg_put(m);
            },
        }

        return;
    }

    // Strictly better replaces; ties keep the incumbent, so the outcome is
    // deterministic however the answers interleave.
    let better = match &state.best {
        None => true,
        Some(best) => req.policy().resolve(best.stamp, meta.stamp) == Ordering::Less,
    };
    if better {
        let displaced = state.best.replace(Best {
            msg: m,
            result: meta.result,
            stamp: meta.stamp,
        });
        if let Some(displaced) = displaced {
            rv.host().msg_put(displaced.msg);
        }
    } else {
        rv.host().msg_put(m);
    }

    if state.peer_complete.iter().any(|done| !*done) {
        return;
    }

    // Every peer has answered: settle the outcome. Even with the origin
    // gone the winner is still applied; the local copy can only improve.
    let result = match &state.best {
        Some(best) if best.result.is_ok() => apply::apply_winner(
            rv.host(),
            req.reservation(),
            &key.digest,
            req.policy(),
            best,
            rv.stats(),
        ),
        Some(best) => best.result,
        None => ResultCode::Unknown,
    };
    state.result = result;
    state.complete = true;
    let origin = state.origin.take();
    let msgp = state.msgp.take();
    drop(state);

    match origin {
        Some(origin) => {
            let remove = rv
                .host()
                .dup_res_done(origin, msgp.unwrap_or_default(), result);
            if remove {
                rv.table().remove(&key, &req);
            }
            rv.stats().completion();
        },
        // the timeout path owns the client now; keep the work, eat the reply
        None => (),
    }
}
