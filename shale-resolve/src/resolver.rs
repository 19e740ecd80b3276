// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use std::sync::{
    atomic::{AtomicU32, Ordering::Relaxed},
    Arc,
};

use crate::{
    fabric::NodeId,
    namespace::Namespaces,
    originator::{self, StartError, Transaction},
    proto::Msg,
    request::Request,
    responder,
    stats::Stats,
    table::Table,
    Host,
};

/// Both ends of duplicate resolution on one node.
///
/// The host wires the fabric's receive path to [`Resolver::handle_probe`] /
/// [`Resolver::handle_ack`], its transaction layer to [`Resolver::start`],
/// and its retransmit worker to [`Resolver::send_probes`] /
/// [`Resolver::abandon`].
pub struct Resolver<H: Host> {
    host: H,
    namespaces: Namespaces,
    table: Table<H>,
    tid: AtomicU32,
    stats: Stats,
}

impl<H: Host> Resolver<H> {
    pub fn new(host: H, namespaces: Namespaces) -> Self {
        Self {
            host,
            namespaces,
            table: Table::new(),
            tid: AtomicU32::new(1),
            stats: Stats::default(),
        }
    }

    /// Begin resolving: register the request, probe every duplicate holder,
    /// return the handle the retransmit worker keeps until the deadline.
    ///
    /// Fails, returning the transaction, if a resolution for this record
    /// is already in flight.
    #[tracing::instrument(level = "debug", skip(self, txn))]
    pub fn start(&self, txn: Transaction<H>) -> Result<Arc<Request<H>>, StartError<H>> {
        originator::start(self, txn)
    }

    /// Fabric receive path, `Op::Dup`. Ownership of `msg` transfers here.
    #[tracing::instrument(level = "debug", skip(self, msg))]
    pub fn handle_probe(&self, from: NodeId, msg: Msg) {
        responder::handle_probe(self, from, msg)
    }

    /// Fabric receive path, `Op::DupAck`. Ownership of `msg` transfers
    /// here.
    #[tracing::instrument(level = "debug", skip(self, msg))]
    pub fn handle_ack(&self, from: NodeId, msg: Msg) {
        originator::handle_ack(self, from, msg)
    }

    /// Re-probe the peers still owing an answer.
    pub fn send_probes(&self, req: &Request<H>) {
        originator::send_probes(self, req)
    }

    /// Deadline expired (or the host is done with a pinned slot): detach
    /// the origin and drop the table's reference. Idempotent; straggling
    /// acks still in flight keep the request alive until they finish.
    pub fn abandon(&self, req: &Arc<Request<H>>) -> bool {
        req.detach_origin();
        self.table.remove(&req.key(), req)
    }

    /// Number of resolutions currently in flight.
    pub fn inflight(&self) -> usize {
        self.table.len()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub(crate) fn host(&self) -> &H {
        &self.host
    }

    pub(crate) fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    pub(crate) fn table(&self) -> &Table<H> {
        &self.table
    }

    pub(crate) fn next_tid(&self) -> u32 {
        self.tid.fetch_add(1, Relaxed)
    }
}
