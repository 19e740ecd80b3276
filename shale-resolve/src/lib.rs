// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

//! Duplicate resolution for shale's partitioned record store.
//!
//! When a partition's authoritative copy is ambiguous (typically during or
//! shortly after a cluster transition), the node coordinating a client
//! operation must reconcile the plausibly-divergent copies its peers hold
//! before serving it. This crate is that reconciliation: probe the
//! duplicate holders, pick a winner under the namespace's conflict policy,
//! apply it locally if it improves on the local copy, and hand the client
//! transaction back to the layer above.
//!
//! Everything around the state machine belongs to the host and is reached
//! through the seam traits ([`Fabric`], [`Store`], [`Partitions`],
//! [`Upstream`]): transport, storage, partition ownership, the transaction
//! service, and the retransmit timer.

#![warn(clippy::extra_unused_lifetimes)]
#![deny(rustdoc::broken_intra_doc_links)]

mod apply;

pub mod fabric;
pub use fabric::{Channel, Fabric, NodeId, SendError};

mod namespace;
pub use namespace::{Namespace, Namespaces};

mod originator;
pub use originator::{StartError, Transaction};

pub mod policy;
pub use policy::ConflictPolicy;

pub mod proto;
pub use proto::{Msg, Op, ResultCode};

pub mod record;
pub use record::{Digest, NsId, RecordId, Stamp, DIGEST_LEN};

mod request;
pub use request::Request;

mod resolver;
pub use resolver::Resolver;

mod responder;

pub mod stats;
pub use stats::Stats;

pub mod store;
pub use store::{Partitions, RecordMeta, RecordRead, RemoteRecord, Store, MIN_PICKLE_LEN};

mod table;

pub mod upstream;
pub use upstream::Upstream;

/// Everything a node must provide for the resolver to run. Blanket-implied;
/// hosts implement the parts.
pub trait Host: Fabric + Store + Upstream + Clone + Send + Sync + 'static {}

impl<T> Host for T where T: Fabric + Store + Upstream + Clone + Send + Sync + 'static {}
