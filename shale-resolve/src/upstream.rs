// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use bytes::Bytes;

use crate::proto::ResultCode;

/// The transaction layer on top of us.
///
/// `Origin` is the layer's own handle onto the suspended client
/// transaction. It is owned by the inflight request until either the
/// resolution completes (ownership moves into [`Upstream::dup_res_done`] or
/// [`Upstream::restart`]) or the timeout path detaches it. Whoever ends up
/// without the origin must not answer the client.
pub trait Upstream {
    type Origin: Send;

    /// Does this ack result demand abandoning the resolution and restarting
    /// the whole transaction? Policy lives with the host.
    fn must_restart(&self, result: ResultCode) -> bool {
        let _ = result;
        false
    }

    /// Re-enqueue the original client request as a fresh transaction
    /// carrying the restart flag. Hosts worried about restart storms can
    /// throttle here; the state machine does not care.
    fn restart(&self, origin: Self::Origin, msgp: Bytes);

    /// The resolution finished and the client transaction may resume with
    /// the reconciled view. Returns whether the request should leave the
    /// inflight table; `false` keeps the slot pinned for a follow-on phase,
    /// which the host then ends via [`crate::Resolver::abandon`].
    fn dup_res_done(&self, origin: Self::Origin, msgp: Bytes, result: ResultCode) -> bool;
}
