// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use crate::{
    policy::ConflictPolicy,
    proto::{info, ResultCode},
    record::Digest,
    request::Best,
    stats::Stats,
    store::{RemoteRecord, Store, MIN_PICKLE_LEN},
};

/// Reconstruct the winning duplicate and offer it to storage.
///
/// Storage re-evaluates the policy under its own lock; it answering
/// `RecordExists` or `Generation` means it kept a copy at least as new,
/// which is just as good as us writing one.
pub(crate) fn apply_winner<S: Store>(
    store: &S,
    reservation: &S::Reservation,
    digest: &Digest,
    policy: ConflictPolicy,
    best: &Best,
    stats: &Stats,
) -> ResultCode {
    let pickle = match &best.msg.record {
        Some(pickle) if pickle.len() >= MIN_PICKLE_LEN => pickle.clone(),
        _ => {
            tracing::warn!(digest = %digest, "winning duplicate shipped an unusable pickle");
            stats.rejected_pickle();
            return ResultCode::Unknown;
        },
    };

    // a binless pickle must never overwrite a live record
    if best.msg.info.unwrap_or(0) & info::NO_BINS != 0 {
        tracing::warn!(digest = %digest, "winning duplicate is binless");
        stats.rejected_pickle();
        return ResultCode::Unknown;
    }

    let remote = RemoteRecord {
        reservation,
        digest,
        stamp: best.stamp,
        void_time: best.msg.void_time,
        set_name: best.msg.set_name.clone(),
        key: best.msg.key.clone(),
        pickle,
    };

    match store.replace_if_better(remote, policy, false, false) {
        ResultCode::RecordExists | ResultCode::Generation => ResultCode::Ok,
        rc => rc,
    }
}
