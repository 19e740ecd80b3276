// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

use proptest::prelude::*;

use crate::{resolve::gen::gen_msg, roundtrip};

proptest! {
    #[test]
    fn roundtrip(msg in gen_msg()) {
        roundtrip::cbor(msg)
    }
}
