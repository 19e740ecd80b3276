// Copyright © 2022 The Shale Team <dev@shale.dev>
//
// This file is part of shale, distributed under the GPLv3 with Shale
// Linking Exception. For full terms see the included LICENSE file.

mod properties;
mod unit;
