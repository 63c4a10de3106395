// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

pub mod cache;
pub mod convert;
pub mod enrich;
pub mod http;
pub mod interpret;
pub mod knowledge;

#[cfg(test)]
mod testing;
