// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared types for the Mkvdemux demuxers: errors, byte sources, demuxed buffers, and the
//! sinks that buffers are delivered to.

pub mod buffer;
pub mod errors;
pub mod formats;
pub mod io;
pub mod sink;
