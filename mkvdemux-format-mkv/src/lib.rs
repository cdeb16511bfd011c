// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A Matroska and WebM demuxer.
//!
//! [`MkvDemuxer`] reads a seekable Matroska stream and delivers decoder initialization buffers
//! and timestamped frames to a [`StreamSink`](mkvdemux_core::sink::StreamSink). It also provides
//! seeking through the Cues index and chapter navigation over the first edition.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod block;
mod chapters;
mod codecs;
mod compression;
mod cues;
mod demuxer;
mod ebml;
mod element_ids;
mod lacing;
mod segment;
mod tracks;
mod vobsub;

pub use crate::chapters::{Chapter, Edition};
pub use crate::compression::Compression;
pub use crate::cues::{CueIndex, CueIndexes};
pub use crate::demuxer::{MkvDemuxer, NavigationEvent};
pub use crate::segment::SegmentInfo;
pub use crate::tracks::{AudioInfo, Track, TrackKind, VideoInfo};
pub use crate::vobsub::VobSubInfo;
