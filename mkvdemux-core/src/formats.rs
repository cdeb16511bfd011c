// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `formats` module provides the traits and support structures necessary to implement
//! container demuxers.

use crate::errors::Result;
use crate::sink::{Capabilities, StreamSink};

/// `FormatOptions` is a common set of options that all demuxers use.
#[derive(Copy, Clone, Debug)]
pub struct FormatOptions {
    /// The maximum number of tracks a stream may declare. Streams declaring more are rejected.
    /// Default: `128`.
    pub max_streams: usize,
    /// The maximum number of frames a single laced block may contain. Default: `32`.
    pub max_lace_frames: usize,
    /// The maximum length of a frame after decompression. Larger frames are dropped.
    /// Default: `16 MiB`.
    pub max_frame_len: usize,
    /// The number of frames sent while priming decoders in `send_headers`. Default: `10`.
    pub preview_buffers: usize,
    /// A jump between consecutive timestamps (in 90kHz ticks) larger than this value is treated
    /// as a discontinuity. Default: `90000` (one second).
    pub wrap_threshold: i64,
    /// The maximum length of a string element that will be read. Default: `4096`.
    pub max_string_len: u64,
    /// The maximum nesting depth of the container's element tree. Default: `10`.
    pub max_depth: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            max_streams: 128,
            max_lace_frames: 32,
            max_frame_len: 16 * 1024 * 1024,
            preview_buffers: 10,
            wrap_threshold: 90000,
            max_string_len: 4096,
            max_depth: 10,
        }
    }
}

/// The playback status of a demuxer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DemuxStatus {
    /// More data may be demuxed.
    Ok,
    /// The stream has ended, either normally or due to an error.
    Finished,
}

/// A `Demuxer` splits a container into elementary stream buffers.
///
/// The expected call sequence is one [`Demuxer::send_headers`], followed by repeated calls to
/// [`Demuxer::send_chunk`] until it reports [`DemuxStatus::Finished`]. [`Demuxer::seek`] may be
/// called at any point after the headers were sent.
pub trait Demuxer {
    /// Parses the stream headers, sends decoder initialization buffers, and primes the decoders
    /// with a few preview frames. On return, the demuxer is positioned at the start of the
    /// stream.
    fn send_headers(&mut self, sink: &mut dyn StreamSink) -> Result<()>;

    /// Demuxes the next unit of the stream. Any error finishes the stream.
    fn send_chunk(&mut self, sink: &mut dyn StreamSink) -> Result<DemuxStatus>;

    /// Seeks to a position. If `start_pos` (normalized to `0..=65535` over the stream length)
    /// is non-zero it takes precedence, otherwise `start_time` (in milliseconds) is used.
    ///
    /// A seek that fails for want of an index leaves the demuxer usable.
    fn seek(
        &mut self,
        start_pos: u32,
        start_time: i64,
        playing: bool,
        sink: &mut dyn StreamSink,
    ) -> Result<()>;

    /// Gets the current status.
    fn status(&self) -> DemuxStatus;

    /// Gets the stream duration in milliseconds.
    fn stream_length(&self) -> u64;

    /// Gets the optional capabilities of the demuxer for this stream.
    fn capabilities(&self) -> Capabilities;

    /// Gets the language of the audio track with the given channel number.
    fn audio_lang(&self, channel: usize) -> Option<&str>;

    /// Gets the language of the subtitle track with the given channel number.
    fn spu_lang(&self, channel: usize) -> Option<&str>;
}
