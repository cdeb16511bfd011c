// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `sink` module defines the consumers of a demuxer's output.
//!
//! A demuxer hands every [`Buffer`] it produces to a [`FrameSink`], and reports stream-level
//! events (title changes, discontinuities, flushes) to a [`ControlSink`]. Most consumers
//! implement both, which is expressed by the [`StreamSink`] trait.

use bitflags::bitflags;

use crate::buffer::Buffer;

/// The destination queue of a buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StreamCategory {
    /// The video queue. Subtitles are delivered here as well.
    Video,
    /// The audio queue.
    Audio,
}

bitflags! {
    /// Stream-level information published once the headers have been parsed.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct StreamInfo: u32 {
        const HAS_VIDEO = 1 << 0;
        const HAS_AUDIO = 1 << 1;
    }
}

bitflags! {
    /// Optional demuxer capabilities.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        /// Subtitle track languages can be queried.
        const SPU_LANG   = 1 << 0;
        /// Audio track languages can be queried.
        const AUDIO_LANG = 1 << 1;
        /// The stream has chapters that can be navigated.
        const CHAPTERS   = 1 << 2;
    }
}

/// A `FrameSink` receives demuxed buffers.
pub trait FrameSink {
    /// Delivers a buffer to the queue of the given category.
    fn put(&mut self, category: StreamCategory, buf: Buffer);
}

/// A `ControlSink` receives stream-level events from a demuxer.
pub trait ControlSink {
    /// Sets the displayed title of the stream.
    fn set_title(&mut self, title: &str);

    /// Gets the currently displayed title of the stream, if any.
    fn title(&self) -> Option<&str>;

    /// Publishes stream-level information.
    fn set_stream_info(&mut self, info: StreamInfo);

    /// Signals a timestamp discontinuity. `seek` is `true` if the discontinuity was caused by
    /// a seek.
    fn new_pts(&mut self, pts: i64, seek: bool);

    /// Discards all buffers queued downstream.
    fn flush(&mut self);
}

/// A `StreamSink` is the full set of collaborators a demuxer writes to.
pub trait StreamSink: FrameSink + ControlSink {}

impl<T: FrameSink + ControlSink> StreamSink for T {}

/// A control event recorded by [`MemorySink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    Title(String),
    StreamInfo(StreamInfo),
    NewPts { pts: i64, seek: bool },
    Flush,
}

/// A `MemorySink` records everything it receives, in order.
#[derive(Default)]
pub struct MemorySink {
    /// Every buffer received, with its category.
    pub buffers: Vec<(StreamCategory, Buffer)>,
    /// Every control event received.
    pub events: Vec<ControlEvent>,
    title: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Default::default()
    }

    /// Instantiate a new `MemorySink` with an initial title, e.g. the file name.
    pub fn with_title(title: &str) -> Self {
        MemorySink { title: Some(title.to_string()), ..Default::default() }
    }

    /// Removes and returns all buffers received so far.
    pub fn take_buffers(&mut self) -> Vec<(StreamCategory, Buffer)> {
        std::mem::take(&mut self.buffers)
    }
}

impl FrameSink for MemorySink {
    fn put(&mut self, category: StreamCategory, buf: Buffer) {
        self.buffers.push((category, buf));
    }
}

impl ControlSink for MemorySink {
    fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
        self.events.push(ControlEvent::Title(title.to_string()));
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn set_stream_info(&mut self, info: StreamInfo) {
        self.events.push(ControlEvent::StreamInfo(info));
    }

    fn new_pts(&mut self, pts: i64, seek: bool) {
        self.events.push(ControlEvent::NewPts { pts, seek });
    }

    fn flush(&mut self) {
        self.events.push(ControlEvent::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferFlags, StreamType};

    fn put_one<S: StreamSink>(sink: &mut S) {
        sink.put(StreamCategory::Audio, Buffer::new(StreamType::AUDIO_AAC, BufferFlags::HEADER));
        sink.new_pts(900, true);
    }

    #[test]
    fn verify_memory_sink() {
        let mut sink = MemorySink::with_title("clip.mkv");
        assert_eq!(sink.title(), Some("clip.mkv"));

        put_one(&mut sink);
        sink.set_title("Movie");

        assert_eq!(sink.title(), Some("Movie"));
        assert_eq!(sink.take_buffers().len(), 1);
        assert!(sink.buffers.is_empty());
        assert_eq!(
            sink.events,
            vec![ControlEvent::NewPts { pts: 900, seek: true }, ControlEvent::Title("Movie".into())]
        );
    }
}
