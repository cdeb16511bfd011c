// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, trace, warn};

use mkvdemux_core::errors::{decode_error, seek_error, unsupported_error};
use mkvdemux_core::errors::{Error, Result, SeekErrorKind};
use mkvdemux_core::formats::{DemuxStatus, Demuxer, FormatOptions};
use mkvdemux_core::io::SourceStream;
use mkvdemux_core::sink::{Capabilities, StreamInfo, StreamSink};

use crate::block::{decode_block, BlockState, RawBlock};
use crate::chapters::{chapter_lookup, Edition};
use crate::cues::CueIndexes;
use crate::ebml::{EbmlParser, ElementHeader};
use crate::element_ids::ElementType;
use crate::segment::{Segment, SegmentInfo};
use crate::tracks::{Track, TrackKind};

/// A chapter navigation request from the user interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NavigationEvent {
    NextChapter,
    PreviousChapter,
}

/// The properties of a block read from a Cluster, its payload is in the block scratch buffer.
struct BlockMeta {
    duration: u64,
    is_key: bool,
    normpos: u32,
}

/// Matroska and WebM demultiplexer.
///
/// `MkvDemuxer` implements a demuxer for the Matroska container format and its WebM subset.
/// The stream must be seekable.
pub struct MkvDemuxer {
    ebml: EbmlParser,
    segment: Segment,
    state: BlockState,
    status: DemuxStatus,
    preview_buffers: usize,
    /// Payload of the block being decoded, reused between blocks.
    block_data: Vec<u8>,
    /// Timestamp of the last Cluster, in timestamp scale units.
    last_timecode: u64,
    /// The stream title chapter names are appended to.
    title: Option<String>,
    events_tx: Sender<NavigationEvent>,
    events_rx: Receiver<NavigationEvent>,
}

impl MkvDemuxer {
    /// Opens a Matroska stream. The EBML header and the start of the Segment are read, the rest
    /// of the headers are parsed by [`Demuxer::send_headers`].
    pub fn try_new(source: SourceStream, options: &FormatOptions) -> Result<Self> {
        if !source.is_seekable() {
            return unsupported_error("mkv: stream is not seekable");
        }

        let mut ebml = EbmlParser::new(source, options.max_depth, options.max_string_len);
        ebml.check_header()?;

        // The EBML header is a sibling of the Segment.
        ebml.set_level(0);

        let header = ebml.read_element_header()?;
        if header.etype != ElementType::Segment {
            return decode_error("mkv: missing segment element");
        }

        debug!("mkv: segment at {}, len {:?}", header.start, header.len);

        let (events_tx, events_rx) = mpsc::channel();

        Ok(MkvDemuxer {
            ebml,
            segment: Segment::new(header, options.max_streams),
            state: BlockState {
                max_frame_len: options.max_frame_len,
                ..BlockState::new(options.max_lace_frames, options.wrap_threshold)
            },
            status: DemuxStatus::Finished,
            preview_buffers: options.preview_buffers,
            block_data: Vec::new(),
            last_timecode: 0,
            title: None,
            events_tx,
            events_rx,
        })
    }

    /// Gets a sender for chapter navigation requests. Requests are handled at the start of the
    /// next Cluster.
    pub fn event_sender(&self) -> Sender<NavigationEvent> {
        self.events_tx.clone()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.segment.tracks.tracks
    }

    pub fn editions(&self) -> &[Edition] {
        &self.segment.editions
    }

    pub fn info(&self) -> &SegmentInfo {
        &self.segment.info
    }

    pub fn cues(&self) -> &CueIndexes {
        &self.segment.cues
    }

    /// Positions the parser at the first child of the Segment.
    fn rewind(&mut self) -> Result<()> {
        self.ebml.set_level(0);
        self.ebml.enter_master(&self.segment.header)?;
        self.ebml.seek(self.segment.header.start)
    }

    /// Reads one top-level element during playback. Everything but Clusters is skipped.
    /// Returns the level of the next element.
    fn read_top_level(&mut self, sink: &mut dyn StreamSink) -> Result<usize> {
        let header = self.ebml.read_element_header()?;

        match header.etype {
            ElementType::Cluster => {
                self.ebml.enter_master(&header)?;
                self.read_cluster(&header, sink)
            }
            _ => {
                trace!("mkv: skipping top-level element {:#x}", header.id);
                self.ebml.skip(&header)?;
                Ok(self.ebml.next_sibling_level(&header))
            }
        }
    }

    /// Reads the children of a Cluster that was just entered, decoding its blocks. Returns the
    /// level of the next element.
    fn read_cluster(&mut self, header: &ElementHeader, sink: &mut dyn StreamSink) -> Result<usize> {
        self.segment.cues.rescale(self.segment.info.timecode_scale);

        if self.handle_events(sink) {
            // The stream was repositioned by a chapter seek.
            return Ok(self.ebml.level());
        }

        let level = self.ebml.level();
        let mut next_level =
            if header.is_empty() { self.ebml.next_sibling_level(header) } else { level };

        let mut timecode = 0;
        let mut cluster_duration = 0;

        while next_level == level {
            let child = self.ebml.read_element_header()?;

            // A Cluster of unknown size ends where the next top-level element starts.
            if header.len.is_none() && child.etype.is_top_level() {
                self.ebml.seek(child.pos)?;
                self.ebml.set_level(level - 1);
                next_level = level - 1;
                break;
            }

            let block = match child.etype {
                ElementType::Timestamp => {
                    timecode = self.ebml.read_uint(&child)?;
                    None
                }
                ElementType::ClusterDuration => {
                    cluster_duration = self.ebml.read_uint(&child)?;
                    None
                }
                ElementType::SimpleBlock => {
                    let normpos = self.normpos(&child);
                    self.read_block_data(&child)?;
                    Some(Ok(BlockMeta { duration: cluster_duration, is_key: true, normpos }))
                }
                ElementType::BlockGroup => Some(
                    self.read_block_group(&child)?
                        .ok_or(Error::DecodeError("mkv: block group without a block")),
                ),
                _ => {
                    trace!("mkv: skipping element {:#x} in cluster", child.id);
                    self.ebml.skip(&child)?;
                    None
                }
            };

            let res = match block {
                Some(Ok(meta)) => {
                    let block = RawBlock {
                        data: &self.block_data,
                        cluster_timecode: timecode,
                        duration: meta.duration,
                        is_key: meta.is_key,
                        normpos: meta.normpos,
                    };
                    decode_block(&mut self.state, &mut self.segment.tracks.tracks, &block, sink)
                }
                Some(Err(err)) => Err(err),
                None => Ok(()),
            };

            match res {
                Err(Error::IoError(err)) => return Err(Error::IoError(err)),
                Err(err) => {
                    warn!("mkv: dropping cluster at {} after bad block: {}", header.pos, err);

                    // The block was read completely, so a Cluster of unknown size can carry on
                    // with the next block.
                    if header.len.is_some() {
                        self.ebml.seek(header.end())?;
                        self.ebml.set_level(level - 1);
                        next_level = level - 1;
                        break;
                    }
                }
                Ok(()) => (),
            }

            next_level = self.ebml.next_sibling_level(&child);
        }

        self.last_timecode = timecode;
        self.update_chapter_title(sink);

        Ok(next_level)
    }

    /// Reads a BlockGroup. Returns `None` if the group has no Block.
    fn read_block_group(&mut self, header: &ElementHeader) -> Result<Option<BlockMeta>> {
        let mut meta = BlockMeta { duration: 0, is_key: true, normpos: 0 };
        let mut has_block = false;

        self.ebml.enter_master(header)?;

        let level = self.ebml.level();
        let mut next_level =
            if header.is_empty() { self.ebml.next_sibling_level(header) } else { level };

        while next_level == level {
            let child = self.ebml.read_element_header()?;

            match child.etype {
                ElementType::Block => {
                    meta.normpos = self.normpos(&child);
                    self.read_block_data(&child)?;
                    has_block = true;
                }
                ElementType::BlockDuration => meta.duration = self.ebml.read_uint(&child)?,
                ElementType::ReferenceBlock => {
                    // Referencing another frame makes this one a delta frame.
                    meta.is_key = false;
                    self.ebml.skip(&child)?;
                }
                _ => {
                    trace!("mkv: skipping element {:#x} in block group", child.id);
                    self.ebml.skip(&child)?;
                }
            }

            next_level = self.ebml.next_sibling_level(&child);
        }

        Ok(if has_block { Some(meta) } else { None })
    }

    /// Reads the payload of a Block or SimpleBlock into the block scratch buffer.
    fn read_block_data(&mut self, header: &ElementHeader) -> Result<()> {
        let len = match header.len {
            Some(len) => {
                usize::try_from(len).map_err(|_| Error::LimitError("mkv: block too large"))?
            }
            None => return decode_error("mkv: block of unknown size"),
        };

        self.block_data.clear();
        self.block_data.resize(len, 0);
        self.ebml.read_exact(&mut self.block_data)
    }

    /// The position of an element's data in the stream, scaled to `0..=65535`.
    fn normpos(&self, header: &ElementHeader) -> u32 {
        match self.ebml.byte_len() {
            0 => 0,
            len => (header.start as f64 * 65535.0 / len as f64) as u32,
        }
    }

    /// Handles pending navigation requests. Returns `true` if the stream was repositioned.
    fn handle_events(&mut self, sink: &mut dyn StreamSink) -> bool {
        let mut seeked = false;

        while let Ok(event) = self.events_rx.try_recv() {
            let scale = self.segment.info.timecode_scale;

            let idx = match chapter_lookup(&self.segment.editions, self.last_timecode, scale) {
                Some(idx) => idx,
                None => continue,
            };

            let chapters = &self.segment.editions[0].chapters;

            let target = match event {
                NavigationEvent::NextChapter if idx + 1 < chapters.len() => &chapters[idx + 1],
                NavigationEvent::PreviousChapter if idx > 0 => &chapters[idx - 1],
                _ => continue,
            };

            let start_time = (target.time_start / 90) as i64;
            info!("mkv: chapter navigation to '{}' at {} ms", target.title, start_time);

            match self.seek(0, start_time, true, sink) {
                Ok(()) => seeked = true,
                Err(err) => warn!("mkv: chapter seek failed: {}", err),
            }
        }

        seeked
    }

    /// Shows the chapter playing at the last Cluster in the stream title.
    fn update_chapter_title(&mut self, sink: &mut dyn StreamSink) {
        let edition = match self.segment.editions.first() {
            Some(edition) if !edition.chapters.is_empty() => edition,
            _ => return,
        };

        let title = self.title.get_or_insert_with(|| match &self.segment.info.title {
            Some(title) => title.clone(),
            None => sink.title().unwrap_or("(No title)").to_string(),
        });

        match edition.chapter_at(self.last_timecode, self.segment.info.timecode_scale) {
            Some(idx) => {
                let chapter = &edition.chapters[idx];
                sink.set_title(&format!("{} / ({}) {}", title, idx + 1, chapter.title));
            }
            None => sink.set_title(title),
        }
    }

    fn has_chapters(&self) -> bool {
        self.segment.editions.first().map_or(false, |edition| !edition.chapters.is_empty())
    }
}

impl Demuxer for MkvDemuxer {
    fn send_headers(&mut self, sink: &mut dyn StreamSink) -> Result<()> {
        if let Err(err) = self.rewind().and_then(|_| self.segment.read_headers(&mut self.ebml)) {
            self.status = DemuxStatus::Finished;
            return Err(err);
        }

        self.status = DemuxStatus::Ok;
        self.state.timecode_scale = self.segment.info.timecode_scale;

        // Leave room for a stripped header ahead of any block payload.
        self.block_data.reserve(self.segment.tracks.max_settings_len);

        for (category, buf) in self.segment.tracks.init_packets.drain(..) {
            sink.put(category, buf);
        }

        let mut stream_info = StreamInfo::empty();
        for track in self.segment.tracks.tracks.iter().filter(|track| track.is_routed()) {
            match track.kind {
                TrackKind::Video => stream_info |= StreamInfo::HAS_VIDEO,
                TrackKind::Audio => stream_info |= StreamInfo::HAS_AUDIO,
                _ => (),
            }
        }
        sink.set_stream_info(stream_info);

        if let Some(title) = &self.segment.info.title {
            sink.set_title(title);
        }

        // Prime the decoders with the first few frames of the stream.
        if let Err(err) = self.rewind() {
            self.status = DemuxStatus::Finished;
            return Err(err);
        }

        self.state.preview_mode = true;
        self.state.preview_sent = 0;

        let mut next_level = 1;
        while self.state.preview_sent < self.preview_buffers && next_level == 1 {
            match self.read_top_level(sink) {
                Ok(level) => next_level = level,
                Err(err) => {
                    debug!("mkv: preview ended early: {}", err);
                    break;
                }
            }
        }

        self.state.preview_mode = false;
        debug!("mkv: sent {} preview frames", self.state.preview_sent);

        if let Err(err) = self.rewind() {
            self.status = DemuxStatus::Finished;
            return Err(err);
        }

        Ok(())
    }

    fn send_chunk(&mut self, sink: &mut dyn StreamSink) -> Result<DemuxStatus> {
        if self.status == DemuxStatus::Ok {
            if let Err(err) = self.read_top_level(sink) {
                match err {
                    Error::IoError(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                        debug!("mkv: end of stream")
                    }
                    _ => warn!("mkv: stream finished: {}", err),
                }
                self.status = DemuxStatus::Finished;
            }
        }

        Ok(self.status)
    }

    fn seek(
        &mut self,
        start_pos: u32,
        start_time: i64,
        _playing: bool,
        sink: &mut dyn StreamSink,
    ) -> Result<()> {
        let start_pos = (f64::from(start_pos) / 65535.0 * self.ebml.byte_len() as f64) as u64;

        self.status = DemuxStatus::Ok;

        for track in self.segment.tracks.tracks.iter_mut() {
            track.last_pts = 0;
        }
        self.state.send_newpts = true;
        self.state.buf_flag_seek = true;

        // Seek points are in milliseconds from here on.
        self.segment.cues.rescale(self.segment.info.timecode_scale);

        let tracks = &self.segment.tracks;
        let find_index = |video_only: bool| {
            self.segment.cues.iter().filter(|index| !index.is_empty()).find(|index| {
                match tracks.find(index.track_num) {
                    Some(idx) => !video_only || tracks.tracks[idx].kind == TrackKind::Video,
                    None => false,
                }
            })
        };

        let index = match find_index(true).or_else(|| find_index(false)) {
            Some(index) => index,
            None => {
                info!("mkv: no index to seek with");
                return seek_error(SeekErrorKind::NoIndex);
            }
        };

        let entry = match index.binary_seek(start_pos, start_time.max(0) as u64) {
            Some(entry) => entry,
            None => return seek_error(SeekErrorKind::NoIndex),
        };

        let pos = index.pos[entry];
        let timecode = index.timecode[entry];
        let track_num = index.track_num;

        info!("mkv: seeking to cluster at {} ({} ms) of track {}", pos, timecode, track_num);

        if let Err(err) = self.ebml.seek(pos) {
            self.status = DemuxStatus::Finished;
            return Err(err);
        }

        self.ebml.set_level(1);

        // Resume at the keyframe of the seek point, in 90 kHz ticks like the block timestamps.
        let timecode = i64::try_from(timecode).unwrap_or(i64::MAX);
        self.state.skip_to_timecode = timecode.saturating_mul(90);
        self.state.skip_for_track = track_num;

        sink.flush();

        Ok(())
    }

    fn status(&self) -> DemuxStatus {
        self.status
    }

    fn stream_length(&self) -> u64 {
        self.segment.info.duration
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::SPU_LANG | Capabilities::AUDIO_LANG;
        if self.has_chapters() {
            caps |= Capabilities::CHAPTERS;
        }
        caps
    }

    fn audio_lang(&self, channel: usize) -> Option<&str> {
        self.segment.tracks.language(channel, |st| st.is_audio())
    }

    fn spu_lang(&self, channel: usize) -> Option<&str> {
        self.segment.tracks.language(channel, |st| st.is_spu())
    }
}
