// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, warn};

use mkvdemux_core::buffer::{Buffer, BufferFlags, ExtraInfo, Special, SpuDvdSubtype};
use mkvdemux_core::errors::Result;
use mkvdemux_core::formats::FormatOptions;
use mkvdemux_core::io::BufReader;
use mkvdemux_core::sink::StreamSink;

use crate::codecs::{ns_to_ticks, tracks_discontinuities};
use crate::compression::{decompress, inflate, is_data_error, Compression};
use crate::lacing::{read_block_header, split_frames, Lacing};
use crate::tracks::Track;

/// Codec specific processing of the frames of a track before they are delivered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum ContentHandler {
    /// Frames are delivered as they are, after undoing content compression.
    #[default]
    None,
    /// UTF-8 text subtitles, prefixed with their display interval.
    Utf8Sub,
    /// SSA or ASS subtitles, reduced to their text and prefixed with their display interval.
    SsaSub,
    /// VobSub subpictures, which are usually zlib compressed even when not declared so.
    VobSub,
    /// RealVideo frames, whose chunk table is delivered separately.
    RealVideoChunks,
}

/// Timing and flags shared by a frame and the buffers it is delivered in.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct FrameInfo {
    pub pts: i64,
    pub duration: i64,
    pub flags: BufferFlags,
    pub extra: ExtraInfo,
}

/// Builds the payload of a text subtitle buffer. Start and end times are in milliseconds.
fn timed_text(text: &[u8], frame: &FrameInfo) -> Box<[u8]> {
    let start = (frame.pts / 90) as u32;
    let end = (frame.pts.saturating_add(frame.duration) / 90) as u32;

    let mut payload = Vec::with_capacity(text.len() + 9);
    payload.extend_from_slice(&start.to_le_bytes());
    payload.extend_from_slice(&end.to_le_bytes());
    payload.extend_from_slice(text);
    payload.push(0);
    payload.into_boxed_slice()
}

/// Extracts the text of an SSA or ASS dialogue line. Line breaks are converted, other escape
/// sequences and override blocks are removed.
pub(crate) fn ssa_dialogue_text(line: &[u8]) -> Vec<u8> {
    // The text follows the 8th comma.
    let mut commas = 0;
    let start = line
        .iter()
        .position(|&c| {
            if commas == 8 {
                return true;
            }
            if c == b',' {
                commas += 1;
            }
            false
        })
        .unwrap_or(line.len());

    let mut text = Vec::with_capacity(line.len() - start);
    let mut depth = 0u32;
    let mut last = 0u8;

    for &c in &line[start..] {
        if depth > 0 {
            match c {
                b'}' => depth -= 1,
                b'{' => depth += 1,
                _ => (),
            }
        }
        else if last == b'\\' && (c == b'n' || c == b'N') {
            text.push(b'\n');
        }
        else if c == b'{' {
            depth += 1;
        }
        else if c != b'\\' {
            text.push(c);
        }
        last = c;
    }

    text
}

/// Inflates a VobSub frame. A frame that is not a valid zlib stream permanently switches a track
/// with autodetected compression to uncompressed.
fn inflate_vobsub(track: &mut Track, data: &[u8], max_len: usize) -> Option<Box<[u8]>> {
    match track.compression {
        Compression::Zlib | Compression::Unknown => (),
        _ => return Some(Box::from(data)),
    }

    match inflate(data, max_len) {
        Ok(out) => {
            track.compression = Compression::Zlib;
            Some(out.into_boxed_slice())
        }
        Err(err) if is_data_error(&err) && track.compression == Compression::Unknown => {
            warn!("mkv: track {} vobsub is not compressed, falling back", track.number);
            track.compression = Compression::None;
            Some(Box::from(data))
        }
        Err(err) => {
            warn!("mkv: vobsub decompression failed for track {}: {}", track.number, err);
            None
        }
    }
}

impl ContentHandler {
    /// Converts a frame into the buffers delivered for it. Decompressed frames are limited to
    /// `max_len` bytes.
    pub(crate) fn process(
        self,
        track: &mut Track,
        data: &[u8],
        frame: &FrameInfo,
        max_len: usize,
    ) -> Vec<Buffer> {
        let stream_type = match track.stream_type {
            Some(stream_type) => stream_type,
            None => return Vec::new(),
        };

        let mut bufs = Vec::with_capacity(2);

        match self {
            ContentHandler::None => {
                let data = match decompress(
                    data,
                    track.compression,
                    &track.compression_settings,
                    max_len,
                ) {
                    Some(data) => data,
                    None => return bufs,
                };

                let mut buf = Buffer::new(
                    stream_type,
                    frame.flags | BufferFlags::FRAME_START | BufferFlags::FRAME_END,
                )
                .with_data(data);
                buf.pts = frame.pts;
                buf.duration = frame.duration;
                buf.extra = frame.extra;
                bufs.push(buf);
            }
            ContentHandler::Utf8Sub | ContentHandler::SsaSub => {
                let text = if self == ContentHandler::SsaSub {
                    timed_text(&ssa_dialogue_text(data), frame)
                }
                else {
                    timed_text(data, frame)
                };

                let mut buf = Buffer::new(stream_type, frame.flags)
                    .with_special(Special::CharsetEncoding("utf-8"))
                    .with_data(text);
                buf.extra = frame.extra;
                bufs.push(buf);
            }
            ContentHandler::VobSub => {
                let data = match inflate_vobsub(track, data, max_len) {
                    Some(data) => data,
                    None => return bufs,
                };

                let mut buf = Buffer::new(stream_type, frame.flags)
                    .with_special(Special::SpuDvd(SpuDvdSubtype::VobsubPackage))
                    .with_data(data);
                buf.pts = frame.pts;
                buf.extra = frame.extra;
                bufs.push(buf);
            }
            ContentHandler::RealVideoChunks => {
                let chunks = match data.first() {
                    Some(&chunks) => u32::from(chunks),
                    None => return bufs,
                };

                let table_len = (chunks as usize + 1) * 8;
                if data.len() < table_len + 1 {
                    warn!("mkv: realvideo chunk table exceeds frame on track {}", track.number);
                    return bufs;
                }

                let mut buf = Buffer::new(
                    stream_type,
                    frame.flags | BufferFlags::FRAME_START | BufferFlags::FRAME_END,
                )
                .with_data(Box::from(&data[table_len + 1..]));
                buf.pts = frame.pts;
                buf.duration = frame.duration;
                buf.extra = frame.extra;
                bufs.push(buf);

                let mut table = Buffer::new(stream_type, frame.flags | BufferFlags::FRAMERATE)
                    .with_special(Special::RvChunkTable {
                        chunks,
                        table: Box::from(&data[1..table_len + 1]),
                    });
                table.info.frame_duration = Some(frame.duration);
                bufs.push(table);
            }
        }

        bufs
    }
}

/// Playback state the block decoder reads and updates.
#[derive(Clone, Debug)]
pub(crate) struct BlockState {
    pub timecode_scale: u64,
    /// After a seek, blocks are dropped until a keyframe of `skip_for_track` at or after this
    /// pts is found. Zero when not skipping.
    pub skip_to_timecode: i64,
    pub skip_for_track: u64,
    /// Set to signal a discontinuity at the next timestamp.
    pub send_newpts: bool,
    /// Set to mark the next discontinuity as caused by a seek.
    pub buf_flag_seek: bool,
    pub preview_mode: bool,
    pub preview_sent: usize,
    pub max_lace_frames: usize,
    pub max_frame_len: usize,
    pub wrap_threshold: i64,
}

impl BlockState {
    pub(crate) fn new(max_lace_frames: usize, wrap_threshold: i64) -> Self {
        BlockState {
            timecode_scale: 1_000_000,
            skip_to_timecode: 0,
            skip_for_track: 0,
            send_newpts: false,
            buf_flag_seek: false,
            preview_mode: false,
            preview_sent: 0,
            max_lace_frames,
            max_frame_len: FormatOptions::default().max_frame_len,
            wrap_threshold,
        }
    }

    /// Converts a timestamp in timestamp scale units to 90 kHz clock ticks.
    pub(crate) fn ticks(&self, timecode: i64) -> i64 {
        let scale = i64::try_from(self.timecode_scale).unwrap_or(i64::MAX);
        timecode.saturating_mul(scale).saturating_mul(90) / 1_000_000
    }

    /// Signals a discontinuity to the sink if `pts` jumps away from the last timestamp of the
    /// track, or if one was requested.
    fn check_newpts(
        &mut self,
        tracks: &mut [Track],
        idx: usize,
        pts: i64,
        sink: &mut dyn StreamSink,
    ) {
        if !tracks_discontinuities(tracks[idx].kind) {
            return;
        }

        let last_pts = tracks[idx].last_pts;
        let jump = pts.wrapping_sub(last_pts).unsigned_abs();

        if pts != 0
            && (self.send_newpts || (last_pts != 0 && jump > self.wrap_threshold.unsigned_abs()))
        {
            debug!("mkv: new pts {} on track {}", pts, tracks[idx].number);
            sink.new_pts(pts, self.buf_flag_seek);
            self.send_newpts = false;
            self.buf_flag_seek = false;

            for track in tracks.iter_mut() {
                track.last_pts = 0;
            }
        }

        if pts != 0 {
            tracks[idx].last_pts = pts;
        }
    }
}

/// A Block or SimpleBlock as read from a Cluster.
pub(crate) struct RawBlock<'a> {
    pub data: &'a [u8],
    pub cluster_timecode: u64,
    /// Duration in timestamp scale units, or 0 to use the track default.
    pub duration: u64,
    pub is_key: bool,
    /// Position of the block in the stream, scaled to 0..65535.
    pub normpos: u32,
}

/// Decodes a block and delivers its frames to `sink`.
pub(crate) fn decode_block(
    state: &mut BlockState,
    tracks: &mut [Track],
    block: &RawBlock<'_>,
    sink: &mut dyn StreamSink,
) -> Result<()> {
    let mut reader = BufReader::new(block.data);
    let header = read_block_header(&mut reader)?;

    let idx = match tracks.iter().position(|track| track.number == header.track) {
        Some(idx) => idx,
        None => {
            warn!("mkv: invalid track id: {}", header.track);
            return Ok(());
        }
    };

    let timecode = i64::try_from(block.cluster_timecode)
        .unwrap_or(i64::MAX)
        .saturating_add(i64::from(header.timecode));
    let pts = state.ticks(timecode);

    if state.skip_to_timecode > 0 {
        if state.skip_for_track != header.track || !block.is_key || pts < state.skip_to_timecode {
            return Ok(());
        }
        state.skip_to_timecode = 0;
    }

    let duration = if block.duration != 0 {
        state.ticks(i64::try_from(block.duration).unwrap_or(i64::MAX))
    }
    else {
        ns_to_ticks(tracks[idx].default_duration)
    };

    state.check_newpts(tracks, idx, pts, sink);

    let mut flags = BufferFlags::empty();
    if state.preview_mode {
        state.preview_sent += 1;
        flags |= BufferFlags::PREVIEW;
    }

    let frames = split_frames(reader, header.lacing, state.max_lace_frames)?;

    let track = &mut tracks[idx];
    let category = match track.category {
        Some(category) if track.stream_type.is_some() => category,
        _ => return Ok(()),
    };

    let extra = ExtraInfo { input_normpos: block.normpos, input_time: pts / 90 };
    let mut frame = FrameInfo { pts, duration, flags, extra };

    // Laced frames share the duration of the block, so none is given for individual frames.
    if header.lacing != Lacing::None {
        frame.duration = 0;
    }

    let handler = track.handler;

    for data in frames {
        // Generic frames have the stripped header restored along with the rest of the content
        // encoding.
        let bufs = if handler != ContentHandler::None
            && track.compression == Compression::HeaderStripping
        {
            let data = [&track.compression_settings[..], data].concat();
            handler.process(track, &data, &frame, state.max_frame_len)
        }
        else {
            handler.process(track, data, &frame, state.max_frame_len)
        };

        for buf in bufs {
            sink.put(category, buf);
        }

        // Only the first frame of a laced block carries a timestamp.
        frame.pts = 0;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use mkvdemux_core::buffer::StreamType;
    use mkvdemux_core::errors::Error;
    use mkvdemux_core::sink::{ControlEvent, MemorySink, StreamCategory};

    use super::*;
    use crate::compression::tests::deflate;
    use crate::tracks::TrackKind;

    const MAX_LEN: usize = 1 << 20;

    fn track(
        number: u64,
        kind: TrackKind,
        stream_type: StreamType,
        handler: ContentHandler,
    ) -> Track {
        Track {
            number,
            kind,
            stream_type: Some(stream_type),
            category: Some(StreamCategory::Video),
            handler,
            ..Default::default()
        }
    }

    fn raw(data: &[u8], cluster_timecode: u64, is_key: bool) -> RawBlock<'_> {
        RawBlock { data, cluster_timecode, duration: 0, is_key, normpos: 0 }
    }

    #[test]
    fn verify_ssa_dialogue_text() {
        let line = b"0,0,Default,,0,0,0,,{\\i1}Hello\\Nworld{\\i0}!";
        assert_eq!(ssa_dialogue_text(line), b"Hello\nworld!");

        // Nested override blocks and unknown escapes.
        let line = b"1,0,Default,,0,0,0,,a{b{c}d}e\\hf";
        assert_eq!(ssa_dialogue_text(line), b"aehf");

        // Fewer than 8 commas leave no text.
        assert_eq!(ssa_dialogue_text(b"0,0,Default"), b"");
    }

    #[test]
    fn verify_utf8_subtitle() {
        let mut sub = track(1, TrackKind::Subtitle, StreamType::SPU_OGM, ContentHandler::Utf8Sub);
        let frame = FrameInfo { pts: 90_000, duration: 180_000, ..Default::default() };

        let bufs = ContentHandler::Utf8Sub.process(&mut sub, b"Hi", &frame, MAX_LEN);
        assert_eq!(bufs.len(), 1);

        let buf = &bufs[0];
        assert_eq!(&buf.data[0..4], &1000u32.to_le_bytes());
        assert_eq!(&buf.data[4..8], &3000u32.to_le_bytes());
        assert_eq!(&buf.data[8..], b"Hi\0");
        assert_eq!(buf.pts, 0);
        assert_eq!(buf.info.special, Some(Special::CharsetEncoding("utf-8")));
    }

    #[test]
    fn verify_vobsub_autodetect() {
        let mut sub = track(1, TrackKind::Subtitle, StreamType::SPU_DVD, ContentHandler::VobSub);
        sub.compression = Compression::Unknown;

        let frame = FrameInfo { pts: 900, ..Default::default() };

        let bufs = ContentHandler::VobSub.process(&mut sub, &deflate(b"spu"), &frame, MAX_LEN);
        assert_eq!(&bufs[0].data[..], b"spu");
        assert_eq!(bufs[0].pts, 900);
        assert_eq!(sub.compression, Compression::Zlib);

        // Once confirmed, corrupt frames are dropped.
        let corrupt = [0x78, 0x9c, 0xff, 0xff, 0xff, 0xff];
        assert!(ContentHandler::VobSub.process(&mut sub, &corrupt, &frame, MAX_LEN).is_empty());

        // Undeclared compression falls back to raw frames for good.
        sub.compression = Compression::Unknown;
        let bufs = ContentHandler::VobSub.process(&mut sub, &corrupt, &frame, MAX_LEN);
        assert_eq!(&bufs[0].data[..], &corrupt);
        assert_eq!(sub.compression, Compression::None);
    }

    #[test]
    fn verify_realvideo_chunks() {
        let mut rv = track(1, TrackKind::Video, StreamType::VIDEO_RV40, ContentHandler::RealVideoChunks);
        let frame = FrameInfo { pts: 3600, duration: 3600, ..Default::default() };

        let mut data = vec![1];
        data.extend_from_slice(&[0xaa; 16]);
        data.extend_from_slice(b"frame");

        let bufs = ContentHandler::RealVideoChunks.process(&mut rv, &data, &frame, MAX_LEN);
        assert_eq!(bufs.len(), 2);
        assert_eq!(&bufs[0].data[..], b"frame");
        assert_eq!(bufs[0].pts, 3600);
        assert!(bufs[1].flags.contains(BufferFlags::SPECIAL | BufferFlags::FRAMERATE));
        assert_eq!(
            bufs[1].info.special,
            Some(Special::RvChunkTable { chunks: 1, table: Box::from(&[0xaa; 16][..]) })
        );

        // A chunk table longer than the frame.
        let bufs = ContentHandler::RealVideoChunks.process(&mut rv, &data[..16], &frame, MAX_LEN);
        assert!(bufs.is_empty());
    }

    #[test]
    fn verify_laced_block() {
        let mut tracks = [track(1, TrackKind::Audio, StreamType::AUDIO_A52, ContentHandler::None)];
        let mut state = BlockState::new(32, 90000);
        let mut sink = MemorySink::new();

        // Track 1, +10, xiph lacing, 3 frames of 2, 3 and 1 bytes.
        let block = [0x81, 0x00, 0x0a, 0x02, 0x02, 0x02, 0x03, 1, 1, 2, 2, 2, 3];
        decode_block(&mut state, &mut tracks, &raw(&block, 90, true), &mut sink).unwrap();

        let bufs = sink.take_buffers();
        let lens: Vec<usize> = bufs.iter().map(|(_, buf)| buf.data.len()).collect();
        let pts: Vec<i64> = bufs.iter().map(|(_, buf)| buf.pts).collect();
        assert_eq!(lens, vec![2, 3, 1]);
        assert_eq!(pts, vec![9000, 0, 0]);
        assert!(bufs.iter().all(|(_, buf)| buf.duration == 0));
        assert_eq!(bufs[0].1.extra.input_time, 100);
    }

    #[test]
    fn verify_header_stripping() {
        let mut tracks = [track(1, TrackKind::Audio, StreamType::AUDIO_A52, ContentHandler::None)];
        tracks[0].compression = Compression::HeaderStripping;
        tracks[0].compression_settings = Box::from(&[0x0b, 0x77][..]);

        let mut state = BlockState::new(32, 90000);
        let mut sink = MemorySink::new();

        // Fixed size lacing, 2 frames.
        let block = [0x81, 0x00, 0x00, 0x04, 0x01, 1, 2];
        decode_block(&mut state, &mut tracks, &raw(&block, 0, true), &mut sink).unwrap();

        let bufs = sink.take_buffers();
        assert_eq!(&bufs[0].1.data[..], &[0x0b, 0x77, 1]);
        assert_eq!(&bufs[1].1.data[..], &[0x0b, 0x77, 2]);
    }

    #[test]
    fn verify_skip_to_keyframe() {
        let mut tracks = [
            track(1, TrackKind::Video, StreamType::VIDEO_MPEG, ContentHandler::None),
            track(2, TrackKind::Audio, StreamType::AUDIO_A52, ContentHandler::None),
        ];
        let mut state = BlockState::new(32, 90000);
        state.skip_to_timecode = 90_000;
        state.skip_for_track = 1;
        let mut sink = MemorySink::new();

        // Other tracks, non-keyframes, and early keyframes are dropped.
        decode_block(&mut state, &mut tracks, &raw(&[0x82, 0, 0, 0, 1], 2000, true), &mut sink)
            .unwrap();
        decode_block(&mut state, &mut tracks, &raw(&[0x81, 0, 0, 0, 1], 2000, false), &mut sink)
            .unwrap();
        decode_block(&mut state, &mut tracks, &raw(&[0x81, 0, 0, 0, 1], 500, true), &mut sink)
            .unwrap();
        assert!(sink.buffers.is_empty());

        decode_block(&mut state, &mut tracks, &raw(&[0x81, 0, 0, 0, 1], 1000, true), &mut sink)
            .unwrap();
        assert_eq!(state.skip_to_timecode, 0);

        decode_block(&mut state, &mut tracks, &raw(&[0x82, 0, 0, 0, 1], 1000, false), &mut sink)
            .unwrap();
        assert_eq!(sink.buffers.len(), 2);
    }

    #[test]
    fn verify_discontinuities() {
        let mut tracks = [
            track(1, TrackKind::Video, StreamType::VIDEO_MPEG, ContentHandler::None),
            track(2, TrackKind::Audio, StreamType::AUDIO_A52, ContentHandler::None),
        ];
        let mut state = BlockState::new(32, 90000);
        let mut sink = MemorySink::new();

        let video = [0x81, 0, 0, 0, 1];
        decode_block(&mut state, &mut tracks, &raw(&video, 1000, true), &mut sink).unwrap();
        decode_block(&mut state, &mut tracks, &raw(&video, 1500, true), &mut sink).unwrap();
        assert!(sink.events.is_empty());
        assert_eq!(tracks[0].last_pts, 135_000);

        // A jump of more than one second.
        decode_block(&mut state, &mut tracks, &raw(&video, 5000, true), &mut sink).unwrap();
        assert_eq!(sink.events, vec![ControlEvent::NewPts { pts: 450_000, seek: false }]);

        // A requested discontinuity is signalled at the next non-zero pts, on any track.
        state.send_newpts = true;
        state.buf_flag_seek = true;
        decode_block(&mut state, &mut tracks, &raw(&[0x82, 0, 0, 0, 1], 0, true), &mut sink)
            .unwrap();
        decode_block(&mut state, &mut tracks, &raw(&[0x82, 0, 0, 0, 1], 10, true), &mut sink)
            .unwrap();
        assert_eq!(sink.events[1], ControlEvent::NewPts { pts: 900, seek: true });
        assert!(!state.send_newpts);
        assert_eq!(tracks[0].last_pts, 0);
        assert_eq!(tracks[1].last_pts, 900);
    }

    #[test]
    fn verify_block_durations() {
        let mut tracks = [track(1, TrackKind::Video, StreamType::VIDEO_MPEG, ContentHandler::None)];
        tracks[0].default_duration = 40_000_000;
        let mut state = BlockState::new(32, 90000);
        state.preview_mode = true;
        let mut sink = MemorySink::new();

        let data = [0x81, 0, 0, 0, 1];
        decode_block(&mut state, &mut tracks, &raw(&data, 0, true), &mut sink).unwrap();
        let block = RawBlock { duration: 20, ..raw(&data, 0, true) };
        decode_block(&mut state, &mut tracks, &block, &mut sink).unwrap();

        assert_eq!(sink.buffers[0].1.duration, 3600);
        assert_eq!(sink.buffers[1].1.duration, 1800);
        assert!(sink.buffers[0].1.flags.contains(BufferFlags::PREVIEW));
        assert_eq!(state.preview_sent, 2);
    }

    #[test]
    fn verify_malformed_blocks() {
        let mut tracks = [track(1, TrackKind::Audio, StreamType::AUDIO_A52, ContentHandler::None)];
        let mut state = BlockState::new(2, 90000);
        let mut sink = MemorySink::new();

        // Unknown tracks are dropped.
        decode_block(&mut state, &mut tracks, &raw(&[0x85, 0, 0, 0, 1], 0, true), &mut sink)
            .unwrap();

        // Too many laced frames.
        let block = [0x81, 0, 0, 0x04, 0x02, 1, 2, 3];
        assert!(matches!(
            decode_block(&mut state, &mut tracks, &raw(&block, 0, true), &mut sink),
            Err(Error::LimitError(_))
        ));

        // EBML lace sizes going negative.
        let block = [0x81, 0, 0, 0x06, 0x02, 0x81, 0xbd, 0, 0];
        let mut state = BlockState::new(32, 90000);
        assert!(matches!(
            decode_block(&mut state, &mut tracks, &raw(&block, 0, true), &mut sink),
            Err(Error::DecodeError(_))
        ));

        assert!(sink.buffers.is_empty());
    }

    #[test]
    fn verify_extreme_timestamps() {
        let mut tracks = [track(1, TrackKind::Video, StreamType::VIDEO_MPEG, ContentHandler::None)];
        let mut state = BlockState::new(32, 90000);
        let mut sink = MemorySink::new();

        // The most negative block offset against the largest cluster timestamp.
        let block = [0x81, 0x80, 0x00, 0, 1];
        decode_block(&mut state, &mut tracks, &raw(&block, u64::MAX, true), &mut sink).unwrap();
        assert_eq!(sink.buffers[0].1.pts, i64::MAX / 1_000_000);

        decode_block(&mut state, &mut tracks, &raw(&block, 1, true), &mut sink).unwrap();
        assert_eq!(sink.buffers[1].1.pts, -2_949_030);
        assert_eq!(sink.events, vec![ControlEvent::NewPts { pts: -2_949_030, seek: false }]);

        // A jump spanning the whole timestamp range.
        tracks[0].last_pts = i64::MAX;
        state.check_newpts(&mut tracks, 0, -1, &mut sink);
        assert_eq!(sink.events[1], ControlEvent::NewPts { pts: -1, seek: false });

        let mut sub = track(2, TrackKind::Subtitle, StreamType::SPU_OGM, ContentHandler::Utf8Sub);
        let frame = FrameInfo { pts: i64::MAX, duration: i64::MAX, ..Default::default() };
        assert_eq!(ContentHandler::Utf8Sub.process(&mut sub, b"Hi", &frame, MAX_LEN).len(), 1);
    }

    #[test]
    fn verify_oversized_frames_dropped() {
        let packed = deflate(&[0; 4096]);
        let frame = FrameInfo::default();

        let mut sub = track(1, TrackKind::Subtitle, StreamType::SPU_DVD, ContentHandler::VobSub);
        sub.compression = Compression::Unknown;
        assert!(ContentHandler::VobSub.process(&mut sub, &packed, &frame, 1000).is_empty());
        // Frames too large are not mistaken for uncompressed ones.
        assert_eq!(sub.compression, Compression::Unknown);

        let mut audio = track(2, TrackKind::Audio, StreamType::AUDIO_A52, ContentHandler::None);
        audio.compression = Compression::Zlib;
        assert!(ContentHandler::None.process(&mut audio, &packed, &frame, 1000).is_empty());
        assert_eq!(ContentHandler::None.process(&mut audio, &packed, &frame, 4096).len(), 1);
    }
}
