// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, info};

use mkvdemux_core::buffer::{Buffer, StreamType};
use mkvdemux_core::errors::{decode_error, limit_error, unsupported_error, Result};
use mkvdemux_core::sink::StreamCategory;

use crate::block::ContentHandler;
use crate::codecs::resolve_codec;
use crate::compression::Compression;
use crate::ebml::{EbmlParser, ElementHeader};
use crate::element_ids::ElementType;
use crate::vobsub::VobSubInfo;

/// Codec private data at or above this size is rejected.
const MAX_CODEC_PRIVATE_LEN: u64 = 0x8000_0000;

/// The type of a track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
    Complex,
    Logo,
    Subtitle,
    Control,
    #[default]
    Unknown,
}

impl TrackKind {
    fn from_type(value: u64) -> Self {
        match value {
            0x01 => TrackKind::Video,
            0x02 => TrackKind::Audio,
            0x03 => TrackKind::Complex,
            0x10 => TrackKind::Logo,
            0x11 => TrackKind::Subtitle,
            0x12 | 0x20 => TrackKind::Control,
            _ => TrackKind::Unknown,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoInfo {
    pub interlaced: bool,
    pub pixel_width: u64,
    pub pixel_height: u64,
    pub display_width: u64,
    pub display_height: u64,
}

impl VideoInfo {
    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<Self> {
        let mut video = VideoInfo::default();

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::FlagInterlaced => video.interlaced = ebml.read_uint(child)? != 0,
                ElementType::PixelWidth => video.pixel_width = ebml.read_uint(child)?,
                ElementType::PixelHeight => video.pixel_height = ebml.read_uint(child)?,
                ElementType::DisplayWidth => video.display_width = ebml.read_uint(child)?,
                ElementType::DisplayHeight => video.display_height = ebml.read_uint(child)?,
                _ => {
                    debug!("mkv: unhandled element {:#x} in video settings", child.id);
                    ebml.skip(child)?
                }
            }
            Ok(())
        })?;

        Ok(video)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioInfo {
    pub sampling_freq: u32,
    pub output_sampling_freq: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
}

impl AudioInfo {
    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<Self> {
        let mut audio = AudioInfo::default();

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::SamplingFrequency => {
                    audio.sampling_freq = ebml.read_float(child)? as u32
                }
                ElementType::OutputSamplingFrequency => {
                    audio.output_sampling_freq = ebml.read_float(child)? as u32
                }
                ElementType::Channels => audio.channels = ebml.read_uint(child)? as u32,
                ElementType::BitDepth => audio.bits_per_sample = ebml.read_uint(child)? as u32,
                _ => {
                    debug!("mkv: unhandled element {:#x} in audio settings", child.id);
                    ebml.skip(child)?
                }
            }
            Ok(())
        })?;

        Ok(audio)
    }
}

/// A track of the segment.
#[derive(Clone, Debug, Default)]
pub struct Track {
    /// The track number blocks refer to the track by.
    pub number: u64,
    pub uid: u64,
    pub kind: TrackKind,
    pub codec_id: Option<String>,
    pub codec_private: Box<[u8]>,
    pub language: Option<String>,
    pub default_flag: bool,
    /// Default frame duration in nanoseconds, or 0.
    pub default_duration: u64,
    pub video: Option<VideoInfo>,
    pub audio: Option<AudioInfo>,
    pub vobsub: Option<VobSubInfo>,
    pub compression: Compression,
    pub compression_settings: Box<[u8]>,
    /// The stream type, including the channel, buffers of this track are tagged with. `None` if
    /// the codec is unsupported.
    pub stream_type: Option<StreamType>,
    /// The queue buffers of this track are delivered to. `None` for tracks nothing is demuxed
    /// for.
    pub category: Option<StreamCategory>,
    pub(crate) handler: ContentHandler,
    pub(crate) last_pts: i64,
}

impl Track {
    /// Returns `true` if frames of this track are delivered to a sink.
    pub fn is_routed(&self) -> bool {
        self.stream_type.is_some() && self.category.is_some()
    }

    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<(Self, bool)> {
        let mut track = Track::default();
        // Set once a second Video or Audio element is found. Everything after it is ignored.
        let mut truncated = false;

        ebml.read_master(header, |ebml, child| {
            if truncated {
                return ebml.skip(child);
            }

            match child.etype {
                ElementType::TrackNumber => track.number = ebml.read_uint(child)?,
                ElementType::TrackType => {
                    track.kind = TrackKind::from_type(ebml.read_uint(child)?)
                }
                ElementType::CodecId => match ebml.alloc_read_ascii(child)? {
                    Some(codec_id) => track.codec_id = Some(codec_id),
                    None => return limit_error("mkv: codec id too long"),
                },
                ElementType::CodecPrivate => {
                    if child.len.map_or(true, |len| len >= MAX_CODEC_PRIVATE_LEN) {
                        return decode_error("mkv: codec private data too large");
                    }
                    track.codec_private = ebml.read_binary(child)?;
                }
                ElementType::Language => match ebml.alloc_read_ascii(child)? {
                    Some(language) => track.language = Some(language),
                    None => return limit_error("mkv: language too long"),
                },
                ElementType::FlagDefault => track.default_flag = ebml.read_uint(child)? != 0,
                ElementType::DefaultDuration => track.default_duration = ebml.read_uint(child)?,
                ElementType::TrackUid => track.uid = ebml.read_uint(child)?,
                ElementType::Video if track.video.is_some() => {
                    truncated = true;
                    ebml.skip(child)?;
                }
                ElementType::Video => track.video = Some(VideoInfo::read(ebml, child)?),
                ElementType::Audio if track.audio.is_some() => {
                    truncated = true;
                    ebml.skip(child)?;
                }
                ElementType::Audio => track.audio = Some(AudioInfo::read(ebml, child)?),
                ElementType::ContentEncodings => {
                    ebml.read_master(child, |ebml, child| match child.etype {
                        ElementType::ContentEncoding => track.read_content_encoding(ebml, child),
                        _ => ebml.skip(child),
                    })?
                }
                _ => {
                    debug!("mkv: unhandled element {:#x} in track entry", child.id);
                    ebml.skip(child)?
                }
            }
            Ok(())
        })?;

        Ok((track, truncated))
    }

    fn read_content_encoding(
        &mut self,
        ebml: &mut EbmlParser,
        header: &ElementHeader,
    ) -> Result<()> {
        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::ContentEncodingOrder => {
                    // Only a single content encoding is supported.
                    if ebml.read_uint(child)? != 0 {
                        return unsupported_error("mkv: non-zero content encoding order");
                    }
                }
                ElementType::ContentEncodingScope => {
                    // Only encodings of whole frames are supported.
                    let scope = ebml.read_uint(child)?;
                    if scope != 1 {
                        debug!("mkv: content encoding scope {}", scope);
                        return unsupported_error("mkv: content encoding scope");
                    }
                }
                ElementType::ContentEncodingType => {
                    if ebml.read_uint(child)? != 0 {
                        return unsupported_error("mkv: content encryption");
                    }
                }
                ElementType::ContentCompression => {
                    ebml.read_master(child, |ebml, child| {
                        match child.etype {
                            ElementType::ContentCompAlgo => {
                                self.compression = Compression::from_algo(ebml.read_uint(child)?)
                            }
                            ElementType::ContentCompSettings => {
                                self.compression_settings = ebml.read_binary(child)?
                            }
                            _ => ebml.skip(child)?,
                        }
                        Ok(())
                    })?;
                }
                ElementType::ContentEncryption => {
                    debug!("mkv: content encryption is not supported");
                    ebml.skip(child)?;
                }
                _ => {
                    debug!("mkv: unhandled element {:#x} in content encoding", child.id);
                    ebml.skip(child)?;
                }
            }
            Ok(())
        })
    }
}

/// Assigns each routed track a channel number, counting separately per kind of track.
#[derive(Default)]
struct TrackRouter {
    video: u16,
    audio: u16,
    subtitle: u16,
}

impl TrackRouter {
    fn route(&mut self, kind: TrackKind) -> Option<(StreamCategory, u16)> {
        let (category, counter) = match kind {
            TrackKind::Video => (StreamCategory::Video, &mut self.video),
            TrackKind::Audio => (StreamCategory::Audio, &mut self.audio),
            // Subtitles are overlaid on the video.
            TrackKind::Subtitle => (StreamCategory::Video, &mut self.subtitle),
            _ => return None,
        };

        let channel = *counter;
        *counter = counter.wrapping_add(1);
        Some((category, channel))
    }
}

/// The track table of a segment.
#[derive(Default)]
pub(crate) struct TrackTable {
    pub tracks: Vec<Track>,
    router: TrackRouter,
    /// Decoder initialization buffers, in the order they must be delivered.
    pub init_packets: Vec<(StreamCategory, Buffer)>,
    /// The longest content compression settings of any track.
    pub max_settings_len: usize,
}

impl TrackTable {
    pub(crate) fn find(&self, number: u64) -> Option<usize> {
        self.tracks.iter().position(|track| track.number == number)
    }

    /// Reads the children of a Tracks element.
    pub(crate) fn read(
        &mut self,
        ebml: &mut EbmlParser,
        header: &ElementHeader,
        max_streams: usize,
    ) -> Result<()> {
        ebml.read_master(header, |ebml, child| match child.etype {
            ElementType::TrackEntry => {
                if self.tracks.len() >= max_streams {
                    return limit_error("mkv: too many tracks");
                }

                let (mut track, truncated) = Track::read(ebml, child)?;

                info!(
                    "mkv: track {}, {} {}",
                    track.number,
                    track.codec_id.as_deref().unwrap_or(""),
                    track.language.as_deref().unwrap_or("")
                );

                if !truncated {
                    self.setup_codec(&mut track)?;
                }

                self.max_settings_len =
                    self.max_settings_len.max(track.compression_settings.len());
                self.tracks.push(track);
                Ok(())
            }
            _ => ebml.skip(child),
        })
    }

    /// Resolves the codec of a track, routes it, and builds its decoder initialization buffers.
    fn setup_codec(&mut self, track: &mut Track) -> Result<()> {
        let codec_id = match track.codec_id.as_deref() {
            Some(codec_id) => codec_id,
            None => return Ok(()),
        };

        let setup = match resolve_codec(codec_id, track) {
            Some(setup) => setup,
            None => return Ok(()),
        };

        if let Some(private) = setup.private {
            track.codec_private = private;
        }
        if setup.autodetect_compression && track.compression == Compression::None {
            // Most VobSub tracks are zlib compressed without declaring it.
            track.compression = Compression::Unknown;
        }
        track.handler = setup.handler;

        let route = self.router.route(track.kind);

        track.stream_type = Some(match route {
            Some((_, channel)) => setup.stream_type.with_channel(channel),
            None => setup.stream_type,
        });
        track.category = route.map(|(category, _)| category);

        if let Some(init) = setup.init {
            let category = match track.category {
                Some(category) => category,
                None => {
                    debug!("mkv: track {} of kind {:?} has no sink", track.number, track.kind);
                    return decode_error("mkv: no sink for track type");
                }
            };

            for buf in init.build(track) {
                self.init_packets.push((category, buf));
            }
        }

        Ok(())
    }

    /// Gets the language of the `channel`th routed track with a stream type matching `is_kind`.
    pub(crate) fn language<F>(&self, channel: usize, is_kind: F) -> Option<&str>
    where
        F: Fn(&StreamType) -> bool,
    {
        let channel = u16::try_from(channel).ok()?;

        self.tracks
            .iter()
            .filter(|track| track.category.is_some())
            .filter_map(|track| track.stream_type.map(|st| (track, st)))
            .find(|(_, st)| is_kind(st) && st.channel() == channel)
            .map(|(track, _)| track.language.as_deref().unwrap_or("eng"))
    }
}
