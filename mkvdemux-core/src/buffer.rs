// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `buffer` module defines the unit of demuxed output, the [`Buffer`], and the tags that
//! describe it.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Flags attached to a demuxed [`Buffer`].
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct BufferFlags: u32 {
        /// The buffer carries decoder initialization data, not a frame.
        const HEADER      = 1 << 0;
        /// The header data is a standard header structure (BITMAPINFOHEADER or WAVEFORMATEX).
        const STDHEADER   = 1 << 1;
        /// The buffer starts a frame.
        const FRAME_START = 1 << 2;
        /// The buffer ends a frame.
        const FRAME_END   = 1 << 3;
        /// The buffer was produced while priming decoders before playback.
        const PREVIEW     = 1 << 4;
        /// The buffer carries a [`Special`] payload in its decoder info.
        const SPECIAL     = 1 << 5;
        /// The decoder info carries a display aspect ratio.
        const ASPECT      = 1 << 6;
        /// The decoder info carries a frame duration.
        const FRAMERATE   = 1 << 7;
        /// The buffer follows a seek.
        const SEEK        = 1 << 8;
    }
}

/// A `StreamType` tags a buffer with the elementary stream it belongs to.
///
/// It packs a major type (video, audio, subtitle), a codec, and a channel number, laid out as
/// `major << 24 | codec << 16 | channel`. The channel is the sequential index of the track among
/// all tracks routed to the same sink category.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct StreamType(u32);

macro_rules! stream_types {
    ($($name:ident = ($major:expr, $codec:expr, $desc:expr);)*) => {
        impl StreamType {
            $(pub const $name: StreamType = StreamType::new($major, $codec);)*

            /// Gets a short human readable name for the codec of this stream type.
            pub fn codec_name(&self) -> &'static str {
                match self.without_channel() {
                    $(StreamType::$name => $desc,)*
                    _ => "unknown",
                }
            }
        }
    };
}

const MAJOR_VIDEO: u8 = 0x02;
const MAJOR_AUDIO: u8 = 0x03;
const MAJOR_SPU: u8 = 0x04;

stream_types! {
    VIDEO_MPEG        = (MAJOR_VIDEO, 0x00, "mpeg-1/2 video");
    VIDEO_MPEG4       = (MAJOR_VIDEO, 0x01, "mpeg-4 part 2");
    VIDEO_MJPEG       = (MAJOR_VIDEO, 0x03, "motion jpeg");
    VIDEO_MSMPEG4_V1  = (MAJOR_VIDEO, 0x09, "ms mpeg-4 v1");
    VIDEO_MSMPEG4_V2  = (MAJOR_VIDEO, 0x0a, "ms mpeg-4 v2");
    VIDEO_MSMPEG4_V3  = (MAJOR_VIDEO, 0x0b, "ms mpeg-4 v3");
    VIDEO_WMV7        = (MAJOR_VIDEO, 0x0c, "windows media video 7");
    VIDEO_WMV8        = (MAJOR_VIDEO, 0x0d, "windows media video 8");
    VIDEO_WMV9        = (MAJOR_VIDEO, 0x0e, "windows media video 9");
    VIDEO_H263        = (MAJOR_VIDEO, 0x10, "h.263");
    VIDEO_RV30        = (MAJOR_VIDEO, 0x1c, "realvideo 3");
    VIDEO_RV40        = (MAJOR_VIDEO, 0x1d, "realvideo 4");
    VIDEO_THEORA      = (MAJOR_VIDEO, 0x3a, "theora");
    VIDEO_H264        = (MAJOR_VIDEO, 0x4d, "h.264");
    VIDEO_VC1         = (MAJOR_VIDEO, 0x55, "vc-1");
    VIDEO_VP8         = (MAJOR_VIDEO, 0x5e, "vp8");
    AUDIO_A52         = (MAJOR_AUDIO, 0x00, "ac-3");
    AUDIO_MPEG        = (MAJOR_AUDIO, 0x01, "mpeg audio");
    AUDIO_LPCM_LE     = (MAJOR_AUDIO, 0x02, "pcm");
    AUDIO_DTS         = (MAJOR_AUDIO, 0x05, "dts");
    AUDIO_MSADPCM     = (MAJOR_AUDIO, 0x06, "ms adpcm");
    AUDIO_MSIMAADPCM  = (MAJOR_AUDIO, 0x07, "ima adpcm");
    AUDIO_VORBIS      = (MAJOR_AUDIO, 0x0a, "vorbis");
    AUDIO_COOK        = (MAJOR_AUDIO, 0x15, "cook");
    AUDIO_ATRK        = (MAJOR_AUDIO, 0x16, "atrac3");
    AUDIO_AAC         = (MAJOR_AUDIO, 0x1a, "aac");
    AUDIO_SIPRO       = (MAJOR_AUDIO, 0x1d, "sipro");
    AUDIO_WMAV2       = (MAJOR_AUDIO, 0x24, "windows media audio 2");
    AUDIO_WMAPRO      = (MAJOR_AUDIO, 0x35, "windows media audio pro");
    AUDIO_FLAC        = (MAJOR_AUDIO, 0x2c, "flac");
    AUDIO_EAC3        = (MAJOR_AUDIO, 0x3d, "e-ac-3");
    SPU_DVD           = (MAJOR_SPU, 0x00, "dvd subpictures");
    SPU_OGM           = (MAJOR_SPU, 0x05, "text subtitles");
    SPU_HDMV          = (MAJOR_SPU, 0x09, "pgs subtitles");
}

impl StreamType {
    const fn new(major: u8, codec: u8) -> Self {
        StreamType(((major as u32) << 24) | ((codec as u32) << 16))
    }

    /// Returns `true` for video stream types.
    pub fn is_video(&self) -> bool {
        (self.0 >> 24) as u8 == MAJOR_VIDEO
    }

    /// Returns `true` for audio stream types.
    pub fn is_audio(&self) -> bool {
        (self.0 >> 24) as u8 == MAJOR_AUDIO
    }

    /// Returns `true` for subtitle stream types.
    pub fn is_spu(&self) -> bool {
        (self.0 >> 24) as u8 == MAJOR_SPU
    }

    /// Gets the channel number.
    pub fn channel(&self) -> u16 {
        self.0 as u16
    }

    /// Returns this stream type with the channel number ORed in.
    pub fn with_channel(self, channel: u16) -> Self {
        StreamType(self.0 | u32::from(channel))
    }

    /// Returns this stream type without its channel number.
    pub fn without_channel(self) -> Self {
        StreamType(self.0 & 0xffff_0000)
    }

    /// Gets the packed value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamType({:#010x} {}:{})", self.0, self.codec_name(), self.channel())
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.codec_name(), self.channel())
    }
}

/// Audio parameters published with a standard audio header buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioParams {
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub channels: u32,
}

/// The kind of DVD subpicture side data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpuDvdSubtype {
    /// A 16 entry colour lookup table, each entry packed as `y << 16 | u << 8 | v`.
    Clut(Box<[u32; 16]>),
    /// A complete VobSub subpicture package.
    VobsubPackage,
}

/// Side information that accompanies buffers flagged [`BufferFlags::SPECIAL`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Special {
    /// Out-of-band decoder configuration, e.g. an AAC DecoderSpecificInfo.
    DecoderConfig(Box<[u8]>),
    /// Text encoding of the buffer payload.
    CharsetEncoding(&'static str),
    /// DVD subpicture data.
    SpuDvd(SpuDvdSubtype),
    /// The fragment table of a RealVideo frame.
    RvChunkTable { chunks: u32, table: Box<[u8]> },
}

/// Decoder hints attached to a buffer. Which fields are meaningful is signalled by the buffer's
/// [`BufferFlags`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecoderInfo {
    /// Frame duration in 90kHz ticks. Valid with [`BufferFlags::FRAMERATE`].
    pub frame_duration: Option<i64>,
    /// Display aspect as `(width, height)`. Valid with [`BufferFlags::ASPECT`].
    pub aspect: Option<(u64, u64)>,
    /// Audio parameters of a standard audio header.
    pub audio: Option<AudioParams>,
    /// Special side data. Valid with [`BufferFlags::SPECIAL`].
    pub special: Option<Special>,
}

/// Positional information of a buffer within the input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtraInfo {
    /// Position of the buffer's source data normalized to `0..=65535` over the input length.
    pub input_normpos: u32,
    /// Presentation time in milliseconds.
    pub input_time: i64,
}

/// A `Buffer` is one unit of demuxed output: a frame, a header, or side data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buffer {
    /// The elementary stream this buffer belongs to.
    pub stream_type: StreamType,
    pub flags: BufferFlags,
    /// Presentation timestamp in 90kHz ticks. Zero means "no timestamp".
    pub pts: i64,
    /// Duration in 90kHz ticks.
    pub duration: i64,
    pub data: Box<[u8]>,
    pub info: DecoderInfo,
    pub extra: ExtraInfo,
}

impl Buffer {
    /// Instantiate a new, empty, `Buffer` of the given stream type and flags.
    pub fn new(stream_type: StreamType, flags: BufferFlags) -> Self {
        Buffer { stream_type, flags, ..Default::default() }
    }

    /// Sets the payload.
    pub fn with_data(mut self, data: Box<[u8]>) -> Self {
        self.data = data;
        self
    }

    /// Attaches special side data and sets [`BufferFlags::SPECIAL`].
    pub fn with_special(mut self, special: Special) -> Self {
        self.flags |= BufferFlags::SPECIAL;
        self.info.special = Some(special);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_stream_type_packing() {
        let st = StreamType::AUDIO_VORBIS.with_channel(3);

        assert!(st.is_audio());
        assert!(!st.is_video());
        assert_eq!(st.channel(), 3);
        assert_eq!(st.without_channel(), StreamType::AUDIO_VORBIS);
        assert_eq!(st.value(), 0x030a_0003);
        assert_eq!(st.to_string(), "vorbis:3");
        assert_eq!(StreamType::default().codec_name(), "unknown");
    }

    #[test]
    fn verify_with_special() {
        let buf = Buffer::new(StreamType::SPU_OGM, BufferFlags::empty())
            .with_special(Special::CharsetEncoding("utf-8"));

        assert!(buf.flags.contains(BufferFlags::SPECIAL));
        assert_eq!(buf.info.special, Some(Special::CharsetEncoding("utf-8")));
    }
}
