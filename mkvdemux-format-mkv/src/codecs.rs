// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::{debug, info, warn};

use mkvdemux_core::buffer::{AudioParams, Buffer, BufferFlags, Special, SpuDvdSubtype, StreamType};

use crate::block::ContentHandler;
use crate::tracks::{Track, TrackKind};
use crate::vobsub::VobSubInfo;

/// The size of a BITMAPINFOHEADER structure.
const BITMAP_INFO_HEADER_LEN: usize = 40;

/// The size of a WAVEFORMATEX structure.
const WAVE_FORMAT_EX_LEN: usize = 18;

const AAC_SYNC_EXTENSION_TYPE: u16 = 0x02b7;

/// How the decoder of a track is initialized before any frame is delivered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum DecoderInit {
    /// A single header buffer with the codec private data, frame rate, and aspect ratio.
    Video,
    /// A single header buffer with the codec private data and audio parameters.
    Audio,
    /// Like `Video`, for RealMedia codecs.
    Real,
    /// Three header buffers, split from Xiph laced codec private data.
    Xiph,
    /// A synthesized AAC decoder specific info.
    Aac,
    /// The palette parsed from the VobSub index in the codec private data.
    VobSub,
    /// An empty buffer.
    Spu,
}

/// The result of resolving a codec ID.
pub(crate) struct CodecSetup {
    pub stream_type: StreamType,
    pub handler: ContentHandler,
    pub init: Option<DecoderInit>,
    /// Replacement codec private data.
    pub private: Option<Box<[u8]>>,
    /// If `true`, undeclared compression of the track is detected from its frames.
    pub autodetect_compression: bool,
}

impl CodecSetup {
    fn new(stream_type: StreamType, init: Option<DecoderInit>) -> Self {
        CodecSetup {
            stream_type,
            handler: ContentHandler::None,
            init,
            private: None,
            autodetect_compression: false,
        }
    }

    fn with_handler(mut self, handler: ContentHandler) -> Self {
        self.handler = handler;
        self
    }
}

/// Codec IDs that are recognized but can not be demuxed.
const UNSUPPORTED_CODECS: &[&str] = &[
    "V_UNCOMPRESSED",
    "V_REAL/RV10",
    "V_REAL/RV20",
    "V_MJPEG",
    "A_PCM/INT/BIG",
    "A_PCM/INT/LIT",
    "A_PCM/FLOAT/IEEE",
    "A_REAL/14_4",
    "A_REAL/28_8",
    "A_REAL/RALF",
];

/// Maps the codec ID of a track to a stream type and decoder setup. Returns `None` if the codec
/// is not supported.
pub(crate) fn resolve_codec(codec_id: &str, track: &Track) -> Option<CodecSetup> {
    let setup = match codec_id {
        "V_MS/VFW/FOURCC" => {
            if track.codec_private.len() < BITMAP_INFO_HEADER_LEN {
                debug!("mkv: bitmap info header too short");
                return None;
            }

            let fourcc = &track.codec_private[16..20];
            match fourcc_to_stream_type(fourcc) {
                Some(stream_type) => CodecSetup::new(stream_type, Some(DecoderInit::Video)),
                None => {
                    warn!("mkv: unknown video fourcc {:?}", String::from_utf8_lossy(fourcc));
                    return None;
                }
            }
        }
        "V_MPEG4/ISO/SP" | "V_MPEG4/ISO/ASP" | "V_MPEG4/ISO/AP" => {
            with_bitmap_info_header(StreamType::VIDEO_MPEG4, b"MP4S", track)
        }
        "V_MPEG4/ISO/AVC" => with_bitmap_info_header(StreamType::VIDEO_H264, b"avc1", track),
        "V_VP8" => with_bitmap_info_header(StreamType::VIDEO_VP8, b"vp80", track),
        "V_MPEG4/MS/V3" => CodecSetup::new(StreamType::VIDEO_MSMPEG4_V3, None),
        "V_MPEG1" | "V_MPEG2" => CodecSetup::new(StreamType::VIDEO_MPEG, Some(DecoderInit::Video)),
        "V_REAL/RV30" => CodecSetup::new(StreamType::VIDEO_RV30, Some(DecoderInit::Real))
            .with_handler(ContentHandler::RealVideoChunks),
        "V_REAL/RV40" => CodecSetup::new(StreamType::VIDEO_RV40, Some(DecoderInit::Real))
            .with_handler(ContentHandler::RealVideoChunks),
        "V_THEORA" => CodecSetup::new(StreamType::VIDEO_THEORA, Some(DecoderInit::Xiph)),
        "A_MPEG/L1" | "A_MPEG/L2" | "A_MPEG/L3" => {
            CodecSetup::new(StreamType::AUDIO_MPEG, Some(DecoderInit::Audio))
        }
        "A_AC3" => CodecSetup::new(StreamType::AUDIO_A52, Some(DecoderInit::Audio)),
        "A_EAC3" => CodecSetup::new(StreamType::AUDIO_EAC3, Some(DecoderInit::Audio)),
        "A_FLAC" => CodecSetup::new(StreamType::AUDIO_FLAC, Some(DecoderInit::Audio)),
        "A_DTS" => CodecSetup::new(StreamType::AUDIO_DTS, Some(DecoderInit::Audio)),
        "A_VORBIS" => CodecSetup::new(StreamType::AUDIO_VORBIS, Some(DecoderInit::Xiph)),
        "A_MS/ACM" => {
            if track.codec_private.len() < WAVE_FORMAT_EX_LEN {
                debug!("mkv: wave format header too short");
                return None;
            }

            let tag = u16::from_le_bytes([track.codec_private[0], track.codec_private[1]]);
            match format_tag_to_stream_type(tag) {
                Some(stream_type) => CodecSetup::new(stream_type, Some(DecoderInit::Audio)),
                None => {
                    warn!("mkv: unknown audio format tag {:#06x}", tag);
                    return None;
                }
            }
        }
        id if id.starts_with("A_AAC") => {
            CodecSetup::new(StreamType::AUDIO_AAC, Some(DecoderInit::Aac))
        }
        "A_REAL/COOK" => CodecSetup::new(StreamType::AUDIO_COOK, Some(DecoderInit::Real)),
        "A_REAL/SIPR" => CodecSetup::new(StreamType::AUDIO_SIPRO, Some(DecoderInit::Real)),
        "A_REAL/ATRC" => CodecSetup::new(StreamType::AUDIO_ATRK, Some(DecoderInit::Real)),
        "S_TEXT/UTF8" | "S_UTF8" | "S_TEXT/USF" => {
            CodecSetup::new(StreamType::SPU_OGM, None).with_handler(ContentHandler::Utf8Sub)
        }
        "S_TEXT/SSA" | "S_TEXT/ASS" | "S_SSA" | "S_ASS" => {
            CodecSetup::new(StreamType::SPU_OGM, None).with_handler(ContentHandler::SsaSub)
        }
        "S_VOBSUB" => CodecSetup {
            autodetect_compression: true,
            ..CodecSetup::new(StreamType::SPU_DVD, Some(DecoderInit::VobSub))
                .with_handler(ContentHandler::VobSub)
        },
        "S_HDMV/PGS" => CodecSetup::new(StreamType::SPU_HDMV, Some(DecoderInit::Spu)),
        id if UNSUPPORTED_CODECS.contains(&id) => {
            info!("mkv: unsupported codec {}", id);
            return None;
        }
        id => {
            warn!("mkv: unknown codec {}", id);
            return None;
        }
    };

    Some(setup)
}

fn fourcc_to_stream_type(fourcc: &[u8]) -> Option<StreamType> {
    let stream_type = match fourcc {
        b"DIVX" | b"divx" | b"DX50" | b"XVID" | b"xvid" | b"MP4S" | b"mp4v" | b"FMP4" => {
            StreamType::VIDEO_MPEG4
        }
        b"MP42" => StreamType::VIDEO_MSMPEG4_V2,
        b"MP43" | b"DIV3" | b"div3" => StreamType::VIDEO_MSMPEG4_V3,
        b"MPG4" => StreamType::VIDEO_MSMPEG4_V1,
        b"WMV1" => StreamType::VIDEO_WMV7,
        b"WMV2" => StreamType::VIDEO_WMV8,
        b"WMV3" => StreamType::VIDEO_WMV9,
        b"H264" | b"h264" | b"X264" | b"x264" | b"avc1" | b"AVC1" => StreamType::VIDEO_H264,
        b"H263" | b"h263" | b"U263" => StreamType::VIDEO_H263,
        b"MJPG" | b"mjpg" => StreamType::VIDEO_MJPEG,
        b"WVC1" => StreamType::VIDEO_VC1,
        b"VP80" => StreamType::VIDEO_VP8,
        b"mpg1" | b"mpg2" | b"MPEG" => StreamType::VIDEO_MPEG,
        _ => return None,
    };
    Some(stream_type)
}

fn format_tag_to_stream_type(tag: u16) -> Option<StreamType> {
    let stream_type = match tag {
        0x0001 => StreamType::AUDIO_LPCM_LE,
        0x0002 => StreamType::AUDIO_MSADPCM,
        0x0011 => StreamType::AUDIO_MSIMAADPCM,
        0x0050 | 0x0055 => StreamType::AUDIO_MPEG,
        0x0161 => StreamType::AUDIO_WMAV2,
        0x0162 => StreamType::AUDIO_WMAPRO,
        0x2000 => StreamType::AUDIO_A52,
        0x2001 => StreamType::AUDIO_DTS,
        0x00ff | 0x706d => StreamType::AUDIO_AAC,
        0xf1ac => StreamType::AUDIO_FLAC,
        _ => return None,
    };
    Some(stream_type)
}

/// Wraps the codec private data of a native Matroska video codec in a bitmap info header, as
/// decoders of codecs originally carried in AVI expect.
fn with_bitmap_info_header(stream_type: StreamType, fourcc: &[u8; 4], track: &Track) -> CodecSetup {
    let video = track.video.unwrap_or_default();

    let mut bih = Vec::with_capacity(BITMAP_INFO_HEADER_LEN + track.codec_private.len());
    let size = (BITMAP_INFO_HEADER_LEN + track.codec_private.len()) as u32;

    bih.extend_from_slice(&size.to_le_bytes());
    bih.extend_from_slice(&(video.pixel_width as u32).to_le_bytes());
    bih.extend_from_slice(&(video.pixel_height as u32).to_le_bytes());
    // Planes and bit count.
    bih.extend_from_slice(&[0; 4]);
    bih.extend_from_slice(fourcc);
    // Image size, resolution, and palette usage.
    bih.extend_from_slice(&[0; 20]);
    bih.extend_from_slice(&track.codec_private);

    CodecSetup {
        private: Some(bih.into_boxed_slice()),
        ..CodecSetup::new(stream_type, Some(DecoderInit::Video))
    }
}

/// Gets the MPEG-4 audio sample rate index of the rate nearest to `sample_rate`.
fn aac_sample_rate_index(sample_rate: u32) -> u8 {
    const THRESHOLDS: [u32; 11] =
        [92017, 75132, 55426, 46009, 37566, 27713, 23004, 18783, 13856, 11502, 9391];

    THRESHOLDS.iter().position(|&min| sample_rate >= min).unwrap_or(11) as u8
}

/// Builds an MPEG-4 audio specific config from the codec ID and audio settings of an AAC track.
pub(crate) fn aac_decoder_config(codec_id: &str, audio: &AudioParams) -> Box<[u8]> {
    let sr_index = aac_sample_rate_index(audio.sample_rate);

    // Old style codec IDs carry the profile, for example A_AAC/MPEG4/LC/SBR.
    let profile: u8 = match codec_id.get(12..) {
        Some(rest) if rest.starts_with("MAIN") => 0,
        Some(rest) if rest.starts_with("LC") => 1,
        Some(rest) if rest.starts_with("SSR") => 2,
        _ => 3,
    };

    let mut config = vec![
        ((profile + 1) << 3) | ((sr_index & 0x0e) >> 1),
        ((sr_index & 0x01) << 7) | ((audio.channels as u8) << 3),
    ];

    if codec_id.contains("SBR") {
        let sr_index = aac_sample_rate_index(audio.sample_rate.saturating_mul(2));
        config.push((AAC_SYNC_EXTENSION_TYPE >> 3) as u8);
        config.push((((AAC_SYNC_EXTENSION_TYPE & 0x07) << 5) | 5) as u8);
        config.push((1 << 7) | (sr_index << 3));
    }

    config.into_boxed_slice()
}

/// Splits Xiph laced codec private data into the three header packets of a Vorbis or Theora
/// stream.
pub(crate) fn split_xiph_headers(private: &[u8]) -> Option<[&[u8]; 3]> {
    if private.len() < 3 || private[0] != 2 {
        return None;
    }

    let first = usize::from(private[1]);
    let second = usize::from(private[2]);
    if private.len() < 3 + first + second {
        return None;
    }

    let (first, rest) = private[3..].split_at(first);
    let (second, third) = rest.split_at(second);

    Some([first, second, third])
}

/// Converts a duration in nanoseconds to 90 kHz clock ticks.
pub(crate) fn ns_to_ticks(ns: u64) -> i64 {
    (ns as i64).wrapping_mul(90) / 1_000_000
}

impl DecoderInit {
    /// Builds the initialization buffers for a track. The stream type and codec private data of
    /// the track must be final.
    pub(crate) fn build(self, track: &mut Track) -> Vec<Buffer> {
        let stream_type = match track.stream_type {
            Some(stream_type) => stream_type,
            None => return Vec::new(),
        };

        match self {
            DecoderInit::Video | DecoderInit::Real => {
                let flags = match self {
                    DecoderInit::Video => {
                        BufferFlags::HEADER | BufferFlags::STDHEADER | BufferFlags::FRAME_END
                    }
                    _ => BufferFlags::HEADER | BufferFlags::FRAME_END,
                };

                let mut buf =
                    Buffer::new(stream_type, flags).with_data(track.codec_private.clone());

                if track.default_duration != 0 {
                    buf.flags |= BufferFlags::FRAMERATE;
                    buf.info.frame_duration = Some(ns_to_ticks(track.default_duration));
                }

                if let Some(video) = &track.video {
                    if video.display_width != 0 && video.display_height != 0 {
                        buf.flags |= BufferFlags::ASPECT;
                        buf.info.aspect = Some((video.display_width, video.display_height));
                    }
                }

                vec![buf]
            }
            DecoderInit::Audio => {
                let mut buf = Buffer::new(
                    stream_type,
                    BufferFlags::HEADER | BufferFlags::STDHEADER | BufferFlags::FRAME_END,
                )
                .with_data(track.codec_private.clone());

                buf.info.audio = Some(audio_params(track));
                vec![buf]
            }
            DecoderInit::Xiph => match split_xiph_headers(&track.codec_private) {
                Some(headers) => headers
                    .iter()
                    .map(|header| {
                        Buffer::new(
                            stream_type,
                            BufferFlags::HEADER | BufferFlags::FRAME_START | BufferFlags::FRAME_END,
                        )
                        .with_data(Box::from(*header))
                    })
                    .collect(),
                None => {
                    warn!("mkv: invalid xiph headers for track {}", track.number);
                    Vec::new()
                }
            },
            DecoderInit::Aac => {
                let codec_id = track.codec_id.as_deref().unwrap_or("");
                let config = aac_decoder_config(codec_id, &aac_params(track));

                vec![Buffer::new(stream_type, BufferFlags::HEADER)
                    .with_special(Special::DecoderConfig(config))]
            }
            DecoderInit::VobSub => {
                if track.codec_private.is_empty() {
                    return Vec::new();
                }

                let info = VobSubInfo::parse(&track.codec_private);
                let palette = info.palette;
                track.vobsub = Some(info);

                match palette {
                    Some(palette) => vec![Buffer::new(StreamType::SPU_DVD, BufferFlags::empty())
                        .with_special(Special::SpuDvd(SpuDvdSubtype::Clut(Box::new(palette))))],
                    None => Vec::new(),
                }
            }
            DecoderInit::Spu => vec![Buffer::new(stream_type, BufferFlags::empty())],
        }
    }
}

/// Gets the audio parameters of a track, substituting defaults for unset values.
fn audio_params(track: &Track) -> AudioParams {
    let mut params = AudioParams { sample_rate: 44100, bits_per_sample: 16, channels: 2 };

    if let Some(audio) = &track.audio {
        if audio.sampling_freq != 0 {
            params.sample_rate = audio.sampling_freq;
        }
        if audio.bits_per_sample != 0 {
            params.bits_per_sample = audio.bits_per_sample;
        }
        if audio.channels != 0 {
            params.channels = audio.channels;
        }
    }

    params
}

/// Gets the audio parameters of an AAC track as written, without defaults.
fn aac_params(track: &Track) -> AudioParams {
    let audio = track.audio.unwrap_or_default();

    AudioParams {
        sample_rate: audio.sampling_freq,
        bits_per_sample: audio.bits_per_sample,
        channels: audio.channels,
    }
}

/// Returns `true` if tracks of this kind have their frames checked for timestamp discontinuities.
pub(crate) fn tracks_discontinuities(kind: TrackKind) -> bool {
    matches!(kind, TrackKind::Video | TrackKind::Audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracks::{AudioInfo, VideoInfo};

    fn track(codec_id: &str, private: &[u8]) -> Track {
        Track {
            number: 1,
            codec_id: Some(codec_id.to_string()),
            codec_private: Box::from(private),
            ..Default::default()
        }
    }

    #[test]
    fn verify_aac_sample_rate_index() {
        assert_eq!(aac_sample_rate_index(96000), 0);
        assert_eq!(aac_sample_rate_index(48000), 3);
        assert_eq!(aac_sample_rate_index(44100), 4);
        assert_eq!(aac_sample_rate_index(22050), 7);
        assert_eq!(aac_sample_rate_index(8000), 11);
        assert_eq!(aac_sample_rate_index(0), 11);
    }

    #[test]
    fn verify_aac_decoder_config() {
        let params = AudioParams { sample_rate: 44100, bits_per_sample: 0, channels: 2 };

        // AAC LC, 44.1 kHz, stereo.
        assert_eq!(&aac_decoder_config("A_AAC/MPEG4/LC", &params)[..], &[0x12, 0x10]);
        // New style codec IDs default to the LTP profile.
        assert_eq!(&aac_decoder_config("A_AAC", &params)[..], &[0x22, 0x10]);

        // HE-AAC, 24 kHz core doubled to 48 kHz.
        let params = AudioParams { sample_rate: 24000, bits_per_sample: 0, channels: 2 };
        assert_eq!(
            &aac_decoder_config("A_AAC/MPEG4/LC/SBR", &params)[..],
            &[0x13, 0x10, 0x56, 0xe5, 0x98]
        );
    }

    #[test]
    fn verify_xiph_header_split() {
        let private = [2, 2, 3, b'a', b'a', b'b', b'b', b'b', b'c', b'c', b'c', b'c'];

        let headers = split_xiph_headers(&private).unwrap();
        assert_eq!(headers, [&b"aa"[..], &b"bbb"[..], &b"cccc"[..]]);

        assert!(split_xiph_headers(&[2, 1]).is_none());
        assert!(split_xiph_headers(&[1, 0, 0]).is_none());
        assert!(split_xiph_headers(&[2, 5, 5, 0, 0]).is_none());
        assert_eq!(split_xiph_headers(&[2, 0, 0]).unwrap(), [&[][..], &[][..], &[][..]]);

        // Header lengths at their maximum.
        let mut private = vec![2, 255, 255];
        private.resize(2 + 255 + 255, 0);
        assert!(split_xiph_headers(&private).is_none());
        private.push(0);
        assert!(split_xiph_headers(&private).unwrap()[2].is_empty());
        private.push(1);
        assert_eq!(split_xiph_headers(&private).unwrap()[2], &[1][..]);
    }

    #[test]
    fn verify_bitmap_info_header() {
        let mut avc = track("V_MPEG4/ISO/AVC", &[1, 2, 3]);
        avc.video = Some(VideoInfo { pixel_width: 1920, pixel_height: 1080, ..Default::default() });

        let setup = resolve_codec("V_MPEG4/ISO/AVC", &avc).unwrap();
        let bih = setup.private.unwrap();

        assert_eq!(setup.stream_type, StreamType::VIDEO_H264);
        assert_eq!(bih.len(), 43);
        assert_eq!(&bih[0..4], &43u32.to_le_bytes());
        assert_eq!(&bih[4..8], &1920u32.to_le_bytes());
        assert_eq!(&bih[8..12], &1080u32.to_le_bytes());
        assert_eq!(&bih[16..20], b"avc1");
        assert_eq!(&bih[40..], &[1, 2, 3]);

        // Missing video settings leave the dimensions zero.
        let setup = resolve_codec("V_VP8", &track("V_VP8", &[])).unwrap();
        let bih = setup.private.unwrap();
        assert_eq!(bih.len(), 40);
        assert_eq!(&bih[4..12], &[0; 8]);
        assert_eq!(&bih[16..20], b"vp80");
    }

    #[test]
    fn verify_legacy_headers() {
        let mut bih = [0u8; 40];
        bih[16..20].copy_from_slice(b"XVID");
        let setup = resolve_codec("V_MS/VFW/FOURCC", &track("V_MS/VFW/FOURCC", &bih)).unwrap();
        assert_eq!(setup.stream_type, StreamType::VIDEO_MPEG4);
        assert!(setup.private.is_none());

        bih[16..20].copy_from_slice(b"ABCD");
        assert!(resolve_codec("V_MS/VFW/FOURCC", &track("V_MS/VFW/FOURCC", &bih)).is_none());
        assert!(resolve_codec("V_MS/VFW/FOURCC", &track("V_MS/VFW/FOURCC", &bih[..39])).is_none());

        let mut wfx = [0u8; 18];
        wfx[0..2].copy_from_slice(&0x0161u16.to_le_bytes());
        let setup = resolve_codec("A_MS/ACM", &track("A_MS/ACM", &wfx)).unwrap();
        assert_eq!(setup.stream_type, StreamType::AUDIO_WMAV2);
        assert_eq!(setup.init, Some(DecoderInit::Audio));
    }

    #[test]
    fn verify_codec_table() {
        let resolve = |id: &str| resolve_codec(id, &track(id, &[]));

        assert_eq!(resolve("A_AAC/MPEG2/MAIN").unwrap().init, Some(DecoderInit::Aac));
        assert_eq!(resolve("V_MPEG4/MS/V3").unwrap().init, None);
        assert_eq!(resolve("V_REAL/RV40").unwrap().handler, ContentHandler::RealVideoChunks);
        assert_eq!(resolve("S_ASS").unwrap().handler, ContentHandler::SsaSub);
        assert_eq!(resolve("S_TEXT/USF").unwrap().handler, ContentHandler::Utf8Sub);
        assert!(resolve("S_VOBSUB").unwrap().autodetect_compression);
        assert!(resolve("V_UNCOMPRESSED").is_none());
        assert!(resolve("A_PCM/INT/LIT").is_none());
        assert!(resolve("X_UNKNOWN").is_none());
    }

    #[test]
    fn verify_audio_init_defaults() {
        let mut ac3 = track("A_AC3", &[9]);
        ac3.stream_type = Some(StreamType::AUDIO_A52.with_channel(1));
        ac3.audio = Some(AudioInfo { channels: 6, ..Default::default() });

        let bufs = DecoderInit::Audio.build(&mut ac3);
        assert_eq!(bufs.len(), 1);
        assert_eq!(&bufs[0].data[..], &[9]);
        assert_eq!(bufs[0].stream_type.channel(), 1);
        assert_eq!(
            bufs[0].info.audio,
            Some(AudioParams { sample_rate: 44100, bits_per_sample: 16, channels: 6 })
        );
    }

    #[test]
    fn verify_vobsub_init() {
        let idx = b"size: 720x480\npalette: 000000, ffffff, 000000, ffffff, 000000, ffffff, \
                    000000, ffffff, 000000, ffffff, 000000, ffffff, 000000, ffffff, 000000, ffffff\n";

        let mut vobsub = track("S_VOBSUB", idx);
        vobsub.stream_type = Some(StreamType::SPU_DVD.with_channel(2));

        let bufs = DecoderInit::VobSub.build(&mut vobsub);
        assert_eq!(bufs.len(), 1);
        assert_eq!(bufs[0].stream_type, StreamType::SPU_DVD);
        match &bufs[0].info.special {
            Some(Special::SpuDvd(SpuDvdSubtype::Clut(palette))) => {
                assert_eq!(palette[0], 0x008080);
                assert_eq!(palette[1], 0xff8080);
            }
            _ => panic!("expected a palette"),
        }
        assert_eq!(vobsub.vobsub.unwrap().width, 720);

        let mut empty = track("S_VOBSUB", &[]);
        empty.stream_type = Some(StreamType::SPU_DVD);
        assert!(DecoderInit::VobSub.build(&mut empty).is_empty());
        assert!(empty.vobsub.is_none());
    }
}
