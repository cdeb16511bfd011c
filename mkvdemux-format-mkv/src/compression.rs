// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::{self, Read};

use flate2::read::ZlibDecoder;

use mkvdemux_core::errors::{limit_error, Error, Result};

/// The compression applied to the frames of a track.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    None,
    Zlib,
    Bzlib,
    Lzo1x,
    HeaderStripping,
    /// The track is suspected to be compressed with an undeclared algorithm.
    Unknown,
}

impl Compression {
    /// Maps a ContentCompAlgo value to a compression algorithm.
    pub(crate) fn from_algo(algo: u64) -> Self {
        match algo {
            0 => Compression::Zlib,
            1 => Compression::Bzlib,
            2 => Compression::Lzo1x,
            3 => Compression::HeaderStripping,
            _ => Compression::Unknown,
        }
    }
}

/// Inflates a zlib stream. Output longer than `max_len` bytes is a `LimitError`.
pub(crate) fn inflate(data: &[u8], max_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(2).min(max_len));

    // Read one byte past the limit to tell a full frame from an oversized one.
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    ZlibDecoder::new(data).take(limit).read_to_end(&mut out)?;

    if out.len() > max_len {
        return limit_error("mkv: decompressed frame too large");
    }
    Ok(out)
}

/// Returns `true` if an inflate error was caused by corrupt input rather than, say, a truncated
/// stream.
pub(crate) fn is_data_error(err: &Error) -> bool {
    match err {
        Error::IoError(err) => {
            matches!(err.kind(), io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData)
        }
        _ => false,
    }
}

/// Undoes the compression of a single frame. Returns `None` if the frame could not be
/// decompressed, or would exceed `max_len` bytes, and should be dropped.
pub(crate) fn decompress(
    data: &[u8],
    algorithm: Compression,
    settings: &[u8],
    max_len: usize,
) -> Option<Box<[u8]>> {
    match algorithm {
        Compression::None | Compression::Unknown => Some(Box::from(data)),
        Compression::HeaderStripping => Some([settings, data].concat().into_boxed_slice()),
        Compression::Zlib => match inflate(data, max_len) {
            Ok(out) => Some(out.into_boxed_slice()),
            Err(err) => {
                log::warn!("mkv: zlib decompression failed: {}", err);
                None
            }
        },
        Compression::Bzlib => {
            log::warn!("mkv: unimplemented compression algorithm [bzlib]. Expect errors.");
            Some(Box::from(data))
        }
        Compression::Lzo1x => {
            log::warn!("mkv: unimplemented compression algorithm [lzo1x]. Expect errors.");
            Some(Box::from(data))
        }
    }
}
