// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mkvdemux_core::errors::{decode_error, limit_error, Error, Result};
use mkvdemux_core::io::{BufReader, FiniteStream, ReadBytes};
use smallvec::SmallVec;

use crate::ebml::{read_signed_vint, read_vint};

/// Frame sizes above this are rejected.
const MAX_FRAME_SIZE: i64 = i32::MAX as i64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Lacing {
    None,
    Xiph,
    FixedSize,
    Ebml,
}

fn parse_flags(flags: u8) -> Lacing {
    match (flags >> 1) & 0b11 {
        0b00 => Lacing::None,
        0b01 => Lacing::Xiph,
        0b10 => Lacing::FixedSize,
        _ => Lacing::Ebml,
    }
}

/// The header of a Block or SimpleBlock.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BlockHeader {
    pub track: u64,
    /// Frame timestamp (relative to Cluster timestamp).
    pub timecode: i16,
    pub lacing: Lacing,
}

/// Reads a block header from the start of the block payload.
pub(crate) fn read_block_header(reader: &mut BufReader<'_>) -> Result<BlockHeader> {
    let (track, _) = read_vint(&mut *reader).map_err(too_small)?;
    let timecode = reader.read_be_i16().map_err(|_| Error::DecodeError("mkv: block too small"))?;
    let flags = reader.read_byte().map_err(|_| Error::DecodeError("mkv: block too small"))?;
    Ok(BlockHeader { track, timecode, lacing: parse_flags(flags) })
}

/// Running out of block data while reading lace sizes is a malformed block, not an IO error.
fn too_small(err: Error) -> Error {
    match err {
        Error::IoError(_) => Error::DecodeError("mkv: block too small"),
        err => err,
    }
}

fn read_xiph_sizes(reader: &mut BufReader<'_>, frames: usize) -> Result<SmallVec<[u64; 8]>> {
    let mut sizes = SmallVec::new();
    let mut prefixes = 0;
    while sizes.len() < frames {
        let byte =
            u64::from(reader.read_byte().map_err(|_| Error::DecodeError("mkv: block too small"))?);
        if byte == 255 {
            prefixes += 1;
        }
        else {
            sizes.push(prefixes * 255 + byte);
            prefixes = 0;
        }
    }
    Ok(sizes)
}

fn read_ebml_sizes(reader: &mut BufReader<'_>, frames: usize) -> Result<SmallVec<[u64; 8]>> {
    let mut sizes: SmallVec<[u64; 8]> = SmallVec::new();
    for _ in 0..frames {
        if let Some(last_size) = sizes.last().copied() {
            let (delta, _) = read_signed_vint(&mut *reader).map_err(too_small)?;
            let size = last_size as i64 + delta;
            if size < 0 || size > MAX_FRAME_SIZE {
                log::debug!("mkv: invalid frame size {}", size);
                return decode_error("mkv: invalid laced frame size");
            }
            sizes.push(size as u64);
        }
        else {
            let (size, _) = read_vint(&mut *reader).map_err(too_small)?;
            if size > MAX_FRAME_SIZE as u64 {
                log::debug!("mkv: invalid first frame size {}", size);
                return decode_error("mkv: invalid laced frame size");
            }
            sizes.push(size);
        }
    }
    Ok(sizes)
}

/// Splits the rest of a block after its header into frames.
///
/// A block without lacing is a single frame. Laced blocks store the number of frames minus one,
/// followed by the sizes of all frames but the last, whose size is what remains of the block.
pub(crate) fn split_frames<'a>(
    mut reader: BufReader<'a>,
    lacing: Lacing,
    max_frames: usize,
) -> Result<SmallVec<[&'a [u8]; 8]>> {
    let mut frames = SmallVec::new();

    if lacing == Lacing::None {
        frames.push(reader.read_buf_bytes_available_ref());
        return Ok(frames);
    }

    let lace_num =
        usize::from(reader.read_byte().map_err(|_| Error::DecodeError("mkv: block too small"))?);
    if lace_num + 1 > max_frames {
        log::debug!("mkv: too many laced frames: {}", lace_num + 1);
        return limit_error("mkv: too many laced frames");
    }

    let sizes = match lacing {
        Lacing::Xiph => read_xiph_sizes(&mut reader, lace_num)?,
        Lacing::Ebml => read_ebml_sizes(&mut reader, lace_num)?,
        _ => {
            let frame_size = reader.bytes_available() / (lace_num as u64 + 1);
            (0..lace_num).map(|_| frame_size).collect()
        }
    };

    for size in sizes {
        let frame = reader
            .read_buf_bytes_ref(size as usize)
            .map_err(|_| Error::DecodeError("mkv: laced frames exceed block size"))?;
        frames.push(frame);
    }

    // Size of last frame is not provided so we read to the end of the block.
    frames.push(reader.read_buf_bytes_available_ref());

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_lens(block: &[u8], lacing: Lacing) -> Result<Vec<usize>> {
        let frames = split_frames(BufReader::new(block), lacing, 32)?;
        Ok(frames.iter().map(|f| f.len()).collect())
    }

    #[test]
    fn verify_block_header() {
        let block = [0x81, 0xff, 0xfe, 0x86, 0xaa];
        let mut reader = BufReader::new(&block);
        let header = read_block_header(&mut reader).unwrap();
        assert_eq!(header.track, 1);
        assert_eq!(header.timecode, -2);
        assert_eq!(header.lacing, Lacing::Ebml);
        assert_eq!(reader.bytes_available(), 1);

        assert!(matches!(
            read_block_header(&mut BufReader::new(&[0x81, 0x00])),
            Err(Error::DecodeError(_))
        ));
    }

    #[test]
    fn verify_no_lacing() {
        assert_eq!(frame_lens(&[1, 2, 3], Lacing::None).unwrap(), vec![3]);
    }

    #[test]
    fn verify_fixed_size_lacing() {
        let mut block = vec![3];
        block.extend([0u8; 100]);
        assert_eq!(frame_lens(&block, Lacing::FixedSize).unwrap(), vec![25, 25, 25, 25]);

        // The last frame takes whatever the division leaves over.
        let mut block = vec![2];
        block.extend([0u8; 10]);
        assert_eq!(frame_lens(&block, Lacing::FixedSize).unwrap(), vec![3, 3, 4]);
    }

    #[test]
    fn verify_xiph_lacing() {
        let mut block = vec![2, 5, 255, 45];
        block.extend(vec![0u8; 5 + 300 + 7]);
        assert_eq!(frame_lens(&block, Lacing::Xiph).unwrap(), vec![5, 300, 7]);

        // Sizes larger than the block.
        let block = [1, 200, 0, 0];
        assert!(matches!(frame_lens(&block, Lacing::Xiph), Err(Error::DecodeError(_))));
    }

    #[test]
    fn verify_ebml_lacing() {
        // 10, then +5.
        let mut block = vec![2, 0x8a, 0xc4];
        block.extend(vec![0u8; 10 + 15 + 4]);
        assert_eq!(frame_lens(&block, Lacing::Ebml).unwrap(), vec![10, 15, 4]);

        // 2, then -10.
        let mut block = vec![2, 0x82, 0xb5];
        block.extend(vec![0u8; 20]);
        assert!(matches!(frame_lens(&block, Lacing::Ebml), Err(Error::DecodeError(_))));

        // Truncated size.
        assert!(matches!(frame_lens(&[1, 0x40], Lacing::Ebml), Err(Error::DecodeError(_))));
    }

    #[test]
    fn verify_lace_limit() {
        let mut block = vec![32];
        block.extend([0u8; 33]);
        assert!(matches!(frame_lens(&block, Lacing::FixedSize), Err(Error::LimitError(_))));
    }
}
