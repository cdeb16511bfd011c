// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::io::SeekFrom;

use mkvdemux_core::errors::{decode_error, limit_error, unsupported_error, Result};
use mkvdemux_core::io::{ReadBytes, SourceStream};

use crate::element_ids::{element_type, ElementType};

/// The only EBML read version this parser understands.
const EBML_READ_VERSION: u64 = 1;

/// Reads a single EBML element ID (as in RFC8794) from the stream and returns it or an error.
///
/// IDs keep their length marker bits, and may be 1 to 4 bytes long.
pub(crate) fn read_id<R: ReadBytes>(mut reader: R) -> Result<u32> {
    let byte = reader.read_byte()?;
    let remaining_octets = byte.leading_zeros();
    if remaining_octets > 3 {
        return decode_error("ebml: invalid element id size");
    }

    let mut id = u32::from(byte);
    for _ in 0..remaining_octets {
        id = (id << 8) | u32::from(reader.read_byte()?);
    }

    Ok(id)
}

/// Reads a single element data size from the stream. A size with all data bits set, in any
/// width, is the "unknown size" marker and is returned as `None`.
pub(crate) fn read_size<R: ReadBytes>(reader: R) -> Result<Option<u64>> {
    let (size, len) = read_vint(reader)?;
    if size == vint_max(len) {
        return Ok(None);
    }
    Ok(Some(size))
}

/// Reads a single unsigned variable size integer (as in RFC8794) from the stream
/// and returns both its value and length in octets, or an error.
pub(crate) fn read_vint<R: ReadBytes>(mut reader: R) -> Result<(u64, u32)> {
    let byte = reader.read_byte()?;
    if byte == 0 {
        return decode_error("ebml: invalid variable size integer width");
    }

    let vint_width = byte.leading_zeros();
    let mut vint = u64::from(byte);
    // Clear VINT_MARKER bit
    vint ^= 1 << (7 - vint_width);

    // Read remaining octets
    for _ in 0..vint_width {
        let byte = reader.read_byte()?;
        vint = (vint << 8) | u64::from(byte);
    }

    Ok((vint, vint_width + 1))
}

/// Reads a single signed variable size integer (as in RFC8794) from the stream
/// and returns both its value and length in octets, or an error.
pub(crate) fn read_signed_vint<R: ReadBytes>(mut reader: R) -> Result<(i64, u32)> {
    let (value, len) = read_vint(&mut reader)?;
    // Convert to a signed integer by range shifting.
    let half_range = (1i64 << (len * 7 - 1)) - 1;
    Ok((value as i64 - half_range, len))
}

/// The largest value a variable size integer of `len` octets can hold.
fn vint_max(len: u32) -> u64 {
    (1u64 << (7 * len)) - 1
}

/// The header of an EBML element.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ElementHeader {
    /// The element ID.
    pub id: u32,
    /// The element type.
    pub etype: ElementType,
    /// The element's offset in the stream.
    pub pos: u64,
    /// The element's data offset in the stream.
    pub start: u64,
    /// The size of the payload data, or `None` if it is unknown.
    pub len: Option<u64>,
}

impl ElementHeader {
    /// Gets the position immediately past the last byte of the element. An element of unknown
    /// size never ends.
    pub(crate) fn end(&self) -> u64 {
        match self.len {
            Some(len) => self.start.saturating_add(len),
            None => u64::MAX,
        }
    }

    /// Returns `true` if the element has no payload.
    pub(crate) fn is_empty(&self) -> bool {
        self.len == Some(0)
    }
}

/// A container element that is currently open.
#[derive(Copy, Clone, Debug)]
struct OpenElement {
    id: u32,
    end: u64,
}

/// The stack of open container elements, from the outermost inwards.
///
/// `EbmlStack` is a plain value so that it can be snapshotted before jumping elsewhere in the
/// stream, and restored afterwards.
#[derive(Clone, Debug)]
pub(crate) struct EbmlStack {
    open: Vec<OpenElement>,
    max_depth: usize,
}

impl EbmlStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        EbmlStack { open: Vec::with_capacity(max_depth), max_depth }
    }

    /// Gets the nesting level, the number of open containers.
    pub(crate) fn level(&self) -> usize {
        self.open.len()
    }

    /// Opens a container element. The new level is one deeper than before.
    pub(crate) fn push(&mut self, header: &ElementHeader) -> Result<()> {
        if self.open.len() + 1 >= self.max_depth {
            return limit_error("ebml: maximum nesting depth exceeded");
        }
        self.open.push(OpenElement { id: header.id, end: header.end() });
        Ok(())
    }

    /// Closes every container that ends at or before the end of `header`, and returns the level
    /// the next sibling element will be read at.
    pub(crate) fn next_sibling_level(&mut self, header: &ElementHeader) -> usize {
        let end = header.end();
        while let Some(parent) = self.open.last() {
            if end < parent.end {
                break;
            }
            log::trace!("ebml: closing {:#x} at {}", parent.id, parent.end);
            self.open.pop();
        }
        self.open.len()
    }

    /// Truncates the stack to the given level.
    pub(crate) fn set_level(&mut self, level: usize) {
        self.open.truncate(level);
    }
}

/// The contents of the EBML header element.
#[derive(Clone, Debug, Default)]
pub(crate) struct EbmlHeader {
    pub version: u64,
    pub read_version: u64,
    pub max_id_len: u64,
    pub max_size_len: u64,
    pub doctype: Option<String>,
    pub doctype_version: u64,
    pub doctype_read_version: u64,
}

/// A streaming EBML decoder.
///
/// The parser reads element headers one at a time and tracks which container elements are open
/// purely from byte offsets. Callers read or skip each element's payload after reading its
/// header, then ask for the level of the next sibling to know when a container ended.
pub(crate) struct EbmlParser {
    reader: SourceStream,
    stack: EbmlStack,
    max_string_len: u64,
}

impl EbmlParser {
    pub(crate) fn new(reader: SourceStream, max_depth: usize, max_string_len: u64) -> Self {
        EbmlParser { reader, stack: EbmlStack::new(max_depth), max_string_len }
    }

    /// Gets the current position in the stream.
    pub(crate) fn pos(&self) -> u64 {
        self.reader.pos()
    }

    /// Gets the stream length, or 0 if it is unknown.
    pub(crate) fn byte_len(&self) -> u64 {
        self.reader.byte_len().unwrap_or(0)
    }

    pub(crate) fn is_seekable(&self) -> bool {
        self.reader.is_seekable()
    }

    /// Seeks to an absolute position in the stream. The element stack is not changed.
    pub(crate) fn seek(&mut self, pos: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub(crate) fn level(&self) -> usize {
        self.stack.level()
    }

    pub(crate) fn set_level(&mut self, level: usize) {
        self.stack.set_level(level)
    }

    /// Takes a copy of the element stack.
    pub(crate) fn snapshot(&self) -> EbmlStack {
        self.stack.clone()
    }

    /// Replaces the element stack with a previously taken snapshot.
    pub(crate) fn restore(&mut self, stack: EbmlStack) {
        self.stack = stack;
    }

    /// Reads an element header at the current position.
    pub(crate) fn read_element_header(&mut self) -> Result<ElementHeader> {
        let pos = self.reader.pos();
        let id = read_id(&mut self.reader)?;
        let len = read_size(&mut self.reader)?;

        let header =
            ElementHeader { id, etype: element_type(id), pos, start: self.reader.pos(), len };

        log::trace!("ebml: element {:#x} ({:?}) at {}, len {:?}", id, header.etype, pos, len);
        Ok(header)
    }

    /// Opens a container element whose header was just read. Its children are read next.
    pub(crate) fn enter_master(&mut self, header: &ElementHeader) -> Result<()> {
        self.stack.push(header)
    }

    /// Opens a container element whose header was just read, and calls `f` with the header of
    /// each of its children in turn. `f` must consume or skip the payload of every child it is
    /// given.
    pub(crate) fn read_master<F>(&mut self, header: &ElementHeader, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Self, &ElementHeader) -> Result<()>,
    {
        self.enter_master(header)?;

        if header.is_empty() {
            return Ok(());
        }

        let level = self.level();
        let mut next_level = level;

        while next_level == level {
            let child = self.read_element_header()?;
            f(self, &child)?;
            next_level = self.next_sibling_level(&child);
        }

        Ok(())
    }

    /// Returns the level the element following `header` will be read at, closing all containers
    /// that `header` ends.
    pub(crate) fn next_sibling_level(&mut self, header: &ElementHeader) -> usize {
        self.stack.next_sibling_level(header)
    }

    /// Skips the payload of an element whose header was just read.
    pub(crate) fn skip(&mut self, header: &ElementHeader) -> Result<()> {
        match header.len {
            Some(len) => Ok(self.reader.ignore_bytes(len)?),
            None => decode_error("ebml: cannot skip an element of unknown size"),
        }
    }

    /// Reads the payload of an element as a big-endian unsigned integer of 1 to 8 bytes.
    pub(crate) fn read_uint(&mut self, header: &ElementHeader) -> Result<u64> {
        let len = match header.len {
            Some(len @ 1..=8) => len as usize,
            _ => return decode_error("ebml: invalid integer element size"),
        };

        let mut buf = [0u8; 8];
        self.reader.read_buf_exact(&mut buf[8 - len..])?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads the payload of an element as a big-endian IEEE-754 float of 4 or 8 bytes.
    pub(crate) fn read_float(&mut self, header: &ElementHeader) -> Result<f64> {
        match header.len {
            Some(4) => Ok(f64::from(self.reader.read_be_f32()?)),
            Some(8) => Ok(self.reader.read_be_f64()?),
            Some(10) => {
                self.skip(header)?;
                unsupported_error("ebml: 10-byte floats")
            }
            _ => decode_error("ebml: invalid float element size"),
        }
    }

    /// Reads the payload of an element as a string. Strings longer than the configured limit
    /// are an error.
    pub(crate) fn read_ascii(&mut self, header: &ElementHeader) -> Result<String> {
        match self.alloc_read_ascii(header)? {
            Some(text) => Ok(text),
            None => limit_error("ebml: string element too long"),
        }
    }

    /// Reads the payload of an element as a string. Strings longer than the configured limit
    /// are skipped and `None` is returned.
    pub(crate) fn alloc_read_ascii(&mut self, header: &ElementHeader) -> Result<Option<String>> {
        let len = match header.len {
            Some(len) if len < self.max_string_len => len as usize,
            Some(_) => {
                log::debug!("ebml: skipping oversized string element {:#x}", header.id);
                self.skip(header)?;
                return Ok(None);
            }
            None => return decode_error("ebml: string element of unknown size"),
        };

        let data = self.reader.read_boxed_slice_exact(len)?;
        // Strings may be zero padded.
        let bytes = data.split(|b| *b == 0).next().unwrap_or(&data);
        Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Reads the payload of an element verbatim.
    pub(crate) fn read_binary(&mut self, header: &ElementHeader) -> Result<Box<[u8]>> {
        match header.len {
            Some(len) => Ok(self.reader.read_boxed_slice_exact(len as usize)?),
            None => decode_error("ebml: binary element of unknown size"),
        }
    }

    /// Reads exactly `buf.len()` bytes of element payload.
    pub(crate) fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        Ok(self.reader.read_buf_exact(buf)?)
    }

    /// Reads and validates the EBML header element at the current position.
    pub(crate) fn check_header(&mut self) -> Result<EbmlHeader> {
        let master = self.read_element_header()?;
        if master.etype != ElementType::Ebml {
            return decode_error("ebml: invalid master element");
        }

        self.enter_master(&master)?;

        let mut ebml = EbmlHeader::default();

        let level = self.level();
        let mut next_level =
            if master.is_empty() { self.next_sibling_level(&master) } else { level };

        while next_level == level {
            let header = self.read_element_header()?;

            match header.etype {
                ElementType::EbmlVersion => ebml.version = self.read_uint(&header)?,
                ElementType::EbmlReadVersion => {
                    ebml.read_version = self.read_uint(&header)?;
                    if ebml.read_version != EBML_READ_VERSION {
                        return unsupported_error("ebml: unsupported read version");
                    }
                }
                ElementType::EbmlMaxIdLength => ebml.max_id_len = self.read_uint(&header)?,
                ElementType::EbmlMaxSizeLength => ebml.max_size_len = self.read_uint(&header)?,
                ElementType::DocType => ebml.doctype = Some(self.read_ascii(&header)?),
                ElementType::DocTypeVersion => ebml.doctype_version = self.read_uint(&header)?,
                ElementType::DocTypeReadVersion => {
                    ebml.doctype_read_version = self.read_uint(&header)?
                }
                _ => {
                    log::info!("ebml: unknown element {:#x} in ebml header (ignored)", header.id);
                    self.skip(&header)?;
                }
            }

            next_level = self.next_sibling_level(&header);
        }

        log::debug!("ebml: {:?}", ebml);

        if ebml.max_id_len > 4 {
            return unsupported_error("ebml: maximum id length greater than 4");
        }
        if ebml.max_size_len > 8 {
            return unsupported_error("ebml: maximum size length greater than 8");
        }
        match ebml.doctype.as_deref() {
            Some("matroska") | Some("webm") => (),
            _ => return unsupported_error("ebml: unsupported document type"),
        }

        Ok(ebml)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Cursor;

    use mkvdemux_core::errors::Error;
    use mkvdemux_core::io::{BufReader, SourceStream};

    use super::*;

    /// Encodes an element ID (which already carries its length marker).
    fn encode_id(id: u32) -> Vec<u8> {
        let bytes = id.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        bytes[skip..].to_vec()
    }

    /// Encodes a data size in the given width.
    pub(crate) fn encode_size(size: u64, width: u32) -> Vec<u8> {
        let marked = size | (1 << (7 * width));
        marked.to_be_bytes()[8 - width as usize..].to_vec()
    }

    /// Encodes the smallest-width data size for `size`.
    fn encode_min_size(size: u64) -> Vec<u8> {
        let width = (1..=8).find(|w| size < vint_max(*w)).unwrap_or(8);
        encode_size(size, width)
    }

    /// Encodes a complete element.
    pub(crate) fn elem(id: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = encode_id(id);
        out.extend(encode_min_size(payload.len() as u64));
        out.extend_from_slice(payload);
        out
    }

    /// Encodes an unsigned integer element in its minimal width.
    pub(crate) fn uint(id: u32, value: u64) -> Vec<u8> {
        let bytes = value.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
        elem(id, &bytes[skip..])
    }

    /// Encodes a string element.
    pub(crate) fn string(id: u32, value: &str) -> Vec<u8> {
        elem(id, value.as_bytes())
    }

    /// Encodes an 8 byte float element.
    pub(crate) fn float(id: u32, value: f64) -> Vec<u8> {
        elem(id, &value.to_be_bytes())
    }

    /// Encodes a container element from its children.
    pub(crate) fn master(id: u32, children: &[Vec<u8>]) -> Vec<u8> {
        elem(id, &children.concat())
    }

    /// An EBML header declaring the given document type.
    pub(crate) fn ebml_header(doctype: &str) -> Vec<u8> {
        master(
            0x1A45DFA3,
            &[
                uint(0x4286, 1),
                uint(0x42F7, 1),
                uint(0x42F2, 4),
                uint(0x42F3, 8),
                string(0x4282, doctype),
                uint(0x4287, 4),
                uint(0x4285, 2),
            ],
        )
    }

    pub(crate) fn parser(data: Vec<u8>) -> EbmlParser {
        let source = SourceStream::new(Box::new(Cursor::new(data)), Default::default());
        EbmlParser::new(source, 10, 4096)
    }

    #[test]
    fn verify_element_header_round_trip() {
        for (id, id_len) in [(0xA3u32, 1), (0x4286, 2), (0x2AD7B1, 3), (0x18538067, 4)] {
            for width in 1..=8u32 {
                for size in [0u64, 1, vint_max(width) - 1] {
                    let mut data = encode_id(id);
                    assert_eq!(data.len(), id_len);
                    data.extend(encode_size(size, width));

                    let mut ebml = parser(data);
                    let header = ebml.read_element_header().unwrap();
                    assert_eq!(header.id, id);
                    assert_eq!(header.len, Some(size));
                    assert_eq!(header.start, (id_len as u32 + width) as u64);
                }

                // All data bits set is the unknown size marker, in any width.
                let mut data = encode_id(id);
                data.extend(encode_size(vint_max(width), width));

                let mut ebml = parser(data);
                let header = ebml.read_element_header().unwrap();
                assert_eq!(header.id, id);
                assert_eq!(header.len, None);
                assert_eq!(header.end(), u64::MAX);
            }
        }
    }

    #[test]
    fn verify_invalid_header_widths() {
        // An ID with more than 4 octets.
        assert!(matches!(
            parser(vec![0x08, 0x00, 0x00, 0x00, 0x01, 0x81]).read_element_header(),
            Err(Error::DecodeError(_))
        ));
        // A size with more than 8 octets.
        assert!(matches!(
            parser(vec![0xA3, 0x00, 0x01]).read_element_header(),
            Err(Error::DecodeError(_))
        ));
        // A truncated size.
        assert!(matches!(
            parser(vec![0xA3, 0x40]).read_element_header(),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn verify_vint_parsing() {
        assert_eq!(read_vint(BufReader::new(&[0x82])).unwrap(), (2, 1));
        assert_eq!(read_vint(BufReader::new(&[0x40, 0x02])).unwrap(), (2, 2));
        assert_eq!(
            read_vint(BufReader::new(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02])).unwrap(),
            (2, 8)
        );
        assert_eq!(read_signed_vint(BufReader::new(&[0x80])).unwrap(), (-63, 1));
        assert_eq!(read_signed_vint(BufReader::new(&[0x40, 0x00])).unwrap(), (-8191, 2));
        assert_eq!(read_signed_vint(BufReader::new(&[0xC4])).unwrap(), (5, 1));
    }

    #[test]
    fn verify_stack_nesting() {
        // Segment { Tracks { TrackEntry { TrackNumber } } Cluster { Timestamp } }
        let data = master(
            0x18538067,
            &[
                master(0x1654AE6B, &[master(0xAE, &[uint(0xD7, 1)])]),
                master(0x1F43B675, &[uint(0xE7, 0)]),
            ],
        );

        let mut ebml = parser(data);
        let mut level = ebml.level();
        assert_eq!(level, 0);

        let mut ids = Vec::new();
        loop {
            let header = ebml.read_element_header().unwrap();
            ids.push(header.id);

            let next = if header.id == 0xD7 || header.id == 0xE7 {
                ebml.read_uint(&header).unwrap();
                ebml.next_sibling_level(&header)
            }
            else {
                ebml.enter_master(&header).unwrap();
                ebml.level()
            };

            // A level never grows by more than one per element.
            assert!(next <= level + 1);
            level = next;

            if level == 0 {
                break;
            }
        }

        assert_eq!(ids, vec![0x18538067, 0x1654AE6B, 0xAE, 0xD7, 0x1F43B675, 0xE7]);
    }

    #[test]
    fn verify_stack_overflow() {
        let mut data = uint(0xD7, 1);
        for _ in 0..10 {
            data = master(0xAE, &[data]);
        }

        let mut ebml = parser(data);
        let mut result = Ok(());
        for _ in 0..10 {
            let header = ebml.read_element_header().unwrap();
            result = ebml.enter_master(&header);
            if result.is_err() {
                break;
            }
        }

        assert!(matches!(result, Err(Error::LimitError(_))));
        assert_eq!(ebml.level(), 9);
    }

    #[test]
    fn verify_read_master() {
        // Tracks { TrackEntry { TrackNumber, CodecId }, TrackEntry { }, TrackEntry { TrackNumber } }
        let data = [
            master(
                0x1654AE6B,
                &[
                    master(0xAE, &[uint(0xD7, 1), string(0x86, "V_VP8")]),
                    master(0xAE, &[]),
                    master(0xAE, &[uint(0xD7, 3)]),
                ],
            ),
            uint(0xE7, 5),
        ]
        .concat();

        let mut ebml = parser(data);
        let tracks = ebml.read_element_header().unwrap();

        let mut entries = 0;
        let mut numbers = Vec::new();
        ebml.read_master(&tracks, |ebml, entry| {
            assert_eq!(entry.etype, ElementType::TrackEntry);
            entries += 1;
            ebml.read_master(entry, |ebml, child| {
                match child.etype {
                    ElementType::TrackNumber => numbers.push(ebml.read_uint(child)?),
                    _ => ebml.skip(child)?,
                }
                Ok(())
            })
        })
        .unwrap();

        assert_eq!(entries, 3);
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(ebml.next_sibling_level(&tracks), 0);

        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.read_uint(&header).unwrap(), 5);
    }

    #[test]
    fn verify_snapshot_restore() {
        let mut ebml = parser(master(0x18538067, &[uint(0xE7, 1)]));
        let header = ebml.read_element_header().unwrap();
        ebml.enter_master(&header).unwrap();

        let saved = ebml.snapshot();
        ebml.set_level(0);
        assert_eq!(ebml.level(), 0);
        ebml.restore(saved);
        assert_eq!(ebml.level(), 1);
    }

    #[test]
    fn verify_scalar_reads() {
        let data = [
            uint(0xD7, 0x1234),
            elem(0xD7, &[0; 9]),
            elem(0xB5, &48000f32.to_be_bytes()),
            float(0xB5, 44100.0),
            elem(0xB5, &[0; 10]),
            string(0x86, "A_AAC\0\0"),
            elem(0x63A2, &[1, 2, 3]),
        ]
        .concat();

        let mut ebml = parser(data);

        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.read_uint(&header).unwrap(), 0x1234);

        let header = ebml.read_element_header().unwrap();
        assert!(ebml.read_uint(&header).is_err());
        ebml.skip(&header).unwrap();

        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.read_float(&header).unwrap(), 48000.0);

        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.read_float(&header).unwrap(), 44100.0);

        let header = ebml.read_element_header().unwrap();
        assert!(matches!(ebml.read_float(&header), Err(Error::Unsupported(_))));

        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.read_ascii(&header).unwrap(), "A_AAC");

        let header = ebml.read_element_header().unwrap();
        assert_eq!(&ebml.read_binary(&header).unwrap()[..], &[1, 2, 3]);
    }

    #[test]
    fn verify_oversized_string_is_skipped() {
        let long = "x".repeat(5000);
        let data = [string(0x7BA9, &long), uint(0xD7, 7)].concat();

        let mut ebml = parser(data);
        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.alloc_read_ascii(&header).unwrap(), None);

        let header = ebml.read_element_header().unwrap();
        assert_eq!(ebml.read_uint(&header).unwrap(), 7);
    }

    #[test]
    fn verify_check_header() {
        let mut ebml = parser(ebml_header("webm"));
        let header = ebml.check_header().unwrap();
        assert_eq!(header.doctype.as_deref(), Some("webm"));
        assert_eq!(header.doctype_read_version, 2);
        assert_eq!(ebml.level(), 0);

        assert!(matches!(parser(ebml_header("avi")).check_header(), Err(Error::Unsupported(_))));

        let bad_version = master(0x1A45DFA3, &[uint(0x42F7, 2), string(0x4282, "matroska")]);
        assert!(matches!(parser(bad_version).check_header(), Err(Error::Unsupported(_))));

        assert!(matches!(parser(uint(0xD7, 1)).check_header(), Err(Error::DecodeError(_))));
    }
}
