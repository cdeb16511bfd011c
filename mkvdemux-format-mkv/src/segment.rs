// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use hashbrown::HashSet;

use mkvdemux_core::errors::Result;

use crate::chapters::{read_chapters, Edition};
use crate::cues::CueIndexes;
use crate::ebml::{EbmlParser, ElementHeader};
use crate::element_ids::{ElementType, CLUSTER_ID};
use crate::tracks::TrackTable;

/// The timestamp scale used when a file does not declare one.
pub(crate) const DEFAULT_TIMECODE_SCALE: u64 = 1_000_000;

/// Segment information.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentInfo {
    /// Nanoseconds per timestamp unit.
    pub timecode_scale: u64,
    /// Duration in milliseconds.
    pub duration: u64,
    pub title: Option<String>,
}

impl Default for SegmentInfo {
    fn default() -> Self {
        SegmentInfo { timecode_scale: DEFAULT_TIMECODE_SCALE, duration: 0, title: None }
    }
}

impl SegmentInfo {
    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<Self> {
        let mut timecode_scale = 0;
        let mut duration = 0.0;
        let mut title = None;

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::TimestampScale => timecode_scale = ebml.read_uint(child)?,
                ElementType::Duration => duration = ebml.read_float(child)?,
                ElementType::Title => {
                    if let Some(text) = ebml.alloc_read_ascii(child)? {
                        title = Some(text);
                    }
                }
                _ => {
                    log::debug!("mkv: unhandled element {:#x} in segment info", child.id);
                    ebml.skip(child)?
                }
            }
            Ok(())
        })?;

        if timecode_scale == 0 {
            timecode_scale = DEFAULT_TIMECODE_SCALE;
        }

        let info = SegmentInfo {
            timecode_scale,
            duration: (duration * timecode_scale as f64 / 1_000_000.0) as u64,
            title,
        };

        log::debug!("mkv: {:?}", info);
        Ok(info)
    }
}

/// What a top-level element turned out to be.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TopLevel {
    Parsed,
    /// A Cluster. Clusters are not read while parsing the segment headers.
    Cluster,
}

/// The headers of a segment, everything but the Clusters.
pub(crate) struct Segment {
    /// The Segment element.
    pub header: ElementHeader,
    pub info: SegmentInfo,
    pub tracks: TrackTable,
    pub cues: CueIndexes,
    pub editions: Vec<Edition>,
    /// Positions of the top-level elements already parsed.
    parsed: HashSet<u64>,
    max_streams: usize,
}

impl Segment {
    pub(crate) fn new(header: ElementHeader, max_streams: usize) -> Self {
        Segment {
            header,
            info: Default::default(),
            tracks: Default::default(),
            cues: Default::default(),
            editions: Vec::new(),
            parsed: HashSet::new(),
            max_streams,
        }
    }

    /// Reads the top-level elements of the segment until the first Cluster, or until the end of
    /// the segment. The segment must have been entered.
    pub(crate) fn read_headers(&mut self, ebml: &mut EbmlParser) -> Result<()> {
        let level = ebml.level();
        let mut next_level = level;

        while next_level == level {
            let (top_level, level) = self.read_top_level(ebml)?;
            if top_level == TopLevel::Cluster {
                break;
            }
            next_level = level;
        }

        Ok(())
    }

    /// Reads the top-level element at the current position. An element seen before is skipped.
    /// Returns what the element was, and the level of the element following it.
    pub(crate) fn read_top_level(&mut self, ebml: &mut EbmlParser) -> Result<(TopLevel, usize)> {
        let header = ebml.read_element_header()?;

        if !self.parsed.insert(header.pos) {
            log::debug!("mkv: top-level element {:#x} at {} already parsed", header.id, header.pos);
            ebml.skip(&header)?;
            return Ok((TopLevel::Parsed, ebml.next_sibling_level(&header)));
        }

        match header.etype {
            ElementType::SeekHead => self.read_seek_head(ebml, &header)?,
            ElementType::Info => self.info = SegmentInfo::read(ebml, &header)?,
            ElementType::Tracks => self.tracks.read(ebml, &header, self.max_streams)?,
            ElementType::Chapters => read_chapters(ebml, &header, &mut self.editions)?,
            ElementType::Cues => self.cues.read(ebml, &header, self.header.start)?,
            ElementType::Cluster => {
                // A Cluster of unknown size can not be skipped, but nothing follows it anyway.
                if header.len.is_some() {
                    ebml.skip(&header)?;
                }
                return Ok((TopLevel::Cluster, ebml.level()));
            }
            ElementType::Attachments | ElementType::Tags => {
                log::debug!("mkv: skipping {:?}", header.etype);
                ebml.skip(&header)?;
            }
            _ => {
                log::debug!("mkv: unknown top-level element {:#x}", header.id);
                ebml.skip(&header)?;
            }
        }

        Ok((TopLevel::Parsed, ebml.next_sibling_level(&header)))
    }

    fn read_seek_head(&mut self, ebml: &mut EbmlParser, header: &ElementHeader) -> Result<()> {
        ebml.read_master(header, |ebml, child| match child.etype {
            ElementType::Seek => self.read_seek(ebml, child),
            _ => ebml.skip(child),
        })
    }

    /// Reads a SeekHead entry and parses the top-level element it points to.
    fn read_seek(&mut self, ebml: &mut EbmlParser, header: &ElementHeader) -> Result<()> {
        let mut id = None;
        let mut pos = None;

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::SeekId => id = Some(ebml.read_uint(child)?),
                ElementType::SeekPosition => pos = Some(ebml.read_uint(child)?),
                _ => ebml.skip(child)?,
            }
            Ok(())
        })?;

        if id == Some(CLUSTER_ID) {
            log::trace!("mkv: not following seek entry of a cluster");
            return Ok(());
        }

        let pos = match (id, pos) {
            (Some(_), Some(pos)) => self.header.start.saturating_add(pos),
            _ => {
                log::debug!("mkv: incomplete seek entry");
                return Ok(());
            }
        };

        if pos == 0 || pos >= ebml.byte_len() {
            log::debug!("mkv: out of stream seek position {}", pos);
            return Ok(());
        }

        let stack = ebml.snapshot();
        let current_pos = ebml.pos();

        ebml.set_level(1);
        ebml.seek(pos)?;
        self.read_top_level(ebml)?;

        ebml.restore(stack);
        ebml.seek(current_pos)
    }
}
