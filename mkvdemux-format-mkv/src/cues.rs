// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mkvdemux_core::errors::Result;

use crate::ebml::{EbmlParser, ElementHeader};
use crate::element_ids::ElementType;

/// The seek points of a single track, in the order the file lists them.
#[derive(Clone, Debug, Default)]
pub struct CueIndex {
    pub track_num: u64,
    /// Absolute stream positions of the clusters containing each seek point.
    pub pos: Vec<u64>,
    /// Timestamps of each seek point. Stored in timestamp scale units as read, and in
    /// milliseconds once [`CueIndexes::rescale`] was applied.
    pub timecode: Vec<u64>,
}

impl CueIndex {
    fn new(track_num: u64) -> Self {
        CueIndex { track_num, ..Default::default() }
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Finds the entry to seek to. A non-zero `start_pos` takes precedence over `start_time`.
    ///
    /// For a position, this is the last entry whose cluster starts at or before the position.
    /// For a time, this is the last entry whose timestamp is at or before the time. Requests
    /// before the first or after the last entry are clamped to the first or last entry.
    pub fn binary_seek(&self, start_pos: u64, start_time: u64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        let last = self.len() - 1;

        if start_pos != 0 {
            if start_pos <= self.pos[0] {
                return Some(0);
            }
            if start_pos >= self.pos[last] {
                return Some(last);
            }

            let mut left = 0;
            let mut right = last;

            while left < right {
                let middle = (left + right + 1) / 2;
                if start_pos >= self.pos[middle] && start_pos < self.pos[middle + 1] {
                    return Some(middle);
                }
                else if start_pos < self.pos[middle] {
                    right = middle - 1;
                }
                else {
                    left = middle;
                }
            }

            // Only reachable if the positions are not in ascending order.
            Some(left)
        }
        else {
            if start_time <= self.timecode[0] {
                return Some(0);
            }
            if start_time >= self.timecode[last] {
                return Some(last);
            }

            let mut left = 0;
            let mut right = last;

            while left < right {
                let middle = (left + right + 1) / 2;
                if start_time < self.timecode[middle] {
                    right = middle - 1;
                }
                else {
                    left = middle;
                }
            }

            Some(left)
        }
    }
}

/// The seek index of a stream: one [`CueIndex`] per track, in order of first appearance.
#[derive(Clone, Debug, Default)]
pub struct CueIndexes {
    indexes: Vec<CueIndex>,
    rescaled: bool,
}

impl CueIndexes {
    pub fn iter(&self) -> impl Iterator<Item = &CueIndex> {
        self.indexes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    fn add(&mut self, track_num: u64, timecode: u64, pos: u64) {
        let idx = match self.indexes.iter().position(|index| index.track_num == track_num) {
            Some(idx) => idx,
            None => {
                self.indexes.push(CueIndex::new(track_num));
                self.indexes.len() - 1
            }
        };

        let index = &mut self.indexes[idx];
        index.pos.push(pos);
        index.timecode.push(timecode);
    }

    /// Converts every seek point timestamp to milliseconds. Only the first call has an effect.
    pub(crate) fn rescale(&mut self, timecode_scale: u64) {
        if self.rescaled {
            return;
        }
        self.rescaled = true;

        for index in self.indexes.iter_mut() {
            for tc in index.timecode.iter_mut() {
                *tc = tc.saturating_mul(timecode_scale) / 1_000_000;
            }
        }
    }

    /// Reads the children of a Cues element.
    pub(crate) fn read(
        &mut self,
        ebml: &mut EbmlParser,
        header: &ElementHeader,
        segment_start: u64,
    ) -> Result<()> {
        ebml.read_master(header, |ebml, child| match child.etype {
            ElementType::CuePoint => self.read_cue_point(ebml, child, segment_start),
            _ => ebml.skip(child),
        })
    }

    fn read_cue_point(
        &mut self,
        ebml: &mut EbmlParser,
        header: &ElementHeader,
        segment_start: u64,
    ) -> Result<()> {
        let mut timecode = None;
        let mut track_num = None;
        let mut pos = None;

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::CueTime => timecode = Some(ebml.read_uint(child)?),
                ElementType::CueTrackPositions => {
                    ebml.read_master(child, |ebml, child| {
                        match child.etype {
                            ElementType::CueTrack => track_num = Some(ebml.read_uint(child)?),
                            ElementType::CueClusterPosition => {
                                let offset = ebml.read_uint(child)?;
                                pos = segment_start.checked_add(offset);
                                if pos.is_none() {
                                    log::warn!("mkv: cue cluster position {} out of range", offset);
                                }
                            }
                            _ => ebml.skip(child)?,
                        }
                        Ok(())
                    })?;
                }
                _ => ebml.skip(child)?,
            }
            Ok(())
        })?;

        if let (Some(timecode), Some(track_num), Some(pos)) = (timecode, track_num, pos) {
            self.add(track_num, timecode, pos);
        }

        Ok(())
    }
}
