// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;

use lazy_static::lazy_static;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ElementType {
    Ebml,
    EbmlVersion,
    EbmlReadVersion,
    EbmlMaxIdLength,
    EbmlMaxSizeLength,
    DocType,
    DocTypeVersion,
    DocTypeReadVersion,
    Crc32,
    Void,
    Segment,
    SeekHead,
    Seek,
    SeekId,
    SeekPosition,
    Info,
    TimestampScale,
    Duration,
    Title,
    Cluster,
    Timestamp,
    ClusterDuration,
    SimpleBlock,
    BlockGroup,
    Block,
    BlockDuration,
    ReferenceBlock,
    Tracks,
    TrackEntry,
    TrackNumber,
    TrackUid,
    TrackType,
    FlagDefault,
    DefaultDuration,
    Language,
    CodecId,
    CodecPrivate,
    Video,
    FlagInterlaced,
    PixelWidth,
    PixelHeight,
    DisplayWidth,
    DisplayHeight,
    Audio,
    SamplingFrequency,
    OutputSamplingFrequency,
    Channels,
    BitDepth,
    ContentEncodings,
    ContentEncoding,
    ContentEncodingOrder,
    ContentEncodingScope,
    ContentEncodingType,
    ContentCompression,
    ContentCompAlgo,
    ContentCompSettings,
    ContentEncryption,
    Attachments,
    Cues,
    CuePoint,
    CueTime,
    CueTrackPositions,
    CueTrack,
    CueClusterPosition,
    Chapters,
    EditionEntry,
    EditionUid,
    EditionFlagHidden,
    EditionFlagDefault,
    EditionFlagOrdered,
    ChapterAtom,
    ChapterUid,
    ChapterTimeStart,
    ChapterTimeEnd,
    ChapterFlagHidden,
    ChapterFlagEnabled,
    ChapterTrack,
    ChapterDisplay,
    ChapString,
    ChapLanguage,
    ChapCountry,
    Tags,
    /// Special type for unknown tags.
    Unknown,
}

impl ElementType {
    /// Returns `true` for elements that may only appear as direct children of a Segment.
    pub(crate) fn is_top_level(&self) -> bool {
        matches!(
            self,
            ElementType::Cluster
                | ElementType::Cues
                | ElementType::Info
                | ElementType::SeekHead
                | ElementType::Tags
                | ElementType::Tracks
                | ElementType::Chapters
                | ElementType::Attachments
        )
    }
}

lazy_static! {
    static ref ELEMENTS: HashMap<u32, ElementType> = {
        let mut elems = HashMap::new();
        elems.insert(0x1A45DFA3, ElementType::Ebml);
        elems.insert(0x4286, ElementType::EbmlVersion);
        elems.insert(0x42F7, ElementType::EbmlReadVersion);
        elems.insert(0x42F2, ElementType::EbmlMaxIdLength);
        elems.insert(0x42F3, ElementType::EbmlMaxSizeLength);
        elems.insert(0x4282, ElementType::DocType);
        elems.insert(0x4287, ElementType::DocTypeVersion);
        elems.insert(0x4285, ElementType::DocTypeReadVersion);
        elems.insert(0xBF, ElementType::Crc32);
        elems.insert(0xEC, ElementType::Void);
        elems.insert(0x18538067, ElementType::Segment);
        elems.insert(0x114D9B74, ElementType::SeekHead);
        elems.insert(0x4DBB, ElementType::Seek);
        elems.insert(0x53AB, ElementType::SeekId);
        elems.insert(0x53AC, ElementType::SeekPosition);
        elems.insert(0x1549A966, ElementType::Info);
        elems.insert(0x2AD7B1, ElementType::TimestampScale);
        elems.insert(0x4489, ElementType::Duration);
        elems.insert(0x7BA9, ElementType::Title);
        elems.insert(0x1F43B675, ElementType::Cluster);
        elems.insert(0xE7, ElementType::Timestamp);
        elems.insert(0xCF, ElementType::ClusterDuration);
        elems.insert(0xA3, ElementType::SimpleBlock);
        elems.insert(0xA0, ElementType::BlockGroup);
        elems.insert(0xA1, ElementType::Block);
        elems.insert(0x9B, ElementType::BlockDuration);
        elems.insert(0xFB, ElementType::ReferenceBlock);
        elems.insert(0x1654AE6B, ElementType::Tracks);
        elems.insert(0xAE, ElementType::TrackEntry);
        elems.insert(0xD7, ElementType::TrackNumber);
        elems.insert(0x73C5, ElementType::TrackUid);
        elems.insert(0x83, ElementType::TrackType);
        elems.insert(0x88, ElementType::FlagDefault);
        elems.insert(0x23E383, ElementType::DefaultDuration);
        elems.insert(0x22B59C, ElementType::Language);
        elems.insert(0x86, ElementType::CodecId);
        elems.insert(0x63A2, ElementType::CodecPrivate);
        elems.insert(0xE0, ElementType::Video);
        elems.insert(0x9A, ElementType::FlagInterlaced);
        elems.insert(0xB0, ElementType::PixelWidth);
        elems.insert(0xBA, ElementType::PixelHeight);
        elems.insert(0x54B0, ElementType::DisplayWidth);
        elems.insert(0x54BA, ElementType::DisplayHeight);
        elems.insert(0xE1, ElementType::Audio);
        elems.insert(0xB5, ElementType::SamplingFrequency);
        elems.insert(0x78B5, ElementType::OutputSamplingFrequency);
        elems.insert(0x9F, ElementType::Channels);
        elems.insert(0x6264, ElementType::BitDepth);
        elems.insert(0x6D80, ElementType::ContentEncodings);
        elems.insert(0x6240, ElementType::ContentEncoding);
        elems.insert(0x5031, ElementType::ContentEncodingOrder);
        elems.insert(0x5032, ElementType::ContentEncodingScope);
        elems.insert(0x5033, ElementType::ContentEncodingType);
        elems.insert(0x5034, ElementType::ContentCompression);
        elems.insert(0x4254, ElementType::ContentCompAlgo);
        elems.insert(0x4255, ElementType::ContentCompSettings);
        elems.insert(0x5035, ElementType::ContentEncryption);
        elems.insert(0x1941A469, ElementType::Attachments);
        elems.insert(0x1C53BB6B, ElementType::Cues);
        elems.insert(0xBB, ElementType::CuePoint);
        elems.insert(0xB3, ElementType::CueTime);
        elems.insert(0xB7, ElementType::CueTrackPositions);
        elems.insert(0xF7, ElementType::CueTrack);
        elems.insert(0xF1, ElementType::CueClusterPosition);
        elems.insert(0x1043A770, ElementType::Chapters);
        elems.insert(0x45B9, ElementType::EditionEntry);
        elems.insert(0x45BC, ElementType::EditionUid);
        elems.insert(0x45BD, ElementType::EditionFlagHidden);
        elems.insert(0x45DB, ElementType::EditionFlagDefault);
        elems.insert(0x45DD, ElementType::EditionFlagOrdered);
        elems.insert(0xB6, ElementType::ChapterAtom);
        elems.insert(0x73C4, ElementType::ChapterUid);
        elems.insert(0x91, ElementType::ChapterTimeStart);
        elems.insert(0x92, ElementType::ChapterTimeEnd);
        elems.insert(0x98, ElementType::ChapterFlagHidden);
        elems.insert(0x4598, ElementType::ChapterFlagEnabled);
        elems.insert(0x8F, ElementType::ChapterTrack);
        elems.insert(0x80, ElementType::ChapterDisplay);
        elems.insert(0x85, ElementType::ChapString);
        elems.insert(0x437C, ElementType::ChapLanguage);
        elems.insert(0x437E, ElementType::ChapCountry);
        elems.insert(0x1254C367, ElementType::Tags);
        elems
    };
}

/// Gets the element type of an element ID. IDs missing from the table map to
/// [`ElementType::Unknown`] and are skipped by every parser.
pub(crate) fn element_type(id: u32) -> ElementType {
    ELEMENTS.get(&id).copied().unwrap_or(ElementType::Unknown)
}

/// The element ID of a Cluster, as written in SeekHead entries.
pub(crate) const CLUSTER_ID: u64 = 0x1F43B675;

#[cfg(test)]
mod tests {
    use super::{element_type, ElementType};

    #[test]
    fn verify_element_lookup() {
        assert_eq!(element_type(0x18538067), ElementType::Segment);
        assert_eq!(element_type(0xA3), ElementType::SimpleBlock);
        assert_eq!(element_type(0x1F43B675), ElementType::Cluster);
        assert!(element_type(0x1F43B675).is_top_level());
        assert!(!element_type(0xA3).is_top_level());
        assert_eq!(element_type(0x7E5A), ElementType::Unknown);
    }
}
