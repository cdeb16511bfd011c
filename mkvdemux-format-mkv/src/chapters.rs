// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use mkvdemux_core::errors::Result;

use crate::ebml::{EbmlParser, ElementHeader};
use crate::element_ids::ElementType;

/// Converts a chapter time in nanoseconds to 90kHz ticks.
fn chapter_time(ns: u64) -> u64 {
    ns / 100000 * 9
}

/// A chapter of an edition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chapter {
    pub uid: u64,
    /// Start time in 90kHz ticks.
    pub time_start: u64,
    /// End time in 90kHz ticks.
    pub time_end: u64,
    pub hidden: bool,
    pub enabled: bool,
    pub title: String,
    pub language: String,
    pub country: String,
}

/// A single title of a chapter, in one language.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ChapterDisplay {
    title: Option<String>,
    language: Option<String>,
    country: Option<String>,
}

impl ChapterDisplay {
    fn is_english(&self) -> bool {
        self.language.as_deref() == Some("eng")
    }

    /// Picks the display to keep for a chapter with several titles. The first display wins,
    /// unless a later one is in English and the kept one is not.
    fn merge(kept: Option<ChapterDisplay>, next: ChapterDisplay) -> ChapterDisplay {
        match kept {
            None => next,
            Some(kept) if next.is_english() && !kept.is_english() => next,
            Some(kept) => kept,
        }
    }

    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<Self> {
        let mut display = ChapterDisplay::default();

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::ChapString => display.title = ebml.alloc_read_ascii(child)?,
                ElementType::ChapLanguage => display.language = ebml.alloc_read_ascii(child)?,
                ElementType::ChapCountry => display.country = ebml.alloc_read_ascii(child)?,
                _ => {
                    log::debug!("mkv: unhandled element {:#x} in chapter display", child.id);
                    ebml.skip(child)?
                }
            }
            Ok(())
        })?;

        Ok(display)
    }
}

impl Chapter {
    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<Self> {
        let mut uid = 0;
        let mut time_start = 0;
        let mut time_end = 0;
        let mut hidden = false;
        let mut enabled = true;
        let mut display = None;

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::ChapterUid => uid = ebml.read_uint(child)?,
                ElementType::ChapterTimeStart => time_start = chapter_time(ebml.read_uint(child)?),
                ElementType::ChapterTimeEnd => time_end = chapter_time(ebml.read_uint(child)?),
                ElementType::ChapterFlagHidden => hidden = ebml.read_uint(child)? != 0,
                ElementType::ChapterFlagEnabled => enabled = ebml.read_uint(child)? != 0,
                ElementType::ChapterDisplay => {
                    let next = ChapterDisplay::read(ebml, child)?;
                    display = Some(ChapterDisplay::merge(display.take(), next));
                }
                ElementType::ChapterAtom => {
                    log::warn!("mkv: nested chapters are not supported, playback may suffer");
                    ebml.skip(child)?;
                }
                ElementType::ChapterTrack => {
                    log::warn!(
                        "mkv: track specific chapters are not supported, playback may suffer"
                    );
                    ebml.skip(child)?;
                }
                _ => {
                    log::debug!("mkv: unhandled element {:#x} in chapter atom", child.id);
                    ebml.skip(child)?;
                }
            }
            Ok(())
        })?;

        let display = display.unwrap_or_default();

        Ok(Chapter {
            uid,
            time_start,
            time_end,
            hidden,
            enabled,
            title: display.title.unwrap_or_else(|| "No title".to_string()),
            language: display.language.unwrap_or_else(|| "unk".to_string()),
            country: display.country.unwrap_or_else(|| "XX".to_string()),
        })
    }
}

/// An edition, one alternative set of chapters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Edition {
    pub uid: u64,
    pub hidden: bool,
    pub is_default: bool,
    pub ordered: bool,
    pub chapters: Vec<Chapter>,
}

impl Edition {
    fn read(ebml: &mut EbmlParser, header: &ElementHeader) -> Result<Self> {
        let mut edition = Edition::default();

        ebml.read_master(header, |ebml, child| {
            match child.etype {
                ElementType::EditionUid => edition.uid = ebml.read_uint(child)?,
                ElementType::EditionFlagHidden => edition.hidden = ebml.read_uint(child)? != 0,
                ElementType::EditionFlagDefault => {
                    edition.is_default = ebml.read_uint(child)? != 0
                }
                ElementType::EditionFlagOrdered => edition.ordered = ebml.read_uint(child)? != 0,
                ElementType::ChapterAtom => edition.chapters.push(Chapter::read(ebml, child)?),
                _ => {
                    log::debug!("mkv: unhandled element {:#x} in edition entry", child.id);
                    ebml.skip(child)?
                }
            }
            Ok(())
        })?;

        edition.log_summary();
        Ok(edition)
    }

    fn log_summary(&self) {
        let not = |flag: bool| if flag { "" } else { "not " };

        log::info!(
            "mkv: edition {:#x}: {}hidden, {}default, {}ordered. {} chapters",
            self.uid,
            not(self.hidden),
            not(self.is_default),
            not(self.ordered),
            self.chapters.len()
        );

        for (i, chap) in self.chapters.iter().enumerate() {
            log::info!(
                "mkv:  chapter {}: {}-{} (pts), {} ({}). {}hidden, {}enabled",
                i + 1,
                chap.time_start,
                chap.time_end,
                chap.title,
                chap.language,
                not(chap.hidden),
                not(chap.enabled)
            );
        }
    }

    /// Finds the chapter playing at a cluster timestamp. This is the last chapter that starts
    /// before the timestamp, or the first chapter.
    pub fn chapter_at(&self, timecode: u64, timecode_scale: u64) -> Option<usize> {
        if self.chapters.is_empty() {
            return None;
        }

        let ts = chapter_time(timecode.saturating_mul(timecode_scale));

        let idx = self.chapters.iter().take_while(|chap| ts > chap.time_start).count();
        Some(idx.saturating_sub(1))
    }
}

/// Reads the editions of a Chapters element.
pub(crate) fn read_chapters(
    ebml: &mut EbmlParser,
    header: &ElementHeader,
    editions: &mut Vec<Edition>,
) -> Result<()> {
    ebml.read_master(header, |ebml, child| {
        match child.etype {
            ElementType::EditionEntry => editions.push(Edition::read(ebml, child)?),
            _ => {
                log::debug!("mkv: unhandled element {:#x} in chapters", child.id);
                ebml.skip(child)?
            }
        }
        Ok(())
    })
}

/// Finds the chapter of the first edition playing at a cluster timestamp.
pub(crate) fn chapter_lookup(
    editions: &[Edition],
    timecode: u64,
    timecode_scale: u64,
) -> Option<usize> {
    editions.first()?.chapter_at(timecode, timecode_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ebml::tests::{master, parser, string, uint};

    fn display(title: &str, lang: &str, country: &str) -> Vec<u8> {
        master(0x80, &[string(0x85, title), string(0x437C, lang), string(0x437E, country)])
    }

    fn read_one_chapter(children: &[Vec<u8>]) -> Chapter {
        let mut ebml = parser(master(0xB6, children));
        let header = ebml.read_element_header().unwrap();
        Chapter::read(&mut ebml, &header).unwrap()
    }

    fn chapter(time_start: u64) -> Chapter {
        Chapter {
            uid: 0,
            time_start,
            time_end: 0,
            hidden: false,
            enabled: true,
            title: String::new(),
            language: String::new(),
            country: String::new(),
        }
    }

    #[test]
    fn verify_later_english_title_wins() {
        let chap = read_one_chapter(&[display("A", "fra", "FR"), display("B", "eng", "US")]);
        assert_eq!((chap.title.as_str(), chap.language.as_str(), chap.country.as_str()), ("B", "eng", "US"));
    }

    #[test]
    fn verify_first_english_title_is_kept() {
        let chap = read_one_chapter(&[display("A", "eng", "US"), display("B", "eng", "FR")]);
        assert_eq!((chap.title.as_str(), chap.language.as_str(), chap.country.as_str()), ("A", "eng", "US"));
    }

    #[test]
    fn verify_chapter_defaults() {
        let chap = read_one_chapter(&[
            uint(0x73C4, 7),
            uint(0x91, 1_000_000_000),
            uint(0x92, 2_000_099_999),
            // Nested atoms are skipped.
            master(0xB6, &[uint(0x73C4, 8)]),
        ]);

        assert_eq!(chap.uid, 7);
        assert_eq!(chap.time_start, 90000);
        assert_eq!(chap.time_end, 180000);
        assert!(!chap.hidden);
        assert!(chap.enabled);
        assert_eq!(chap.title, "No title");
        assert_eq!(chap.language, "unk");
        assert_eq!(chap.country, "XX");
    }

    #[test]
    fn verify_read_chapters() {
        let data = master(
            0x1043A770,
            &[
                master(
                    0x45B9,
                    &[
                        uint(0x45BC, 1),
                        uint(0x45DB, 1),
                        master(0xB6, &[uint(0x91, 0), display("Intro", "eng", "US")]),
                        master(0xB6, &[uint(0x91, 60_000_000_000), uint(0x98, 1)]),
                    ],
                ),
                master(0x45B9, &[uint(0x45BC, 2), uint(0x45BD, 1)]),
            ],
        );

        let mut ebml = parser(data);
        let header = ebml.read_element_header().unwrap();
        let mut editions = Vec::new();
        read_chapters(&mut ebml, &header, &mut editions).unwrap();

        assert_eq!(editions.len(), 2);
        assert_eq!(editions[0].uid, 1);
        assert!(editions[0].is_default);
        assert_eq!(editions[0].chapters.len(), 2);
        assert_eq!(editions[0].chapters[0].title, "Intro");
        assert_eq!(editions[0].chapters[1].time_start, 5_400_000);
        assert!(editions[0].chapters[1].hidden);
        assert!(editions[1].hidden);
        assert!(editions[1].chapters.is_empty());
    }

    #[test]
    fn verify_chapter_lookup() {
        let edition = Edition {
            chapters: vec![chapter(0), chapter(90000), chapter(180000)],
            ..Default::default()
        };
        let editions = vec![edition];

        assert_eq!(chapter_lookup(&[], 0, 1_000_000), None);
        assert_eq!(chapter_lookup(&editions, 0, 1_000_000), Some(0));
        assert_eq!(chapter_lookup(&editions, 500, 1_000_000), Some(0));
        // A timestamp exactly at a chapter start still reports the previous chapter.
        assert_eq!(chapter_lookup(&editions, 1000, 1_000_000), Some(0));
        assert_eq!(chapter_lookup(&editions, 1001, 1_000_000), Some(1));
        assert_eq!(chapter_lookup(&editions, 99999, 1_000_000), Some(2));

        let empty = vec![Edition::default()];
        assert_eq!(chapter_lookup(&empty, 1000, 1_000_000), None);

        // Timestamps beyond the range of a nanosecond count fall in the last chapter.
        assert_eq!(chapter_lookup(&editions, 1 << 45, 1_000_000), Some(2));
        assert_eq!(chapter_lookup(&editions, u64::MAX, u64::MAX), Some(2));
    }
}
