// Mkvdemux Probe Tool
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::fs::File;
use std::path::PathBuf;

use mkvdemux_core::buffer::Buffer;
use mkvdemux_core::errors::{Error, Result};
use mkvdemux_core::formats::{DemuxStatus, Demuxer, FormatOptions};
use mkvdemux_core::io::SourceStream;
use mkvdemux_core::sink::{ControlSink, FrameSink, StreamCategory, StreamInfo};
use mkvdemux_format_mkv::{Edition, MkvDemuxer, NavigationEvent, Track};

use clap::Parser;
use log::{error, info, warn};
use serde::Serialize;

/// Key padding of printed key-value pairs.
const PAD: usize = 20;

#[derive(Parser, Debug)]
#[command(name = "mkvdemux-probe", version, about = "Inspect and demux Matroska and WebM files")]
struct Args {
    /// The input file path
    input: PathBuf,

    /// Seek to the time in milliseconds before demuxing
    #[arg(long, value_name = "MS", conflicts_with = "seek_pos")]
    seek_time: Option<i64>,

    /// Seek to the position, normalized to 0..=65535 over the file length, before demuxing
    #[arg(long, value_name = "POS", value_parser = clap::value_parser!(u32).range(0..=65535))]
    seek_pos: Option<u32>,

    /// The number of chunks to demux
    #[arg(long, value_name = "N", default_value_t = 16)]
    chunks: usize,

    /// Request a jump to the next chapter before demuxing
    #[arg(long)]
    next_chapter: bool,

    /// Print one JSON object per line instead of a listing
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TrackRecord<'a> {
    number: u64,
    kind: String,
    codec_id: Option<&'a str>,
    stream_type: Option<String>,
    language: Option<&'a str>,
    default_duration: u64,
}

#[derive(Serialize)]
struct BufferRecord {
    category: &'static str,
    stream_type: String,
    flags: Vec<&'static str>,
    pts: i64,
    duration: i64,
    len: usize,
    normpos: u32,
}

/// A sink that prints everything it receives.
struct PrintSink {
    json: bool,
    title: Option<String>,
    n_buffers: usize,
}

impl PrintSink {
    fn new(json: bool, title: Option<String>) -> Self {
        PrintSink { json, title, n_buffers: 0 }
    }
}

impl FrameSink for PrintSink {
    fn put(&mut self, category: StreamCategory, buf: Buffer) {
        self.n_buffers += 1;

        let category = match category {
            StreamCategory::Video => "video",
            StreamCategory::Audio => "audio",
        };

        if self.json {
            let record = BufferRecord {
                category,
                stream_type: buf.stream_type.to_string(),
                flags: buf.flags.iter_names().map(|(name, _)| name).collect(),
                pts: buf.pts,
                duration: buf.duration,
                len: buf.data.len(),
                normpos: buf.extra.input_normpos,
            };

            match serde_json::to_string(&record) {
                Ok(line) => println!("{}", line),
                Err(err) => warn!("failed to serialize buffer: {}", err),
            }
        }
        else {
            println!(
                "| {:<5} {:<24} pts={:<12} dur={:<8} len={:<8} {:?}",
                category,
                buf.stream_type.to_string(),
                buf.pts,
                buf.duration,
                buf.data.len(),
                buf.flags,
            );
        }
    }
}

impl ControlSink for PrintSink {
    fn set_title(&mut self, title: &str) {
        if !self.json && self.title.as_deref() != Some(title) {
            println!("| title: {}", title);
        }
        self.title = Some(title.to_string());
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn set_stream_info(&mut self, info: StreamInfo) {
        if !self.json {
            println!("| stream info: {:?}", info);
        }
    }

    fn new_pts(&mut self, pts: i64, seek: bool) {
        if !self.json {
            println!("| new pts: {} (seek: {})", pts, seek);
        }
    }

    fn flush(&mut self) {
        if !self.json {
            println!("| flush");
        }
    }
}

fn main() {
    pretty_env_logger::init();

    let args = Args::parse();

    // For any error, return an exit code -1. Otherwise return the exit code provided.
    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            -1
        }
    };

    std::process::exit(code)
}

fn run(args: &Args) -> Result<i32> {
    let file = File::open(&args.input)?;
    let source = SourceStream::new(Box::new(file), Default::default());

    let mut demuxer = MkvDemuxer::try_new(source, &FormatOptions::default())?;

    // The file name is the title until the stream provides one.
    let file_name = args.input.file_name().map(|name| name.to_string_lossy().into_owned());
    let mut sink = PrintSink::new(args.json, file_name);

    if !args.json {
        println!("+ {}", args.input.display());
        print_blank();
        print_header("Headers");
    }

    demuxer.send_headers(&mut sink)?;

    if args.json {
        print_tracks_json(demuxer.tracks());
    }
    else {
        print_format(&demuxer);
    }

    if args.seek_time.is_some() || args.seek_pos.is_some() {
        let pos = args.seek_pos.unwrap_or(0);
        let time = args.seek_time.unwrap_or(0);

        match demuxer.seek(pos, time, false, &mut sink) {
            Ok(()) => info!("seeked to position {} time {} ms", pos, time),
            Err(Error::SeekError(kind)) => warn!("seek failed: {}", Error::SeekError(kind)),
            Err(err) => return Err(err),
        }
    }

    if args.next_chapter && demuxer.event_sender().send(NavigationEvent::NextChapter).is_err() {
        warn!("chapter navigation is unavailable");
    }

    if !args.json {
        print_blank();
        print_header("Buffers");
    }

    for _ in 0..args.chunks {
        if demuxer.send_chunk(&mut sink)? == DemuxStatus::Finished {
            break;
        }
    }

    if !args.json {
        print_blank();
        print_pair("Buffers:", &sink.n_buffers, Bullet::None, 1);
        print_pair("Status:", &format!("{:?}", demuxer.status()), Bullet::None, 1);
        println!(":");
        println!();
    }

    Ok(0)
}

fn print_format(demuxer: &MkvDemuxer) {
    let info = demuxer.info();

    print_blank();
    print_header("Segment");
    if let Some(title) = &info.title {
        print_pair("Title:", title, Bullet::None, 1);
    }
    print_pair("Timestamp Scale:", &info.timecode_scale, Bullet::None, 1);
    print_pair("Duration:", &fmt_ms(demuxer.stream_length()), Bullet::None, 1);
    print_pair("Capabilities:", &format!("{:?}", demuxer.capabilities()), Bullet::None, 1);
    print_pair("Cue Indexes:", &demuxer.cues().iter().count(), Bullet::None, 1);

    print_tracks(demuxer.tracks());
    print_editions(demuxer.editions());
}

fn print_tracks(tracks: &[Track]) {
    if tracks.is_empty() {
        return;
    }

    print_blank();
    print_header("Tracks");

    for (idx, track) in tracks.iter().enumerate() {
        print_pair("Track Number:", &track.number, Bullet::Num(idx + 1), 1);
        print_pair("Track Type:", &format!("{:?}", track.kind), Bullet::None, 1);
        print_pair("Codec ID:", &track.codec_id.as_deref().unwrap_or("-"), Bullet::None, 1);

        match track.stream_type {
            Some(stream_type) if track.is_routed() => {
                print_pair("Stream Type:", &stream_type, Bullet::None, 1)
            }
            _ => print_pair("Stream Type:", &"(unsupported)", Bullet::None, 1),
        }

        if let Some(language) = &track.language {
            print_pair("Language:", language, Bullet::None, 1);
        }
        if track.default_duration > 0 {
            let duration = format!("{} ns", track.default_duration);
            print_pair("Frame Duration:", &duration, Bullet::None, 1);
        }
        if let Some(video) = &track.video {
            print_pair(
                "Frame Size:",
                &format!("{}x{}", video.pixel_width, video.pixel_height),
                Bullet::None,
                1,
            );
        }
        if let Some(audio) = &track.audio {
            print_pair("Sample Rate:", &audio.sampling_freq, Bullet::None, 1);
            print_pair("Channels:", &audio.channels, Bullet::None, 1);
        }
    }
}

fn print_editions(editions: &[Edition]) {
    if editions.is_empty() {
        return;
    }

    print_blank();
    print_header("Chapters");

    for (idx, edition) in editions.iter().enumerate() {
        print_pair("Edition:", &format!("{:#x}", edition.uid), Bullet::Num(idx + 1), 1);

        for (i, chapter) in edition.chapters.iter().enumerate() {
            print_pair("Title:", &chapter.title, Bullet::Num(i + 1), 2);
            // Chapter times are in 90kHz ticks.
            print_pair("Start Time:", &fmt_ms(chapter.time_start / 90), Bullet::None, 2);
            print_pair("End Time:", &fmt_ms(chapter.time_end / 90), Bullet::None, 2);
            print_pair("Language:", &chapter.language, Bullet::None, 2);
        }
    }
}

fn print_tracks_json(tracks: &[Track]) {
    for track in tracks {
        let record = TrackRecord {
            number: track.number,
            kind: format!("{:?}", track.kind),
            codec_id: track.codec_id.as_deref(),
            stream_type: track.stream_type.map(|st| st.to_string()),
            language: track.language.as_deref(),
            default_duration: track.default_duration,
        };

        match serde_json::to_string(&record) {
            Ok(line) => println!("{}", line),
            Err(err) => warn!("failed to serialize track: {}", err),
        }
    }
}

enum Bullet {
    /// No bullet.
    None,
    /// A numbered bullet.
    Num(usize),
}

impl std::fmt::Display for Bullet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The bullet must occupy 4 characters.
        match self {
            Bullet::None => write!(f, "    "),
            Bullet::Num(num) => write!(f, "[{:0>2}]", num),
        }
    }
}

/// Print a key-value pair as a plain or numbered list item in a hierarchical list.
fn print_pair<T>(key: &str, value: &T, bullet: Bullet, depth: usize)
where
    T: std::fmt::Display + ?Sized,
{
    let indent = 5 * depth;
    // The format is: "|<INDENT><BULLET> <KEY> <VALUE>"
    println!("|{:indent$}{} {:<PAD$} {}", "", bullet, key, value)
}

/// Print a list header.
fn print_header(title: &str) {
    println!("| // {} //", title)
}

/// Print a blank list line.
fn print_blank() {
    println!("|")
}

fn fmt_ms(ms: u64) -> String {
    let hours = ms / (60 * 60 * 1000);
    let mins = (ms % (60 * 60 * 1000)) / (60 * 1000);
    let secs = (ms % (60 * 1000)) / 1000;
    let millis = ms % 1000;

    format!("{}:{:0>2}:{:0>2}.{:0>3}", hours, mins, secs, millis)
}
