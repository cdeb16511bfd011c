// Mkvdemux
// Copyright (c) 2019-2022 The Project Mkvdemux Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parsing of the VobSub `.idx` style text stored as the codec private data of `S_VOBSUB`
//! tracks.

/// The settings of a VobSub track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VobSubInfo {
    pub width: u32,
    pub height: u32,
    /// The colour lookup table, with each entry packed as `y << 16 | u << 8 | v`. Only present
    /// if all 16 entries could be parsed.
    pub palette: Option<[u32; 16]>,
    /// Custom RGB colours, if enabled and all 4 could be parsed.
    pub custom_colors: Option<[u32; 4]>,
    pub forced_only: bool,
}

/// Converts a packed RGB colour to a packed YUV colour.
pub(crate) fn rgb_to_yuv(rgb: u32) -> u32 {
    let r = f64::from((rgb >> 16) & 0xff);
    let g = f64::from((rgb >> 8) & 0xff);
    let b = f64::from(rgb & 0xff);

    let y = ((0.1494 * r + 0.6061 * g + 0.2445 * b) as i32).clamp(0, 0xff) as u32;
    let u = (((0.6066 * r - 0.4322 * g - 0.1744 * b) as i32) + 128).clamp(0, 0xff) as u32;
    let v = (((-0.08435 * r - 0.3422 * g + 0.4266 * b) as i32) + 128).clamp(0, 0xff) as u32;

    y << 16 | u << 8 | v
}

/// Case-insensitively strips `prefix` from the start of `line`.
fn strip_prefix_ignore_case<'a>(line: &'a [u8], prefix: &str) -> Option<&'a [u8]> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix.as_bytes()) {
        Some(&line[prefix.len()..])
    }
    else {
        None
    }
}

fn trim_start(s: &[u8]) -> &[u8] {
    let skip = s.iter().take_while(|c| c.is_ascii_whitespace()).count();
    &s[skip..]
}

/// Parses a hexadecimal number of at most 6 digits at the start of `s`.
fn parse_hex6(s: &[u8]) -> Option<u32> {
    let s = trim_start(s);
    let digits = s.iter().take(6).take_while(|c| c.is_ascii_hexdigit()).count();
    if digits == 0 {
        return None;
    }
    std::str::from_utf8(&s[..digits]).ok().and_then(|hex| u32::from_str_radix(hex, 16).ok())
}

/// Parses a decimal number at the start of `s` and returns it along with the rest of `s`.
fn parse_decimal(s: &[u8]) -> Option<(u32, &[u8])> {
    let s = trim_start(s);
    let digits = s.iter().take_while(|c| c.is_ascii_digit()).count();
    let value = std::str::from_utf8(&s[..digits]).ok()?.parse().ok()?;
    Some((value, &s[digits..]))
}

/// Parses a list of comma or whitespace separated colours, each 6 hex digits wide.
fn parse_colors<const N: usize>(mut s: &[u8]) -> Option<[u32; N]> {
    let mut colors = [0; N];

    s = trim_start(s);
    for color in colors.iter_mut() {
        *color = parse_hex6(s)?;
        s = s.get(6..).unwrap_or(&[]);
        let skip = s.iter().take_while(|c| **c == b',' || c.is_ascii_whitespace()).count();
        s = &s[skip..];
    }

    Some(colors)
}

fn parse_on_off(s: &[u8], on: &str, off: &str) -> Option<bool> {
    let s = trim_start(s);
    if strip_prefix_ignore_case(s, on).is_some() || s.first() == Some(&b'1') {
        Some(true)
    }
    else if strip_prefix_ignore_case(s, off).is_some() || s.first() == Some(&b'0') {
        Some(false)
    }
    else {
        None
    }
}

impl VobSubInfo {
    /// Parses the codec private data of a VobSub track. Unknown or malformed lines are ignored.
    pub fn parse(private: &[u8]) -> Self {
        let mut info = VobSubInfo::default();

        // The text may be NUL terminated.
        let text = private.split(|c| *c == 0).next().unwrap_or(&[]);

        for line in text.split(|c| *c == b'\r' || *c == b'\n').filter(|l| !l.is_empty()) {
            if let Some(rest) = strip_prefix_ignore_case(line, "size: ") {
                if let Some((width, rest)) = parse_decimal(rest) {
                    if let Some((height, _)) = rest.strip_prefix(b"x").and_then(parse_decimal) {
                        log::debug!("mkv: vobsub size {}x{}", width, height);
                        info.width = width;
                        info.height = height;
                    }
                }
            }
            else if let Some(rest) = strip_prefix_ignore_case(line, "palette:") {
                info.palette = parse_colors::<16>(rest).map(|rgb| rgb.map(rgb_to_yuv));
                if info.palette.is_none() {
                    log::debug!("mkv: incomplete vobsub palette");
                }
            }
            else if let Some(rest) = strip_prefix_ignore_case(line, "custom colours:") {
                let enabled = parse_on_off(rest, "on", "off").unwrap_or(false);

                let colors = rest
                    .windows(7)
                    .position(|w| w == b"colors:")
                    .and_then(|pos| parse_colors::<4>(&rest[pos + 7..]));

                info.custom_colors = if enabled { colors } else { None };
            }
            else if let Some(rest) = strip_prefix_ignore_case(line, "forced subs:") {
                if let Some(forced) = parse_on_off(rest, "on", "off") {
                    info.forced_only = forced;
                }
            }
        }

        info
    }
}
