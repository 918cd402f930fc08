// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! JPEG marker constants and the marker scanner.
//!
//! Markers are two-byte big-endian values of the form 0xFFxx. The scanner
//! tolerates runs of 0xFF padding before the marker byte and yields the
//! [`INVALID`] sentinel for any malformed sequence; the header parser decides
//! what is fatal.

use super::error::Result;
use super::stream::ByteStream;

pub type Marker = u16;

/// Sentinel for a malformed or unrecognized marker sequence.
pub const INVALID: Marker = 0x0000;

pub const SOI: Marker = 0xFFD8;
pub const EOI: Marker = 0xFFD9;
pub const SOF0: Marker = 0xFFC0;
pub const DHT: Marker = 0xFFC4;
pub const DQT: Marker = 0xFFDB;
pub const DRI: Marker = 0xFFDD;
pub const SOS: Marker = 0xFFDA;
pub const COM: Marker = 0xFFFE;
pub const DHP: Marker = 0xFFDE;
pub const EXP: Marker = 0xFFDF;
pub const RST0: Marker = 0xFFD0;
pub const RST7: Marker = 0xFFD7;
pub const APP0: Marker = 0xFFE0;
pub const APP15: Marker = 0xFFEF;

/// JPG (0xFFC8) and DAC (0xFFCC) fall in the frame-marker range but do not
/// define a frame; neither is recognized here.
const JPG: Marker = 0xFFC8;
const DAC: Marker = 0xFFCC;

/// Restart markers RST0–RST7.
pub fn is_restart(marker: Marker) -> bool {
    (RST0..=RST7).contains(&marker)
}

/// Application markers APP0–APP15.
pub fn is_app(marker: Marker) -> bool {
    (APP0..=APP15).contains(&marker)
}

/// Frame markers SOF0–SOF15 (excluding DHT/JPG/DAC, which share the range).
pub fn is_frame(marker: Marker) -> bool {
    (0xFFC0..=0xFFCF).contains(&marker) && marker != DHT && marker != JPG && marker != DAC
}

fn is_recognized(marker: Marker) -> bool {
    if is_app(marker) || is_restart(marker) || is_frame(marker) {
        return true;
    }
    // Reserved markers 0xFFF1-0xFFFD are length-prefixed and skippable.
    if (0xFFF1..=0xFFFD).contains(&marker) {
        return true;
    }
    matches!(marker, SOI | EOI | DHT | DQT | DRI | SOS | COM | DHP | EXP)
}

/// Read the next marker from the stream.
///
/// A valid marker is either exactly 0xFFxx with a recognized xx, or 0xFF
/// followed by any number of 0xFF filler bytes before the final marker byte.
/// A filler run terminated by 0x00, or any unrecognized sequence, yields
/// [`INVALID`].
pub fn read_marker(stream: &mut ByteStream) -> Result<Marker> {
    let mut marker = stream.read_u16()?;
    if is_recognized(marker) {
        return Ok(marker);
    }
    if marker != 0xFFFF {
        log::trace!("invalid marker sequence {marker:#06X}");
        return Ok(INVALID);
    }
    // 0xFFFF: consume the filler run up to the real marker byte.
    loop {
        let next = stream.read_u8()?;
        if next == 0x00 {
            return Ok(INVALID);
        }
        if next != 0xFF {
            marker = 0xFF00 | Marker::from(next);
            break;
        }
    }
    Ok(if is_recognized(marker) { marker } else { INVALID })
}
