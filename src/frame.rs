// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frame header (SOF0) parsing.
//!
//! Extracts image dimensions, per-component sampling factors and table ids,
//! and derives the macroblock grid geometry, including the padding required
//! when subsampled dimensions are not multiples of two macroblocks.

use super::error::{JpegError, Result};

/// Largest image width accepted by the decoder.
pub const MAX_WIDTH: u16 = 16384;
/// Largest image height accepted by the decoder.
pub const MAX_HEIGHT: u16 = 16384;

/// One image component as declared in SOF, with the entropy table ids
/// filled in later by the SOS parser.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    /// Component identifier (typically 1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1 or 2; always 1 for chroma).
    pub hsample_factor: u8,
    /// Vertical sampling factor (1 or 2; always 1 for chroma).
    pub vsample_factor: u8,
    /// DC Huffman table destination (0 or 1), set by SOS.
    pub dc_destination_id: u8,
    /// AC Huffman table destination (0 or 1), set by SOS.
    pub ac_destination_id: u8,
    /// Quantization table id (0 or 1).
    pub qtable_id: u8,
}

/// Geometry of the 8×8 macroblock grid covering the image.
///
/// `hpadded_count`/`vpadded_count` round the base counts up to a multiple of
/// the luma sampling factors so that every MCU group is fully backed by
/// allocated blocks; the padding blocks never contribute output pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroblockMeta {
    pub hcount: usize,
    pub vcount: usize,
    pub hpadded_count: usize,
    pub vpadded_count: usize,
    pub total: usize,
    pub padded_total: usize,
}

/// Parsed SOF header plus derived grid geometry.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    /// SOF marker low nibble; only 0 (baseline DCT) ever gets this far.
    pub frame_type: u8,
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    pub components: Vec<ComponentSpec>,
    /// Luma sampling factors, duplicated for quick access in the kernels.
    pub hsample_factor: u8,
    pub vsample_factor: u8,
    pub meta: MacroblockMeta,
}

/// Parse an SOF0 segment body (the bytes after the length field).
pub fn parse_sof(body: &[u8]) -> Result<FrameHeader> {
    if body.len() < 6 {
        return Err(JpegError::MalformedSegment("SOF segment truncated"));
    }

    let precision = body[0];
    if precision != 8 {
        return Err(JpegError::UnsupportedProfile("sample precision is not 8-bit"));
    }

    let height = u16::from_be_bytes([body[1], body[2]]);
    let width = u16::from_be_bytes([body[3], body[4]]);
    if width == 0 || height == 0 {
        return Err(JpegError::MalformedSegment("zero image dimension"));
    }
    if width > MAX_WIDTH || height > MAX_HEIGHT {
        log::debug!("rejecting oversized image: {width}x{height}");
        return Err(JpegError::BoundsError);
    }

    let component_count = body[5] as usize;
    if component_count != 1 && component_count != 3 {
        return Err(JpegError::UnsupportedProfile("component count is not 1 or 3"));
    }
    if body.len() < 6 + component_count * 3 {
        return Err(JpegError::MalformedSegment("SOF segment truncated"));
    }

    let mut components = Vec::with_capacity(component_count);
    for i in 0..component_count {
        let offset = 6 + i * 3;
        let id = body[offset];
        let factors = body[offset + 1];
        let mut hsample_factor = factors >> 4;
        let mut vsample_factor = factors & 0x0F;

        if i == 0 {
            // A single-component (grayscale) scan is never interleaved, so
            // any declared luma sampling factors are ignored.
            if component_count == 1 {
                hsample_factor = 1;
                vsample_factor = 1;
            }
            if !matches!(hsample_factor, 1 | 2) || !matches!(vsample_factor, 1 | 2) {
                return Err(JpegError::UnsupportedProfile("luma sampling factor is not 1 or 2"));
            }
        } else if hsample_factor != 1 || vsample_factor != 1 {
            // Downsampling is only ever applied to chroma, so chroma factors
            // must be exactly (1,1); the luma factors carry the ratio.
            return Err(JpegError::UnsupportedProfile("chroma sampling factor is not 1"));
        }

        let qtable_id = body[offset + 2];
        if qtable_id > 1 {
            return Err(JpegError::UnsupportedProfile("quantization table id out of range"));
        }

        components.push(ComponentSpec {
            id,
            hsample_factor,
            vsample_factor,
            dc_destination_id: 0,
            ac_destination_id: 0,
            qtable_id,
        });
    }

    let hsample_factor = components[0].hsample_factor;
    let vsample_factor = components[0].vsample_factor;
    let meta = macroblock_meta(width, height, hsample_factor, vsample_factor);

    log::debug!(
        "SOF0: {width}x{height}, {component_count} component(s), luma sampling {hsample_factor}x{vsample_factor}, \
         {} blocks ({} padded)",
        meta.total,
        meta.padded_total
    );

    Ok(FrameHeader {
        frame_type: 0,
        precision,
        width,
        height,
        components,
        hsample_factor,
        vsample_factor,
        meta,
    })
}

fn macroblock_meta(width: u16, height: u16, hsample: u8, vsample: u8) -> MacroblockMeta {
    let hcount = (width as usize + 7) / 8;
    let vcount = (height as usize + 7) / 8;
    // An odd block count with a factor-2 luma needs one padding row/column of
    // blocks so the trailing MCU group is fully backed.
    let hpadded_count = hcount + if hsample == 2 { hcount % 2 } else { 0 };
    let vpadded_count = vcount + if vsample == 2 { vcount % 2 } else { 0 };
    MacroblockMeta {
        hcount,
        vcount,
        hpadded_count,
        vpadded_count,
        total: hcount * vcount,
        padded_total: hpadded_count * vpadded_count,
    }
}
