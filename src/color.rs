// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Chroma upsampling and YCbCr to RGB conversion.
//!
//! Each MCU group stores its (subsampled) chroma in the group's top-left
//! grid cell. For every luma data unit of the group, the matching chroma
//! sample is found by dividing the pixel position by the sampling factor
//! and offsetting by the data unit's position inside the group. Converted
//! samples go into a fresh [`RgbMacroblock`] grid, so the chroma source is
//! never overwritten mid-group.

use super::block::{Macroblock, RgbMacroblock};
use super::frame::FrameHeader;

/// Convert the decoded macroblock grid into RGB macroblocks.
///
/// Grayscale images take the same path: the chroma planes are all zero, so
/// every channel collapses to `y + 128`.
pub fn ycbcr_to_rgb(frame: &FrameHeader, macroblocks: &[Macroblock]) -> Vec<RgbMacroblock> {
    let meta = frame.meta;
    let hsample = frame.hsample_factor as usize;
    let vsample = frame.vsample_factor as usize;
    let mut rgb = vec![RgbMacroblock::default(); meta.padded_total];

    for vcursor in (0..meta.vcount).step_by(vsample) {
        for hcursor in (0..meta.hcount).step_by(hsample) {
            let chroma = &macroblocks[vcursor * meta.hpadded_count + hcursor];
            for vfactor_i in 0..vsample {
                for hfactor_i in 0..hsample {
                    let mb_index = (vcursor + vfactor_i) * meta.hpadded_count + (hcursor + hfactor_i);
                    let luma = &macroblocks[mb_index].y;
                    let out = &mut rgb[mb_index];
                    for i in 0..8 {
                        for j in 0..8 {
                            let pixel = i * 8 + j;
                            let chroma_row = i / vsample + 4 * vfactor_i;
                            let chroma_col = j / hsample + 4 * hfactor_i;
                            let chroma_pixel = chroma_row * 8 + chroma_col;
                            let cb = chroma.cb[chroma_pixel] as f32;
                            let cr = chroma.cr[chroma_pixel] as f32;
                            let y = luma[pixel] as f32;
                            let r = y + 1.402 * cr + 128.0;
                            let g = y - 0.344 * cb - 0.714 * cr + 128.0;
                            let b = y + 1.772 * cb + 128.0;
                            out.r[pixel] = clamp_channel(r);
                            out.g[pixel] = clamp_channel(g);
                            out.b[pixel] = clamp_channel(b);
                        }
                    }
                }
            }
        }
    }

    rgb
}

fn clamp_channel(value: f32) -> u8 {
    (value as i32).clamp(0, 255) as u8
}
