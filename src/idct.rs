// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Dequantization and the inverse DCT.
//!
//! The IDCT is the Arai-Agui-Nakajima factorization: a scaled 1-D 8-point
//! transform applied along columns and then rows, in place. Values are
//! truncated to integers after each pass. Macroblocks are processed in
//! parallel per MCU-row band; bands are disjoint slices of the grid, and
//! the entropy decode has already finished, so the kernels are race-free.

use std::sync::OnceLock;

use rayon::prelude::*;

use super::block::Macroblock;
use super::frame::FrameHeader;

struct AanConstants {
    m1: f32,
    m2: f32,
    m3: f32,
    m4: f32,
    m5: f32,
    s: [f32; 8],
}

static AAN: OnceLock<AanConstants> = OnceLock::new();

fn aan_constants() -> &'static AanConstants {
    AAN.get_or_init(|| {
        let pi = std::f32::consts::PI;
        let m0 = 2.0 * (1.0 / 16.0 * 2.0 * pi).cos();
        let m1 = 2.0 * (2.0 / 16.0 * 2.0 * pi).cos();
        let m3 = 2.0 * (2.0 / 16.0 * 2.0 * pi).cos();
        let m5 = 2.0 * (3.0 / 16.0 * 2.0 * pi).cos();
        let m2 = m0 - m5;
        let m4 = m0 + m5;
        let mut s = [0.0f32; 8];
        s[0] = (0.0f32).cos() / 8.0f32.sqrt();
        for (k, entry) in s.iter_mut().enumerate().skip(1) {
            *entry = (k as f32 / 16.0 * pi).cos() / 2.0;
        }
        AanConstants { m1, m2, m3, m4, m5, s }
    })
}

/// Dequantize and inverse-transform every component plane of the padded
/// macroblock grid, in place.
pub fn dequantize_and_idct(
    frame: &FrameHeader,
    quant_tables: &[[u16; 64]; 2],
    macroblocks: &mut [Macroblock],
) {
    let aan = aan_constants();
    let meta = frame.meta;
    let hsample = frame.hsample_factor as usize;
    let vsample = frame.vsample_factor as usize;

    // One band = one row of MCU groups = `vsample` rows of grid cells.
    let band = meta.hpadded_count * vsample;
    macroblocks.par_chunks_mut(band).for_each(|band_blocks| {
        for hcursor in (0..meta.hcount).step_by(hsample) {
            for (component_i, component) in frame.components.iter().enumerate() {
                let table = &quant_tables[component.qtable_id as usize];
                for vfactor_i in 0..component.vsample_factor as usize {
                    for hfactor_i in 0..component.hsample_factor as usize {
                        let index = vfactor_i * meta.hpadded_count + hcursor + hfactor_i;
                        let plane = band_blocks[index].plane_mut(component_i);
                        dequantize_block(plane, table);
                        idct_block(plane, aan);
                    }
                }
            }
        }
    });
}

fn dequantize_block(plane: &mut [i32; 64], table: &[u16; 64]) {
    for (coefficient, &quantum) in plane.iter_mut().zip(table.iter()) {
        *coefficient *= i32::from(quantum);
    }
}

fn idct_block(plane: &mut [i32; 64], aan: &AanConstants) {
    for k in 0..8 {
        idct_1d(plane, k, 8, aan);
    }
    for l in 0..8 {
        idct_1d(plane, l * 8, 1, aan);
    }
}

/// One scaled AAN butterfly over eight elements at `base`, `base + stride`,
/// ..., `base + 7 * stride`.
fn idct_1d(plane: &mut [i32; 64], base: usize, stride: usize, aan: &AanConstants) {
    let g0 = plane[base] as f32 * aan.s[0];
    let g1 = plane[base + 4 * stride] as f32 * aan.s[4];
    let g2 = plane[base + 2 * stride] as f32 * aan.s[2];
    let g3 = plane[base + 6 * stride] as f32 * aan.s[6];
    let g4 = plane[base + 5 * stride] as f32 * aan.s[5];
    let g5 = plane[base + stride] as f32 * aan.s[1];
    let g6 = plane[base + 7 * stride] as f32 * aan.s[7];
    let g7 = plane[base + 3 * stride] as f32 * aan.s[3];

    let f0 = g0;
    let f1 = g1;
    let f2 = g2;
    let f3 = g3;
    let f4 = g4 - g7;
    let f5 = g5 + g6;
    let f6 = g5 - g6;
    let f7 = g4 + g7;

    let e0 = f0;
    let e1 = f1;
    let e2 = f2 - f3;
    let e3 = f2 + f3;
    let e4 = f4;
    let e5 = f5 - f7;
    let e6 = f6;
    let e7 = f5 + f7;
    let e8 = f4 + f6;

    let d0 = e0;
    let d1 = e1;
    let d2 = e2 * aan.m1;
    let d3 = e3;
    let d4 = e4 * aan.m2;
    let d5 = e5 * aan.m3;
    let d6 = e6 * aan.m4;
    let d7 = e7;
    let d8 = e8 * aan.m5;

    let c0 = d0 + d1;
    let c1 = d0 - d1;
    let c2 = d2 - d3;
    let c3 = d3;
    let c4 = d4 + d8;
    let c5 = d5 + d7;
    let c6 = d6 - d8;
    let c7 = d7;
    let c8 = c5 - c6;

    let b0 = c0 + c3;
    let b1 = c1 + c2;
    let b2 = c1 - c2;
    let b3 = c0 - c3;
    let b4 = c4 - c8;
    let b5 = c8;
    let b6 = c6 - c7;
    let b7 = c7;

    plane[base] = (b0 + b7) as i32;
    plane[base + stride] = (b1 + b6) as i32;
    plane[base + 2 * stride] = (b2 + b5) as i32;
    plane[base + 3 * stride] = (b3 + b4) as i32;
    plane[base + 4 * stride] = (b3 - b4) as i32;
    plane[base + 5 * stride] = (b2 - b5) as i32;
    plane[base + 6 * stride] = (b1 - b6) as i32;
    plane[base + 7 * stride] = (b0 - b7) as i32;
}
