// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! The JPEG zigzag scan order.

/// Maps a zigzag position (0–63) to the natural row-major index (0–63).
///
/// DQT entries and entropy-coded AC coefficients arrive in zigzag order;
/// indexing through this table undoes the encoder's anti-diagonal traversal
/// so blocks are stored as `row * 8 + col`.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];
