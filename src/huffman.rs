// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Huffman tables for JPEG entropy decoding.
//!
//! DHT segments carry only the per-length code counts and the symbol list;
//! the actual codewords are regenerated here with the canonical assignment
//! from ITU-T T.81 Annex C, which is prefix-free by construction.

use super::bitio::BitReader;
use super::error::{JpegError, Result};

/// Whether a table decodes DC difference categories or AC run/size symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableClass {
    Dc,
    Ac,
}

/// One Huffman table as defined by a DHT segment.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    pub class: TableClass,
    /// Destination slot this table was stored under (0 or 1).
    pub destination_id: u8,
    /// `code_counts[i]` codes have length `i + 1` bits.
    pub code_counts: [u8; 16],
    /// Symbols in order of increasing code length.
    pub symbols: Vec<u8>,
    /// Canonical codewords, parallel to `symbols`; empty until
    /// [`generate_codes`](Self::generate_codes) runs at scan start.
    pub codes: Vec<u16>,
}

impl HuffmanTable {
    pub fn new(class: TableClass, destination_id: u8, code_counts: [u8; 16], symbols: Vec<u8>) -> Self {
        Self {
            class,
            destination_id,
            code_counts,
            symbols,
            codes: Vec::new(),
        }
    }

    /// Assign canonical codewords: consecutive integers within each bit
    /// length, shifted left by one when moving to the next length.
    pub fn generate_codes(&mut self) {
        self.codes.clear();
        self.codes.reserve(self.symbols.len());
        let mut code: u16 = 0;
        for &count in &self.code_counts {
            for _ in 0..count {
                self.codes.push(code);
                code += 1;
            }
            code <<= 1;
        }
    }

    /// Decode the next symbol from the bit stream.
    ///
    /// Accumulates one bit at a time and compares against the codewords
    /// registered at the current length. No JPEG code is longer than 16
    /// bits, so 16 bits without a match is a hard failure.
    pub fn next_symbol(&self, reader: &mut BitReader) -> Result<u8> {
        let mut code: u32 = 0;
        let mut cursor = 0usize;
        for length in 0..16 {
            code = (code << 1) | u32::from(reader.read_bit()?);
            let count = self.code_counts[length] as usize;
            for i in 0..count {
                if code == u32::from(self.codes[cursor + i]) {
                    return Ok(self.symbols[cursor + i]);
                }
            }
            cursor += count;
        }
        Err(JpegError::EntropyError("no matching huffman code in 16 bits"))
    }
}

/// Undo the JPEG magnitude encoding of Table F.1: a `length`-bit value whose
/// most significant bit is clear encodes a negative coefficient.
pub fn extend_sign(value: u32, length: u8) -> i32 {
    if length == 0 {
        return 0;
    }
    let value = value as i32;
    if value < (1 << (length - 1)) {
        value - ((1 << length) - 1)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Standard luminance DC table (ITU-T T.81 Table K.3).
    fn lum_dc_table() -> HuffmanTable {
        HuffmanTable::new(
            TableClass::Dc,
            0,
            [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
            (0..12).collect(),
        )
    }

    #[test]
    fn canonical_codes() {
        let mut table = lum_dc_table();
        table.generate_codes();
        assert_eq!(table.codes.len(), table.symbols.len());
        // Category 0 gets the 2-bit code 00, category 5 the last 3-bit code.
        assert_eq!(table.codes[0], 0b00);
        assert_eq!(table.codes[1], 0b010);
        assert_eq!(table.codes[5], 0b110);
        assert_eq!(table.codes[6], 0b1110);
        assert_eq!(table.codes[11], 0b111111110);
    }

    #[test]
    fn codes_are_prefix_free() {
        let mut table = lum_dc_table();
        table.generate_codes();
        let mut lengths = Vec::new();
        for (i, &count) in table.code_counts.iter().enumerate() {
            for _ in 0..count {
                lengths.push(i + 1);
            }
        }
        for a in 0..table.codes.len() {
            for b in 0..table.codes.len() {
                if a == b {
                    continue;
                }
                if lengths[a] <= lengths[b] {
                    let shifted = table.codes[b] >> (lengths[b] - lengths[a]);
                    assert_ne!(shifted, table.codes[a], "code {a} is a prefix of code {b}");
                }
            }
        }
    }

    #[test]
    fn decode_symbols() {
        let mut table = lum_dc_table();
        table.generate_codes();
        // 00 (cat 0), 010 (cat 1), 1110 (cat 6) = 0b0001_0111, 0b0xxxxxxx
        let mut reader = BitReader::new(vec![0b0001_0111, 0b0000_0000]);
        assert_eq!(table.next_symbol(&mut reader).unwrap(), 0);
        assert_eq!(table.next_symbol(&mut reader).unwrap(), 1);
        assert_eq!(table.next_symbol(&mut reader).unwrap(), 6);
    }

    #[test]
    fn sixteen_bit_codes_decode() {
        // Two codes of the maximum length: 16 zero bits and 15 zeros + 1.
        let mut counts = [0u8; 16];
        counts[15] = 2;
        let mut table = HuffmanTable::new(TableClass::Dc, 0, counts, vec![3, 7]);
        table.generate_codes();
        let mut reader = BitReader::new(vec![0x00, 0x00, 0x00, 0x01]);
        assert_eq!(table.next_symbol(&mut reader).unwrap(), 3);
        assert_eq!(table.next_symbol(&mut reader).unwrap(), 7);
    }

    #[test]
    fn unmatched_code_fails() {
        // Only one 1-bit code (0); an endless run of 1-bits never matches.
        let mut counts = [0u8; 16];
        counts[0] = 1;
        let mut table = HuffmanTable::new(TableClass::Ac, 0, counts, vec![0]);
        table.generate_codes();
        let mut reader = BitReader::new(vec![0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            table.next_symbol(&mut reader),
            Err(JpegError::EntropyError(_))
        ));
    }

    #[test]
    fn sign_extension() {
        // Table F.1: category 1 encodes {-1, 1}, category 3 encodes
        // {-7..-4, 4..7}.
        assert_eq!(extend_sign(0, 1), -1);
        assert_eq!(extend_sign(1, 1), 1);
        assert_eq!(extend_sign(0, 3), -7);
        assert_eq!(extend_sign(3, 3), -4);
        assert_eq!(extend_sign(4, 3), 4);
        assert_eq!(extend_sign(7, 3), 7);
        assert_eq!(extend_sign(0, 0), 0);
        // Category 11 is the DC maximum.
        assert_eq!(extend_sign(0, 11), -2047);
        assert_eq!(extend_sign(2047, 11), 2047);
    }
}
