// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Entropy-coded segment extraction and bit-level reading.
//!
//! Between the SOS header and EOI the stream is a byte-stuffed bit stream:
//! a literal 0xFF data byte is followed by 0x00, extra 0xFF bytes are
//! padding, and restart markers appear byte-aligned between restart
//! intervals. [`extract_entropy_stream`] undoes the stuffing once up front,
//! keeping restart markers inline as two-byte sentinels, and [`BitReader`]
//! then serves MSB-first bit reads from the cleaned buffer.

use super::error::{JpegError, Result};
use super::marker;
use super::stream::ByteStream;

/// Collect the entropy-coded bytes starting at the stream cursor.
///
/// Stops at EOI. Any non-restart marker inside the scan data is fatal;
/// running out of input before EOI is a bounds error.
pub fn extract_entropy_stream(stream: &mut ByteStream) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(stream.remaining());
    let mut current = stream.read_u8()?;
    loop {
        let last = current;
        current = stream.read_u8()?;
        if last != 0xFF {
            out.push(last);
            continue;
        }
        if current == 0xFF {
            // Fill byte; keep scanning for the marker byte.
            continue;
        }
        if current == 0x00 {
            // Byte-stuffed literal 0xFF.
            out.push(0xFF);
            current = stream.read_u8()?;
            continue;
        }
        let found = 0xFF00 | marker::Marker::from(current);
        if found == marker::EOI {
            return Ok(out);
        }
        if marker::is_restart(found) {
            // Keep the whole marker in-stream; the decoder skips it at the
            // restart boundary.
            out.push(0xFF);
            out.push(current);
            current = stream.read_u8()?;
            continue;
        }
        log::debug!("unexpected marker {found:#06X} inside scan data");
        return Err(JpegError::UnexpectedMarker(found));
    }
}

/// MSB-first bit reader over the extracted entropy stream.
pub struct BitReader {
    stream: Vec<u8>,
    byte_offset: usize,
    bit_offset: u8,
}

impl BitReader {
    pub fn new(stream: Vec<u8>) -> Self {
        Self {
            stream,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<u8> {
        let byte = *self
            .stream
            .get(self.byte_offset)
            .ok_or(JpegError::EntropyError("bit stream exhausted"))?;
        let bit = (byte >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;
        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
        Ok(bit)
    }

    /// Read `count` bits (at most 64) into the low end of a u64.
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(JpegError::EntropyError("bit read wider than 64 bits"));
        }
        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Discard any partially consumed byte. Restart markers are stored on
    /// byte boundaries, so the reader must realign before skipping one.
    pub fn align_to_byte(&mut self) {
        if self.bit_offset > 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    /// Step over the two-byte restart sentinel embedded by
    /// [`extract_entropy_stream`]. The reader must be byte-aligned.
    pub fn skip_restart_marker(&mut self) {
        debug_assert_eq!(self.bit_offset, 0);
        self.byte_offset += 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(bytes: &[u8]) -> Result<Vec<u8>> {
        extract_entropy_stream(&mut ByteStream::new(bytes))
    }

    #[test]
    fn plain_data_up_to_eoi() {
        assert_eq!(extract(&[0x12, 0x34, 0xFF, 0xD9]).unwrap(), vec![0x12, 0x34]);
    }

    #[test]
    fn destuffs_ff00() {
        assert_eq!(
            extract(&[0xAA, 0xFF, 0x00, 0xBB, 0xFF, 0xD9]).unwrap(),
            vec![0xAA, 0xFF, 0xBB]
        );
    }

    #[test]
    fn drops_fill_bytes() {
        assert_eq!(extract(&[0x11, 0xFF, 0xFF, 0xFF, 0xD9]).unwrap(), vec![0x11]);
    }

    #[test]
    fn restart_markers_stay_inline() {
        assert_eq!(
            extract(&[0x11, 0xFF, 0xD0, 0x22, 0xFF, 0xD9]).unwrap(),
            vec![0x11, 0xFF, 0xD0, 0x22]
        );
    }

    #[test]
    fn foreign_marker_is_fatal() {
        assert_eq!(
            extract(&[0x11, 0xFF, 0xC4, 0xFF, 0xD9]),
            Err(JpegError::UnexpectedMarker(0xFFC4))
        );
    }

    #[test]
    fn missing_eoi_is_fatal() {
        assert_eq!(extract(&[0x11, 0x22]), Err(JpegError::BoundsError));
    }

    #[test]
    fn msb_first_reads() {
        let mut r = BitReader::new(vec![0b1010_0101, 0b1100_0011]);
        assert_eq!(r.read_bit().unwrap(), 1);
        assert_eq!(r.read_bits(3).unwrap(), 0b010);
        // Crosses the byte boundary.
        assert_eq!(r.read_bits(8).unwrap(), 0b0101_1100);
        assert_eq!(r.read_bits(4).unwrap(), 0b0011);
        assert!(matches!(r.read_bit(), Err(JpegError::EntropyError(_))));
    }

    #[test]
    fn read_width_is_capped() {
        let mut r = BitReader::new(vec![0u8; 16]);
        assert!(r.read_bits(64).is_ok());
        assert!(matches!(r.read_bits(65), Err(JpegError::EntropyError(_))));
        // Zero-width reads are valid and return zero.
        assert_eq!(r.read_bits(0).unwrap(), 0);
    }

    #[test]
    fn align_and_skip_restart() {
        let mut r = BitReader::new(vec![0b1000_0000, 0xFF, 0xD1, 0b0100_0000]);
        assert_eq!(r.read_bit().unwrap(), 1);
        r.align_to_byte();
        r.skip_restart_marker();
        assert_eq!(r.read_bits(2).unwrap(), 0b01);
    }

    #[test]
    fn align_on_boundary_is_a_no_op() {
        let mut r = BitReader::new(vec![0xA0, 0x0B]);
        r.align_to_byte();
        assert_eq!(r.read_bits(8).unwrap(), 0xA0);
    }
}
