// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Quantization (DQT), Huffman (DHT) and restart-interval (DRI) segments.
//!
//! DQT and DHT segments may carry several tables each; both parsers consume
//! the body exactly and treat leftover bytes as an error.

use super::error::{JpegError, Result};
use super::huffman::{HuffmanTable, TableClass};
use super::zigzag::ZIGZAG_TO_NATURAL;

/// Parse a DQT segment body into the two table slots.
///
/// The 64 entries arrive in zigzag position order and are stored at their
/// natural row-major index, undoing the encoder's traversal. Entries are
/// 8-bit or 16-bit depending on the element size nibble.
pub fn parse_dqt(body: &[u8], tables: &mut [[u16; 64]; 2]) -> Result<()> {
    let mut pos = 0usize;
    while pos < body.len() {
        let info = body[pos];
        pos += 1;
        let element_size = info >> 4;
        if element_size > 1 {
            return Err(JpegError::MalformedSegment("invalid quantization element size"));
        }
        let table_id = info & 0x0F;
        if table_id > 1 {
            return Err(JpegError::UnsupportedProfile("quantization table id out of range"));
        }

        let entry_bytes = if element_size == 0 { 1 } else { 2 };
        if pos + 64 * entry_bytes > body.len() {
            return Err(JpegError::MalformedSegment("quantization table truncated"));
        }
        let table = &mut tables[table_id as usize];
        for i in 0..64 {
            let value = if element_size == 0 {
                u16::from(body[pos + i])
            } else {
                u16::from_be_bytes([body[pos + i * 2], body[pos + i * 2 + 1]])
            };
            table[ZIGZAG_TO_NATURAL[i]] = value;
        }
        pos += 64 * entry_bytes;
        log::debug!("DQT: loaded {}-bit table {table_id}", 8 * entry_bytes);
    }
    Ok(())
}

/// Parse a DHT segment body into a list of Huffman tables (codes not yet
/// generated). The destination id must be 0 or 1 and the total symbol
/// count must fit the declared segment length exactly.
pub fn parse_dht(body: &[u8]) -> Result<Vec<HuffmanTable>> {
    let mut tables = Vec::new();
    let mut pos = 0usize;
    while pos < body.len() {
        let info = body[pos];
        pos += 1;
        let class = match info >> 4 {
            0 => TableClass::Dc,
            1 => TableClass::Ac,
            _ => return Err(JpegError::MalformedSegment("unrecognized huffman table class")),
        };
        let destination_id = info & 0x0F;
        if destination_id > 1 {
            return Err(JpegError::UnsupportedProfile("huffman table destination id out of range"));
        }

        if pos + 16 > body.len() {
            return Err(JpegError::MalformedSegment("huffman code counts truncated"));
        }
        let mut code_counts = [0u8; 16];
        code_counts.copy_from_slice(&body[pos..pos + 16]);
        pos += 16;

        let total_codes: usize = code_counts.iter().map(|&c| c as usize).sum();
        if total_codes > 256 {
            return Err(JpegError::MalformedSegment("huffman table declares more than 256 codes"));
        }
        if pos + total_codes > body.len() {
            return Err(JpegError::MalformedSegment("huffman symbols truncated"));
        }
        let symbols = body[pos..pos + total_codes].to_vec();
        pos += total_codes;

        log::debug!(
            "DHT: {:?} table {destination_id} with {total_codes} symbols",
            class
        );
        tables.push(HuffmanTable::new(class, destination_id, code_counts, symbols));
    }
    Ok(tables)
}

/// Parse a DRI segment body: a single 16-bit restart interval in MCUs
/// (0 disables restarts). The segment length is fixed at four bytes, so
/// the body must be exactly two.
pub fn parse_dri(body: &[u8]) -> Result<u16> {
    if body.len() != 2 {
        return Err(JpegError::MalformedSegment("restart interval segment has wrong length"));
    }
    Ok(u16::from_be_bytes([body[0], body[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dqt_zigzag_order() {
        // Values 1..=64 in zigzag order land at their natural positions.
        let mut body = vec![0x00u8];
        body.extend(1..=64u8);
        let mut tables = [[0u16; 64]; 2];
        parse_dqt(&body, &mut tables).unwrap();
        assert_eq!(tables[0][0], 1);
        assert_eq!(tables[0][1], 2);
        // Third zigzag entry is row 1, column 0.
        assert_eq!(tables[0][8], 3);
        assert_eq!(tables[0][63], 64);
        assert_eq!(tables[1], [0u16; 64]);
    }

    #[test]
    fn dqt_sixteen_bit_entries() {
        let mut body = vec![0x11u8];
        for i in 0..64u16 {
            body.extend_from_slice(&(0x100 + i).to_be_bytes());
        }
        let mut tables = [[0u16; 64]; 2];
        parse_dqt(&body, &mut tables).unwrap();
        assert_eq!(tables[1][0], 0x100);
        assert_eq!(tables[1][63], 0x100 + 63);
    }

    #[test]
    fn dqt_two_tables_one_segment() {
        let mut body = vec![0x00u8];
        body.extend(std::iter::repeat(2).take(64));
        body.push(0x01);
        body.extend(std::iter::repeat(5).take(64));
        let mut tables = [[0u16; 64]; 2];
        parse_dqt(&body, &mut tables).unwrap();
        assert!(tables[0].iter().all(|&v| v == 2));
        assert!(tables[1].iter().all(|&v| v == 5));
    }

    #[test]
    fn dqt_rejects_bad_input() {
        let mut tables = [[0u16; 64]; 2];
        // Element size nibble 2 is undefined.
        assert!(matches!(
            parse_dqt(&[0x20], &mut tables),
            Err(JpegError::MalformedSegment(_))
        ));
        // Table id 2 is out of range.
        assert!(matches!(
            parse_dqt(&[0x02], &mut tables),
            Err(JpegError::UnsupportedProfile(_))
        ));
        // Truncated entries.
        assert!(matches!(
            parse_dqt(&[0x00, 1, 2, 3], &mut tables),
            Err(JpegError::MalformedSegment(_))
        ));
    }

    fn dht_body(info: u8, counts: &[u8; 16], symbols: &[u8]) -> Vec<u8> {
        let mut body = vec![info];
        body.extend_from_slice(counts);
        body.extend_from_slice(symbols);
        body
    }

    #[test]
    fn dht_basic() {
        let counts = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        let symbols: Vec<u8> = (0..12).collect();
        let tables = parse_dht(&dht_body(0x00, &counts, &symbols)).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].class, TableClass::Dc);
        assert_eq!(tables[0].destination_id, 0);
        assert_eq!(tables[0].code_counts, counts);
        assert_eq!(tables[0].symbols, symbols);
        assert!(tables[0].codes.is_empty());
    }

    #[test]
    fn dht_multiple_tables() {
        let mut counts = [0u8; 16];
        counts[0] = 1;
        let mut body = dht_body(0x00, &counts, &[0]);
        body.extend_from_slice(&dht_body(0x11, &counts, &[0]));
        let tables = parse_dht(&body).unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].class, TableClass::Ac);
        assert_eq!(tables[1].destination_id, 1);
    }

    #[test]
    fn dht_rejects_overrun_and_trailing() {
        // Counts promise 12 symbols but only 3 follow.
        let counts = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            parse_dht(&dht_body(0x00, &counts, &[1, 2, 3])),
            Err(JpegError::MalformedSegment(_))
        ));
        // Class nibble 2 is undefined.
        let mut counts = [0u8; 16];
        counts[0] = 1;
        assert!(matches!(
            parse_dht(&dht_body(0x20, &counts, &[0])),
            Err(JpegError::MalformedSegment(_))
        ));
        // Destination 2 is out of range.
        assert!(matches!(
            parse_dht(&dht_body(0x02, &counts, &[0])),
            Err(JpegError::UnsupportedProfile(_))
        ));
        // A count sum over 256 cannot be valid.
        let counts = [255u8; 16];
        let symbols = vec![0u8; 255 * 16];
        assert!(matches!(
            parse_dht(&dht_body(0x00, &counts, &symbols)),
            Err(JpegError::MalformedSegment(_))
        ));
    }

    #[test]
    fn dri_length_is_fixed() {
        assert_eq!(parse_dri(&[0x00, 0x0A]).unwrap(), 10);
        assert_eq!(parse_dri(&[0x00, 0x00]).unwrap(), 0);
        assert!(matches!(parse_dri(&[0x00]), Err(JpegError::MalformedSegment(_))));
        assert!(matches!(
            parse_dri(&[0, 0, 0]),
            Err(JpegError::MalformedSegment(_))
        ));
    }
}
