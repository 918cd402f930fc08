// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Scan header (SOS) parsing and the entropy decode loop.
//!
//! The decode loop walks luma MCU groups in raster order. Each group holds
//! the component's `vsample × hsample` luma data units followed by one data
//! unit per chroma component; chroma lands in the group's top-left grid
//! cell and is expanded later by the upsampler.

use super::bitio::BitReader;
use super::block::Macroblock;
use super::error::{JpegError, Result};
use super::frame::FrameHeader;
use super::huffman::{extend_sign, HuffmanTable};
use super::zigzag::ZIGZAG_TO_NATURAL;

/// Parse an SOS segment body and bind each component to its entropy tables.
///
/// Validates that the scan matches the frame (component count and ids in
/// SOF order), that every referenced table destination exists, and that the
/// spectral parameters pin the stream to baseline sequential DCT.
pub fn parse_sos(
    body: &[u8],
    frame: &mut FrameHeader,
    dc_tables: &[Option<HuffmanTable>; 2],
    ac_tables: &[Option<HuffmanTable>; 2],
) -> Result<()> {
    if body.is_empty() {
        return Err(JpegError::MalformedSegment("SOS segment truncated"));
    }
    let component_count = body[0] as usize;
    if component_count != frame.components.len() {
        return Err(JpegError::UnsupportedProfile("scan component count differs from frame"));
    }
    if body.len() < 1 + component_count * 2 + 3 {
        return Err(JpegError::MalformedSegment("SOS segment truncated"));
    }

    let dc_count = dc_tables.iter().filter(|t| t.is_some()).count();
    let ac_count = ac_tables.iter().filter(|t| t.is_some()).count();
    if dc_count != ac_count {
        return Err(JpegError::MalformedSegment("DC and AC huffman table counts differ"));
    }

    for i in 0..component_count {
        let offset = 1 + i * 2;
        let id = body[offset];
        let component = &mut frame.components[i];
        if component.id != id {
            return Err(JpegError::MalformedSegment("scan component id does not match frame"));
        }

        let table_ids = body[offset + 1];
        let dc_id = table_ids >> 4;
        let ac_id = table_ids & 0x0F;
        if dc_id > 1 || ac_id > 1 {
            return Err(JpegError::UnsupportedProfile("huffman table destination id out of range"));
        }
        if dc_tables[dc_id as usize].is_none() {
            return Err(JpegError::MalformedSegment("DC huffman table not defined"));
        }
        if ac_tables[ac_id as usize].is_none() {
            return Err(JpegError::MalformedSegment("AC huffman table not defined"));
        }
        component.dc_destination_id = dc_id;
        component.ac_destination_id = ac_id;
    }

    let params = &body[1 + component_count * 2..];
    let (start, end, approximation) = (params[0], params[1], params[2]);
    if start != 0 || end != 63 || approximation != 0 {
        log::debug!("non-baseline scan parameters: Ss={start} Se={end} A={approximation}");
        return Err(JpegError::UnsupportedProfile("spectral selection is not baseline sequential"));
    }
    Ok(())
}

/// Decode the entropy bit stream into a padded grid of macroblocks.
///
/// Restart intervals count MCU groups: before each group whose index is a
/// positive multiple of the interval, the DC predictors reset and the
/// reader realigns to a byte boundary and steps over the RST sentinel.
pub fn decode_scan(
    frame: &FrameHeader,
    dc_tables: &[Option<HuffmanTable>; 2],
    ac_tables: &[Option<HuffmanTable>; 2],
    reset_interval: u16,
    reader: &mut BitReader,
) -> Result<Vec<Macroblock>> {
    let meta = &frame.meta;
    let mut macroblocks = vec![Macroblock::default(); meta.padded_total];
    let mut previous_dc = [0i32; 3];
    let hsample = frame.hsample_factor as usize;
    let vsample = frame.vsample_factor as usize;
    let mut groups_decoded = 0usize;

    for vcursor in (0..meta.vcount).step_by(vsample) {
        for hcursor in (0..meta.hcount).step_by(hsample) {
            if reset_interval > 0
                && groups_decoded > 0
                && groups_decoded % reset_interval as usize == 0
            {
                previous_dc = [0; 3];
                reader.align_to_byte();
                reader.skip_restart_marker();
            }

            decode_mcu_group(
                frame,
                dc_tables,
                ac_tables,
                reader,
                &mut macroblocks,
                &mut previous_dc,
                hcursor,
                vcursor,
            )?;
            groups_decoded += 1;
        }
    }

    Ok(macroblocks)
}

fn decode_mcu_group(
    frame: &FrameHeader,
    dc_tables: &[Option<HuffmanTable>; 2],
    ac_tables: &[Option<HuffmanTable>; 2],
    reader: &mut BitReader,
    macroblocks: &mut [Macroblock],
    previous_dc: &mut [i32; 3],
    hcursor: usize,
    vcursor: usize,
) -> Result<()> {
    for (component_i, component) in frame.components.iter().enumerate() {
        let dc_table = dc_tables[component.dc_destination_id as usize]
            .as_ref()
            .ok_or(JpegError::MalformedSegment("DC huffman table not defined"))?;
        let ac_table = ac_tables[component.ac_destination_id as usize]
            .as_ref()
            .ok_or(JpegError::MalformedSegment("AC huffman table not defined"))?;

        for vfactor_i in 0..component.vsample_factor as usize {
            for hfactor_i in 0..component.hsample_factor as usize {
                let mb_index = (vcursor + vfactor_i) * frame.meta.hpadded_count + (hcursor + hfactor_i);
                let plane = macroblocks[mb_index].plane_mut(component_i);

                // The DC symbol is the bit length of the difference from the
                // previous DC value of the same component.
                let dc_length = dc_table.next_symbol(reader)?;
                if dc_length > 11 {
                    return Err(JpegError::EntropyError("DC coefficient category out of range"));
                }
                let dc_bits = reader.read_bits(dc_length as usize)? as u32;
                let dc_diff = extend_sign(dc_bits, dc_length);
                // Malicious streams can overflow the accumulated predictor.
                previous_dc[component_i] = previous_dc[component_i].wrapping_add(dc_diff);
                plane[0] = previous_dc[component_i];

                // AC symbols pack a zero run (high nibble) and the
                // coefficient bit length (low nibble); 0x00 ends the block
                // and 0xF0 skips sixteen zeros.
                let mut j = 1usize;
                while j < 64 {
                    let ac_symbol = ac_table.next_symbol(reader)?;
                    if ac_symbol == 0 {
                        break;
                    }
                    let run_length = if ac_symbol == 0xF0 { 16 } else { (ac_symbol >> 4) as usize };
                    j += run_length;
                    if j >= 64 {
                        return Err(JpegError::EntropyError("AC run-length past end of block"));
                    }
                    let coefficient_length = ac_symbol & 0x0F;
                    if coefficient_length > 10 {
                        return Err(JpegError::EntropyError("AC coefficient category out of range"));
                    }
                    if coefficient_length > 0 {
                        let bits = reader.read_bits(coefficient_length as usize)? as u32;
                        plane[ZIGZAG_TO_NATURAL[j]] = extend_sign(bits, coefficient_length);
                        j += 1;
                    }
                }
            }
        }
    }
    Ok(())
}
