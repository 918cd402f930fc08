// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! The decoder handle and its state machine.
//!
//! [`JpegDecoder`] borrows the input bytes and decodes lazily: `size` and
//! `icc_data` only need the header, `frame` runs the full pipeline and
//! caches the bitmap. The first failure latches the handle into the error
//! state; later calls return the same error and nothing partial escapes.

use super::bitio::{self, BitReader};
use super::bitmap::{self, Bitmap};
use super::color;
use super::error::{JpegError, Result};
use super::frame::{self, FrameHeader};
use super::huffman::{HuffmanTable, TableClass};
use super::icc::{self, IccChunkState};
use super::idct;
use super::marker;
use super::scan;
use super::stream::ByteStream;
use super::tables;

/// Decode progress. The variant order matters: `Error` sorts below
/// `FrameDecoded`, so ordered comparisons treat a failed decode like one
/// that never produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum State {
    NotDecoded,
    Error,
    FrameDecoded,
    HeaderDecoded,
    BitmapDecoded,
}

/// A baseline JPEG decoder over a borrowed byte slice.
pub struct JpegDecoder<'a> {
    data: &'a [u8],
    state: State,
    error: Option<JpegError>,
    frame: Option<FrameHeader>,
    quant_tables: [[u16; 64]; 2],
    dc_tables: [Option<HuffmanTable>; 2],
    ac_tables: [Option<HuffmanTable>; 2],
    reset_interval: u16,
    /// Byte offset of the entropy-coded data, set when SOS is reached.
    scan_start: usize,
    icc_chunks: Option<IccChunkState>,
    icc_data: Option<Vec<u8>>,
    bitmap: Option<Bitmap>,
}

impl<'a> JpegDecoder<'a> {
    /// True iff the data starts with the JPEG SOI pattern FF D8 FF.
    pub fn sniff(data: &[u8]) -> bool {
        data.len() >= 3 && data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF
    }

    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            state: State::NotDecoded,
            error: None,
            frame: None,
            quant_tables: [[0; 64]; 2],
            dc_tables: [None, None],
            ac_tables: [None, None],
            reset_interval: 0,
            scan_start: 0,
            icc_chunks: None,
            icc_data: None,
            bitmap: None,
        }
    }

    /// Image dimensions, or (0, 0) until a frame header has been decoded.
    pub fn size(&self) -> (u16, u16) {
        if self.state >= State::FrameDecoded {
            if let Some(frame) = &self.frame {
                return (frame.width, frame.height);
            }
        }
        (0, 0)
    }

    pub fn frame_count(&self) -> usize {
        1
    }

    pub fn loop_count(&self) -> usize {
        0
    }

    pub fn is_animated(&self) -> bool {
        false
    }

    /// Decode (or return the cached) bitmap. Only frame 0 exists.
    pub fn frame(&mut self, index: usize) -> Result<&Bitmap> {
        if index != 0 {
            return Err(JpegError::BoundsError);
        }
        self.decode_header()?;
        if self.state < State::BitmapDecoded {
            match self.decode_bitmap() {
                Ok(bitmap) => {
                    self.state = State::BitmapDecoded;
                    self.bitmap = Some(bitmap);
                }
                Err(error) => return Err(self.latch(error)),
            }
        }
        self.bitmap.as_ref().ok_or(JpegError::BoundsError)
    }

    /// The embedded ICC profile, if the header carries a complete one.
    /// Triggers header decoding.
    pub fn icc_data(&mut self) -> Result<Option<&[u8]>> {
        self.decode_header()?;
        Ok(self.icc_data.as_deref())
    }

    fn decode_header(&mut self) -> Result<()> {
        if self.state == State::Error {
            return Err(self.latched_error());
        }
        if self.state < State::HeaderDecoded {
            if let Err(error) = self.parse_header() {
                return Err(self.latch(error));
            }
            self.state = State::HeaderDecoded;
        }
        Ok(())
    }

    /// Walk the marker stream from SOI up to (and including) the SOS header.
    fn parse_header(&mut self) -> Result<()> {
        let mut stream = ByteStream::new(self.data);
        if marker::read_marker(&mut stream)? != marker::SOI {
            return Err(JpegError::InvalidSignature);
        }
        loop {
            let m = marker::read_marker(&mut stream)?;
            log::trace!("marker {m:#06X} at offset {}", stream.position());
            match m {
                marker::INVALID | marker::SOI | marker::EOI => {
                    return Err(JpegError::UnexpectedMarker(m));
                }
                _ if marker::is_restart(m) => return Err(JpegError::UnexpectedMarker(m)),
                _ if marker::is_app(m) => {
                    let body = read_segment(&mut stream)?;
                    icc::read_app_segment(
                        body,
                        (m - marker::APP0) as u8,
                        &mut self.icc_chunks,
                        &mut self.icc_data,
                    )?;
                }
                marker::SOF0 => {
                    if self.frame.is_some() {
                        return Err(JpegError::MalformedSegment("repeated SOF segment"));
                    }
                    let body = read_segment(&mut stream)?;
                    self.frame = Some(frame::parse_sof(body)?);
                    self.state = State::FrameDecoded;
                }
                _ if marker::is_frame(m) => {
                    log::debug!("rejecting frame type SOF{}", m & 0x0F);
                    return Err(JpegError::UnsupportedProfile(
                        "only baseline sequential DCT frames are supported",
                    ));
                }
                marker::DQT => {
                    let body = read_segment(&mut stream)?;
                    tables::parse_dqt(body, &mut self.quant_tables)?;
                }
                marker::DHT => {
                    let body = read_segment(&mut stream)?;
                    for table in tables::parse_dht(body)? {
                        let slot = table.destination_id as usize;
                        match table.class {
                            TableClass::Dc => self.dc_tables[slot] = Some(table),
                            TableClass::Ac => self.ac_tables[slot] = Some(table),
                        }
                    }
                }
                marker::DRI => {
                    let body = read_segment(&mut stream)?;
                    self.reset_interval = tables::parse_dri(body)?;
                }
                marker::SOS => {
                    let body = read_segment(&mut stream)?;
                    let frame = self
                        .frame
                        .as_mut()
                        .ok_or(JpegError::MalformedSegment("SOS before SOF"))?;
                    scan::parse_sos(body, frame, &self.dc_tables, &self.ac_tables)?;
                    self.scan_start = stream.position();
                    return Ok(());
                }
                _ => {
                    // COM, DHP, EXP and reserved markers: skip by length.
                    read_segment(&mut stream)?;
                }
            }
        }
    }

    /// Run the pipeline after the header: extract the entropy stream,
    /// Huffman-decode, dequantize + IDCT, convert color, compose.
    fn decode_bitmap(&mut self) -> Result<Bitmap> {
        let frame = self
            .frame
            .as_ref()
            .ok_or(JpegError::MalformedSegment("SOS before SOF"))?;

        // Huffman codewords are generated once the header is complete.
        for table in self.dc_tables.iter_mut().flatten() {
            table.generate_codes();
        }
        for table in self.ac_tables.iter_mut().flatten() {
            table.generate_codes();
        }

        let mut stream = ByteStream::new_at(self.data, self.scan_start);
        let entropy = bitio::extract_entropy_stream(&mut stream)?;
        let mut reader = BitReader::new(entropy);

        let mut macroblocks = scan::decode_scan(
            frame,
            &self.dc_tables,
            &self.ac_tables,
            self.reset_interval,
            &mut reader,
        )?;
        idct::dequantize_and_idct(frame, &self.quant_tables, &mut macroblocks);
        let rgb = color::ycbcr_to_rgb(frame, &macroblocks);
        Ok(bitmap::compose_bitmap(frame, &rgb))
    }

    fn latch(&mut self, error: JpegError) -> JpegError {
        log::debug!("decode failed: {error}");
        self.state = State::Error;
        self.error = Some(error.clone());
        error
    }

    fn latched_error(&self) -> JpegError {
        self.error.clone().unwrap_or(JpegError::InvalidSignature)
    }
}

fn read_segment<'d>(stream: &mut ByteStream<'d>) -> Result<&'d [u8]> {
    let length = stream.read_u16()? as usize;
    if length < 2 {
        return Err(JpegError::MalformedSegment("segment length shorter than its length field"));
    }
    stream.take(length - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_checks_the_soi_pattern() {
        assert!(JpegDecoder::sniff(&[0xFF, 0xD8, 0xFF]));
        assert!(JpegDecoder::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]));
        assert!(!JpegDecoder::sniff(&[0xFF, 0xD8]));
        assert!(!JpegDecoder::sniff(&[0x89, 0x50, 0x4E]));
        assert!(!JpegDecoder::sniff(&[]));
    }

    #[test]
    fn fresh_handle_reports_nothing() {
        let decoder = JpegDecoder::new(&[0xFF, 0xD8, 0xFF]);
        assert_eq!(decoder.size(), (0, 0));
        assert_eq!(decoder.frame_count(), 1);
        assert_eq!(decoder.loop_count(), 0);
        assert!(!decoder.is_animated());
    }

    #[test]
    fn only_frame_zero_exists() {
        let mut decoder = JpegDecoder::new(&[0xFF, 0xD8, 0xFF]);
        assert_eq!(decoder.frame(1).unwrap_err(), JpegError::BoundsError);
    }

    #[test]
    fn missing_soi_is_an_invalid_signature() {
        let mut decoder = JpegDecoder::new(&[0x00, 0x01, 0x02, 0x03]);
        assert_eq!(decoder.frame(0).unwrap_err(), JpegError::InvalidSignature);
        // The failure is latched.
        assert_eq!(decoder.icc_data().unwrap_err(), JpegError::InvalidSignature);
        assert_eq!(decoder.size(), (0, 0));
    }

    #[test]
    fn stray_restart_marker_in_header() {
        let mut decoder = JpegDecoder::new(&[0xFF, 0xD8, 0xFF, 0xD1]);
        assert_eq!(decoder.frame(0).unwrap_err(), JpegError::UnexpectedMarker(0xFFD1));
    }

    #[test]
    fn truncated_segment_is_a_bounds_error() {
        // An APP0 claiming 100 bytes with only 2 present.
        let mut decoder = JpegDecoder::new(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x64, 0x4A, 0x46]);
        assert_eq!(decoder.frame(0).unwrap_err(), JpegError::BoundsError);
    }
}
