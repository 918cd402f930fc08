// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Application segments and ICC profile reassembly.
//!
//! Every APPn payload starts with a NUL-terminated ASCII identifier. Only
//! APP2 segments tagged `ICC_PROFILE` matter here: an ICC profile may be
//! split across up to 255 such segments, each carrying a 1-based sequence
//! number and the total chunk count. Chunks may arrive in any order; the
//! profile is concatenated by sequence number once all chunks are present.

use super::error::{JpegError, Result};

const ICC_PROFILE_IDENTIFIER: &[u8] = b"ICC_PROFILE";

/// Reassembly state spanning multiple APP2 segments.
#[derive(Debug, Default)]
pub struct IccChunkState {
    seen_chunks: u8,
    chunks: Vec<Option<Vec<u8>>>,
}

/// Parse one APPn segment body.
///
/// `app_number` is the marker's low nibble (0 for APP0, 2 for APP2, ...).
/// ICC chunks feed `state`; once the last chunk arrives the assembled
/// profile is stored in `icc_data`. All other application segments are
/// read past and ignored.
pub fn read_app_segment(
    body: &[u8],
    app_number: u8,
    state: &mut Option<IccChunkState>,
    icc_data: &mut Option<Vec<u8>>,
) -> Result<()> {
    if body.is_empty() {
        return Err(JpegError::MalformedSegment("application segment too small"));
    }

    let nul = body
        .iter()
        .position(|&b| b == 0)
        .ok_or(JpegError::MalformedSegment("unterminated application segment identifier"))?;
    let identifier = &body[..nul];
    let payload = &body[nul + 1..];

    if app_number == 2 && identifier == ICC_PROFILE_IDENTIFIER {
        return read_icc_chunk(payload, state, icc_data);
    }
    log::trace!("skipping APP{app_number} segment ({} bytes)", body.len());
    Ok(())
}

fn read_icc_chunk(
    payload: &[u8],
    state: &mut Option<IccChunkState>,
    icc_data: &mut Option<Vec<u8>>,
) -> Result<()> {
    if payload.len() <= 2 {
        return Err(JpegError::MalformedSegment("ICC chunk too small"));
    }
    let sequence_number = payload[0];
    let chunk_count = payload[1];
    let chunk = &payload[2..];

    let state = state.get_or_insert_with(|| IccChunkState {
        seen_chunks: 0,
        chunks: vec![None; chunk_count as usize],
    });

    if state.seen_chunks as usize >= state.chunks.len() {
        return Err(JpegError::MalformedSegment("too many ICC chunks"));
    }
    if state.chunks.len() != chunk_count as usize {
        return Err(JpegError::MalformedSegment("inconsistent ICC chunk count"));
    }
    if sequence_number == 0 {
        return Err(JpegError::MalformedSegment("ICC chunk sequence number is not 1-based"));
    }
    let index = (sequence_number - 1) as usize;
    if index >= state.chunks.len() {
        return Err(JpegError::MalformedSegment("ICC chunk sequence number out of range"));
    }
    if state.chunks[index].is_some() {
        return Err(JpegError::MalformedSegment("duplicate ICC chunk"));
    }

    state.chunks[index] = Some(chunk.to_vec());
    state.seen_chunks += 1;
    log::debug!(
        "ICC chunk {sequence_number}/{chunk_count} ({} bytes)",
        chunk.len()
    );

    if state.seen_chunks as usize == state.chunks.len() {
        let total: usize = state.chunks.iter().flatten().map(Vec::len).sum();
        let mut assembled = Vec::with_capacity(total);
        for chunk in state.chunks.iter().flatten() {
            assembled.extend_from_slice(chunk);
        }
        *icc_data = Some(assembled);
    }
    Ok(())
}
