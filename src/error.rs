// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for JPEG decoding.

use std::fmt;

/// Errors that can occur while decoding a JPEG stream.
///
/// All errors are fatal: the first one aborts the pipeline and latches the
/// decoder into its error state. No partial bitmap is ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JpegError {
    /// The SOI signature is missing; the input is not a JPEG.
    InvalidSignature,
    /// The stream is a JPEG, but uses a profile outside baseline sequential
    /// DCT (progressive, arithmetic, 12-bit, CMYK, unsupported sampling, ...).
    UnsupportedProfile(&'static str),
    /// A marker segment has an inconsistent length or invalid content.
    MalformedSegment(&'static str),
    /// The entropy-coded scan data could not be Huffman-decoded.
    EntropyError(&'static str),
    /// A marker appeared where it is not allowed, or an unrecognized
    /// marker sequence was read (0x0000 denotes an invalid sequence).
    UnexpectedMarker(u16),
    /// A read would run past the end of the input, or the image dimensions
    /// exceed the configured maxima.
    BoundsError,
}

impl fmt::Display for JpegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "missing SOI signature (not a JPEG)"),
            Self::UnsupportedProfile(msg) => write!(f, "unsupported JPEG profile: {msg}"),
            Self::MalformedSegment(msg) => write!(f, "malformed marker segment: {msg}"),
            Self::EntropyError(msg) => write!(f, "entropy decode error: {msg}"),
            Self::UnexpectedMarker(m) => write!(f, "unexpected marker: {m:#06X}"),
            Self::BoundsError => write!(f, "read out of bounds or image too large"),
        }
    }
}

impl std::error::Error for JpegError {}

pub type Result<T> = std::result::Result<T, JpegError>;
