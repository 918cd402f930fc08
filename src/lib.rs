// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # softjpeg
//!
//! Baseline JPEG (JFIF) decoder: the codec core of a larger graphics stack.
//! Takes an in-memory JPEG byte slice and produces a 32-bit BGRx raster,
//! plus the embedded ICC color profile when one is present.
//!
//! Supports:
//! - Baseline sequential DCT (SOF0), 8-bit precision
//! - Grayscale and YCbCr with 4:4:4, 4:2:2, 4:4:0 and 4:2:0 subsampling
//! - Restart markers (DRI/RST)
//! - ICC profiles split across multiple APP2 segments
//!
//! Does NOT support:
//! - Progressive DCT (SOF2) or any other non-baseline frame type --
//!   rejected at parse time
//! - Arithmetic coding, 12-bit precision, CMYK/YCCK
//!
//! # Quick start
//!
//! ```rust,ignore
//! use softjpeg::JpegDecoder;
//!
//! let data = std::fs::read("photo.jpg")?;
//! let mut decoder = JpegDecoder::new(&data);
//! let bitmap = decoder.frame(0)?;
//! let (width, height) = (bitmap.width(), bitmap.height());
//! ```

pub mod bitio;
pub mod bitmap;
pub mod block;
pub mod color;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod huffman;
pub mod icc;
pub mod idct;
pub mod marker;
pub mod scan;
pub mod stream;
pub mod tables;
pub mod zigzag;

pub use bitmap::Bitmap;
pub use decoder::JpegDecoder;
pub use error::{JpegError, Result};
pub use frame::{MAX_HEIGHT, MAX_WIDTH};
