//! Minimal raster image and its compressed encoding.
//!
//! The transport treats frames as opaque bytes. This module provides the
//! encoding used by the built-in test-pattern source and the PPM sink.
//!
//! ## Encoded layout
//!
//! ```text
//! width:   u32  (4)  big-endian
//! height:  u32  (4)  big-endian
//! pixels:  [u8]      zstd(RGB8 rows, tightly packed)
//! ```

use crate::error::FrameError;

/// Bytes per RGB8 pixel.
pub const BYTES_PER_PIXEL: usize = 3;

/// Largest accepted width or height. Bounds the decode allocation.
pub const MAX_DIMENSION: u32 = 8192;

const PREFIX_LEN: usize = 8;

// ── RawImage ─────────────────────────────────────────────────────

/// An uncompressed RGB8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major, no padding.
    pub pixels: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(FrameError::Codec(format!(
                "pixel buffer is {} bytes, {width}x{height} needs {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Diagonal colour bands that shift with `phase`, so consecutive
    /// frames are visibly different.
    pub fn test_pattern(width: u32, height: u32, phase: u32) -> Result<Self, FrameError> {
        check_dimensions(width, height)?;
        let mut pixels = Vec::with_capacity(byte_len(width, height));
        for y in 0..height {
            for x in 0..width {
                let d = x.wrapping_add(y).wrapping_add(phase);
                pixels.push((d & 0xFF) as u8);
                pixels.push(((x * 255) / width.max(1)) as u8);
                pixels.push(((y * 255) / height.max(1)) as u8);
            }
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Compress into the encoded layout.
    pub fn encode(&self, level: i32) -> Result<Vec<u8>, FrameError> {
        let compressed = zstd::bulk::compress(&self.pixels, level)
            .map_err(|e| FrameError::Codec(format!("zstd encode failed: {e}")))?;

        let mut out = Vec::with_capacity(PREFIX_LEN + compressed.len());
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&compressed);
        Ok(out)
    }

    /// Parse the encoded layout.
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        let Some((prefix, body)) = data.split_first_chunk::<PREFIX_LEN>() else {
            return Err(FrameError::Codec(format!(
                "image too short: {} < {PREFIX_LEN}",
                data.len()
            )));
        };
        let width = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
        let height = u32::from_be_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);
        check_dimensions(width, height)?;

        let expected = byte_len(width, height);
        let pixels = zstd::bulk::decompress(body, expected)
            .map_err(|e| FrameError::Codec(format!("zstd decode failed: {e}")))?;
        Self::new(width, height, pixels)
    }

    /// Binary PPM (P6) rendering.
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.pixels);
        out
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), FrameError> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(FrameError::Codec(format!(
            "unsupported dimensions {width}x{height}"
        )));
    }
    Ok(())
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

// ── Tests ────────────────────────────────────────────────────────
