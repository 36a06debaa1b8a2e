//! Frame sources for the sender.
//!
//! A [`FrameSource`] produces one encoded frame per sender tick. A failed
//! capture only skips that tick.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FrameError;
use crate::image::RawImage;

/// Produces encoded frames on demand.
#[async_trait]
pub trait FrameSource: Send {
    /// Capture and encode the current frame.
    async fn capture(&mut self) -> Result<Bytes, FrameError>;
}

// ── PatternSource ────────────────────────────────────────────────

/// Synthetic moving test pattern at a fixed output size.
pub struct PatternSource {
    width: u32,
    height: u32,
    compression_level: i32,
    phase: u32,
}

impl PatternSource {
    pub fn new(width: u32, height: u32, compression_level: i32) -> Self {
        Self {
            width,
            height,
            compression_level,
            phase: 0,
        }
    }
}

#[async_trait]
impl FrameSource for PatternSource {
    async fn capture(&mut self) -> Result<Bytes, FrameError> {
        let image = RawImage::test_pattern(self.width, self.height, self.phase)?;
        self.phase = self.phase.wrapping_add(4);
        Ok(image.encode(self.compression_level)?.into())
    }
}

// ── FileSource ───────────────────────────────────────────────────

/// Re-reads an already encoded image from disk on every tick.
///
/// Lets an external capture tool feed the sender by overwriting one file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSource for FileSource {
    async fn capture(&mut self) -> Result<Bytes, FrameError> {
        tokio::fs::read(&self.path)
            .await
            .map(Bytes::from)
            .map_err(|e| FrameError::Capture(format!("{}: {e}", self.path.display())))
    }
}

// ── Tests ────────────────────────────────────────────────────────
