//! Frame sinks for the receiver.
//!
//! A [`FrameSink`] consumes completed frames on its own task, fed by the
//! receive loop's watch channel. Sink failures discard the frame and never
//! reach the receive loop.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::FrameError;
use crate::image::RawImage;
use crate::reassembly::CompletedFrame;

/// Displays (or otherwise consumes) completed frames.
#[async_trait]
pub trait FrameSink: Send {
    async fn display(&mut self, frame: CompletedFrame) -> Result<(), FrameError>;
}

#[async_trait]
impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    async fn display(&mut self, frame: CompletedFrame) -> Result<(), FrameError> {
        (**self).display(frame).await
    }
}

// ── LogSink ──────────────────────────────────────────────────────

/// Logs each frame's sequence and size.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl FrameSink for LogSink {
    async fn display(&mut self, frame: CompletedFrame) -> Result<(), FrameError> {
        info!(seq = %frame.sequence, bytes = frame.data.len(), "frame received");
        Ok(())
    }
}

// ── FileSink ─────────────────────────────────────────────────────

/// How [`FileSink`] writes frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Frame bytes as received.
    Raw,
    /// Decode as [`RawImage`] and write PPM.
    Ppm,
}

/// Keeps `path` holding the newest frame.
///
/// Writes go to a sibling temp file first and are renamed into place, so
/// readers never observe a half-written frame.
pub struct FileSink {
    path: PathBuf,
    tmp_path: PathBuf,
    format: FileFormat,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>, format: FileFormat) -> Self {
        let path = path.into();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            path,
            tmp_path: tmp.into(),
            format,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl FrameSink for FileSink {
    async fn display(&mut self, frame: CompletedFrame) -> Result<(), FrameError> {
        let bytes = match self.format {
            FileFormat::Raw => frame.data.to_vec(),
            FileFormat::Ppm => RawImage::decode(&frame.data)?.to_ppm(),
        };
        tokio::fs::write(&self.tmp_path, &bytes)
            .await
            .map_err(|e| FrameError::Sink(format!("{}: {e}", self.tmp_path.display())))?;
        tokio::fs::rename(&self.tmp_path, &self.path)
            .await
            .map_err(|e| FrameError::Sink(format!("{}: {e}", self.path.display())))?;
        debug!(seq = %frame.sequence, path = %self.path.display(), "frame written");
        Ok(())
    }
}

// ── Sink task ────────────────────────────────────────────────────

/// Run `sink` on its own task, displaying the newest frame published on
/// `frames` each time it changes.
///
/// Frames published faster than the sink can keep up are coalesced: only
/// the latest is shown. The task ends when the sending side is dropped.
pub fn spawn_sink<S>(mut frames: watch::Receiver<Option<CompletedFrame>>, mut sink: S) -> JoinHandle<()>
where
    S: FrameSink + 'static,
{
    tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            let latest = frames.borrow_and_update().clone();
            let Some(frame) = latest else {
                continue;
            };
            let seq = frame.sequence;
            if let Err(e) = sink.display(frame).await {
                warn!(seq = %seq, error = %e, "discarding frame");
            }
        }
        debug!("frame channel closed; sink task exiting");
    })
}

// ── Tests ────────────────────────────────────────────────────────
