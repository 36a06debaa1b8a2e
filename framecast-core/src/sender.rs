//! Sender-side capture loop.
//!
//! Each tick:
//!
//! 1. [`FrameSource::capture`] produces an encoded frame.
//! 2. [`Packetizer::split`] fragments it under the next sequence number.
//! 3. [`FrameTransport::send_frame`] sends every part in index order.
//! 4. The loop sleeps a fixed `1s / target_fps`.
//!
//! There is no catch-up: a slow tick simply delays the next one. Capture
//! failures skip the tick; transport failures end the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::FrameError;
use crate::header::MAX_PAYLOAD_PER_PACKET;
use crate::packetizer::Packetizer;
use crate::sequence::SequenceNumber;
use crate::source::FrameSource;
use crate::transport::FrameTransport;

// ── SenderOptions ────────────────────────────────────────────────

/// Configuration for [`FrameSender`].
#[derive(Debug, Clone)]
pub struct SenderOptions {
    /// Target frames per second (at least 1).
    pub target_fps: u32,
    /// Per-packet payload limit in bytes.
    pub max_payload: usize,
    /// Sequence number of the first frame.
    pub initial_sequence: i32,
}

impl Default for SenderOptions {
    fn default() -> Self {
        Self {
            target_fps: 20,
            max_payload: MAX_PAYLOAD_PER_PACKET,
            initial_sequence: 0,
        }
    }
}

impl SenderOptions {
    /// Fixed sleep between ticks.
    pub fn tick_delay(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

// ── SenderStats ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderStats {
    /// Frames fully handed to the transport.
    pub frames_sent: u64,
    /// Packets handed to the transport.
    pub packets_sent: u64,
    /// Ticks skipped because capture or packetizing failed.
    pub ticks_skipped: u64,
}

// ── FrameSender ──────────────────────────────────────────────────

/// Captures, packetizes and sends frames at a fixed rate.
pub struct FrameSender<S> {
    source: S,
    transport: FrameTransport,
    packetizer: Packetizer,
    next_sequence: SequenceNumber,
    tick_delay: Duration,
    running: Arc<AtomicBool>,
    stats: SenderStats,
}

impl<S: FrameSource> FrameSender<S> {
    pub fn new(source: S, transport: FrameTransport) -> Result<Self, FrameError> {
        Self::with_options(source, transport, SenderOptions::default())
    }

    pub fn with_options(
        source: S,
        transport: FrameTransport,
        options: SenderOptions,
    ) -> Result<Self, FrameError> {
        Ok(Self {
            source,
            transport,
            packetizer: Packetizer::with_max_payload(options.max_payload)?,
            next_sequence: SequenceNumber::new(options.initial_sequence),
            tick_delay: options.tick_delay(),
            running: Arc::new(AtomicBool::new(true)),
            stats: SenderStats::default(),
        })
    }

    /// A cloneable handle; storing `false` ends [`run`](Self::run) after
    /// the current tick, or before the first one if `run` has not started.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    pub fn transport(&self) -> &FrameTransport {
        &self.transport
    }

    /// Sequence number the next produced frame will carry.
    pub fn next_sequence(&self) -> SequenceNumber {
        self.next_sequence
    }

    /// Run the capture loop until stopped or the transport fails.
    pub async fn run(&mut self) -> Result<(), FrameError> {
        info!(
            remote = ?self.transport.remote_addr(),
            delay_ms = self.tick_delay.as_millis() as u64,
            "sender started"
        );

        while self.running.load(Ordering::SeqCst) {
            self.tick().await?;
            tokio::time::sleep(self.tick_delay).await;
        }

        info!(frames = self.stats.frames_sent, "sender stopped");
        Ok(())
    }

    /// One capture → packetize → send cycle, without the sleep.
    ///
    /// Returns the sequence number used, or `None` when the tick was skipped.
    pub async fn tick(&mut self) -> Result<Option<SequenceNumber>, FrameError> {
        let frame = match self.source.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.ticks_skipped += 1;
                warn!(error = %e, "capture failed; skipping tick");
                return Ok(None);
            }
        };

        let sequence = self.next_sequence;
        let frame_len = frame.len();
        let packets = match self.packetizer.split(frame, sequence) {
            Ok(packets) => packets,
            Err(e) => {
                self.stats.ticks_skipped += 1;
                warn!(error = %e, "cannot packetize frame; skipping tick");
                return Ok(None);
            }
        };
        self.next_sequence = sequence.next();

        self.transport.send_frame(&packets).await?;

        self.stats.frames_sent += 1;
        self.stats.packets_sent += packets.len() as u64;
        debug!(seq = %sequence, parts = packets.len(), bytes = frame_len, "frame sent");
        Ok(Some(sequence))
    }

    /// Signal the loop to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

// ── Tests ────────────────────────────────────────────────────────
