//! Receiver-side datagram loop.
//!
//! Pulls datagrams from the [`FrameTransport`], feeds them to the
//! [`Reassembler`] inline, and publishes each completed frame on a
//! `tokio::sync::watch` channel. The channel holds only the newest frame,
//! so a slow sink never stalls reception; it just sees fewer frames.
//!
//! Statistics go out on a second watch channel after every datagram, so
//! drop counters stay current even while no frame completes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::info;

use crate::error::FrameError;
use crate::reassembly::{CompletedFrame, ReassemblyStats, Reassembler};
use crate::sequence::SequenceNumber;
use crate::transport::{FrameTransport, TransportStats};

const FPS_WINDOW: usize = 60;

// ── ReceiverStats ────────────────────────────────────────────────

/// Statistics published after every received datagram.
#[derive(Debug, Clone, Default)]
pub struct ReceiverStats {
    /// Smoothed completed frames per second.
    pub fps: f64,
    /// Sequence of the most recent completed frame.
    pub last_sequence: Option<SequenceNumber>,
    /// Size of the most recent completed frame.
    pub last_frame_bytes: usize,
    pub reassembly: ReassemblyStats,
    pub transport: TransportStats,
}

// ── FrameReceiver ────────────────────────────────────────────────

/// Owns the reassembler and the receive loop.
pub struct FrameReceiver {
    transport: FrameTransport,
    reassembler: Reassembler,
    running: Arc<AtomicBool>,
    frame_tx: watch::Sender<Option<CompletedFrame>>,
    frame_rx: watch::Receiver<Option<CompletedFrame>>,
    stats_tx: watch::Sender<ReceiverStats>,
    stats_rx: watch::Receiver<ReceiverStats>,
    intervals: VecDeque<Duration>,
    last_frame_at: Option<Instant>,
    snapshot: ReceiverStats,
}

impl FrameReceiver {
    pub fn new(transport: FrameTransport) -> Self {
        Self::with_reassembler(transport, Reassembler::new())
    }

    pub fn with_reassembler(transport: FrameTransport, reassembler: Reassembler) -> Self {
        let (frame_tx, frame_rx) = watch::channel(None);
        let (stats_tx, stats_rx) = watch::channel(ReceiverStats::default());
        Self {
            transport,
            reassembler,
            running: Arc::new(AtomicBool::new(true)),
            frame_tx,
            frame_rx,
            stats_tx,
            stats_rx,
            intervals: VecDeque::with_capacity(FPS_WINDOW),
            last_frame_at: None,
            snapshot: ReceiverStats::default(),
        }
    }

    /// Receiver for the newest completed frame. Hand it to
    /// [`spawn_sink`](crate::sink::spawn_sink).
    pub fn frame_receiver(&self) -> watch::Receiver<Option<CompletedFrame>> {
        self.frame_rx.clone()
    }

    pub fn stats_receiver(&self) -> watch::Receiver<ReceiverStats> {
        self.stats_rx.clone()
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn transport(&self) -> &FrameTransport {
        &self.transport
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// Run the receive loop.
    ///
    /// Returns only when stopped (checked between datagrams, and before
    /// the first one) or when the socket fails. Malformed datagrams never
    /// end the loop.
    pub async fn run(&mut self) -> Result<(), FrameError> {
        info!(local = ?self.transport.local_addr().ok(), "receiver started");

        let mut buf = FrameTransport::recv_buffer();
        while self.running.load(Ordering::SeqCst) {
            let (len, _) = self.transport.recv_datagram(&mut buf).await?;
            self.handle_datagram(&buf[..len]);
        }

        info!(frames = self.reassembler.stats().completed, "receiver stopped");
        Ok(())
    }

    /// Feed one datagram through the reassembler, publish any frame it
    /// completes, then publish updated statistics.
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Option<SequenceNumber> {
        let completed = match self.reassembler.on_packet(datagram) {
            Some(frame) => {
                let sequence = frame.sequence;
                self.record_frame(sequence, frame.data.len());
                self.frame_tx.send_replace(Some(frame));
                Some(sequence)
            }
            None => None,
        };
        self.publish_stats();
        completed
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // ── Internal ─────────────────────────────────────────────────

    fn record_frame(&mut self, sequence: SequenceNumber, bytes: usize) {
        let now = Instant::now();
        if let Some(prev) = self.last_frame_at.replace(now) {
            if self.intervals.len() == FPS_WINDOW {
                self.intervals.pop_front();
            }
            self.intervals.push_back(now.duration_since(prev));
        }

        self.snapshot.fps = if self.intervals.is_empty() {
            0.0
        } else {
            let avg = self.intervals.iter().map(Duration::as_secs_f64).sum::<f64>()
                / self.intervals.len() as f64;
            if avg > 0.0 { 1.0 / avg } else { 0.0 }
        };
        self.snapshot.last_sequence = Some(sequence);
        self.snapshot.last_frame_bytes = bytes;
    }

    fn publish_stats(&mut self) {
        self.snapshot.reassembly = self.reassembler.stats();
        self.snapshot.transport = self.transport.stats();
        self.stats_tx.send_replace(self.snapshot.clone());
    }
}

// ── Tests ────────────────────────────────────────────────────────
