//! # framecast-core
//!
//! Freshness-first frame transport over UDP.
//!
//! A sender splits each encoded frame into datagrams of at most
//! [`MAX_DATAGRAM_SIZE`] bytes; the receiver reassembles one frame at a
//! time and abandons it as soon as a newer frame shows up. There is no
//! retransmission, acknowledgment or handshake.
//!
//! ```text
//! SENDER                                   RECEIVER
//! ┌──────────────────┐                     ┌──────────────────────┐
//! │ FrameSource      │                     │ FrameTransport::recv │
//! │   ↓              │                     │   ↓                  │
//! │ Packetizer       │        UDP          │ Reassembler          │
//! │   ↓              │ ─────────────────►  │   ↓  (watch channel) │
//! │ FrameTransport   │                     │ FrameSink task       │
//! └──────────────────┘                     └──────────────────────┘
//! ```
//!
//! This crate contains:
//! - **Protocol**: `FrameHeader`, `Packet`, `SequenceNumber`
//! - **Sender side**: `Packetizer`, `FrameSender`, `FrameSource` impls
//! - **Receiver side**: `Reassembler`, `FrameReceiver`, `FrameSink` impls
//! - **Transport**: `FrameTransport` over `tokio::net::UdpSocket`
//! - **Image**: `RawImage`, the test-pattern encoding
//! - **Error**: `FrameError`, a `thiserror`-based error enum

pub mod error;
pub mod header;
pub mod image;
pub mod packet;
pub mod packetizer;
pub mod reassembly;
pub mod receiver;
pub mod sender;
pub mod sequence;
pub mod sink;
pub mod source;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use error::FrameError;
pub use header::{FrameHeader, HEADER_SIZE, MAX_DATAGRAM_SIZE, MAX_PAYLOAD_PER_PACKET};
pub use image::RawImage;
pub use packet::Packet;
pub use packetizer::{Packetizer, split};
pub use reassembly::{AssemblyView, CompletedFrame, DEFAULT_MAX_PARTS, ReassemblyStats, Reassembler};
pub use receiver::{FrameReceiver, ReceiverStats};
pub use sender::{FrameSender, SenderOptions, SenderStats};
pub use sequence::{Recency, SequenceNumber};
pub use sink::{FileFormat, FileSink, FrameSink, LogSink, spawn_sink};
pub use source::{FileSource, FrameSource, PatternSource};
pub use transport::{FrameTransport, TransportStats};
