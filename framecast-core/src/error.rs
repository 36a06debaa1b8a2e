//! Domain-specific error types for the framecast transport.
//!
//! All fallible operations return `Result<T, FrameError>`.
//! Malformed datagrams never reach the caller as errors: the reassembler
//! classifies them internally and drops them.

use thiserror::Error;

/// The canonical error type for framecast.
#[derive(Debug, Error)]
pub enum FrameError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// Fewer bytes than a full packet header were supplied.
    #[error("malformed header: {len} bytes (need {})", crate::header::HEADER_SIZE)]
    MalformedHeader { len: usize },

    /// A header announced a part count below one.
    #[error("invalid part count: {0}")]
    InvalidPartCount(i32),

    /// A header's part index does not fall inside `[0, part_count)`.
    #[error("part index {index} out of range for {count} parts")]
    PartIndexOutOfRange { index: i32, count: i32 },

    /// A packet of the frame being assembled disagrees on the part count.
    #[error("part count mismatch: assembling {expected}, packet says {actual}")]
    PartCountMismatch { expected: usize, actual: usize },

    /// A header announced more parts than the receiver will allocate for.
    #[error("too many parts: {count} (max {max})")]
    TooManyParts { count: usize, max: usize },

    /// A packet payload exceeds the per-packet limit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    // ── Packetizer Errors ────────────────────────────────────────
    /// The configured per-packet payload limit is zero or above the protocol ceiling.
    #[error("invalid payload limit: {0} bytes")]
    InvalidPayloadLimit(usize),

    /// A frame needs more parts than a 32-bit header can describe.
    #[error("frame too large: {size} bytes would need {parts} parts")]
    FrameTooLarge { size: usize, parts: usize },

    // ── Transport Errors ─────────────────────────────────────────
    /// The UDP socket reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    // ── Collaborator Errors ──────────────────────────────────────
    /// A frame source could not produce bytes this tick.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Encoding or decoding of an image failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// A frame sink could not display a frame.
    #[error("sink error: {0}")]
    Sink(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for FrameError {
    fn from(s: String) -> Self {
        FrameError::Other(s)
    }
}

impl From<&str> for FrameError {
    fn from(s: &str) -> Self {
        FrameError::Other(s.to_string())
    }
}
