//! Fixed 12-byte packet header.
//!
//! ## Wire format
//!
//! ```text
//! sequence:    i32  (4)  big-endian
//! part_index:  i32  (4)  big-endian
//! part_count:  i32  (4)  big-endian
//! payload:     [u8] (0..=MAX_PAYLOAD_PER_PACKET)
//! ```

use crate::error::FrameError;
use crate::sequence::SequenceNumber;

// ── Constants ────────────────────────────────────────────────────

/// Encoded header size on the wire.
pub const HEADER_SIZE: usize = 12;

/// Largest UDP payload that fits an IPv4 datagram (65535 − 20 − 8).
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// Largest frame slice a single packet may carry.
pub const MAX_PAYLOAD_PER_PACKET: usize = MAX_DATAGRAM_SIZE - HEADER_SIZE;

// ── FrameHeader ──────────────────────────────────────────────────

/// Per-packet metadata prepended to every datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub sequence: SequenceNumber,
    pub part_index: i32,
    pub part_count: i32,
}

impl FrameHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = HEADER_SIZE;

    pub fn new(sequence: SequenceNumber, part_index: i32, part_count: i32) -> Self {
        Self {
            sequence,
            part_index,
            part_count,
        }
    }

    /// Serialize to bytes (big-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.sequence.get().to_be_bytes());
        buf[4..8].copy_from_slice(&self.part_index.to_be_bytes());
        buf[8..12].copy_from_slice(&self.part_count.to_be_bytes());
        buf
    }

    /// Deserialize from the first [`HEADER_SIZE`] bytes of `data`.
    ///
    /// Only the layout is checked; field ranges are checked by
    /// [`validate`](Self::validate).
    pub fn decode(data: &[u8]) -> Result<Self, FrameError> {
        let Some(raw) = data.first_chunk::<HEADER_SIZE>() else {
            return Err(FrameError::MalformedHeader { len: data.len() });
        };
        Ok(Self {
            sequence: SequenceNumber::new(read_i32(raw, 0)),
            part_index: read_i32(raw, 4),
            part_count: read_i32(raw, 8),
        })
    }

    /// Check `part_count >= 1` and `0 <= part_index < part_count`.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.part_count < 1 {
            return Err(FrameError::InvalidPartCount(self.part_count));
        }
        if self.part_index < 0 || self.part_index >= self.part_count {
            return Err(FrameError::PartIndexOutOfRange {
                index: self.part_index,
                count: self.part_count,
            });
        }
        Ok(())
    }

    /// `part_index` as a slot index. Only meaningful after [`validate`](Self::validate).
    pub fn index(&self) -> usize {
        self.part_index as usize
    }

    /// `part_count` as a slot count. Only meaningful after [`validate`](Self::validate).
    pub fn count(&self) -> usize {
        self.part_count as usize
    }
}

fn read_i32(raw: &[u8; HEADER_SIZE], at: usize) -> i32 {
    i32::from_be_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]])
}

// ── Tests ────────────────────────────────────────────────────────
