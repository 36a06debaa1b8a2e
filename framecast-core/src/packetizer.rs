//! Sender-side fragmentation of encoded frames.
//!
//! A frame of `n` bytes becomes `max(1, ceil(n / limit))` packets. Packet
//! `i` carries bytes `[i * limit, min(n, (i + 1) * limit))`. Slices share the
//! frame's buffer, so splitting never copies payload bytes.

use bytes::Bytes;

use crate::error::FrameError;
use crate::header::{FrameHeader, MAX_PAYLOAD_PER_PACKET};
use crate::packet::Packet;
use crate::sequence::SequenceNumber;

/// Splits frames into packets no larger than a fixed payload limit.
#[derive(Debug, Clone, Copy)]
pub struct Packetizer {
    max_payload: usize,
}

impl Packetizer {
    /// Packetizer using the protocol maximum of [`MAX_PAYLOAD_PER_PACKET`].
    pub fn new() -> Self {
        Self {
            max_payload: MAX_PAYLOAD_PER_PACKET,
        }
    }

    /// Use a smaller per-packet payload, e.g. to stay below a link MTU.
    pub fn with_max_payload(max_payload: usize) -> Result<Self, FrameError> {
        if max_payload == 0 || max_payload > MAX_PAYLOAD_PER_PACKET {
            return Err(FrameError::InvalidPayloadLimit(max_payload));
        }
        Ok(Self { max_payload })
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Number of packets a frame of `len` bytes splits into.
    pub fn part_count(&self, len: usize) -> usize {
        len.div_ceil(self.max_payload).max(1)
    }

    /// Split `frame` into ordered packets tagged with `sequence`.
    pub fn split(
        &self,
        frame: impl Into<Bytes>,
        sequence: SequenceNumber,
    ) -> Result<Vec<Packet>, FrameError> {
        let frame: Bytes = frame.into();
        let parts = self.part_count(frame.len());
        let part_count = i32::try_from(parts).map_err(|_| FrameError::FrameTooLarge {
            size: frame.len(),
            parts,
        })?;

        let mut packets = Vec::with_capacity(parts);
        for index in 0..parts {
            let start = index * self.max_payload;
            let end = frame.len().min(start + self.max_payload);
            let header = FrameHeader::new(sequence, index as i32, part_count);
            packets.push(Packet::new(header, frame.slice(start..end))?);
        }
        Ok(packets)
    }
}

impl Default for Packetizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Split with the protocol maximum payload size.
pub fn split(
    frame: impl Into<Bytes>,
    sequence: SequenceNumber,
) -> Result<Vec<Packet>, FrameError> {
    Packetizer::new().split(frame, sequence)
}

// ── Tests ────────────────────────────────────────────────────────
