//! A single datagram: [`FrameHeader`] + one slice of a frame.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::header::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_PER_PACKET};
use crate::sequence::SequenceNumber;

/// One fragment of a frame. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header: FrameHeader,
    payload: Bytes,
}

impl Packet {
    /// Build a packet, checking the header ranges and payload size.
    pub fn new(header: FrameHeader, payload: Bytes) -> Result<Self, FrameError> {
        header.validate()?;
        if payload.len() > MAX_PAYLOAD_PER_PACKET {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_PER_PACKET,
            });
        }
        Ok(Self { header, payload })
    }

    /// Parse a received datagram.
    ///
    /// Copies the payload out of `datagram`, so the receive buffer can be
    /// reused immediately.
    pub fn parse(datagram: &[u8]) -> Result<Self, FrameError> {
        let header = FrameHeader::decode(datagram)?;
        Self::new(header, Bytes::copy_from_slice(&datagram[HEADER_SIZE..]))
    }

    /// Serialize into a single datagram.
    pub fn to_datagram(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.datagram_len());
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Size of the datagram this packet serializes to.
    pub fn datagram_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.header.sequence
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

// ── Tests ────────────────────────────────────────────────────────
