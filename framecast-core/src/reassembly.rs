//! Receiver-side frame reassembly.
//!
//! The [`Reassembler`] turns an unordered, lossy datagram stream into
//! complete frames while holding at most one frame in flight:
//!
//! ```text
//!            first packet / newer seq            last missing slot
//!   Empty ───────────────────────────► Assembling ───────────────► emit → Empty
//!                                        │   ▲
//!                       newer seq        │   │ same seq, new slot
//!              (drop current, restart)   └───┘
//! ```
//!
//! Older packets and duplicates leave the state untouched. Malformed
//! datagrams are counted and dropped; nothing is ever returned as an error.
//!
//! # Thread Safety
//!
//! Single writer. The receive loop owns the reassembler outright.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use crate::error::FrameError;
use crate::header::{FrameHeader, HEADER_SIZE, MAX_PAYLOAD_PER_PACKET};
use crate::sequence::{Recency, SequenceNumber};

/// Default ceiling on `part_count`. At the full payload size this admits
/// frames up to roughly 268 MB.
pub const DEFAULT_MAX_PARTS: usize = 4096;

// ── CompletedFrame ───────────────────────────────────────────────

/// A fully reassembled frame, ready for the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFrame {
    pub sequence: SequenceNumber,
    pub data: Bytes,
}

// ── ReassemblyStats ──────────────────────────────────────────────

/// Running counters of what the reassembler did with its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReassemblyStats {
    /// Frames emitted.
    pub completed: u64,
    /// Incomplete frames abandoned because a newer sequence arrived.
    pub superseded: u64,
    /// Packets ignored for belonging to an older sequence.
    pub stale: u64,
    /// Packets ignored because their slot was already filled.
    pub duplicates: u64,
    /// Datagrams dropped for a bad header, size or part count.
    pub malformed: u64,
}

// ── State ────────────────────────────────────────────────────────

/// Read-only snapshot of the reassembly state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyView {
    Empty,
    Assembling {
        sequence: SequenceNumber,
        part_count: usize,
        missing: usize,
    },
}

#[derive(Debug)]
struct Assembly {
    sequence: SequenceNumber,
    slots: Vec<Option<Bytes>>,
    /// Always equals the number of `None` slots.
    missing: usize,
}

#[derive(Debug, Default)]
enum ReassemblyState {
    #[default]
    Empty,
    Assembling(Assembly),
}

/// What a packet did to the frame in flight.
enum Step {
    Start,
    Supersede(SequenceNumber),
    Stale(SequenceNumber),
    Duplicate,
    Pending,
    Complete,
}

impl Assembly {
    fn new(header: &FrameHeader, payload: &[u8]) -> Self {
        let mut slots = vec![None; header.count()];
        slots[header.index()] = Some(Bytes::copy_from_slice(payload));
        Self {
            sequence: header.sequence,
            slots,
            missing: header.count() - 1,
        }
    }

    fn insert(&mut self, header: &FrameHeader, payload: &[u8]) -> Result<Step, FrameError> {
        if self.slots.len() != header.count() {
            return Err(FrameError::PartCountMismatch {
                expected: self.slots.len(),
                actual: header.count(),
            });
        }

        let slot = &mut self.slots[header.index()];
        if slot.is_some() {
            return Ok(Step::Duplicate);
        }
        *slot = Some(Bytes::copy_from_slice(payload));
        self.missing -= 1;

        Ok(if self.missing == 0 {
            Step::Complete
        } else {
            Step::Pending
        })
    }

    /// Concatenate the slots in index order.
    fn into_frame(self) -> CompletedFrame {
        let data = match self.slots.as_slice() {
            [Some(only)] => only.clone(),
            slots => {
                let len = slots.iter().flatten().map(Bytes::len).sum();
                let mut buf = BytesMut::with_capacity(len);
                for part in slots.iter().flatten() {
                    buf.put_slice(part);
                }
                buf.freeze()
            }
        };
        CompletedFrame {
            sequence: self.sequence,
            data,
        }
    }
}

// ── Reassembler ──────────────────────────────────────────────────

/// Single-frame, freshness-first reassembler.
#[derive(Debug)]
pub struct Reassembler {
    state: ReassemblyState,
    max_parts: usize,
    stats: ReassemblyStats,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::with_max_parts(DEFAULT_MAX_PARTS)
    }

    /// Reject headers announcing more than `max_parts` parts.
    pub fn with_max_parts(max_parts: usize) -> Self {
        Self {
            state: ReassemblyState::Empty,
            max_parts: max_parts.max(1),
            stats: ReassemblyStats::default(),
        }
    }

    /// Feed one received datagram. Returns a frame when this datagram
    /// filled its last missing slot.
    pub fn on_packet(&mut self, datagram: &[u8]) -> Option<CompletedFrame> {
        match self.accept(datagram) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.malformed += 1;
                trace!(len = datagram.len(), error = %e, "dropping malformed datagram");
                None
            }
        }
    }

    pub fn view(&self) -> AssemblyView {
        match &self.state {
            ReassemblyState::Empty => AssemblyView::Empty,
            ReassemblyState::Assembling(a) => AssemblyView::Assembling {
                sequence: a.sequence,
                part_count: a.slots.len(),
                missing: a.missing,
            },
        }
    }

    pub fn stats(&self) -> ReassemblyStats {
        self.stats
    }

    /// Discard any frame in flight.
    pub fn reset(&mut self) {
        self.state = ReassemblyState::Empty;
    }

    // ── Internal ─────────────────────────────────────────────────

    fn accept(&mut self, datagram: &[u8]) -> Result<Option<CompletedFrame>, FrameError> {
        let header = FrameHeader::decode(datagram)?;
        header.validate()?;
        if header.count() > self.max_parts {
            return Err(FrameError::TooManyParts {
                count: header.count(),
                max: self.max_parts,
            });
        }
        let payload = &datagram[HEADER_SIZE..];
        if payload.len() > MAX_PAYLOAD_PER_PACKET {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_PER_PACKET,
            });
        }

        let step = match &mut self.state {
            ReassemblyState::Empty => Step::Start,
            ReassemblyState::Assembling(current) => {
                match header.sequence.recency(current.sequence) {
                    Recency::Newer => Step::Supersede(current.sequence),
                    Recency::Older => Step::Stale(current.sequence),
                    Recency::Same => current.insert(&header, payload)?,
                }
            }
        };

        let frame = match step {
            Step::Start => self.start(&header, payload),
            Step::Supersede(dropped) => {
                self.stats.superseded += 1;
                debug!(dropped = %dropped, by = %header.sequence, "superseded incomplete frame");
                self.start(&header, payload)
            }
            Step::Stale(current) => {
                self.stats.stale += 1;
                trace!(seq = %header.sequence, current = %current, "ignoring stale packet");
                None
            }
            Step::Duplicate => {
                self.stats.duplicates += 1;
                trace!(seq = %header.sequence, index = header.part_index, "ignoring duplicate part");
                None
            }
            Step::Pending => None,
            Step::Complete => match std::mem::take(&mut self.state) {
                ReassemblyState::Assembling(done) => Some(self.emit(done)),
                ReassemblyState::Empty => None,
            },
        };
        Ok(frame)
    }

    /// Begin a fresh assembly from this packet, emitting at once for
    /// single-part frames.
    fn start(&mut self, header: &FrameHeader, payload: &[u8]) -> Option<CompletedFrame> {
        let assembly = Assembly::new(header, payload);
        if assembly.missing == 0 {
            self.state = ReassemblyState::Empty;
            Some(self.emit(assembly))
        } else {
            self.state = ReassemblyState::Assembling(assembly);
            None
        }
    }

    fn emit(&mut self, assembly: Assembly) -> CompletedFrame {
        let parts = assembly.slots.len();
        let frame = assembly.into_frame();
        self.stats.completed += 1;
        debug!(seq = %frame.sequence, parts, bytes = frame.data.len(), "frame complete");
        frame
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn datagram(seq: i32, index: i32, count: i32, payload: &[u8]) -> Vec<u8> {
        let mut buf = FrameHeader::new(SequenceNumber::new(seq), index, count)
            .encode()
            .to_vec();
        buf.extend_from_slice(payload);
        buf
    }

    fn assembling(seq: i32, part_count: usize, missing: usize) -> AssemblyView {
        AssemblyView::Assembling {
            sequence: SequenceNumber::new(seq),
            part_count,
            missing,
        }
    }

    #[test]
    fn single_part_emits_immediately() {
        let mut r = Reassembler::new();
        let frame = r.on_packet(&datagram(1, 0, 1, b"hello")).unwrap();
        assert_eq!(frame.sequence.get(), 1);
        assert_eq!(frame.data.as_ref(), b"hello");
        assert_eq!(r.view(), AssemblyView::Empty);
        assert_eq!(r.stats().completed, 1);
    }

    #[test]
    fn three_parts_in_order() {
        let mut r = Reassembler::new();
        assert!(r.on_packet(&datagram(5, 0, 3, b"aa")).is_none());
        assert_eq!(r.view(), assembling(5, 3, 2));
        assert!(r.on_packet(&datagram(5, 1, 3, b"bb")).is_none());
        assert_eq!(r.view(), assembling(5, 3, 1));
        let frame = r.on_packet(&datagram(5, 2, 3, b"c")).unwrap();
        assert_eq!(frame.sequence.get(), 5);
        assert_eq!(frame.data.as_ref(), b"aabbc");
        assert_eq!(r.view(), AssemblyView::Empty);
    }

    #[test]
    fn out_of_order_parts_concatenate_by_index() {
        let mut r = Reassembler::new();
        assert!(r.on_packet(&datagram(2, 2, 3, b"3")).is_none());
        assert!(r.on_packet(&datagram(2, 0, 3, b"1")).is_none());
        let frame = r.on_packet(&datagram(2, 1, 3, b"2")).unwrap();
        assert_eq!(frame.data.as_ref(), b"123");
    }

    #[test]
    fn duplicate_does_not_change_state() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(8, 1, 3, b"first"));
        let before = r.view();

        assert!(r.on_packet(&datagram(8, 1, 3, b"other")).is_none());
        assert_eq!(r.view(), before);
        assert_eq!(r.stats().duplicates, 1);

        r.on_packet(&datagram(8, 0, 3, b"0-"));
        let frame = r.on_packet(&datagram(8, 2, 3, b"-2")).unwrap();
        // The first copy of slot 1 is kept.
        assert_eq!(frame.data.as_ref(), b"0-first-2");
    }

    #[test]
    fn stale_packet_is_ignored() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(100, 0, 2, b"x"));
        let before = r.view();

        assert!(r.on_packet(&datagram(99, 0, 1, b"old")).is_none());
        assert!(r.on_packet(&datagram(50, 1, 2, b"old")).is_none());
        assert_eq!(r.view(), before);
        assert_eq!(r.stats().stale, 2);
        assert_eq!(r.stats().completed, 0);
    }

    #[test]
    fn newer_sequence_supersedes() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(5, 0, 3, b"a"));
        r.on_packet(&datagram(5, 1, 3, b"b"));

        assert!(r.on_packet(&datagram(6, 0, 2, b"n")).is_none());
        assert_eq!(r.view(), assembling(6, 2, 1));
        assert_eq!(r.stats().superseded, 1);

        // Late part of frame 5 is now stale.
        assert!(r.on_packet(&datagram(5, 2, 3, b"c")).is_none());
        assert_eq!(r.stats().stale, 1);

        let frame = r.on_packet(&datagram(6, 1, 2, b"ew")).unwrap();
        assert_eq!(frame.sequence.get(), 6);
        assert_eq!(frame.data.as_ref(), b"new");
    }

    #[test]
    fn newer_single_part_supersedes_and_emits() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(5, 0, 3, b"a"));
        r.on_packet(&datagram(5, 1, 3, b"b"));
        let frame = r.on_packet(&datagram(6, 0, 1, b"six")).unwrap();
        assert_eq!(frame.sequence.get(), 6);
        assert_eq!(r.view(), AssemblyView::Empty);
        assert_eq!(r.stats().superseded, 1);
        assert_eq!(r.stats().completed, 1);
    }

    #[test]
    fn wraparound_is_newer() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(i32::MAX, 0, 2, b"a"));
        assert!(r.on_packet(&datagram(i32::MIN, 0, 2, b"b")).is_none());
        assert_eq!(r.view(), assembling(i32::MIN, 2, 1));
        assert_eq!(r.stats().superseded, 1);

        // And the pre-wrap sequence is now stale.
        r.on_packet(&datagram(i32::MAX, 1, 2, b"late"));
        assert_eq!(r.view(), assembling(i32::MIN, 2, 1));
        assert_eq!(r.stats().stale, 1);
    }

    #[test]
    fn malformed_datagrams_are_dropped() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(3, 0, 2, b"keep"));
        let before = r.view();

        assert!(r.on_packet(&[0u8; 11]).is_none());
        assert!(r.on_packet(&[]).is_none());
        assert!(r.on_packet(&datagram(4, 0, 0, b"")).is_none());
        assert!(r.on_packet(&datagram(4, 2, 2, b"")).is_none());
        assert!(r.on_packet(&datagram(4, -1, 2, b"")).is_none());

        assert_eq!(r.view(), before);
        assert_eq!(r.stats().malformed, 5);
        assert_eq!(r.stats().superseded, 0);
    }

    #[test]
    fn part_count_mismatch_is_malformed() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(3, 0, 2, b"a"));
        assert!(r.on_packet(&datagram(3, 3, 4, b"b")).is_none());
        assert_eq!(r.view(), assembling(3, 2, 1));
        assert_eq!(r.stats().malformed, 1);
    }

    #[test]
    fn oversized_payload_is_malformed() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(6, 0, 2, b"a"));
        let before = r.view();

        let big = vec![0u8; MAX_PAYLOAD_PER_PACKET + 1];
        assert!(r.on_packet(&datagram(6, 1, 2, &big)).is_none());
        assert!(r.on_packet(&datagram(7, 0, 1, &big)).is_none());
        assert_eq!(r.view(), before);
        assert_eq!(r.stats().malformed, 2);

        // Exactly the maximum is still a valid part.
        let max = vec![1u8; MAX_PAYLOAD_PER_PACKET];
        let frame = r.on_packet(&datagram(6, 1, 2, &max)).unwrap();
        assert_eq!(frame.data.len(), 1 + MAX_PAYLOAD_PER_PACKET);
    }

    #[test]
    fn part_count_ceiling() {
        let mut r = Reassembler::with_max_parts(8);
        assert!(r.on_packet(&datagram(1, 0, 9, b"")).is_none());
        assert_eq!(r.view(), AssemblyView::Empty);
        assert_eq!(r.stats().malformed, 1);

        assert!(r.on_packet(&datagram(1, 0, i32::MAX, b"")).is_none());
        assert_eq!(r.stats().malformed, 2);

        assert!(r.on_packet(&datagram(1, 0, 8, b"")).is_none());
        assert_eq!(r.view(), assembling(1, 8, 7));
    }

    #[test]
    fn empty_frame_roundtrip() {
        let mut r = Reassembler::new();
        let frame = r.on_packet(&datagram(0, 0, 1, b"")).unwrap();
        assert!(frame.data.is_empty());
    }

    #[test]
    fn reset_discards_in_flight_frame() {
        let mut r = Reassembler::new();
        r.on_packet(&datagram(1, 0, 2, b"a"));
        r.reset();
        assert_eq!(r.view(), AssemblyView::Empty);
        // Remaining part of seq 1 now starts a fresh assembly.
        assert!(r.on_packet(&datagram(1, 1, 2, b"b")).is_none());
        assert_eq!(r.view(), assembling(1, 2, 1));
    }
}
