//! Circular 32-bit frame sequence numbers.
//!
//! Sequence numbers wrap with two's-complement arithmetic, so they have no
//! total order. Two numbers are compared by the sign of their wrapping
//! difference, which orders any pair less than 2^31 apart.

use std::fmt;

/// Result of comparing two sequence numbers on the circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    /// The left-hand number is strictly newer.
    Newer,
    /// Both numbers are equal.
    Same,
    /// The left-hand number is older (or exactly half the range away).
    Older,
}

/// A frame sequence number as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceNumber(i32);

impl SequenceNumber {
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    /// The number the sender uses for the following frame.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// `self` is strictly newer than `other` iff `int32(self - other) > 0`.
    pub const fn is_newer_than(self, other: Self) -> bool {
        self.0.wrapping_sub(other.0) > 0
    }

    pub fn recency(self, other: Self) -> Recency {
        match self.0.wrapping_sub(other.0) {
            0 => Recency::Same,
            d if d > 0 => Recency::Newer,
            _ => Recency::Older,
        }
    }
}

impl From<i32> for SequenceNumber {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<SequenceNumber> for i32 {
    fn from(seq: SequenceNumber) -> Self {
        seq.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── Tests ────────────────────────────────────────────────────────
