//! Index scan flags.

use std::fmt;
use std::ops::BitOr;

/// Bit flags selecting scan direction and bound inclusion.
///
/// A scan is descending only when [`IndexType::DESCENDING`] is set, and a
/// bound is inclusive only when its `*_INCLUSIVE` flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexType(u8);

impl IndexType {
    /// Ascending order.
    pub const ASCENDING: Self = Self(1 << 5);
    /// Descending order.
    pub const DESCENDING: Self = Self(1 << 4);
    /// Low bound included.
    pub const LEFT_INCLUSIVE: Self = Self(1 << 3);
    /// Low bound excluded.
    pub const LEFT_EXCLUSIVE: Self = Self(1 << 2);
    /// High bound included.
    pub const RIGHT_INCLUSIVE: Self = Self(1 << 1);
    /// High bound excluded.
    pub const RIGHT_EXCLUSIVE: Self = Self(1);

    /// Ascending, `[lo, hi]`.
    pub const AII: Self = Self(Self::ASCENDING.0 | Self::LEFT_INCLUSIVE.0 | Self::RIGHT_INCLUSIVE.0);
    /// Descending, `[lo, hi]`.
    pub const DII: Self = Self(Self::DESCENDING.0 | Self::LEFT_INCLUSIVE.0 | Self::RIGHT_INCLUSIVE.0);
    /// Ascending, `(lo, hi]`.
    pub const AEI: Self = Self(Self::ASCENDING.0 | Self::LEFT_EXCLUSIVE.0 | Self::RIGHT_INCLUSIVE.0);
    /// Descending, `(lo, hi]`.
    pub const DEI: Self = Self(Self::DESCENDING.0 | Self::LEFT_EXCLUSIVE.0 | Self::RIGHT_INCLUSIVE.0);
    /// Ascending, `[lo, hi)`.
    pub const AIE: Self = Self(Self::ASCENDING.0 | Self::LEFT_INCLUSIVE.0 | Self::RIGHT_EXCLUSIVE.0);
    /// Descending, `[lo, hi)`.
    pub const DIE: Self = Self(Self::DESCENDING.0 | Self::LEFT_INCLUSIVE.0 | Self::RIGHT_EXCLUSIVE.0);
    /// Ascending, `(lo, hi)`.
    pub const AEE: Self = Self(Self::ASCENDING.0 | Self::LEFT_EXCLUSIVE.0 | Self::RIGHT_EXCLUSIVE.0);
    /// Descending, `(lo, hi)`.
    pub const DEE: Self = Self(Self::DESCENDING.0 | Self::LEFT_EXCLUSIVE.0 | Self::RIGHT_EXCLUSIVE.0);

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Builds a flag set from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b11_1111)
    }

    /// Returns true if every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true for descending scans.
    #[must_use]
    pub const fn is_descending(self) -> bool {
        self.contains(Self::DESCENDING)
    }

    /// Returns true if the low bound is included.
    #[must_use]
    pub const fn left_inclusive(self) -> bool {
        self.contains(Self::LEFT_INCLUSIVE)
    }

    /// Returns true if the high bound is included.
    #[must_use]
    pub const fn right_inclusive(self) -> bool {
        self.contains(Self::RIGHT_INCLUSIVE)
    }

    /// Same bounds, opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        let direction = if self.is_descending() {
            Self::ASCENDING.0
        } else {
            Self::DESCENDING.0
        };
        Self((self.0 & !(Self::ASCENDING.0 | Self::DESCENDING.0)) | direction)
    }
}

impl BitOr for IndexType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.is_descending() { 'D' } else { 'A' };
        let left = if self.left_inclusive() { 'I' } else { 'E' };
        let right = if self.right_inclusive() { 'I' } else { 'E' };
        write!(f, "{direction}{left}{right}")
    }
}
