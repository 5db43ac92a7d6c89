//! Order-preserving codec between `f32` and `u32`.
//!
//! Forward scores are merged by taking a max over many arcs that race to
//! update the same destination state. Hardware has no atomic max on floats,
//! but it does on unsigned integers, so we map every non-NaN float to a
//! `u32` whose unsigned ordering agrees with the float ordering and run the
//! merge as [`AtomicU32::fetch_max`].
//!
//! The mapping flips the sign bit for non-negative floats and flips all
//! bits for negative ones: positives keep their magnitude ordering in the
//! upper half of the `u32` range, negatives end up reversed in the lower
//! half.

use std::sync::atomic::{AtomicU32, Ordering};

/// Encode a float so that unsigned integer comparison matches float
/// comparison. Total and exact for every non-NaN input, including the
/// infinities; NaNs are not required to round-trip.
#[inline]
pub fn to_ordered(f: f32) -> u32 {
    let bits = f.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

/// Inverse of [`to_ordered`] for every value it produces from a non-NaN
/// float.
#[inline]
pub fn from_ordered(u: u32) -> f32 {
    let bits = if u & 0x8000_0000 != 0 {
        u ^ 0x8000_0000
    } else {
        !u
    };
    f32::from_bits(bits)
}

/// A float cell supporting a lock-free max, built on the ordered encoding.
///
/// This is the only atomic the intersection needs: every other kernel
/// writes to disjoint indices.
#[derive(Debug)]
pub struct AtomicOrderedMax(AtomicU32);

impl AtomicOrderedMax {
    #[inline]
    pub fn new(f: f32) -> Self {
        AtomicOrderedMax(AtomicU32::new(to_ordered(f)))
    }

    /// Raise the stored value to at least `f`.
    #[inline]
    pub fn fetch_max(&self, f: f32) {
        self.0.fetch_max(to_ordered(f), Ordering::Relaxed);
    }

    /// Read back the encoded value. Only meaningful after all concurrent
    /// `fetch_max` calls have completed (kernel completion is the
    /// synchronisation point).
    #[inline]
    pub fn load_ordered(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn load(&self) -> f32 {
        from_ordered(self.load_ordered())
    }
}
