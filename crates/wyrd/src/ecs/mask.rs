//! # Mask — Fixed-Width Occupancy Bitset
//!
//! A [`Mask`] is a 64-bit set of type ids: bit *i* says "this entity owns a
//! component of type id *i*" (or, on the entity row, "this entity is
//! attached to the system with type id *i*"). The width matches
//! [`MAX_COMPONENTS`](super::MAX_COMPONENTS), so every assignable type id
//! has a bit.
//!
//! Masks are plain `Copy` values. Reading one out of the store gives a
//! snapshot — later component changes don't retroactively alter a mask a
//! caller already holds.

use std::fmt;

/// A 64-bit set of type ids.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct Mask(u64);

impl Mask {
    /// The empty set.
    pub const EMPTY: Mask = Mask(0);

    /// The full set — every representable type id.
    pub const ALL: Mask = Mask(u64::MAX);

    /// Sets bit `id`.
    pub fn set(&mut self, id: usize) {
        self.0 |= 1 << id;
    }

    /// Clears bit `id`.
    pub fn clear(&mut self, id: usize) {
        self.0 &= !(1 << id);
    }

    /// Returns whether bit `id` is set.
    pub fn test(self, id: usize) -> bool {
        self.0 & (1 << id) != 0
    }

    /// Returns whether no bits are set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns whether any bit is set in both masks.
    pub fn intersects(self, other: Mask) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns whether every bit of `required` is also set in `self`.
    pub fn contains_all(self, required: Mask) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns the complement set.
    pub fn inverted(self) -> Mask {
        Mask(!self.0)
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mask({:#066b})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_test_clear() {
        let mut mask = Mask::EMPTY;
        assert!(!mask.test(3));
        mask.set(3);
        assert!(mask.test(3));
        assert!(!mask.test(2));
        mask.clear(3);
        assert!(!mask.test(3));
        assert!(mask.is_empty());
    }

    #[test]
    fn highest_bit() {
        let mut mask = Mask::EMPTY;
        mask.set(63);
        assert!(mask.test(63));
        assert!(Mask::ALL.test(63));
    }

    #[test]
    fn contains_all_and_intersects() {
        let mut a = Mask::EMPTY;
        a.set(1);
        a.set(4);
        let mut b = Mask::EMPTY;
        b.set(1);
        assert!(a.contains_all(b));
        assert!(!b.contains_all(a));
        assert!(a.intersects(b));
        b.clear(1);
        b.set(9);
        assert!(!a.intersects(b));
        // Everything contains the empty set.
        assert!(Mask::EMPTY.contains_all(Mask::EMPTY));
        assert!(a.contains_all(Mask::EMPTY));
    }

    #[test]
    fn inverted_flips_every_bit() {
        let mut mask = Mask::EMPTY;
        mask.set(0);
        let inv = mask.inverted();
        assert!(!inv.test(0));
        assert!(inv.test(1));
        assert!(inv.test(63));
    }
}
