//! ## Plane sets
//! A plane holds the keys whose count has one particular bit set. Counter arithmetic only
//! ever talks to planes through the [`PlaneSet`] trait, which describes the small slice of
//! compressed-bitset functionality the ripple-carry algorithms need.
//!
//! Two backends are provided:
//! - [`RoaringTreemap`] - 64-bit roaring bitmap, the default. Clustered key populations
//!   compress into run/array containers and set algebra works container-at-a-time.
//! - [`BTreeSet<u64>`] - uncompressed ordered set. Useful for small populations and as a
//!   reference backend when cross-checking the roaring planes.

use std::collections::BTreeSet;
use std::iter::Copied;
use std::mem::size_of;
use std::ops::Range;

use roaring::RoaringTreemap;

/// Ordered set of `u64` keys with in-place boolean algebra.
///
/// `Clone` must produce an independent deep copy.
pub trait PlaneSet: Clone {
    /// Ascending iterator over the keys of the set
    type Iter<'a>: Iterator<Item = u64>
    where
        Self: 'a;

    /// Create an empty set
    fn new() -> Self;
    /// Return whether `key` is a member of the set
    fn contains(&self, key: u64) -> bool;
    /// Insert `key`, returning true if it was not present before
    fn insert(&mut self, key: u64) -> bool;
    /// Remove `key`, returning true if it was present before
    fn remove(&mut self, key: u64) -> bool;
    /// Remove every key
    fn clear(&mut self);
    fn is_empty(&self) -> bool;
    /// Number of keys in the set
    fn len(&self) -> u64;
    fn iter(&self) -> Self::Iter<'_>;
    /// Remove every key in `range`
    fn remove_range(&mut self, range: Range<u64>);
    /// Symmetric difference: keep keys present in exactly one of `self` and `other`
    fn xor_with(&mut self, other: &Self);
    /// Union: add every key of `other`
    fn union_with(&mut self, other: &Self);
    /// Difference: remove every key of `other`
    fn difference_with(&mut self, other: &Self);
    /// Approximate number of bytes used by the set contents
    fn size_of(&self) -> usize;
}

impl PlaneSet for RoaringTreemap {
    type Iter<'a> = roaring::treemap::Iter<'a> where Self: 'a;

    #[inline]
    fn new() -> Self {
        RoaringTreemap::new()
    }

    #[inline]
    fn contains(&self, key: u64) -> bool {
        RoaringTreemap::contains(self, key)
    }

    #[inline]
    fn insert(&mut self, key: u64) -> bool {
        RoaringTreemap::insert(self, key)
    }

    #[inline]
    fn remove(&mut self, key: u64) -> bool {
        RoaringTreemap::remove(self, key)
    }

    #[inline]
    fn clear(&mut self) {
        RoaringTreemap::clear(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        RoaringTreemap::is_empty(self)
    }

    #[inline]
    fn len(&self) -> u64 {
        RoaringTreemap::len(self)
    }

    #[inline]
    fn iter(&self) -> Self::Iter<'_> {
        RoaringTreemap::iter(self)
    }

    #[inline]
    fn remove_range(&mut self, range: Range<u64>) {
        RoaringTreemap::remove_range(self, range);
    }

    #[inline]
    fn xor_with(&mut self, other: &Self) {
        *self ^= other;
    }

    #[inline]
    fn union_with(&mut self, other: &Self) {
        *self |= other;
    }

    #[inline]
    fn difference_with(&mut self, other: &Self) {
        *self -= other;
    }

    /// Size of the portable roaring serialization, which tracks the in-memory container sizes
    fn size_of(&self) -> usize {
        self.serialized_size()
    }
}

impl PlaneSet for BTreeSet<u64> {
    type Iter<'a> = Copied<std::collections::btree_set::Iter<'a, u64>>;

    #[inline]
    fn new() -> Self {
        BTreeSet::new()
    }

    #[inline]
    fn contains(&self, key: u64) -> bool {
        BTreeSet::contains(self, &key)
    }

    #[inline]
    fn insert(&mut self, key: u64) -> bool {
        BTreeSet::insert(self, key)
    }

    #[inline]
    fn remove(&mut self, key: u64) -> bool {
        BTreeSet::remove(self, &key)
    }

    #[inline]
    fn clear(&mut self) {
        BTreeSet::clear(self)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        BTreeSet::is_empty(self)
    }

    #[inline]
    fn len(&self) -> u64 {
        BTreeSet::len(self) as u64
    }

    #[inline]
    fn iter(&self) -> Self::Iter<'_> {
        BTreeSet::iter(self).copied()
    }

    fn remove_range(&mut self, range: Range<u64>) {
        // `split_off` keeps `[.., at)` in place and returns `[at, ..)`
        let mut tail = self.split_off(&range.start);
        let mut rest = tail.split_off(&range.end);
        self.append(&mut rest);
    }

    fn xor_with(&mut self, other: &Self) {
        for &key in other {
            if !BTreeSet::insert(self, key) {
                BTreeSet::remove(self, &key);
            }
        }
    }

    fn union_with(&mut self, other: &Self) {
        self.extend(other.iter().copied());
    }

    fn difference_with(&mut self, other: &Self) {
        if other.len() < BTreeSet::len(self) {
            for key in other {
                BTreeSet::remove(self, key);
            }
        } else {
            self.retain(|key| !other.contains(key));
        }
    }

    fn size_of(&self) -> usize {
        BTreeSet::len(self) * size_of::<u64>()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use test_case::test_case;

    fn set_of<S: PlaneSet>(keys: &[u64]) -> S {
        let mut set = S::new();
        for &key in keys {
            set.insert(key);
        }
        set
    }

    fn keys_of<S: PlaneSet>(set: &S) -> Vec<u64> {
        set.iter().collect()
    }

    fn check_membership<S: PlaneSet>() {
        let mut set = S::new();
        assert!(set.is_empty());
        assert!(set.insert(0));
        assert!(set.insert(u64::MAX));
        assert!(!set.insert(0));
        assert!(set.contains(0));
        assert!(set.contains(u64::MAX));
        assert_eq!(set.len(), 2);
        assert!(set.remove(0));
        assert!(!set.remove(0));
        assert_eq!(keys_of(&set), vec![u64::MAX]);
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    fn check_algebra<S: PlaneSet>() {
        let a: S = set_of(&[1, 2, 3, 1 << 40]);
        let b: S = set_of(&[3, 4, 1 << 40, u64::MAX]);

        let mut xor = a.clone();
        xor.xor_with(&b);
        assert_eq!(keys_of(&xor), vec![1, 2, 4, u64::MAX]);

        let mut union = a.clone();
        union.union_with(&b);
        assert_eq!(keys_of(&union), vec![1, 2, 3, 4, 1 << 40, u64::MAX]);

        let mut difference = a.clone();
        difference.difference_with(&b);
        assert_eq!(keys_of(&difference), vec![1, 2]);

        // the originals stay untouched by operations on their clones
        assert_eq!(keys_of(&a), vec![1, 2, 3, 1 << 40]);
        assert_eq!(keys_of(&b), vec![3, 4, 1 << 40, u64::MAX]);
    }

    fn check_remove_range<S: PlaneSet>(range: Range<u64>) -> Vec<u64> {
        let mut set: S = set_of(&[0, 1, 5, 9, 10, 11, 1 << 33, u64::MAX]);
        set.remove_range(range);
        keys_of(&set)
    }

    #[test]
    fn test_membership_roaring() {
        check_membership::<RoaringTreemap>();
    }

    #[test]
    fn test_membership_btree() {
        check_membership::<BTreeSet<u64>>();
    }

    #[test]
    fn test_algebra_roaring() {
        check_algebra::<RoaringTreemap>();
    }

    #[test]
    fn test_algebra_btree() {
        check_algebra::<BTreeSet<u64>>();
    }

    #[test_case(0..0 => vec![0, 1, 5, 9, 10, 11, 1 << 33, u64::MAX]; "empty range")]
    #[test_case(0..10 => vec![10, 11, 1 << 33, u64::MAX]; "prefix")]
    #[test_case(5..11 => vec![0, 1, 11, 1 << 33, u64::MAX]; "middle")]
    #[test_case(2..1 << 40 => vec![0, 1, u64::MAX]; "across high words")]
    #[test_case(10..5 => vec![0, 1, 5, 9, 10, 11, 1 << 33, u64::MAX]; "inverted range")]
    fn test_remove_range_roaring(range: Range<u64>) -> Vec<u64> {
        check_remove_range::<RoaringTreemap>(range)
    }

    #[test_case(0..0 => vec![0, 1, 5, 9, 10, 11, 1 << 33, u64::MAX]; "empty range")]
    #[test_case(0..10 => vec![10, 11, 1 << 33, u64::MAX]; "prefix")]
    #[test_case(5..11 => vec![0, 1, 11, 1 << 33, u64::MAX]; "middle")]
    #[test_case(2..1 << 40 => vec![0, 1, u64::MAX]; "across high words")]
    #[test_case(10..5 => vec![0, 1, 5, 9, 10, 11, 1 << 33, u64::MAX]; "inverted range")]
    fn test_remove_range_btree(range: Range<u64>) -> Vec<u64> {
        check_remove_range::<BTreeSet<u64>>(range)
    }

    #[test]
    fn test_size_of_grows_with_contents() {
        let empty = RoaringTreemap::new();
        let full: RoaringTreemap = set_of(&(0..1000u64).collect::<Vec<_>>());
        assert!(PlaneSet::size_of(&full) > PlaneSet::size_of(&empty));

        let btree: BTreeSet<u64> = set_of(&[1, 2, 3]);
        assert_eq!(PlaneSet::size_of(&btree), 24);
    }
}
