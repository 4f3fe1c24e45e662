//! Bit-plane counter tracks an approximate count for every key of a sparse `u64` key space
//! and is defined with const `L` parameter:
//! - `L`: number of planes in [1..64] range. Counts are exact below `2^(L-1)` and
//!   saturate at that threshold.
//!
//! # Data-structure design rationale
//!
//! ## Bit-plane encoding
//! Instead of storing one integer per key, the binary decomposition of every count is spread
//! across `L` sets of keys ("planes"): plane `i` holds every key whose count has bit `i` set.
//! Key populations are usually clustered, so each plane compresses much better than a
//! per-key table, and whole-population operations become set algebra over planes.
//!
//! For `L = 4`, `threshold = 8`:
//! - count 0 - key absent from every plane
//! - count 5 - key present in planes 0 and 2
//! - count >= 8 - key present in plane 3 only (saturated)
//!
//! ## Sticky saturation
//! The top plane `L-1` is not a value bit. Presence in it means "count reached threshold",
//! the key holds no bits in lower planes, and further increments are ignored until the key
//! is removed. Counts therefore never need more than `L` planes.
//!
//! ## Ripple-carry arithmetic
//! - Single key increments walk planes upwards: a present bit is cleared and carried, the
//!   first absent bit is set.
//! - Batched increments and merges perform the same carry on whole key sets at once:
//!   `plane ^= carry; carry -= plane` is a half adder for every key in the carry set.
//! - Rescaling by `2^n` shifts plane contents up by `n` positions and folds the planes that
//!   would overflow into the saturation plane.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use roaring::RoaringTreemap;
use tracing::{debug, trace};
use wyhash::WyHash;

use crate::error::CounterError;
use crate::plane::PlaneSet;

/// Approximate saturating counter over `u64` keys stored as `L` bit-planes.
pub struct BitPlaneCounter<
    const L: usize = 8,
    S: PlaneSet = RoaringTreemap,
    H: Hasher + Default = WyHash,
> {
    /// Planes ordered from least significant bit to the saturation plane
    pub(crate) planes: [S; L],
    /// Zero-sized build hasher
    build_hasher: BuildHasherDefault<H>,
}

/// Count readout for a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Count {
    /// Count below threshold, absent keys have an exact count of 0
    Exact(u64),
    /// Count reached or exceeded threshold
    Saturated,
}

impl Count {
    #[inline]
    pub fn is_saturated(&self) -> bool {
        matches!(self, Count::Saturated)
    }
}

impl<const L: usize, S: PlaneSet, H: Hasher + Default> BitPlaneCounter<L, S, H> {
    /// Ensure that `L` is in correct range at compile time
    const VALID_PARAMS: () = assert!(L >= 1 && L <= 64, "plane count must be in [1..64] range");
    /// Index of the saturation plane
    const TOP: usize = L - 1;
    /// Smallest count represented by the saturation flag
    pub const THRESHOLD: u64 = 1 << (L - 1);

    /// Creates new instance of `BitPlaneCounter` with all planes empty
    #[inline]
    pub fn new() -> Self {
        // compile time check of params
        _ = Self::VALID_PARAMS;

        Self {
            planes: std::array::from_fn(|_| S::new()),
            build_hasher: BuildHasherDefault::default(),
        }
    }

    /// Rebuild a counter from planes ordered least significant first.
    ///
    /// Fails if any key of the saturation plane also appears in a lower plane.
    pub fn from_planes(planes: [S; L]) -> Result<Self, CounterError> {
        _ = Self::VALID_PARAMS;

        let (lower, top) = planes.split_at(Self::TOP);
        for (plane, set) in lower.iter().enumerate() {
            if let Some(key) = set.iter().find(|&key| top[0].contains(key)) {
                return Err(CounterError::SaturatedKeyInLowerPlane { key, plane });
            }
        }

        Ok(Self {
            planes,
            build_hasher: BuildHasherDefault::default(),
        })
    }

    /// Number of planes
    #[inline]
    pub const fn limit(&self) -> usize {
        L
    }

    /// Saturation threshold, `2^(L-1)`
    #[inline]
    pub const fn threshold(&self) -> u64 {
        Self::THRESHOLD
    }

    /// Increment count of `key` by one
    #[inline]
    pub fn increment(&mut self, key: u64) {
        if self.planes[Self::TOP].contains(key) {
            return;
        }
        self.ripple(key, 0);
    }

    /// Increment count of `key` by `n`
    pub fn increment_by(&mut self, key: u64, n: u64) {
        if self.planes[Self::TOP].contains(key) {
            return;
        }

        // the sum reaches threshold regardless of the current count
        if n >= Self::THRESHOLD {
            self.saturate(key);
            return;
        }

        if n == 1 {
            self.ripple(key, 0);
            return;
        }

        // `n < THRESHOLD`, so every set bit has a value plane below `TOP`
        let mut n = n;
        while n != 0 {
            let bit = (u64::BITS - 1 - n.leading_zeros()) as usize;
            if !self.ripple(key, bit) {
                return;
            }
            n ^= 1 << bit;
        }
    }

    /// Hash `item` and increment count of the resulting key by one
    #[inline]
    pub fn insert_item<T: Hash + ?Sized>(&mut self, item: &T) {
        let key = self.hash_item(item);
        self.increment(key);
    }

    /// Hash `item` and increment count of the resulting key by `n`
    #[inline]
    pub fn insert_item_by<T: Hash + ?Sized>(&mut self, item: &T, n: u64) {
        let key = self.hash_item(item);
        self.increment_by(key, n);
    }

    /// Return the key `item` is counted under
    #[inline]
    pub fn hash_item<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        let mut hasher = self.build_hasher.build_hasher();
        item.hash(&mut hasher);
        hasher.finish()
    }

    /// Increment count of every key in `keys` by one
    pub fn increment_many(&mut self, keys: &S) {
        trace!(keys = keys.len(), "incrementing key batch");
        self.add_weighted(keys.clone(), 0);
    }

    /// Add counts of `rhs` into `self`, leaving `rhs` untouched
    pub fn merge(&mut self, rhs: &Self) {
        debug!(limit = L, "merging counter");
        for (offset, plane) in rhs.planes.iter().enumerate().rev() {
            if !plane.is_empty() {
                self.add_weighted(plane.clone(), offset);
            }
        }
    }

    /// Add counts of `rhs` into `self`, reusing the planes of `rhs`.
    ///
    /// `rhs` is left empty.
    pub fn merge_drain(&mut self, rhs: &mut Self) {
        debug!(limit = L, "draining counter into self");
        for offset in (0..L).rev() {
            let plane = std::mem::replace(&mut rhs.planes[offset], S::new());
            if !plane.is_empty() {
                self.add_weighted(plane, offset);
            }
        }
    }

    /// Multiply every count by `2^n`, saturating counts that reach threshold.
    ///
    /// Panics if `n >= L`.
    pub fn scale_by_pow2(&mut self, n: usize) {
        assert!(
            n < L,
            "scale exponent {} must be below the plane count {}",
            n,
            L
        );
        if n == 0 {
            return;
        }

        let (lower, top) = self.planes.split_at_mut(Self::TOP);
        let top = &mut top[0];

        // planes shifted at or past the top plane now hold counts >= threshold
        let mut overflow = S::new();
        for plane in &lower[Self::TOP - n..] {
            overflow.union_with(plane);
        }
        top.union_with(&overflow);

        lower.rotate_right(n);
        for plane in &mut lower[..n] {
            plane.clear();
        }
        if !overflow.is_empty() {
            for plane in &mut lower[n..] {
                plane.difference_with(&overflow);
            }
        }

        debug!(n, saturated = overflow.len(), "scaled counts");
    }

    /// Reset count of `key` to zero, clearing saturation
    pub fn remove(&mut self, key: u64) {
        for plane in &mut self.planes {
            plane.remove(key);
        }
    }

    /// Reset count of every key in `keys` to zero
    pub fn remove_many(&mut self, keys: &S) {
        trace!(keys = keys.len(), "removing key batch");
        for plane in &mut self.planes {
            plane.difference_with(keys);
        }
    }

    /// Forget every key with value below `bound`, whatever its count.
    ///
    /// This evicts a range of the key space, not low counts.
    pub fn remove_keys_below(&mut self, bound: u64) {
        debug!(bound, "evicting keys below bound");
        for plane in &mut self.planes {
            plane.remove_range(0..bound);
        }
    }

    /// Return set of keys whose count reached threshold
    #[inline]
    pub fn saturated(&self) -> &S {
        &self.planes[Self::TOP]
    }

    /// Return `n`-th plane counting from the top, `n = 1` is the saturation plane.
    ///
    /// Panics if `n` is outside of [1..L] range.
    #[inline]
    pub fn plane_from_top(&self, n: usize) -> &S {
        assert!(
            (1..=L).contains(&n),
            "plane {} from top is outside of [1..{}] range",
            n,
            L
        );
        &self.planes[L - n]
    }

    /// Return all planes, least significant first
    #[inline]
    pub fn planes(&self) -> &[S; L] {
        &self.planes
    }

    /// Return whether `key` reached threshold
    #[inline]
    pub fn is_saturated(&self, key: u64) -> bool {
        self.planes[Self::TOP].contains(key)
    }

    /// Return count of `key`
    pub fn count(&self, key: u64) -> Count {
        if self.is_saturated(key) {
            return Count::Saturated;
        }
        let value = self.planes[..Self::TOP]
            .iter()
            .enumerate()
            .filter(|(_, plane)| plane.contains(key))
            .fold(0u64, |acc, (bit, _)| acc | (1u64 << bit));
        Count::Exact(value)
    }

    /// Materialize every key with non-zero count into a map.
    ///
    /// Saturated keys are reported with a count equal to threshold.
    pub fn snapshot(&self) -> HashMap<u64, u64> {
        let mut counts = HashMap::new();
        for (bit, plane) in self.planes.iter().enumerate() {
            for key in plane.iter() {
                *counts.entry(key).or_insert(0) += 1u64 << bit;
            }
        }
        counts
    }

    /// Number of keys with non-zero count
    pub fn len(&self) -> u64 {
        let mut keys = S::new();
        for plane in &self.planes {
            keys.union_with(plane);
        }
        keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.iter().all(PlaneSet::is_empty)
    }

    /// Reset every count to zero
    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.clear();
        }
    }

    /// Return approximate memory size of the counter
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.planes.iter().map(PlaneSet::size_of).sum::<usize>()
    }

    /// Add `2^offset` to the count of `key`.
    /// Returns false if the carry saturated the key.
    #[inline]
    fn ripple(&mut self, key: u64, offset: usize) -> bool {
        for plane in &mut self.planes[offset..Self::TOP] {
            if plane.insert(key) {
                return true;
            }
            plane.remove(key);
        }
        self.saturate(key);
        false
    }

    /// Mark `key` as saturated, dropping its value bits
    #[inline]
    fn saturate(&mut self, key: u64) {
        for plane in &mut self.planes[..Self::TOP] {
            plane.remove(key);
        }
        self.planes[Self::TOP].insert(key);
    }

    /// Add `2^offset` to the count of every key in `carry`.
    ///
    /// Carry surviving past the last value plane is absorbed by the saturation plane.
    pub(crate) fn add_weighted(&mut self, mut carry: S, offset: usize) {
        debug_assert!(offset < L);

        // saturated keys ignore increments
        carry.difference_with(&self.planes[Self::TOP]);

        for plane in &mut self.planes[offset..Self::TOP] {
            if carry.is_empty() {
                return;
            }
            plane.xor_with(&carry);
            carry.difference_with(plane);
        }

        if carry.is_empty() {
            return;
        }

        trace!(offset, saturated = carry.len(), "carry reached saturation plane");
        for plane in &mut self.planes[..offset] {
            plane.difference_with(&carry);
        }
        self.planes[Self::TOP].union_with(&carry);
    }
}

impl<const L: usize, S: PlaneSet, H: Hasher + Default> Default for BitPlaneCounter<L, S, H> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<const L: usize, S: PlaneSet, H: Hasher + Default> Clone for BitPlaneCounter<L, S, H> {
    fn clone(&self) -> Self {
        Self {
            planes: self.planes.clone(),
            build_hasher: BuildHasherDefault::default(),
        }
    }
}

impl<const L: usize, S: PlaneSet + PartialEq, H: Hasher + Default> PartialEq
    for BitPlaneCounter<L, S, H>
{
    fn eq(&self, other: &Self) -> bool {
        self.planes == other.planes
    }
}

impl<const L: usize, S: PlaneSet, H: Hasher + Default> TryFrom<Vec<S>>
    for BitPlaneCounter<L, S, H>
{
    type Error = CounterError;

    /// Rebuild a counter from a vector of planes ordered least significant first
    fn try_from(planes: Vec<S>) -> Result<Self, Self::Error> {
        let planes: [S; L] = planes
            .try_into()
            .map_err(|planes: Vec<S>| CounterError::InvalidPlaneCount {
                expected: L,
                found: planes.len(),
            })?;
        Self::from_planes(planes)
    }
}

impl<const L: usize, S: PlaneSet, H: Hasher + Default> Debug for BitPlaneCounter<L, S, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let planes: Vec<u64> = self.planes.iter().map(PlaneSet::len).collect();
        write!(
            f,
            "{{ limit: {}, threshold: {}, keys: {}, planes: {:?} }}",
            L,
            Self::THRESHOLD,
            self.len(),
            planes
        )
    }
}
