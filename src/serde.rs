//! # Serde module for BitPlaneCounter
//!
//! This module provides serde-based (serialization and deserialization) features for
//! `BitPlaneCounter`. The counter has no encoding of its own: it is written as a tuple
//! `(limit, planes)` where every plane is serialized by the plane backend itself (roaring's
//! portable format for `RoaringTreemap`, a plain sequence for `BTreeSet<u64>`).
//!
//! During deserialization the plane limit is checked against `L` and the planes are validated
//! so that saturated keys hold no bits in lower planes. Failures are reported as
//! [`CounterError`] through `serde::de::Error::custom`.
use std::hash::Hasher;

use serde::de::Error;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize};

use crate::counter::BitPlaneCounter;
use crate::error::CounterError;
use crate::plane::PlaneSet;

impl<const L: usize, S, H> Serialize for BitPlaneCounter<L, S, H>
where
    S: PlaneSet + Serialize,
    H: Hasher + Default,
{
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
    {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&L)?;
        tup.serialize_element(self.planes.as_slice())?;
        tup.end()
    }
}

impl<'de, const L: usize, S, H> Deserialize<'de> for BitPlaneCounter<L, S, H>
where
    S: PlaneSet + Deserialize<'de>,
    H: Hasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (limit, planes): (usize, Vec<S>) = Deserialize::deserialize(deserializer)?;
        if limit != L {
            return Err(Error::custom(CounterError::InvalidLimit {
                expected: L,
                found: limit,
            }));
        }
        Self::try_from(planes).map_err(Error::custom)
    }
}
