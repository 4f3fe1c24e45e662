//! `bitplane-counter` is a Rust crate for approximate, saturating frequency counting over large and sparse `u64` key spaces.
//!
//! Counts are stored as compressed bit-planes (one roaring bitmap per bit of the count) rather than one integer per key,
//! so clustered key populations stay compact and whole-population operations (batched increments, merges, rescaling,
//! eviction) run as set algebra over planes.
pub mod counter;
pub mod error;
pub mod plane;
#[cfg(feature = "with_serde")]
mod serde;

pub use counter::{BitPlaneCounter, Count};
pub use error::CounterError;
pub use plane::PlaneSet;
