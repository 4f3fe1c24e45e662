use std::fmt::{Display, Formatter};

/// Errors raised when a counter is rebuilt from externally supplied planes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    /// Encoded counter was created with a different number of planes
    InvalidLimit { expected: usize, found: usize },
    /// Number of supplied planes does not match the counter's plane count
    InvalidPlaneCount { expected: usize, found: usize },
    /// Key is marked saturated but still holds bits in a lower plane
    SaturatedKeyInLowerPlane { key: u64, plane: usize },
}

impl Display for CounterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CounterError::InvalidLimit { expected, found } => {
                write!(f, "invalid plane limit: expected {expected}, found {found}")
            }
            CounterError::InvalidPlaneCount { expected, found } => {
                write!(f, "invalid plane count: expected {expected}, found {found}")
            }
            CounterError::SaturatedKeyInLowerPlane { key, plane } => {
                write!(f, "saturated key {key} is also present in plane {plane}")
            }
        }
    }
}

impl std::error::Error for CounterError {}
