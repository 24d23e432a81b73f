#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Numeric bit-width used for weights and KV cache.
///
/// The set is closed: 4, 8 or 16 bits. Memory scales linearly with `bits()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub enum Precision {
    Int4,
    #[default]
    Int8,
    Fp16,
}

impl Precision {
    /// Menu order used by every view (widest first).
    pub const ALL: [Precision; 3] = [Precision::Fp16, Precision::Int8, Precision::Int4];

    pub fn bits(self) -> u32 {
        match self {
            Precision::Int4 => 4,
            Precision::Int8 => 8,
            Precision::Fp16 => 16,
        }
    }

    pub fn bytes_per_param(self) -> f64 {
        self.bits() as f64 / 8.0
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            4 => Some(Precision::Int4),
            8 => Some(Precision::Int8),
            16 => Some(Precision::Fp16),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Precision::Int4 => "4-bit",
            Precision::Int8 => "8-bit",
            Precision::Fp16 => "16-bit",
        }
    }
}

impl TryFrom<u32> for Precision {
    type Error = SimError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Precision::from_bits(bits).ok_or(SimError::InvalidPrecision(bits))
    }
}

impl From<Precision> for u32 {
    fn from(p: Precision) -> Self {
        p.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip_through_the_closed_set() {
        for p in Precision::ALL {
            assert_eq!(Precision::from_bits(p.bits()), Some(p));
        }
        assert_eq!(Precision::from_bits(32), None);
        assert!(matches!(
            Precision::try_from(2),
            Err(SimError::InvalidPrecision(2))
        ));
    }

    #[test]
    fn bytes_per_param_is_bits_over_eight() {
        assert_eq!(Precision::Int4.bytes_per_param(), 0.5);
        assert_eq!(Precision::Int8.bytes_per_param(), 1.0);
        assert_eq!(Precision::Fp16.bytes_per_param(), 2.0);
    }
}
