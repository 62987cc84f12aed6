//! Core scalar types and the submit-time error taxonomy.

use thiserror::Error;

/// Instrument identifier, an index into the fixed registry.
pub type InstrumentId = u32;

/// Fixed-point price (e.g., $100.50 -> 10050000 with 5 decimal places)
pub type Price = u64;

/// Order quantity as submitted.
pub type Qty = u32;

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Decode a side stored as its `repr(u8)` discriminant.
    #[inline]
    pub(crate) const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Side::Bid,
            _ => Side::Ask,
        }
    }
}

/// Synchronous rejection of a submitted order.
///
/// These are the only failures the engine reports. CAS contention inside
/// insert or matching is never an error: it drives a retry of the insert
/// scan or abandonment of the current matching step.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Instrument id is outside the registry built at startup.
    #[error("unknown instrument {0}")]
    UnknownInstrument(InstrumentId),
    /// Quantity must be a positive integer.
    #[error("quantity must be positive")]
    InvalidQuantity,
    /// Price must be a positive integer.
    #[error("price must be positive")]
    InvalidPrice,
    /// The order arena has no slots left.
    #[error("order capacity exhausted")]
    CapacityExhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_raw_round_trip() {
        assert_eq!(Side::from_raw(Side::Bid as u8), Side::Bid);
        assert_eq!(Side::from_raw(Side::Ask as u8), Side::Ask);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SubmitError::UnknownInstrument(2048).to_string(),
            "unknown instrument 2048"
        );
        assert_eq!(SubmitError::InvalidQuantity.to_string(), "quantity must be positive");
    }
}
