//! Exchange - the fixed instrument registry and the public submit surface.
//!
//! Built once at startup and structurally immutable afterwards: a shared
//! order arena plus one [`InstrumentBook`] per instrument, addressed by
//! direct index. `submit_order` is the entire external contract - insert
//! into the correct side, then one matching step on that instrument. It
//! returns no fill information, confirmation, or order handle; callers
//! learn nothing about partial or full execution.

use tracing::debug;

use crate::arena::Arena;
use crate::book::InstrumentBook;
use crate::matching;
use crate::types::{InstrumentId, Price, Qty, Side, SubmitError};

/// Instrument count used by the driver when none is configured.
pub const DEFAULT_INSTRUMENTS: u32 = 1024;

/// A lock-free multi-instrument matching engine.
///
/// Safe to share across threads by reference; every operation is
/// non-blocking apart from contention-driven retry loops. There is no
/// per-instrument lock serializing a submit-and-match cycle, so matching
/// steps on one instrument can interleave - see the [`matching`] module for
/// the races this deliberately admits.
pub struct Exchange {
    arena: Arena,
    books: Box<[InstrumentBook]>,
}

impl Exchange {
    /// Create an exchange with `instruments` books and arena capacity for
    /// `capacity` orders across all of them.
    pub fn new(instruments: u32, capacity: u32) -> Self {
        let books: Vec<InstrumentBook> =
            (0..instruments).map(|_| InstrumentBook::new()).collect();
        Self {
            arena: Arena::new(capacity),
            books: books.into_boxed_slice(),
        }
    }

    /// Submit a limit order: validate, publish into the sorted side list,
    /// then run one matching step on the instrument.
    ///
    /// Returns only after the order is reachable from its side's head and
    /// the matching step has settled. Validation failures reject the order
    /// before any shared state is touched.
    pub fn submit_order(
        &self,
        side: Side,
        instrument: InstrumentId,
        quantity: Qty,
        price: Price,
    ) -> Result<(), SubmitError> {
        let book = self.book(instrument)?;
        if quantity == 0 {
            return Err(SubmitError::InvalidQuantity);
        }
        if price == 0 {
            return Err(SubmitError::InvalidPrice);
        }

        let index = self
            .arena
            .alloc(side, instrument, quantity, price)
            .ok_or_else(|| {
                debug!(instrument, "order arena exhausted");
                SubmitError::CapacityExhausted
            })?;

        book.insert(&self.arena, index);
        matching::cross(&self.arena, book);
        Ok(())
    }

    /// Run one matching step on `instrument` without submitting anything.
    ///
    /// Matching is normally driven only by submissions; this re-drives it
    /// so a harness can settle an instrument after its submitters finish
    /// (abandoned unlinks can leave work for a later step).
    pub fn settle(&self, instrument: InstrumentId) -> Result<(), SubmitError> {
        let book = self.book(instrument)?;
        matching::cross(&self.arena, book);
        Ok(())
    }

    /// Best bid price on `instrument`. Quiescent-only, like all inspection.
    pub fn best_bid(&self, instrument: InstrumentId) -> Result<Option<Price>, SubmitError> {
        Ok(self.book(instrument)?.best_bid(&self.arena))
    }

    /// Best ask price on `instrument`.
    pub fn best_ask(&self, instrument: InstrumentId) -> Result<Option<Price>, SubmitError> {
        Ok(self.book(instrument)?.best_ask(&self.arena))
    }

    /// Snapshot of one side of an instrument, head to tail.
    pub fn side_depth(
        &self,
        instrument: InstrumentId,
        side: Side,
    ) -> Result<Vec<(Price, i64)>, SubmitError> {
        Ok(self.book(instrument)?.side_depth(&self.arena, side))
    }

    /// Sum of resting remaining quantity on one side of an instrument.
    pub fn total_remaining(
        &self,
        instrument: InstrumentId,
        side: Side,
    ) -> Result<i64, SubmitError> {
        Ok(self.book(instrument)?.total_remaining(&self.arena, side))
    }

    /// Number of instruments in the registry.
    #[inline]
    pub fn instruments(&self) -> u32 {
        self.books.len() as u32
    }

    /// Orders accepted so far (resting, filled, and retired alike).
    #[inline]
    pub fn orders_accepted(&self) -> u64 {
        self.arena.allocated()
    }

    #[inline]
    fn book(&self, instrument: InstrumentId) -> Result<&InstrumentBook, SubmitError> {
        self.books
            .get(instrument as usize)
            .ok_or(SubmitError::UnknownInstrument(instrument))
    }
}

impl std::fmt::Debug for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exchange")
            .field("instruments", &self.instruments())
            .field("orders_accepted", &self.orders_accepted())
            .finish()
    }
}
