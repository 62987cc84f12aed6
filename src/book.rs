//! Instrument book - two CAS-managed sorted singly-linked lists.
//!
//! Each instrument owns one bid list (descending price) and one ask list
//! (ascending price), exposed only through an atomic head index. Insertion
//! is an optimistic scan-then-CAS loop: lock-free but not wait-free, and
//! under sustained contention a single caller can in principle retry
//! forever. Equal-priced orders carry no FIFO guarantee - the tie-break is
//! whichever CAS wins.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::types::{Price, Side};

/// Per-instrument pair of price-ordered order lists.
///
/// Holds only the two head indices; all nodes live in the shared [`Arena`].
#[derive(Debug)]
pub struct InstrumentBook {
    bid_head: AtomicU32,
    ask_head: AtomicU32,
}

impl InstrumentBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bid_head: AtomicU32::new(NULL_INDEX),
            ask_head: AtomicU32::new(NULL_INDEX),
        }
    }

    /// Head reference for one side.
    #[inline]
    pub(crate) fn head(&self, side: Side) -> &AtomicU32 {
        match side {
            Side::Bid => &self.bid_head,
            Side::Ask => &self.ask_head,
        }
    }

    /// Index of the best order on `side`, or `NULL_INDEX`.
    #[inline]
    pub fn head_index(&self, side: Side) -> ArenaIndex {
        self.head(side).load(Ordering::Acquire)
    }

    /// Publish an already-allocated order into its side's list, keeping the
    /// side sorted (bids: descending price; asks: ascending price).
    ///
    /// Scans with a (prev, curr) cursor while the existing order ranks
    /// strictly before the new one, points the new node at the `curr`
    /// snapshot, then attempts one CAS - on the head if no predecessor was
    /// found, otherwise on the predecessor's link. Any failure restarts the
    /// whole scan from the head; there is no localized repair.
    ///
    /// Returns once the node is reachable from the head.
    pub fn insert(&self, arena: &Arena, index: ArenaIndex) {
        let new = arena.get(index);
        let side = new.side();
        let price = new.price();
        let head = self.head(side);

        loop {
            let mut prev = NULL_INDEX;
            let mut curr = head.load(Ordering::Acquire);

            while curr != NULL_INDEX && ranks_before(side, arena.get(curr).price(), price) {
                prev = curr;
                curr = arena.get(curr).next();
            }

            new.set_next(curr);

            let link = if prev == NULL_INDEX {
                head
            } else {
                arena.get(prev).next_link()
            };
            if link
                .compare_exchange(curr, index, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return;
            }
        }
    }

    /// Best (head) bid price, or `None` if the bid side is empty.
    ///
    /// Meaningful only at a quiescent instant; the head can include an
    /// order whose remaining quantity has already reached zero but whose
    /// unlink was abandoned.
    pub fn best_bid(&self, arena: &Arena) -> Option<Price> {
        match self.bid_head.load(Ordering::Acquire) {
            NULL_INDEX => None,
            idx => Some(arena.get(idx).price()),
        }
    }

    /// Best (head) ask price, or `None` if the ask side is empty.
    pub fn best_ask(&self, arena: &Arena) -> Option<Price> {
        match self.ask_head.load(Ordering::Acquire) {
            NULL_INDEX => None,
            idx => Some(arena.get(idx).price()),
        }
    }

    /// Snapshot one side, head to tail, as (price, remaining) pairs.
    ///
    /// A plain walk of the links; only meaningful at a quiescent instant.
    pub fn side_depth(&self, arena: &Arena, side: Side) -> Vec<(Price, i64)> {
        let mut out = Vec::new();
        let mut curr = self.head(side).load(Ordering::Acquire);
        while curr != NULL_INDEX {
            let slot = arena.get(curr);
            out.push((slot.price(), slot.remaining()));
            curr = slot.next();
        }
        out
    }

    /// Sum of remaining quantity over one side's list.
    pub fn total_remaining(&self, arena: &Arena, side: Side) -> i64 {
        self.side_depth(arena, side).iter().map(|(_, q)| q).sum()
    }
}

impl Default for InstrumentBook {
    fn default() -> Self {
        Self::new()
    }
}

/// Side-specific ordering predicate: does an existing resting order belong
/// strictly before a new order at `new_price`?
///
/// Equal prices return false on both sides, so a new order lands after the
/// scan position its CAS wins - arrival order at one price is undefined
/// under concurrency.
#[inline]
fn ranks_before(side: Side, existing: Price, new_price: Price) -> bool {
    match side {
        Side::Bid => existing > new_price,
        Side::Ask => existing < new_price,
    }
}
