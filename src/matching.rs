//! Matching step - crosses the current best bid/ask pair of one book.
//!
//! Runs synchronously after every insertion. One invocation loops over
//! rounds, each crossing only the two current head orders:
//!
//! - A round keeps the loop alive only by retiring an exhausted head. When
//!   both heads come out of a round still partially filled - possible only
//!   when concurrent steps interleave with the subtractions - the
//!   invocation stops and leaves continuation to the next submission on
//!   the instrument.
//! - The two quantity subtractions are independent atomics, not one joint
//!   transaction. A concurrent matching step on the same instrument can
//!   interleave between them; the counters are signed so the interleaving
//!   over-subtracts reversibly instead of corrupting totals.
//! - A failed head-unlink CAS abandons the whole step immediately. The
//!   zero-quantity order left at the head is harmless: every round re-reads
//!   remaining quantities, so a later invocation crosses zero against it
//!   and retires it then.
//!
//! None of this is a bug to fix. Serializing the subtractions or retrying
//! a lost unlink would change observable concurrent behavior.

use std::sync::atomic::Ordering;

use crate::arena::{Arena, NULL_INDEX};
use crate::book::InstrumentBook;
use crate::types::Side;

/// Cross the book's best bid/ask pair until no further cross is possible or
/// the step loses an unlink race. Never blocks.
pub fn cross(arena: &Arena, book: &InstrumentBook) {
    loop {
        let bid_idx = book.head(Side::Bid).load(Ordering::Acquire);
        let ask_idx = book.head(Side::Ask).load(Ordering::Acquire);
        if bid_idx == NULL_INDEX || ask_idx == NULL_INDEX {
            return;
        }

        let bid = arena.get(bid_idx);
        let ask = arena.get(ask_idx);
        // Strict inequality: equal prices do cross.
        if bid.price() < ask.price() {
            return;
        }

        let min_qty = bid.remaining().min(ask.remaining());
        let bid_left = bid.take(min_qty);
        let ask_left = ask.take(min_qty);

        if bid_left == 0
            && book
                .head(Side::Bid)
                .compare_exchange(bid_idx, bid.next(), Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            // Someone else already advanced the head: abandon the step.
            return;
        }
        if ask_left == 0
            && book
                .head(Side::Ask)
                .compare_exchange(ask_idx, ask.next(), Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return;
        }

        // Only a round where neither side reached zero ends the step.
        if bid_left != 0 && ask_left != 0 {
            return;
        }
    }
}
