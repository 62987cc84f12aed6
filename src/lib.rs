//! # lfx
//!
//! A lock-free, multi-instrument limit order matching engine.
//!
//! ## Design Principles
//!
//! - **No locks anywhere**: each side of each book is a CAS-managed sorted
//!   singly-linked list behind a single atomic head
//! - **Arena indices, not pointers**: orders live in a pre-allocated slab
//!   and links are atomic u32 indices; retired slots are never reused, so
//!   unlink/traverse races can't touch freed memory
//! - **Synchronous matching**: every submission runs one matching step on
//!   its instrument before returning; no background threads or queues
//! - **Honest weak guarantees**: equal-price tie-break is whichever CAS
//!   wins, a fill is two independent atomic subtractions, and a lost
//!   unlink race abandons the step - all by construction, none patched over
//!
//! ## Architecture
//!
//! ```text
//! [Caller Threads] --> submit_order --> [Registry: books[instrument]]
//!                                           |            |
//!                                     sorted insert  matching step
//!                                      (CAS loop)     (CAS loop)
//! ```

pub mod arena;
pub mod book;
pub mod exchange;
pub mod matching;
pub mod types;

// Re-exports for convenience
pub use arena::{Arena, ArenaIndex, OrderSlot, NULL_INDEX};
pub use book::InstrumentBook;
pub use exchange::{Exchange, DEFAULT_INSTRUMENTS};
pub use types::{InstrumentId, Price, Qty, Side, SubmitError};
