//! Order arena - pre-allocated slots addressed by stable u32 indices.
//!
//! The arena is the memory backbone of the lock-free lists. Links between
//! orders are atomic u32 indices into this arena rather than pointers, and
//! slots are never recycled once handed out: an order that has been unlinked
//! from a book stays readable for the life of the process. That is what makes
//! the unlink-vs-traverse races safe without hazard pointers or epochs - a
//! stale index always refers to valid (if retired) memory, and a CAS can
//! never splice a link onto freed storage.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::types::{InstrumentId, Price, Qty, Side};

/// Sentinel value representing a null/invalid index (like nullptr)
pub const NULL_INDEX: u32 = u32::MAX;

/// Type alias for arena indices - our "compressed pointers"
pub type ArenaIndex = u32;

/// A single order - exactly 64 bytes (one cache line).
///
/// `price`, `instrument`, and `side` are written once by the allocating
/// thread and immutable from then on; they are atomics only so the arena can
/// hand slots out through `&self`. The release CAS that links the slot into
/// a book publishes them, and traversers read them behind acquire loads of
/// the links, so relaxed field access is sufficient on both ends.
///
/// `remaining` is signed, like the reference counter it ports: when two
/// matching steps race between their independent subtractions it can dip
/// below zero, and a negative minimum on a later round adds the excess back.
/// Keeping the sign keeps the totals subtracted from the two sides of a
/// book equal under every interleaving.
#[repr(C)]
#[repr(align(64))]
pub struct OrderSlot {
    /// Fixed-point limit price. Immutable after publication.
    price: AtomicU64,
    /// Remaining quantity; mutated only by `fetch_sub` during matching.
    remaining: AtomicI64,
    /// Index of the next order on the same side, `NULL_INDEX` for tail.
    /// Set once before the insert CAS; never rewritten afterwards - removal
    /// swings the *predecessor's* link past this node, not this node's own.
    next: AtomicU32,
    /// Owning instrument. Immutable after publication.
    instrument: AtomicU32,
    /// Side discriminant (`Side as u8`). Immutable after publication.
    side: AtomicU8,

    _pad: [u8; 39],
}

// Compile-time assertion: OrderSlot must be exactly 64 bytes
const _: () = assert!(
    std::mem::size_of::<OrderSlot>() == 64,
    "OrderSlot must be exactly 64 bytes (one cache line)"
);

const _: () = assert!(
    std::mem::align_of::<OrderSlot>() == 64,
    "OrderSlot must be 64-byte aligned"
);

impl OrderSlot {
    fn empty() -> Self {
        Self {
            price: AtomicU64::new(0),
            remaining: AtomicI64::new(0),
            next: AtomicU32::new(NULL_INDEX),
            instrument: AtomicU32::new(0),
            side: AtomicU8::new(0),
            _pad: [0u8; 39],
        }
    }

    /// Limit price of this order.
    #[inline]
    pub fn price(&self) -> Price {
        self.price.load(Ordering::Relaxed)
    }

    /// Owning instrument id.
    #[inline]
    pub fn instrument(&self) -> InstrumentId {
        self.instrument.load(Ordering::Relaxed)
    }

    /// Order side.
    #[inline]
    pub fn side(&self) -> Side {
        Side::from_raw(self.side.load(Ordering::Relaxed))
    }

    /// Current remaining quantity. Can be transiently negative while
    /// concurrent matching steps are in flight on the owning instrument.
    #[inline]
    pub fn remaining(&self) -> i64 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Atomically subtract `qty` and return the post-subtraction remaining.
    #[inline]
    pub(crate) fn take(&self, qty: i64) -> i64 {
        self.remaining.fetch_sub(qty, Ordering::AcqRel) - qty
    }

    /// Successor index on this order's side.
    #[inline]
    pub fn next(&self) -> ArenaIndex {
        self.next.load(Ordering::Acquire)
    }

    /// Point this order's link at `succ`. Only valid before the slot is
    /// published by the insert CAS.
    #[inline]
    pub(crate) fn set_next(&self, succ: ArenaIndex) {
        self.next.store(succ, Ordering::Release);
    }

    /// CAS handle on the link, for sorted insertion after this node.
    #[inline]
    pub(crate) fn next_link(&self) -> &AtomicU32 {
        &self.next
    }
}

impl fmt::Debug for OrderSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSlot")
            .field("side", &self.side())
            .field("instrument", &self.instrument())
            .field("price", &self.price())
            .field("remaining", &self.remaining())
            .field("next", &self.next())
            .finish()
    }
}

/// Fixed-capacity slot pool shared by every instrument book.
///
/// Allocation is a single `fetch_add` on a cursor: wait-free and O(1).
/// There is no free list - the engine has no cancel operation, so a slot's
/// lifetime ends only when the process does. Exhausting the arena fails
/// allocation rather than blocking or reusing live memory.
pub struct Arena {
    slots: Box<[OrderSlot]>,
    /// Allocation cursor. u64 so that a burst of failed allocations past
    /// capacity cannot wrap it back into range.
    cursor: AtomicU64,
}

impl Arena {
    /// Create an arena with room for `capacity` orders.
    ///
    /// # Panics
    /// Panics if `capacity` is not below `NULL_INDEX`.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity < NULL_INDEX, "capacity must be less than NULL_INDEX");
        let slots: Vec<OrderSlot> = (0..capacity).map(|_| OrderSlot::empty()).collect();
        Self {
            slots: slots.into_boxed_slice(),
            cursor: AtomicU64::new(0),
        }
    }

    /// Claim a slot and populate it with a fresh, unpublished order.
    ///
    /// The slot is exclusively owned by the caller until an insert CAS makes
    /// it reachable from a book head. Returns `None` when the arena is full.
    pub fn alloc(
        &self,
        side: Side,
        instrument: InstrumentId,
        qty: Qty,
        price: Price,
    ) -> Option<ArenaIndex> {
        let claimed = self.cursor.fetch_add(1, Ordering::Relaxed);
        if claimed >= self.slots.len() as u64 {
            return None;
        }
        let index = claimed as ArenaIndex;
        let slot = &self.slots[index as usize];
        slot.price.store(price, Ordering::Relaxed);
        slot.instrument.store(instrument, Ordering::Relaxed);
        slot.side.store(side as u8, Ordering::Relaxed);
        slot.remaining.store(i64::from(qty), Ordering::Relaxed);
        slot.next.store(NULL_INDEX, Ordering::Relaxed);
        Some(index)
    }

    /// Get a reference to a slot.
    ///
    /// # Panics
    /// Panics on an out-of-range index; `NULL_INDEX` must be checked by the
    /// caller before dereferencing a link.
    #[inline]
    pub fn get(&self, index: ArenaIndex) -> &OrderSlot {
        &self.slots[index as usize]
    }

    /// Number of slots handed out so far.
    #[inline]
    pub fn allocated(&self) -> u64 {
        self.cursor.load(Ordering::Relaxed).min(self.slots.len() as u64)
    }

    /// Total slot capacity.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Returns true if no further allocation can succeed.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.cursor.load(Ordering::Relaxed) >= self.slots.len() as u64
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .finish()
    }
}
