//! Concurrency tests - the engine's quiescent-instant guarantees under
//! real thread interleavings.
//!
//! Every assertion here is made after all submitting threads have joined
//! and the touched instruments have been settled; mid-flight states are
//! deliberately not asserted on.

use std::sync::{Arc, Barrier};

use lfx::{Exchange, Price, Side};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn assert_sorted(depth: &[(Price, i64)], side: Side) {
    for pair in depth.windows(2) {
        match side {
            Side::Bid => assert!(
                pair[0].0 >= pair[1].0,
                "bid prices must be non-increasing head to tail: {:?}",
                depth
            ),
            Side::Ask => assert!(
                pair[0].0 <= pair[1].0,
                "ask prices must be non-decreasing head to tail: {:?}",
                depth
            ),
        }
    }
}

#[test]
fn concurrent_single_sided_inserts_stay_sorted() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 400;

    // Bids on instrument 0, asks on instrument 1: no crossing anywhere, so
    // every inserted order is still resting when we inspect.
    let exchange = Arc::new(Exchange::new(2, (2 * THREADS * PER_THREAD) as u32));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let exchange = Arc::clone(&exchange);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(0xD0_0D + t as u64);
                barrier.wait();
                for _ in 0..PER_THREAD {
                    let price = rng.gen_range(1..=500);
                    exchange.submit_order(Side::Bid, 0, 10, price).unwrap();
                    let price = rng.gen_range(1..=500);
                    exchange.submit_order(Side::Ask, 1, 10, price).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let bids = exchange.side_depth(0, Side::Bid).unwrap();
    let asks = exchange.side_depth(1, Side::Ask).unwrap();
    assert_sorted(&bids, Side::Bid);
    assert_sorted(&asks, Side::Ask);
    assert_eq!(bids.len(), THREADS * PER_THREAD);
    assert_eq!(asks.len(), THREADS * PER_THREAD);
}

#[test]
fn paired_submissions_sum_to_zero_after_settling() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 20;
    const QTY: u32 = 50;
    const PRICE: u64 = 100;

    for round in 0..ROUNDS {
        let exchange = Arc::new(Exchange::new(1, (2 * THREADS) as u32));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let exchange = Arc::clone(&exchange);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    // Alternate sides per thread so bids and asks race in
                    // both submission orders.
                    if t % 2 == 0 {
                        exchange.submit_order(Side::Bid, 0, QTY, PRICE).unwrap();
                        exchange.submit_order(Side::Ask, 0, QTY, PRICE).unwrap();
                    } else {
                        exchange.submit_order(Side::Ask, 0, QTY, PRICE).unwrap();
                        exchange.submit_order(Side::Bid, 0, QTY, PRICE).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // One additional settling pass: abandoned unlink races can leave
        // crossable work that only a later matching step performs.
        exchange.settle(0).unwrap();

        let bid_total = exchange.total_remaining(0, Side::Bid).unwrap();
        let ask_total = exchange.total_remaining(0, Side::Ask).unwrap();
        assert_eq!(
            bid_total + ask_total,
            0,
            "round {}: unmatched quantity left behind (bids {}, asks {})",
            round,
            bid_total,
            ask_total
        );
    }
}

#[test]
fn random_crossing_workload_settles_uncrossed_and_sorted() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;
    const INSTRUMENTS: u32 = 4;

    let exchange = Arc::new(Exchange::new(
        INSTRUMENTS,
        (THREADS * PER_THREAD) as u32,
    ));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let exchange = Arc::clone(&exchange);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                let mut rng = ChaCha8Rng::seed_from_u64(0xFEED + t as u64);
                barrier.wait();
                for _ in 0..PER_THREAD {
                    let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
                    let instrument = rng.gen_range(0..INSTRUMENTS);
                    let qty = rng.gen_range(1..=100);
                    let price = rng.gen_range(90..=110);
                    exchange.submit_order(side, instrument, qty, price).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for instrument in 0..INSTRUMENTS {
        exchange.settle(instrument).unwrap();

        let bids = exchange.side_depth(instrument, Side::Bid).unwrap();
        let asks = exchange.side_depth(instrument, Side::Ask).unwrap();
        assert_sorted(&bids, Side::Bid);
        assert_sorted(&asks, Side::Ask);

        // No crossable state persists once settled.
        if let (Some(&(best_bid, _)), Some(&(best_ask, _))) = (bids.first(), asks.first()) {
            assert!(
                best_bid < best_ask,
                "instrument {} settled crossed: bid {} vs ask {}",
                instrument,
                best_bid,
                best_ask
            );
        }
    }
}

#[test]
fn quantities_only_ever_shrink_single_threaded() {
    let exchange = Exchange::new(1, 8);

    exchange.submit_order(Side::Bid, 0, 100, 50).unwrap();
    assert_eq!(exchange.side_depth(0, Side::Bid).unwrap(), vec![(50, 100)]);

    exchange.submit_order(Side::Ask, 0, 40, 50).unwrap();
    assert_eq!(exchange.side_depth(0, Side::Bid).unwrap(), vec![(50, 60)]);
    assert!(exchange.side_depth(0, Side::Ask).unwrap().is_empty());

    exchange.submit_order(Side::Ask, 0, 60, 50).unwrap();
    assert!(exchange.side_depth(0, Side::Bid).unwrap().is_empty());
    assert!(exchange.side_depth(0, Side::Ask).unwrap().is_empty());
}
