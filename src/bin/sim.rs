//! Randomized concurrent driver: many threads hammer one shared exchange
//! with random orders at a fixed cadence, then the books are settled and a
//! latency/occupancy report is printed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use hdrhistogram::Histogram;
use lfx::{Exchange, Side, DEFAULT_INSTRUMENTS};
use rand::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sim", about = "Concurrent random-order driver for lfx")]
struct Args {
    /// Number of submitting threads
    #[arg(long, default_value_t = 8)]
    threads: usize,

    /// Number of instruments in the registry
    #[arg(long, default_value_t = DEFAULT_INSTRUMENTS)]
    instruments: u32,

    /// Orders submitted per thread
    #[arg(long, default_value_t = 100_000)]
    orders: u64,

    /// Total order capacity of the arena
    #[arg(long, default_value_t = 4_000_000)]
    capacity: u32,

    /// Maximum random quantity (inclusive, minimum is 1)
    #[arg(long, default_value_t = 100)]
    max_qty: u32,

    /// Maximum random price (inclusive, minimum is 1)
    #[arg(long, default_value_t = 1000)]
    max_price: u64,

    /// Pause between submissions, in microseconds (0 = full throttle)
    #[arg(long, default_value_t = 0)]
    cadence_us: u64,

    /// RNG seed; thread id is mixed in per thread
    #[arg(long, default_value_t = 0x1f2e3d4c)]
    seed: u64,

    /// Pin submitting threads to CPU cores
    #[arg(long, default_value_t = false)]
    pin: bool,
}

struct ThreadReport {
    histogram: Histogram<u64>,
    accepted: u64,
    rejected: u64,
}

fn run_submitter(exchange: &Exchange, args: &Args, thread_id: usize) -> ThreadReport {
    if args.pin {
        if let Some(core_ids) = core_affinity::get_core_ids() {
            let core = core_ids[thread_id % core_ids.len()];
            core_affinity::set_for_current(core);
        }
    }

    let mut rng = StdRng::seed_from_u64(args.seed.wrapping_add(thread_id as u64));
    let mut histogram = Histogram::<u64>::new_with_bounds(1, 10_000_000, 3)
        .expect("histogram bounds are static");
    let mut accepted = 0u64;
    let mut rejected = 0u64;

    for _ in 0..args.orders {
        let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
        let instrument = rng.gen_range(0..args.instruments);
        let qty = rng.gen_range(1..=args.max_qty);
        let price = rng.gen_range(1..=args.max_price);

        let start = Instant::now();
        let outcome = exchange.submit_order(side, instrument, qty, price);
        let elapsed = start.elapsed();
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());

        match outcome {
            Ok(()) => accepted += 1,
            Err(_) => rejected += 1,
        }

        if args.cadence_us > 0 {
            std::thread::sleep(Duration::from_micros(args.cadence_us));
        }
    }

    ThreadReport {
        histogram,
        accepted,
        rejected,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Arc::new(Args::parse());
    info!(?args, "starting driver");

    let exchange = Arc::new(Exchange::new(args.instruments, args.capacity));

    let started = Instant::now();
    let handles: Vec<_> = (0..args.threads)
        .map(|thread_id| {
            let exchange = Arc::clone(&exchange);
            let args = Arc::clone(&args);
            std::thread::spawn(move || run_submitter(&exchange, &args, thread_id))
        })
        .collect();

    let mut merged = Histogram::<u64>::new_with_bounds(1, 10_000_000, 3)
        .expect("histogram bounds are static");
    let mut accepted = 0u64;
    let mut rejected = 0u64;
    for handle in handles {
        let report = handle.join().expect("submitter thread panicked");
        merged.add(&report.histogram).unwrap_or(());
        accepted += report.accepted;
        rejected += report.rejected;
    }
    let wall = started.elapsed();

    // Settle every instrument once the submitters are done; abandoned
    // unlink races can leave crossable work behind.
    for instrument in 0..args.instruments {
        exchange.settle(instrument).expect("instrument in range");
    }

    let mut resting_bid = 0i64;
    let mut resting_ask = 0i64;
    for instrument in 0..args.instruments {
        resting_bid += exchange
            .total_remaining(instrument, Side::Bid)
            .expect("instrument in range");
        resting_ask += exchange
            .total_remaining(instrument, Side::Ask)
            .expect("instrument in range");
    }

    info!(accepted, rejected, "driver finished");

    println!("\n=== Submit Latency (ns) ===");
    println!("Total Ops:  {}", accepted + rejected);
    println!(
        "Throughput: {:.2} ops/sec",
        (accepted + rejected) as f64 / wall.as_secs_f64()
    );
    println!("---------------------------");
    println!("p50:   {}", merged.value_at_quantile(0.50));
    println!("p90:   {}", merged.value_at_quantile(0.90));
    println!("p99:   {}", merged.value_at_quantile(0.99));
    println!("p99.9: {}", merged.value_at_quantile(0.999));
    println!("max:   {}", merged.max());

    println!("\n=== Book State (settled) ===");
    println!("Accepted:      {}", accepted);
    println!("Rejected:      {}", rejected);
    println!("Resting bids:  {}", resting_bid);
    println!("Resting asks:  {}", resting_ask);
}
