//! Benchmark suite for comparing processing strategies
//!
//! This benchmark compares the performance of the synchronous and concurrent
//! processing strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```
//!
//! # Benchmark Fixtures
//!
//! Two representative CSV files are used:
//! - `benchmark_small.csv` - Small dataset (100 events)
//! - `benchmark_medium.csv` - Medium dataset (5,000 events)
//!
//! Each fixture includes a mix of:
//! - Bookings, reservations, and direct earns
//! - Redeems and transfers
//! - Multiple users

use rewards_ledger::cli::StrategyType;
use rewards_ledger::strategy::create_strategy;
use rewards_ledger::strategy::BatchConfig;
use std::path::Path;

fn main() {
    divan::main();
}

/// Benchmark synchronous processing strategy with small dataset (100 events)
#[divan::bench]
fn sync_strategy_small() {
    let strategy = create_strategy(StrategyType::Sync, None);
    let path = Path::new("benches/fixtures/benchmark_small.csv");
    let mut output = Vec::new();

    strategy
        .process(path, &mut output)
        .expect("Processing failed");
}

/// Benchmark concurrent processing strategy with small dataset (100 events)
#[divan::bench]
fn concurrent_strategy_small() {
    let strategy = create_strategy(StrategyType::Concurrent, Some(BatchConfig::default()));
    let path = Path::new("benches/fixtures/benchmark_small.csv");
    let mut output = Vec::new();

    strategy
        .process(path, &mut output)
        .expect("Processing failed");
}

/// Benchmark synchronous processing strategy with medium dataset (5,000 events)
#[divan::bench]
fn sync_strategy_medium() {
    let strategy = create_strategy(StrategyType::Sync, None);
    let path = Path::new("benches/fixtures/benchmark_medium.csv");
    let mut output = Vec::new();

    strategy
        .process(path, &mut output)
        .expect("Processing failed");
}

/// Benchmark concurrent processing strategy with medium dataset (5,000 events)
#[divan::bench]
fn concurrent_strategy_medium() {
    let strategy = create_strategy(StrategyType::Concurrent, Some(BatchConfig::default()));
    let path = Path::new("benches/fixtures/benchmark_medium.csv");
    let mut output = Vec::new();

    strategy
        .process(path, &mut output)
        .expect("Processing failed");
}
