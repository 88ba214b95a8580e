//! Rewards Ledger CLI
//!
//! Command-line interface for processing reward point events from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- events.csv > summaries.csv
//! cargo run -- --strategy sync events.csv > summaries.csv
//! cargo run -- --strategy concurrent events.csv > summaries.csv
//! cargo run -- --strategy concurrent --batch-size 2000 --max-concurrent 8 events.csv > summaries.csv
//! ```
//!
//! The program reads reward event records from the input CSV file, processes
//! them through the rewards engine using the selected strategy, and outputs
//! per-user balance and tier summaries to stdout.
//!
//! # Processing Strategies
//!
//! - **sync**: Synchronous CSV parsing with single-threaded processing
//! - **concurrent**: Batched processing with per-user parallelism (default)
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use rewards_ledger::cli;
use rewards_ledger::strategy;
use std::process;

fn main() {
    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Concurrent) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
