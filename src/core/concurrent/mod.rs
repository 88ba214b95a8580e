//! Concurrent implementations of core components
//!
//! This module provides thread-safe implementations of the core reward
//! processing components for the batched concurrent strategy.
//!
//! # Architecture
//!
//! The concurrent implementations mirror the single-threaded versions with
//! concurrent data structures:
//!
//! - **SharedBalanceBook**: per-user balances behind individual mutexes in a DashMap
//! - **SharedLedgerStore**: ledger history in a DashMap with atomic id allocation
//! - **SharedRewardsEngine**: orchestrates concurrent event processing
//! - **BatchProcessor**: partitions batches by user and fans out tokio tasks
//!
//! # Thread Safety
//!
//! Operations on different users proceed in parallel. Operations on the same
//! user serialize on that user's account mutex, held across every
//! check-then-write. Transfers lock both parties in ascending user-id order.

pub mod balances;
pub mod batch;
pub mod engine;
pub mod ledger;

pub use balances::SharedBalanceBook;
pub use batch::{BatchProcessor, ProcessingOutcome};
pub use engine::SharedRewardsEngine;
pub use ledger::SharedLedgerStore;
