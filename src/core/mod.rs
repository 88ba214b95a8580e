//! Core business logic module
//!
//! This module contains the core reward processing components:
//! - `balances` - Cached per-user balance management
//! - `ledger` - Append-only transaction storage
//! - `stats` - Read-side aggregation (statistics, expiry, reconciliation)
//! - `engine` - Event processing orchestration
//! - `concurrent` - Thread-safe implementations for batched processing

pub mod balances;
pub mod concurrent;
pub mod engine;
pub mod ledger;
pub mod stats;

pub use balances::BalanceBook;
pub use concurrent::{BatchProcessor, SharedBalanceBook, SharedLedgerStore, SharedRewardsEngine};
pub use engine::{RewardsEngine, UserSummary};
pub use ledger::LedgerStore;
pub use stats::{ExpiringEntry, ExpiringSummary, Reconciliation, Statistics};
