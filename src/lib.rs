//! Rewards Ledger Library
//! # Overview
//!
//! This library provides a streaming CSV-based reward points processor with a
//! tier engine, implementing both a sync and a concurrent strategy
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Transaction, UserAccount, EventRecord, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`accrual`] - Point accrual rules for bookings and reservations
//! - [`tier`] - Tier schedule and standing computation
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Reward event orchestration
//!   - [`core::balances`] - Account state management and balance operations
//!   - [`core::ledger`] - Append-only ledger of reward transactions
//!   - [`core::stats`] - Balance aggregation, expiry reports, reconciliation
//!   - [`core::concurrent`] - Thread-safe counterparts for batch processing
//! - [`io`] - I/O handling with sync and async CSV readers
//! - [`strategy`] - Pluggable processing strategies
//!
//! # Event Types
//!
//! The engine supports six event types:
//!
//! - **Booking**: Earn points from a paid booking (floor of price times two)
//! - **Reservation**: Earn a flat completion bonus
//! - **Earn**: Credit points directly
//! - **Redeem**: Debit points (requires sufficient balance)
//! - **Transfer**: Move points from one user to another
//! - **Reverse**: Undo a previous credit, deducting its points
//!
//! # Tier Standings
//!
//! Each user's current point balance places them in a tier:
//! - **Silver**: 0+ points, 5% discount
//! - **Gold**: 1000+ points, 10% discount
//! - **Platinum**: 5000+ points, 15% discount

// Module declarations
pub mod accrual;
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod tier;
pub mod types;

pub use core::{BalanceBook, LedgerStore, RewardsEngine, SharedRewardsEngine, UserSummary};
pub use io::write_summaries_csv;
pub use tier::{TierBand, TierSchedule, TierStatus};
pub use types::{
    EventKind, EventRecord, RewardError, Transaction, TransactionId, TransactionKind, UserId,
};
