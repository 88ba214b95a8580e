//! Core data types for the rewards ledger engine
//!
//! This module contains the fundamental types used throughout the system:
//! ledger transactions, user accounts, reward events, and error types.

pub mod account;
pub mod error;
pub mod transaction;

pub use account::UserAccount;
pub use error::RewardError;
pub use transaction::{
    EarnSource, EventKind, EventRecord, Transaction, TransactionId, TransactionKind,
    TransactionStatus, UserId,
};
