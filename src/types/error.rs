//! Error types for the rewards ledger engine
//!
//! This module defines all error types that can occur while recording
//! point transactions or processing reward events. Errors are designed to
//! be descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **CSV Parsing Errors**: Malformed CSV, invalid field values, etc.
//! - **Ledger Errors**: Insufficient balance, invalid recipient, reversal
//!   conflicts, missing transactions
//! - **Arithmetic Errors**: Overflow in balance calculations

use crate::types::{TransactionId, UserId};
use thiserror::Error;

/// Main error type for the rewards ledger
///
/// This enum represents all possible errors that can occur while recording
/// or reading point transactions. Each variant includes relevant context
/// to help diagnose and resolve the issue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewardError {
    /// I/O error occurred while reading or writing files
    ///
    /// This is typically a fatal error (file permissions, disk full, etc.).
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    ///
    /// This is a recoverable error - the malformed record is skipped
    /// and processing continues with the next record.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Invalid event type encountered in the input
    ///
    /// This is a recoverable error - the invalid event is skipped
    /// and processing continues.
    #[error("Invalid event type '{event_type}'")]
    InvalidEventType {
        /// The invalid event type string
        event_type: String,
    },

    /// A field required by the event kind is missing
    ///
    /// Booking events require an amount, transfers require a counterparty,
    /// and so on. This is a recoverable error.
    #[error("{event_type} event for user {user} requires a '{field}' value")]
    MissingField {
        /// Name of the missing CSV column
        field: String,
        /// Event kind that requires the field
        event_type: String,
        /// User ID
        user: UserId,
    },

    /// Invalid amount value (malformed decimal)
    ///
    /// This is a recoverable error - the event is skipped.
    #[error("Invalid amount '{amount}' for user {user}")]
    InvalidAmount {
        /// The invalid amount string
        amount: String,
        /// User ID
        user: UserId,
    },

    /// Point magnitude of zero requested
    ///
    /// Every ledger entry carries a strictly positive point magnitude.
    /// This is a recoverable error - the operation is rejected.
    #[error("Point amount must be positive for {operation} on user {user}")]
    InvalidPoints {
        /// Operation that was rejected
        operation: String,
        /// User ID
        user: UserId,
    },

    /// Insufficient point balance for a redemption, transfer, or reversal
    ///
    /// This is a recoverable error - the operation is rejected and the
    /// balance remains unchanged.
    #[error("Insufficient balance for user {user}: available {balance}, requested {requested}")]
    InsufficientBalance {
        /// User ID
        user: UserId,
        /// Current balance
        balance: u64,
        /// Requested point amount
        requested: u64,
    },

    /// Transfer target is the sender or has no rewards account
    ///
    /// This is a recoverable error - the transfer is rejected and neither
    /// balance changes.
    #[error("Invalid transfer recipient {recipient} for sender {sender}: {reason}")]
    InvalidRecipient {
        /// Sender user ID
        sender: UserId,
        /// Rejected recipient user ID
        recipient: UserId,
        /// Why the recipient was rejected
        reason: String,
    },

    /// Reversal requested on a transaction that is already reversed
    ///
    /// Reversal is idempotence-checked: the first call succeeds, every
    /// later call fails here and leaves the balance unchanged.
    #[error("Transaction {tx} is already reversed")]
    AlreadyReversed {
        /// Transaction ID
        tx: TransactionId,
    },

    /// Reversal requested on a debit-side transaction
    ///
    /// Only earn-type entries (earn, transfer-in) can be reversed.
    /// This is a recoverable error.
    #[error("Transaction {tx} of kind {kind} cannot be reversed")]
    NotReversible {
        /// Transaction ID
        tx: TransactionId,
        /// Kind label of the rejected entry
        kind: String,
    },

    /// Referenced transaction does not exist
    ///
    /// This is a recoverable error - the operation is rejected.
    #[error("Transaction {tx} not found for {operation}")]
    TransactionNotFound {
        /// Transaction ID that was not found
        tx: TransactionId,
        /// Operation that failed
        operation: String,
    },

    /// Arithmetic overflow would occur
    ///
    /// This is a recoverable error - the operation is rejected to keep
    /// the balance intact.
    #[error("Arithmetic overflow in {operation} for user {user}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// User ID
        user: UserId,
    },
}

// Conversion from io::Error to RewardError
impl From<std::io::Error> for RewardError {
    fn from(error: std::io::Error) -> Self {
        RewardError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to RewardError
impl From<csv::Error> for RewardError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        RewardError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl RewardError {
    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user: UserId, balance: u64, requested: u64) -> Self {
        RewardError::InsufficientBalance {
            user,
            balance,
            requested,
        }
    }

    /// Create an InvalidRecipient error
    pub fn invalid_recipient(sender: UserId, recipient: UserId, reason: &str) -> Self {
        RewardError::InvalidRecipient {
            sender,
            recipient,
            reason: reason.to_string(),
        }
    }

    /// Create an AlreadyReversed error
    pub fn already_reversed(tx: TransactionId) -> Self {
        RewardError::AlreadyReversed { tx }
    }

    /// Create a NotReversible error
    pub fn not_reversible(tx: TransactionId, kind: &str) -> Self {
        RewardError::NotReversible {
            tx,
            kind: kind.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(tx: TransactionId, operation: &str) -> Self {
        RewardError::TransactionNotFound {
            tx,
            operation: operation.to_string(),
        }
    }

    /// Create an InvalidPoints error
    pub fn invalid_points(operation: &str, user: UserId) -> Self {
        RewardError::InvalidPoints {
            operation: operation.to_string(),
            user,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, user: UserId) -> Self {
        RewardError::ArithmeticOverflow {
            operation: operation.to_string(),
            user,
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: &str, event_type: &str, user: UserId) -> Self {
        RewardError::MissingField {
            field: field.to_string(),
            event_type: event_type.to_string(),
            user,
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl Into<String>, user: UserId) -> Self {
        RewardError::InvalidAmount {
            amount: amount.into(),
            user,
        }
    }

    /// Create an InvalidEventType error
    pub fn invalid_event_type(event_type: &str) -> Self {
        RewardError::InvalidEventType {
            event_type: event_type.to_string(),
        }
    }
}
