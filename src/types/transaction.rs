//! Ledger transaction types
//!
//! This module defines the point transaction entries stored in the ledger,
//! the reward event records consumed by the processing pipeline, and the
//! identifier aliases used throughout the system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identifier
///
/// Supports user IDs from 0 to 4,294,967,295
pub type UserId = u32;

/// Ledger transaction identifier
///
/// Assigned monotonically by the ledger store, starting at 1.
pub type TransactionId = u64;

/// Point transaction kinds recorded in the ledger
///
/// The direction of each entry is encoded by its kind, not by a sign on the
/// point magnitude. Transfers always appear as a pair: a `TransferOut` on
/// the sender and a `TransferIn` on the recipient, linked through the
/// `counterparty` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    /// Points credited from a business event (booking, reservation, grant)
    Earn,

    /// Points spent by the user
    Redeem,

    /// Sender side of a peer-to-peer transfer
    TransferOut,

    /// Recipient side of a peer-to-peer transfer
    TransferIn,

    /// Offsetting debit created by a reversal (or an expiry sweep)
    Deduct,
}

impl TransactionKind {
    /// Whether entries of this kind increase the owner's balance
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionKind::Earn | TransactionKind::TransferIn)
    }

    /// Lowercase label used in error messages and reports
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Earn => "earn",
            TransactionKind::Redeem => "redeem",
            TransactionKind::TransferOut => "transfer-out",
            TransactionKind::TransferIn => "transfer-in",
            TransactionKind::Deduct => "deduct",
        }
    }
}

/// Lifecycle status of a ledger entry
///
/// Entries are immutable once created except for this field, which moves
/// from `Active` to `Reversed` exactly once. Reversed entries are never
/// deleted; they remain as the audit trail of the original credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Active,
    Reversed,
}

/// A single point transaction in the ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Unique, monotonically assigned identifier
    pub id: TransactionId,

    /// Owner of this ledger entry
    pub user: UserId,

    /// Direction and category of the entry
    pub kind: TransactionKind,

    /// Point magnitude, always positive
    pub points: u64,

    /// `Active`, or `Reversed` once voided by a reversal
    pub status: TransactionStatus,

    /// Human-readable free text, not semantically load-bearing
    pub description: String,

    /// The other party of a transfer pair (sender stores the recipient's
    /// id and vice versa)
    pub counterparty: Option<UserId>,

    /// Booking that caused this entry, if any
    pub related_booking: Option<u64>,

    /// Restaurant reservation that caused this entry, if any
    pub related_reservation: Option<u64>,

    /// Expiry date; only meaningful for earn-type entries
    pub expires_at: Option<DateTime<Utc>>,

    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new active transaction with no event links and no expiry
    pub fn new(
        id: TransactionId,
        user: UserId,
        kind: TransactionKind,
        points: u64,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id,
            user,
            kind,
            points,
            status: TransactionStatus::Active,
            description: description.into(),
            counterparty: None,
            related_booking: None,
            related_reservation: None,
            expires_at: None,
            created_at,
        }
    }

    /// Link this entry to the other party of a transfer
    pub fn with_counterparty(mut self, user: UserId) -> Self {
        self.counterparty = Some(user);
        self
    }

    /// Link this entry to the booking that caused it
    pub fn with_booking(mut self, booking: u64) -> Self {
        self.related_booking = Some(booking);
        self
    }

    /// Link this entry to the reservation that caused it
    pub fn with_reservation(mut self, reservation: u64) -> Self {
        self.related_reservation = Some(reservation);
        self
    }

    /// Attach an expiry date to an earn-type entry
    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Signed effect of this entry on the owner's balance
    ///
    /// Every persisted entry carries its effect exactly once: credits are
    /// positive, debits negative, regardless of status. Reversal voids a
    /// credit by appending an offsetting deduct rather than by excluding
    /// the original from recomputation (see [`crate::core::stats`]).
    pub fn signed_effect(&self) -> i128 {
        if self.kind.is_credit() {
            self.points as i128
        } else {
            -(self.points as i128)
        }
    }
}

/// Where an earn entry came from
///
/// Determines which business-event link is stored on the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarnSource {
    /// Property booking, identified by booking id
    Booking(u64),

    /// Restaurant reservation, identified by reservation id
    Reservation(u64),

    /// Manual grant with no business-event link
    Manual,
}

/// Reward event kinds accepted by the processing pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Booking confirmed: earn `floor(amount * 2)` points
    Booking,

    /// Restaurant reservation created: earn a flat 100 points
    Reservation,

    /// Explicit point grant
    Earn,

    /// Manual redemption
    Redeem,

    /// Peer-to-peer transfer from `user` to `counterparty`
    Transfer,

    /// Reversal of a previously earned transaction (booking cancelled)
    Reverse,
}

impl EventKind {
    /// Number of transaction ids a record of this kind occupies
    ///
    /// Ids are reserved per record at intake, before the outcome is known,
    /// so the id a record receives depends only on its position in the
    /// input. A transfer writes a linked pair of entries and takes two
    /// consecutive ids; every other kind takes one. A rejected record
    /// leaves its reserved ids as a gap in the sequence.
    pub fn id_span(&self) -> u64 {
        match self {
            EventKind::Transfer => 2,
            _ => 1,
        }
    }
}

/// Input reward event record
///
/// Represents a single business event as read from the input CSV file.
/// Optional fields are only meaningful for some event kinds; the CSV
/// conversion layer validates presence per kind before an event reaches
/// the engine.
#[derive(Debug, Clone)]
pub struct EventRecord {
    /// The kind of event
    pub kind: EventKind,

    /// The user this event applies to (the sender, for transfers)
    pub user: UserId,

    /// Transfer recipient
    pub counterparty: Option<UserId>,

    /// Point magnitude for earn/redeem/transfer events
    pub points: Option<u64>,

    /// Booking total price, converted to points by the accrual rate
    pub amount: Option<rust_decimal::Decimal>,

    /// Transaction id referenced by a reversal
    pub tx: Option<TransactionId>,

    /// Days until the earned points expire
    pub expiry_days: Option<i64>,

    /// Booking or reservation id
    pub reference: Option<u64>,

    /// Free-text description carried onto the ledger entry
    pub description: String,
}
