//! Rewards processing engine
//!
//! This module provides the RewardsEngine that orchestrates ledger writes
//! by coordinating between the BalanceBook and LedgerStore components.
//!
//! The engine enforces business rules such as:
//! - Positive point magnitudes on every operation
//! - Balance coverage checks before any debit
//! - Recipient validation for transfers (exists, not the sender)
//! - One-shot reversal of earn-type credits via offsetting deducts
//!
//! Failed operations never leave partial state: every precondition is
//! checked before the first write, and the balance write happens before
//! the ledger append so a rejected mutation leaves both stores untouched.

use crate::accrual::{booking_points, RESERVATION_POINTS};
use crate::core::balances::BalanceBook;
use crate::core::ledger::LedgerStore;
use crate::core::stats::{self, ExpiringSummary, Reconciliation, Statistics};
use crate::tier::{TierSchedule, TierStatus};
use crate::types::{
    EarnSource, EventKind, EventRecord, RewardError, Transaction, TransactionId, TransactionKind,
    TransactionStatus, UserId,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Transfer-in credits expire one year after the transfer
const TRANSFER_EXPIRY_DAYS: i64 = 365;

/// Final per-user row for report output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    /// User identifier
    pub user: UserId,

    /// Current point balance
    pub balance: u64,

    /// Current tier name
    pub tier: String,

    /// Discount at the current tier, in percent
    pub discount_percent: u8,
}

/// Rewards processing engine
///
/// Orchestrates ledger writes by coordinating between BalanceBook and
/// LedgerStore, and serves the read-side queries (statistics, expiring
/// points, reconciliation, tier standing) over the stored history.
pub struct RewardsEngine {
    balances: BalanceBook,
    ledger: LedgerStore,
    schedule: TierSchedule,
}

impl RewardsEngine {
    /// Create a new RewardsEngine with the canonical tier schedule
    ///
    /// Initializes an empty engine with no accounts or ledger entries.
    pub fn new() -> Self {
        RewardsEngine {
            balances: BalanceBook::new(),
            ledger: LedgerStore::new(),
            schedule: TierSchedule::default(),
        }
    }

    /// Create an engine with a custom tier schedule
    pub fn with_schedule(schedule: TierSchedule) -> Self {
        RewardsEngine {
            balances: BalanceBook::new(),
            ledger: LedgerStore::new(),
            schedule,
        }
    }

    /// Process a single reward event record
    ///
    /// Routes the event to the appropriate handler based on event kind and
    /// validates that the fields that kind requires are present.
    ///
    /// The record's transaction ids are reserved here, before any
    /// validation, so the ids an event receives depend only on its position
    /// in the input. A rejected record leaves its reserved ids as a gap.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A field required by the event kind is missing
    /// - The routed operation fails (insufficient balance, invalid
    ///   recipient, unknown or already-reversed transaction, etc.)
    pub fn process(&mut self, record: EventRecord) -> Result<(), RewardError> {
        let id = self.ledger.allocate_span(record.kind.id_span());
        self.apply(record, id)
    }

    fn apply(&mut self, record: EventRecord, id: TransactionId) -> Result<(), RewardError> {
        match record.kind {
            EventKind::Booking => {
                let amount = record.amount.ok_or_else(|| {
                    RewardError::missing_field("amount", "booking", record.user)
                })?;
                let reference = record
                    .reference
                    .ok_or_else(|| RewardError::missing_field("ref", "booking", record.user))?;

                let points = booking_points(amount);
                if points == 0 {
                    return Err(RewardError::invalid_amount(amount.to_string(), record.user));
                }

                let description = if record.description.is_empty() {
                    format!("booking #{}", reference)
                } else {
                    record.description
                };
                self.record_earn_at(
                    id,
                    record.user,
                    points,
                    EarnSource::Booking(reference),
                    record.expiry_days,
                    description,
                )?;
                Ok(())
            }
            EventKind::Reservation => {
                let reference = record.reference.ok_or_else(|| {
                    RewardError::missing_field("ref", "reservation", record.user)
                })?;

                let description = if record.description.is_empty() {
                    format!("reservation #{}", reference)
                } else {
                    record.description
                };
                self.record_earn_at(
                    id,
                    record.user,
                    RESERVATION_POINTS,
                    EarnSource::Reservation(reference),
                    record.expiry_days,
                    description,
                )?;
                Ok(())
            }
            EventKind::Earn => {
                let points = record
                    .points
                    .ok_or_else(|| RewardError::missing_field("points", "earn", record.user))?;

                self.record_earn_at(
                    id,
                    record.user,
                    points,
                    EarnSource::Manual,
                    record.expiry_days,
                    record.description,
                )?;
                Ok(())
            }
            EventKind::Redeem => {
                let points = record
                    .points
                    .ok_or_else(|| RewardError::missing_field("points", "redeem", record.user))?;

                self.record_redeem_at(id, record.user, points, record.description)?;
                Ok(())
            }
            EventKind::Transfer => {
                let recipient = record.counterparty.ok_or_else(|| {
                    RewardError::missing_field("counterparty", "transfer", record.user)
                })?;
                let points = record
                    .points
                    .ok_or_else(|| RewardError::missing_field("points", "transfer", record.user))?;

                self.record_transfer_at(
                    id,
                    id + 1,
                    record.user,
                    recipient,
                    points,
                    record.description,
                )?;
                Ok(())
            }
            EventKind::Reverse => {
                let tx = record
                    .tx
                    .ok_or_else(|| RewardError::missing_field("tx", "reverse", record.user))?;

                self.reverse_at(id, tx)?;
                Ok(())
            }
        }
    }

    /// Record an earn credit for a user
    ///
    /// Credits the balance (creating the account on first earn) and appends
    /// an `Earn` entry linked to the triggering business event. An expiry
    /// date of `now + expiry_days` is attached when given.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `points` is zero
    /// - The balance would overflow
    pub fn record_earn(
        &mut self,
        user: UserId,
        points: u64,
        source: EarnSource,
        expiry_days: Option<i64>,
        description: impl Into<String>,
    ) -> Result<TransactionId, RewardError> {
        let id = self.ledger.allocate_id();
        self.record_earn_at(id, user, points, source, expiry_days, description)
    }

    fn record_earn_at(
        &mut self,
        id: TransactionId,
        user: UserId,
        points: u64,
        source: EarnSource,
        expiry_days: Option<i64>,
        description: impl Into<String>,
    ) -> Result<TransactionId, RewardError> {
        if points == 0 {
            return Err(RewardError::invalid_points("earn", user));
        }

        let now = Utc::now();
        self.balances.credit(user, points)?;

        let mut tx = Transaction::new(id, user, TransactionKind::Earn, points, description, now)
            .with_expiry(expiry_days.map(|days| now + Duration::days(days)));
        match source {
            EarnSource::Booking(booking) => tx = tx.with_booking(booking),
            EarnSource::Reservation(reservation) => tx = tx.with_reservation(reservation),
            EarnSource::Manual => {}
        }
        self.ledger.insert(tx);

        Ok(id)
    }

    /// Record a redemption debit for a user
    ///
    /// The coverage check and the balance write form one step; a rejected
    /// redemption appends nothing to the ledger.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `points` is zero
    /// - The user's balance does not cover `points`
    pub fn record_redeem(
        &mut self,
        user: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<TransactionId, RewardError> {
        let id = self.ledger.allocate_id();
        self.record_redeem_at(id, user, points, description)
    }

    fn record_redeem_at(
        &mut self,
        id: TransactionId,
        user: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<TransactionId, RewardError> {
        if points == 0 {
            return Err(RewardError::invalid_points("redeem", user));
        }

        self.balances.debit(user, points)?;

        self.ledger.insert(Transaction::new(
            id,
            user,
            TransactionKind::Redeem,
            points,
            description,
            Utc::now(),
        ));

        Ok(id)
    }

    /// Record a peer-to-peer transfer
    ///
    /// Moves points from sender to recipient and appends a linked pair of
    /// entries: a `TransferOut` on the sender and a `TransferIn` on the
    /// recipient, each naming the other party. The transfer-in credit
    /// expires one year after the transfer.
    ///
    /// Returns the ids of the pair as `(transfer_out, transfer_in)`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `points` is zero
    /// - The recipient is the sender, or has no rewards account
    /// - The sender's balance does not cover `points`
    pub fn record_transfer(
        &mut self,
        sender: UserId,
        recipient: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<(TransactionId, TransactionId), RewardError> {
        let out_id = self.ledger.allocate_span(2);
        self.record_transfer_at(out_id, out_id + 1, sender, recipient, points, description)
    }

    fn record_transfer_at(
        &mut self,
        out_id: TransactionId,
        in_id: TransactionId,
        sender: UserId,
        recipient: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<(TransactionId, TransactionId), RewardError> {
        if points == 0 {
            return Err(RewardError::invalid_points("transfer", sender));
        }
        if sender == recipient {
            return Err(RewardError::invalid_recipient(
                sender,
                recipient,
                "cannot transfer to self",
            ));
        }
        // Accounts come into existence by earning, never by receiving
        if !self.balances.contains(recipient) {
            return Err(RewardError::invalid_recipient(
                sender,
                recipient,
                "recipient has no rewards account",
            ));
        }

        self.balances.transfer(sender, recipient, points)?;

        let now = Utc::now();
        let description = description.into();

        self.ledger.insert(
            Transaction::new(
                out_id,
                sender,
                TransactionKind::TransferOut,
                points,
                description.clone(),
                now,
            )
            .with_counterparty(recipient),
        );

        self.ledger.insert(
            Transaction::new(
                in_id,
                recipient,
                TransactionKind::TransferIn,
                points,
                description,
                now,
            )
            .with_counterparty(sender)
            .with_expiry(Some(now + Duration::days(TRANSFER_EXPIRY_DAYS))),
        );

        Ok((out_id, in_id))
    }

    /// Reverse a previously recorded credit
    ///
    /// Marks the original entry `Reversed` and appends an offsetting
    /// `Deduct` that carries the balance effect; the original is kept as
    /// the audit trail. Only earn-type entries (earns and transfer-ins)
    /// are reversible, and each at most once.
    ///
    /// Returns the id of the offsetting deduct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction id is unknown
    /// - The entry is not an earn-type credit
    /// - The entry was already reversed
    /// - The owner's balance no longer covers the reversal
    pub fn reverse(&mut self, tx_id: TransactionId) -> Result<TransactionId, RewardError> {
        let deduct_id = self.ledger.allocate_id();
        self.reverse_at(deduct_id, tx_id)
    }

    fn reverse_at(
        &mut self,
        deduct_id: TransactionId,
        tx_id: TransactionId,
    ) -> Result<TransactionId, RewardError> {
        let original = self
            .ledger
            .get(tx_id)
            .ok_or_else(|| RewardError::transaction_not_found(tx_id, "reverse"))?;

        if !original.kind.is_credit() {
            return Err(RewardError::not_reversible(tx_id, original.kind.label()));
        }
        if original.status != TransactionStatus::Active {
            return Err(RewardError::already_reversed(tx_id));
        }

        let user = original.user;
        let points = original.points;
        let related_booking = original.related_booking;
        let related_reservation = original.related_reservation;

        // Points already spent cannot be clawed back below zero
        self.balances.debit(user, points)?;
        self.ledger.mark_reversed(tx_id)?;

        let mut deduct = Transaction::new(
            deduct_id,
            user,
            TransactionKind::Deduct,
            points,
            format!("reversal of tx {}", tx_id),
            Utc::now(),
        );
        deduct.related_booking = related_booking;
        deduct.related_reservation = related_reservation;
        self.ledger.insert(deduct);

        Ok(deduct_id)
    }

    /// Current point balance for a user, zero if no account exists
    pub fn balance(&self, user: UserId) -> u64 {
        self.balances.balance(user)
    }

    /// A user's ledger entries, newest first
    pub fn transactions_for(&self, user: UserId) -> Vec<&Transaction> {
        self.ledger.transactions_for(user)
    }

    /// Per-kind totals over a user's active entries
    pub fn statistics(&self, user: UserId) -> Statistics {
        stats::statistics(self.ledger.transactions_for(user))
    }

    /// Active earn-type credits expiring within `within_days` of `now`
    pub fn expiring_soon(
        &self,
        user: UserId,
        within_days: i64,
        now: DateTime<Utc>,
    ) -> ExpiringSummary {
        stats::expiring_soon(self.ledger.transactions_for(user), within_days, now)
    }

    /// Check a user's cached balance against their full history
    pub fn reconcile(&self, user: UserId) -> Reconciliation {
        stats::reconcile(
            self.ledger.transactions_for(user),
            self.balances.balance(user),
        )
    }

    /// A user's tier standing, derived from the current balance
    pub fn tier_status(&self, user: UserId) -> TierStatus {
        self.schedule.status_for(self.balances.balance(user))
    }

    /// The tier schedule in effect
    pub fn schedule(&self) -> &TierSchedule {
        &self.schedule
    }

    /// Total number of ledger entries across all users
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    /// Get final per-user summaries for output
    ///
    /// Returns one row per account sorted by user ID, each carrying the
    /// balance and the tier standing derived from it.
    pub fn summaries(&self) -> Vec<UserSummary> {
        self.balances
            .all_accounts()
            .into_iter()
            .map(|account| {
                let band = self.schedule.tier_for(account.balance);
                UserSummary {
                    user: account.user,
                    balance: account.balance,
                    tier: band.name.clone(),
                    discount_percent: band.discount_percent,
                }
            })
            .collect()
    }
}

impl Default for RewardsEngine {
    fn default() -> Self {
        Self::new()
    }
}
