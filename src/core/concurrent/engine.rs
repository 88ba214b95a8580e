//! Rewards processing orchestration for concurrent batch processing
//!
//! This module provides the `SharedRewardsEngine` struct, which orchestrates
//! ledger writes using the thread-safe `SharedBalanceBook` and
//! `SharedLedgerStore` components.
//!
//! # Architecture
//!
//! ```text
//! SharedRewardsEngine
//!     ├── Arc<SharedBalanceBook>   (thread-safe balances)
//!     ├── Arc<SharedLedgerStore>   (thread-safe ledger history)
//!     └── TierSchedule             (immutable tier configuration)
//! ```
//!
//! # Locking protocol
//!
//! Every mutation takes the owning user's account mutex and holds it across
//! the balance check, the balance write, and the ledger append. Transfers
//! take both parties' mutexes, always in ascending user-id order, so two
//! opposite-direction transfers between the same pair cannot deadlock.
//! Reversal serializes on the owner's mutex, which makes the
//! check-mark-debit sequence atomic with respect to other operations on
//! that user.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::balances::{lock_account, SharedBalanceBook};
use super::ledger::SharedLedgerStore;
use crate::accrual::{booking_points, RESERVATION_POINTS};
use crate::core::engine::UserSummary;
use crate::core::stats::{self, ExpiringSummary, Reconciliation, Statistics};
use crate::tier::{TierSchedule, TierStatus};
use crate::types::{
    EarnSource, EventKind, EventRecord, RewardError, Transaction, TransactionId, TransactionKind,
    TransactionStatus, UserId,
};

/// Transfer-in credits expire one year after the transfer
const TRANSFER_EXPIRY_DAYS: i64 = 365;

/// Thread-safe rewards processing orchestrator
///
/// `SharedRewardsEngine` coordinates ledger writes across thread-safe
/// balance and ledger components. It is cloneable and can be shared across
/// tokio tasks; clones operate on the same underlying state.
#[derive(Debug, Clone)]
pub struct SharedRewardsEngine {
    /// Thread-safe balance book, shared across tasks
    balances: Arc<SharedBalanceBook>,

    /// Thread-safe ledger history, shared across tasks
    ledger: Arc<SharedLedgerStore>,

    /// Tier configuration, immutable after construction
    schedule: Arc<TierSchedule>,
}

impl SharedRewardsEngine {
    /// Create a new SharedRewardsEngine with the canonical tier schedule
    pub fn new(balances: Arc<SharedBalanceBook>, ledger: Arc<SharedLedgerStore>) -> Self {
        Self {
            balances,
            ledger,
            schedule: Arc::new(TierSchedule::default()),
        }
    }

    /// Reserve the transaction ids a record will occupy
    ///
    /// Called in input order before records are handed to parallel tasks,
    /// so the ids an event receives depend only on its position in the
    /// input, never on task scheduling. A rejected record leaves its
    /// reserved ids as a gap, matching the single-threaded engine.
    pub fn reserve_ids(&self, record: &EventRecord) -> TransactionId {
        self.ledger.allocate_span(record.kind.id_span())
    }

    /// Process a single reward event record
    ///
    /// Same routing and field validation as the single-threaded engine; see
    /// [`RewardsEngine::process`].
    ///
    /// [`RewardsEngine::process`]: crate::core::engine::RewardsEngine::process
    pub fn process(&self, record: EventRecord) -> Result<(), RewardError> {
        let id = self.reserve_ids(&record);
        self.process_reserved(record, id)
    }

    /// Process a record whose ids were reserved via [`reserve_ids`]
    ///
    /// [`reserve_ids`]: SharedRewardsEngine::reserve_ids
    pub fn process_reserved(
        &self,
        record: EventRecord,
        id: TransactionId,
    ) -> Result<(), RewardError> {
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
    /// # Errors
    ///
    /// Returns an error if `points` is zero or the balance would overflow.
    pub fn record_earn(
        &self,
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
        &self,
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
        let handle = self.balances.handle(user);
        let mut account = lock_account(&handle);

        account.balance = account
            .balance
            .checked_add(points)
            .ok_or_else(|| RewardError::arithmetic_overflow("earn", user))?;

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
    /// # Errors
    ///
    /// Returns an error if `points` is zero or the balance does not cover it.
    pub fn record_redeem(
        &self,
        user: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<TransactionId, RewardError> {
        let id = self.ledger.allocate_id();
        self.record_redeem_at(id, user, points, description)
    }

    fn record_redeem_at(
        &self,
        id: TransactionId,
        user: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<TransactionId, RewardError> {
        if points == 0 {
            return Err(RewardError::invalid_points("redeem", user));
        }

        let handle = self.balances.handle(user);
        let mut account = lock_account(&handle);

        if account.balance < points {
            return Err(RewardError::insufficient_balance(
                user,
                account.balance,
                points,
            ));
        }
        account.balance -= points;

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
    /// Both accounts are locked in ascending user-id order for the duration
    /// of the check-then-write and the ledger appends, so concurrent
    /// transfers over the same pair serialize and the pair of entries is
    /// consistent with the balance move.
    ///
    /// # Errors
    ///
    /// Returns an error if `points` is zero, the recipient is the sender or
    /// has no account, or the sender's balance does not cover `points`.
    pub fn record_transfer(
        &self,
        sender: UserId,
        recipient: UserId,
        points: u64,
        description: impl Into<String>,
    ) -> Result<(TransactionId, TransactionId), RewardError> {
        let out_id = self.ledger.allocate_span(2);
        self.record_transfer_at(out_id, out_id + 1, sender, recipient, points, description)
    }

    fn record_transfer_at(
        &self,
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
        let recipient_handle = self.balances.existing_handle(recipient).ok_or_else(|| {
            RewardError::invalid_recipient(sender, recipient, "recipient has no rewards account")
        })?;
        let sender_handle = self.balances.handle(sender);

        // Ascending-id lock order keeps opposing transfers deadlock-free
        let (mut first, mut second) = if sender < recipient {
            let first = lock_account(&sender_handle);
            let second = lock_account(&recipient_handle);
            (first, second)
        } else {
            let first = lock_account(&recipient_handle);
            let second = lock_account(&sender_handle);
            (first, second)
        };
        let (sender_account, recipient_account) = if sender < recipient {
            (&mut *first, &mut *second)
        } else {
            (&mut *second, &mut *first)
        };

        if sender_account.balance < points {
            return Err(RewardError::insufficient_balance(
                sender,
                sender_account.balance,
                points,
            ));
        }
        let new_recipient = recipient_account
            .balance
            .checked_add(points)
            .ok_or_else(|| RewardError::arithmetic_overflow("transfer", recipient))?;

        sender_account.balance -= points;
        recipient_account.balance = new_recipient;

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
    /// Holds the owner's account mutex across the status transition and the
    /// debit, so two racing reversals of the same entry resolve to exactly
    /// one winner and the loser observes `AlreadyReversed`.
    ///
    /// # Errors
    ///
    /// Same contract as [`RewardsEngine::reverse`].
    ///
    /// [`RewardsEngine::reverse`]: crate::core::engine::RewardsEngine::reverse
    pub fn reverse(&self, tx_id: TransactionId) -> Result<TransactionId, RewardError> {
        let deduct_id = self.ledger.allocate_id();
        self.reverse_at(deduct_id, tx_id)
    }

    fn reverse_at(
        &self,
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

        let handle = self.balances.handle(original.user);
        let mut account = lock_account(&handle);

        // Re-check under the lock; another reversal may have won the race
        // between the snapshot above and the lock acquisition
        if self
            .ledger
            .get(tx_id)
            .map(|tx| tx.status)
            .unwrap_or(TransactionStatus::Reversed)
            != TransactionStatus::Active
        {
            return Err(RewardError::already_reversed(tx_id));
        }
        if account.balance < original.points {
            return Err(RewardError::insufficient_balance(
                original.user,
                account.balance,
                original.points,
            ));
        }

        self.ledger.mark_reversed(tx_id)?;
        account.balance -= original.points;

        let mut deduct = Transaction::new(
            deduct_id,
            original.user,
            TransactionKind::Deduct,
            original.points,
            format!("reversal of tx {}", tx_id),
            Utc::now(),
        );
        deduct.related_booking = original.related_booking;
        deduct.related_reservation = original.related_reservation;
        self.ledger.insert(deduct);

        Ok(deduct_id)
    }

    /// Snapshot of a user's balance, zero if no account exists
    pub fn balance(&self, user: UserId) -> u64 {
        self.balances.balance(user)
    }

    /// Snapshot of a user's ledger entries, newest first
    pub fn transactions_for(&self, user: UserId) -> Vec<Transaction> {
        self.ledger.transactions_for(user)
    }

    /// Per-kind totals over a user's active entries
    pub fn statistics(&self, user: UserId) -> Statistics {
        stats::statistics(&self.ledger.transactions_for(user))
    }

    /// Active earn-type credits expiring within `within_days` of `now`
    pub fn expiring_soon(
        &self,
        user: UserId,
        within_days: i64,
        now: DateTime<Utc>,
    ) -> ExpiringSummary {
        stats::expiring_soon(&self.ledger.transactions_for(user), within_days, now)
    }

    /// Check a user's cached balance against their full history
    ///
    /// Holds the user's account mutex while snapshotting both sides, so the
    /// comparison never straddles a half-applied mutation.
    pub fn reconcile(&self, user: UserId) -> Reconciliation {
        let handle = self.balances.handle(user);
        let account = lock_account(&handle);
        stats::reconcile(&self.ledger.transactions_for(user), account.balance)
    }

    /// A user's tier standing, derived from the current balance
    pub fn tier_status(&self, user: UserId) -> TierStatus {
        self.schedule.status_for(self.balances.balance(user))
    }

    /// Get final per-user summaries for output
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
