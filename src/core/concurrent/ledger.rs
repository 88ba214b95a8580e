//! Thread-safe ledger storage for concurrent batch processing
//!
//! This module provides the `SharedLedgerStore` struct, the concurrent
//! counterpart of [`LedgerStore`]. Entries live in a `DashMap` keyed by
//! transaction id, with a per-user index for history listings; ids are
//! allocated with an atomic counter so they stay unique and monotone under
//! concurrent writers.
//!
//! [`LedgerStore`]: crate::core::ledger::LedgerStore

use crate::types::{RewardError, Transaction, TransactionId, TransactionStatus, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe append-only ledger of point transactions
#[derive(Debug)]
pub struct SharedLedgerStore {
    /// Concurrent map of transaction ID to ledger entry
    transactions: DashMap<TransactionId, Transaction>,

    /// Per-user index of transaction ids, in insertion order
    by_user: DashMap<UserId, Vec<TransactionId>>,

    /// Next id to hand out
    next_id: AtomicU64,
}

impl SharedLedgerStore {
    /// Create a new empty SharedLedgerStore
    pub fn new() -> Self {
        Self {
            transactions: DashMap::new(),
            by_user: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocate the next transaction id
    ///
    /// Uses an atomic fetch-add, so concurrent callers always receive
    /// distinct ids.
    pub fn allocate_id(&self) -> TransactionId {
        self.allocate_span(1)
    }

    /// Reserve `span` consecutive transaction ids, returning the first
    pub fn allocate_span(&self, span: u64) -> TransactionId {
        self.next_id.fetch_add(span, Ordering::Relaxed)
    }

    /// Append an entry to the ledger
    ///
    /// The entry's id must have been obtained from [`allocate_id`].
    ///
    /// [`allocate_id`]: SharedLedgerStore::allocate_id
    pub fn insert(&self, tx: Transaction) {
        debug_assert!(
            !self.transactions.contains_key(&tx.id),
            "duplicate transaction id {}",
            tx.id
        );
        self.by_user.entry(tx.user).or_default().push(tx.id);
        self.transactions.insert(tx.id, tx);
    }

    /// Snapshot of a ledger entry
    pub fn get(&self, tx_id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&tx_id).map(|entry| entry.clone())
    }

    /// Number of entries in the ledger
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the ledger holds no entries
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Flip an entry from `Active` to `Reversed`
    ///
    /// The check and the write happen under the entry's lock, so two racing
    /// reversals of the same entry resolve to one winner.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if the id is unknown
    /// - `AlreadyReversed` if the entry is not `Active`
    pub fn mark_reversed(&self, tx_id: TransactionId) -> Result<(), RewardError> {
        let mut entry = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| RewardError::transaction_not_found(tx_id, "reverse"))?;

        if entry.status != TransactionStatus::Active {
            return Err(RewardError::already_reversed(tx_id));
        }

        entry.status = TransactionStatus::Reversed;
        Ok(())
    }

    /// Snapshot of a user's entries, newest first
    pub fn transactions_for(&self, user: UserId) -> Vec<Transaction> {
        let ids: Vec<TransactionId> = self
            .by_user
            .get(&user)
            .map(|entry| entry.clone())
            .unwrap_or_default();

        let mut entries: Vec<Transaction> = ids
            .iter()
            .filter_map(|id| self.transactions.get(id).map(|entry| entry.clone()))
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }
}

impl Default for SharedLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}
