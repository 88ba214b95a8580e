//! Append-only transaction storage
//!
//! This module provides the LedgerStore component that keeps the full
//! history of point transactions per user. Entries are never deleted;
//! reversal flips the status of the original entry and appends an
//! offsetting deduct, preserving the audit trail.
//!
//! # Identifier Assignment
//!
//! Transaction ids are allocated by the store, monotonically from 1.
//! Callers reserve an id span, build the entries, and insert them; this
//! keeps the same shape as the thread-safe store, where reservation is an
//! atomic fetch-add. A reserved id that never gets an entry (a rejected
//! operation) stays a gap in the sequence.

use crate::types::{RewardError, Transaction, TransactionId, TransactionStatus, UserId};
use std::collections::HashMap;

/// Append-only ledger of point transactions
///
/// Maintains a map of transaction ids to entries plus a per-user index
/// for history listings and read-side aggregation.
pub struct LedgerStore {
    /// Map of transaction ID to ledger entry
    transactions: HashMap<TransactionId, Transaction>,

    /// Per-user index of transaction ids, in insertion order
    by_user: HashMap<UserId, Vec<TransactionId>>,

    /// Next id to hand out
    next_id: TransactionId,
}

impl LedgerStore {
    /// Create a new empty ledger store
    pub fn new() -> Self {
        LedgerStore {
            transactions: HashMap::new(),
            by_user: HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocate the next transaction id
    pub fn allocate_id(&mut self) -> TransactionId {
        self.allocate_span(1)
    }

    /// Reserve `span` consecutive transaction ids, returning the first
    pub fn allocate_span(&mut self, span: u64) -> TransactionId {
        let id = self.next_id;
        self.next_id += span;
        id
    }

    /// Append an entry to the ledger
    ///
    /// The entry's id must have been obtained from [`allocate_id`].
    ///
    /// [`allocate_id`]: LedgerStore::allocate_id
    pub fn insert(&mut self, tx: Transaction) {
        debug_assert!(
            !self.transactions.contains_key(&tx.id),
            "duplicate transaction id {}",
            tx.id
        );
        self.by_user.entry(tx.user).or_default().push(tx.id);
        self.transactions.insert(tx.id, tx);
    }

    /// Get an immutable reference to a ledger entry
    pub fn get(&self, tx_id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&tx_id)
    }

    /// Number of entries in the ledger
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the ledger holds no entries
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Iterate over every entry in the ledger, in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Flip an entry from `Active` to `Reversed`
    ///
    /// The transition happens at most once per entry; a second attempt is
    /// the idempotence check that makes double-reversal fail cleanly.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if the id is unknown
    /// - `AlreadyReversed` if the entry is not `Active`
    pub fn mark_reversed(&mut self, tx_id: TransactionId) -> Result<(), RewardError> {
        let tx = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| RewardError::transaction_not_found(tx_id, "reverse"))?;

        if tx.status != TransactionStatus::Active {
            return Err(RewardError::already_reversed(tx_id));
        }

        tx.status = TransactionStatus::Reversed;
        Ok(())
    }

    /// All of a user's entries, newest first
    ///
    /// Newest-first means descending transaction id; ids are monotone in
    /// creation order.
    pub fn transactions_for(&self, user: UserId) -> Vec<&Transaction> {
        let mut entries: Vec<&Transaction> = self
            .by_user
            .get(&user)
            .into_iter()
            .flatten()
            .filter_map(|id| self.transactions.get(id))
            .collect();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}
