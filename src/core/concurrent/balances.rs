//! Thread-safe balance management for concurrent batch processing
//!
//! This module provides the `SharedBalanceBook` struct, which manages user
//! balances using concurrent data structures to enable safe multi-threaded
//! access.
//!
//! # Design
//!
//! Accounts are stored as `Arc<Mutex<UserAccount>>` handles inside a
//! `DashMap`. The extra indirection over a plain `DashMap<UserId, UserAccount>`
//! exists for transfers: a transfer must hold both parties at once, and two
//! `DashMap` entry guards taken in opposite orders by two threads can
//! deadlock. Handles can be fetched first (briefly touching the map) and then
//! locked in ascending user-id order, which makes the two-party lock
//! acquisition deadlock-free.
//!
//! # Thread Safety
//!
//! Operations on different users proceed in parallel; operations on the same
//! user serialize on that user's mutex. The mutex is held across the
//! check-then-write of every balance mutation, so a precondition observed
//! under the lock still holds when the write lands.

use crate::types::{UserAccount, UserId};
use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lock an account handle, recovering from poisoning
///
/// A panic while holding the lock can only happen in a caller's closure;
/// balances themselves are plain integers and every mutation is applied
/// after its checks, so the state behind a poisoned lock is still valid.
pub(crate) fn lock_account(handle: &Mutex<UserAccount>) -> MutexGuard<'_, UserAccount> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe balance book for concurrent batch processing
///
/// `SharedBalanceBook` provides concurrent access to per-user balances.
/// Each account lives behind its own mutex, so multiple threads can mutate
/// different users simultaneously while same-user operations serialize.
#[derive(Debug, Default)]
pub struct SharedBalanceBook {
    /// Concurrent map of user IDs to account handles
    accounts: DashMap<UserId, Arc<Mutex<UserAccount>>>,
}

impl SharedBalanceBook {
    /// Create a new empty SharedBalanceBook
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Get or create the handle for a user's account
    ///
    /// If multiple threads race to create the same account, exactly one
    /// insertion wins and all callers receive the same handle.
    pub fn handle(&self, user: UserId) -> Arc<Mutex<UserAccount>> {
        self.accounts
            .entry(user)
            .or_insert_with(|| Arc::new(Mutex::new(UserAccount::new(user))))
            .clone()
    }

    /// The handle for an existing account, None if the user is unknown
    pub fn existing_handle(&self, user: UserId) -> Option<Arc<Mutex<UserAccount>>> {
        self.accounts.get(&user).map(|entry| entry.clone())
    }

    /// Whether the user has a rewards account
    pub fn contains(&self, user: UserId) -> bool {
        self.accounts.contains_key(&user)
    }

    /// Snapshot of a user's balance, zero if no account exists
    ///
    /// The value is a point-in-time read; concurrent writers may change the
    /// balance immediately after this returns.
    pub fn balance(&self, user: UserId) -> u64 {
        self.accounts
            .get(&user)
            .map(|entry| lock_account(&entry).balance)
            .unwrap_or(0)
    }

    /// Snapshot of all accounts sorted by user ID
    pub fn all_accounts(&self) -> Vec<UserAccount> {
        let mut accounts: Vec<UserAccount> = self
            .accounts
            .iter()
            .map(|entry| lock_account(entry.value()).clone())
            .collect();
        accounts.sort_by_key(|account| account.user);
        accounts
    }
}
