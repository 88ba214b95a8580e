//! Cached balance management
//!
//! This module provides the `BalanceBook` struct which maintains the
//! denormalized point balance of every user and provides the primitive
//! balance mutations used by the ledger.
//!
//! The BalanceBook is responsible for:
//! - Creating accounts on first credit
//! - Conditional debits that reject overdraw before any mutation
//! - Atomic two-party moves for transfers
//! - Sorted account listings for output

use crate::types::{RewardError, UserAccount, UserId};
use std::collections::HashMap;

/// Manages the cached point balance of every user
///
/// The BalanceBook maintains an in-memory map of user IDs to accounts.
/// Every mutation validates its precondition against the current balance
/// before writing, so a failed operation leaves the book untouched.
pub struct BalanceBook {
    /// Map of user IDs to account states
    accounts: HashMap<UserId, UserAccount>,
}

impl BalanceBook {
    /// Create a new BalanceBook with no accounts
    pub fn new() -> Self {
        BalanceBook {
            accounts: HashMap::new(),
        }
    }

    /// Get or create an account for the specified user
    ///
    /// If no account exists, creates one with a zero balance.
    pub fn get_or_create(&mut self, user: UserId) -> &mut UserAccount {
        self.accounts
            .entry(user)
            .or_insert_with(|| UserAccount::new(user))
    }

    /// Whether the user has a rewards account
    ///
    /// Accounts come into existence on first credit; transfer recipients
    /// must already exist.
    pub fn contains(&self, user: UserId) -> bool {
        self.accounts.contains_key(&user)
    }

    /// Current balance for a user, zero if no account exists
    pub fn balance(&self, user: UserId) -> u64 {
        self.accounts.get(&user).map(|acc| acc.balance).unwrap_or(0)
    }

    /// Get all accounts sorted by user ID
    ///
    /// Sorted ascending for deterministic report output.
    pub fn all_accounts(&self) -> Vec<&UserAccount> {
        let mut accounts: Vec<&UserAccount> = self.accounts.values().collect();
        accounts.sort_by_key(|account| account.user);
        accounts
    }

    /// Credit points to a user, creating the account if needed
    ///
    /// Uses checked arithmetic; rejects the credit if the balance would
    /// overflow, leaving the account unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if adding `points` would overflow.
    pub fn credit(&mut self, user: UserId, points: u64) -> Result<(), RewardError> {
        let account = self.get_or_create(user);

        account.balance = account
            .balance
            .checked_add(points)
            .ok_or_else(|| RewardError::arithmetic_overflow("credit", user))?;

        Ok(())
    }

    /// Debit points from a user
    ///
    /// The balance check and the write form one step: if the current
    /// balance does not cover `points`, nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if `points` exceeds the balance.
    pub fn debit(&mut self, user: UserId, points: u64) -> Result<(), RewardError> {
        let account = self.get_or_create(user);

        if account.balance < points {
            return Err(RewardError::insufficient_balance(
                user,
                account.balance,
                points,
            ));
        }

        account.balance -= points;
        Ok(())
    }

    /// Move points from one user to another as a single atomic step
    ///
    /// Both preconditions (sender coverage, recipient overflow headroom)
    /// are checked before either balance is written, so a failure leaves
    /// both accounts untouched.
    ///
    /// # Errors
    ///
    /// - `InsufficientBalance` if the sender's balance is below `points`
    /// - `ArithmeticOverflow` if the recipient's balance would overflow
    pub fn transfer(
        &mut self,
        sender: UserId,
        recipient: UserId,
        points: u64,
    ) -> Result<(), RewardError> {
        let sender_balance = self.balance(sender);
        if sender_balance < points {
            return Err(RewardError::insufficient_balance(
                sender,
                sender_balance,
                points,
            ));
        }

        let new_recipient = self
            .balance(recipient)
            .checked_add(points)
            .ok_or_else(|| RewardError::arithmetic_overflow("transfer", recipient))?;

        self.get_or_create(sender).balance = sender_balance - points;
        self.get_or_create(recipient).balance = new_recipient;
        Ok(())
    }
}

impl Default for BalanceBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_empty_book() {
        let book = BalanceBook::new();
        assert_eq!(book.all_accounts().len(), 0);
        assert_eq!(book.balance(1), 0);
        assert!(!book.contains(1));
    }

    #[test]
    fn test_credit_creates_account() {
        let mut book = BalanceBook::new();

        book.credit(1, 500).unwrap();

        assert!(book.contains(1));
        assert_eq!(book.balance(1), 500);
    }

    #[test]
    fn test_credit_accumulates() {
        let mut book = BalanceBook::new();

        book.credit(1, 100).unwrap();
        book.credit(1, 250).unwrap();
        book.credit(1, 50).unwrap();

        assert_eq!(book.balance(1), 400);
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut book = BalanceBook::new();
        book.get_or_create(1).balance = u64::MAX;

        let result = book.credit(1, 1);

        assert!(matches!(
            result.unwrap_err(),
            RewardError::ArithmeticOverflow { .. }
        ));
        assert_eq!(book.balance(1), u64::MAX);
    }

    #[test]
    fn test_debit_decreases_balance() {
        let mut book = BalanceBook::new();
        book.credit(1, 500).unwrap();

        book.debit(1, 200).unwrap();

        assert_eq!(book.balance(1), 300);
    }

    #[test]
    fn test_debit_overdraw_rejected_and_unchanged() {
        let mut book = BalanceBook::new();
        book.credit(1, 500).unwrap();

        let result = book.debit(1, 600);

        assert!(matches!(
            result.unwrap_err(),
            RewardError::InsufficientBalance {
                user: 1,
                balance: 500,
                requested: 600,
            }
        ));
        assert_eq!(book.balance(1), 500);
    }

    #[test]
    fn test_debit_from_unknown_user_fails() {
        let mut book = BalanceBook::new();

        let result = book.debit(7, 1);

        assert!(matches!(
            result.unwrap_err(),
            RewardError::InsufficientBalance { .. }
        ));
    }

    #[test]
    fn test_transfer_moves_points() {
        let mut book = BalanceBook::new();
        book.credit(1, 1000).unwrap();
        book.credit(2, 0).unwrap();

        book.transfer(1, 2, 300).unwrap();

        assert_eq!(book.balance(1), 700);
        assert_eq!(book.balance(2), 300);
    }

    #[test]
    fn test_transfer_insufficient_leaves_both_unchanged() {
        let mut book = BalanceBook::new();
        book.credit(1, 100).unwrap();
        book.credit(2, 50).unwrap();

        let result = book.transfer(1, 2, 200);

        assert!(matches!(
            result.unwrap_err(),
            RewardError::InsufficientBalance { .. }
        ));
        assert_eq!(book.balance(1), 100);
        assert_eq!(book.balance(2), 50);
    }

    #[test]
    fn test_transfer_recipient_overflow_leaves_both_unchanged() {
        let mut book = BalanceBook::new();
        book.credit(1, 100).unwrap();
        book.get_or_create(2).balance = u64::MAX;

        let result = book.transfer(1, 2, 100);

        assert!(matches!(
            result.unwrap_err(),
            RewardError::ArithmeticOverflow { .. }
        ));
        assert_eq!(book.balance(1), 100);
        assert_eq!(book.balance(2), u64::MAX);
    }

    #[test]
    fn test_all_accounts_sorted_by_user() {
        let mut book = BalanceBook::new();
        book.credit(3, 30).unwrap();
        book.credit(1, 10).unwrap();
        book.credit(2, 20).unwrap();

        let users: Vec<UserId> = book.all_accounts().iter().map(|a| a.user).collect();
        assert_eq!(users, vec![1, 2, 3]);
    }
}
