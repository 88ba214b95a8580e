//! User account types
//!
//! This module defines the UserAccount structure holding the denormalized
//! point balance maintained by the ledger.

use super::transaction::UserId;

/// Cached point balance for a single user
///
/// The balance is a denormalized running total, mutated only through the
/// ledger's apply step: every successful write adjusts it in the same
/// logical operation as the transaction insert. It can be recomputed from
/// the full transaction history at any time for reconciliation.
///
/// The `u64` representation makes the non-negativity invariant structural:
/// no operation can produce a negative balance, overdraw attempts are
/// rejected before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// The user ID owning this balance
    pub user: UserId,

    /// Current point balance
    pub balance: u64,
}

impl UserAccount {
    /// Create a new account with a zero balance
    pub fn new(user: UserId) -> Self {
        UserAccount { user, balance: 0 }
    }
}
