//! Read-side balance aggregation
//!
//! Pure computations over a user's ledger entries: per-kind statistics,
//! the expiring-soon report, and balance reconciliation. Nothing here
//! mutates state; every function can be re-run at any time.
//!
//! The functions are generic over any iterator of borrowed entries so the
//! same aggregation serves both the single-threaded store (which hands
//! out references) and the thread-safe store (which hands out clones).
//!
//! # Reversal bookkeeping
//!
//! A reversal marks the original credit `Reversed` and appends an
//! offsetting active deduct; the cached balance is decremented once, by
//! the deduct. Reconciliation therefore sums the signed effect of every
//! entry regardless of status; filtering by status on top of the
//! offsetting deduct would count each reversal twice. The `Active` filter
//! applies where reversed credits must not appear: statistics and the
//! expiring-points view.

use crate::types::{Transaction, TransactionId, TransactionKind, TransactionStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Per-user totals over active ledger entries, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Sum of active earn magnitudes
    pub total_earned: u64,

    /// Sum of active redeem magnitudes
    pub total_redeemed: u64,

    /// Sum of active transfer-in magnitudes
    pub total_transferred_in: u64,

    /// Sum of active transfer-out magnitudes
    pub total_transferred_out: u64,

    /// Count of active entries of any kind
    pub transaction_count: usize,
}

/// One earn-type entry expiring inside the report window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiringEntry {
    /// Ledger entry id
    pub tx: TransactionId,

    /// Points that will expire
    pub points: u64,

    /// When they expire
    pub expires_at: DateTime<Utc>,
}

/// Points expiring within a report window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpiringSummary {
    /// Total points expiring inside the window
    pub total_expiring: u64,

    /// The soonest expiry inside the window, None if nothing expires
    pub nearest_expiry: Option<DateTime<Utc>>,

    /// Matching entries, ascending by expiry date, ties broken by id
    pub entries: Vec<ExpiringEntry>,
}

/// Result of recomputing a balance from the full transaction history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// The cached balance field
    pub cached: u64,

    /// Balance recomputed from the ledger
    pub recomputed: i128,

    /// Whether the two agree
    pub is_consistent: bool,
}

/// Compute per-kind totals over a user's entries
///
/// Only `Active` entries count; reversed credits and their history drop
/// out of the totals. An empty history yields all zeros, never an error.
pub fn statistics<'a, I>(entries: I) -> Statistics
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut stats = Statistics::default();

    for tx in entries {
        if tx.status != TransactionStatus::Active {
            continue;
        }
        stats.transaction_count += 1;
        match tx.kind {
            TransactionKind::Earn => {
                stats.total_earned = stats.total_earned.saturating_add(tx.points)
            }
            TransactionKind::Redeem => {
                stats.total_redeemed = stats.total_redeemed.saturating_add(tx.points)
            }
            TransactionKind::TransferIn => {
                stats.total_transferred_in = stats.total_transferred_in.saturating_add(tx.points)
            }
            TransactionKind::TransferOut => {
                stats.total_transferred_out = stats.total_transferred_out.saturating_add(tx.points)
            }
            TransactionKind::Deduct => {}
        }
    }

    stats
}

/// Report active earn-type entries expiring within `[now, now + within_days]`
///
/// Entries are sorted ascending by expiry date, ties broken by transaction
/// id ascending. Entries already past their expiry at `now` are excluded.
pub fn expiring_soon<'a, I>(entries: I, within_days: i64, now: DateTime<Utc>) -> ExpiringSummary
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let cutoff = now + Duration::days(within_days);

    let mut matching: Vec<ExpiringEntry> = entries
        .into_iter()
        .filter(|tx| tx.status == TransactionStatus::Active && tx.kind.is_credit())
        .filter_map(|tx| {
            let expires_at = tx.expires_at?;
            (expires_at >= now && expires_at <= cutoff).then_some(ExpiringEntry {
                tx: tx.id,
                points: tx.points,
                expires_at,
            })
        })
        .collect();

    matching.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then(a.tx.cmp(&b.tx)));

    ExpiringSummary {
        total_expiring: matching.iter().map(|e| e.points).sum(),
        nearest_expiry: matching.first().map(|e| e.expires_at),
        entries: matching,
    }
}

/// Recompute a balance by summing the signed effect of every entry
pub fn recompute_balance<'a, I>(entries: I) -> i128
where
    I: IntoIterator<Item = &'a Transaction>,
{
    entries.into_iter().map(Transaction::signed_effect).sum()
}

/// Compare the cached balance against a from-history recomputation
///
/// This is the drift-detection primitive: after any sequence of
/// successful operations the two values must agree.
pub fn reconcile<'a, I>(entries: I, cached: u64) -> Reconciliation
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let recomputed = recompute_balance(entries);
    Reconciliation {
        cached,
        recomputed,
        is_consistent: recomputed == cached as i128,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;
    use chrono::Duration;

    fn tx(id: TransactionId, kind: TransactionKind, points: u64) -> Transaction {
        Transaction::new(id, 1, kind, points, "test", Utc::now())
    }

    #[test]
    fn test_statistics_empty_history() {
        let stats = statistics([]);
        assert_eq!(stats, Statistics::default());
    }

    #[test]
    fn test_statistics_groups_by_kind() {
        let entries = vec![
            tx(1, TransactionKind::Earn, 500),
            tx(2, TransactionKind::Earn, 300),
            tx(3, TransactionKind::Redeem, 200),
            tx(4, TransactionKind::TransferIn, 150),
            tx(5, TransactionKind::TransferOut, 50),
            tx(6, TransactionKind::Deduct, 25),
        ];

        let stats = statistics(&entries);

        assert_eq!(stats.total_earned, 800);
        assert_eq!(stats.total_redeemed, 200);
        assert_eq!(stats.total_transferred_in, 150);
        assert_eq!(stats.total_transferred_out, 50);
        assert_eq!(stats.transaction_count, 6);
    }

    #[test]
    fn test_statistics_skips_reversed_entries() {
        let mut reversed = tx(1, TransactionKind::Earn, 500);
        reversed.status = TransactionStatus::Reversed;
        let entries = vec![reversed, tx(2, TransactionKind::Earn, 100)];

        let stats = statistics(&entries);

        assert_eq!(stats.total_earned, 100);
        assert_eq!(stats.transaction_count, 1);
    }

    #[test]
    fn test_expiring_soon_window_and_ordering() {
        let now = Utc::now();
        let entries = vec![
            tx(1, TransactionKind::Earn, 100).with_expiry(Some(now + Duration::days(25))),
            tx(2, TransactionKind::Earn, 200).with_expiry(Some(now + Duration::days(10))),
            // ties on expiry sort by id
            tx(3, TransactionKind::Earn, 50).with_expiry(Some(now + Duration::days(10))),
            // outside the window
            tx(4, TransactionKind::Earn, 999).with_expiry(Some(now + Duration::days(40))),
            // no expiry date
            tx(5, TransactionKind::Earn, 999),
        ];

        let summary = expiring_soon(&entries, 30, now);

        assert_eq!(summary.total_expiring, 350);
        assert_eq!(summary.nearest_expiry, Some(now + Duration::days(10)));
        let ids: Vec<TransactionId> = summary.entries.iter().map(|e| e.tx).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_expiring_soon_excludes_reversed_and_debits() {
        let now = Utc::now();
        let mut reversed = tx(1, TransactionKind::Earn, 100);
        reversed.status = TransactionStatus::Reversed;
        reversed.expires_at = Some(now + Duration::days(5));
        let entries = vec![
            reversed,
            tx(2, TransactionKind::Redeem, 200).with_expiry(Some(now + Duration::days(5))),
        ];

        let summary = expiring_soon(&entries, 30, now);

        assert_eq!(summary.total_expiring, 0);
        assert_eq!(summary.nearest_expiry, None);
    }

    #[test]
    fn test_expiring_soon_excludes_already_expired() {
        let now = Utc::now();
        let entries =
            vec![tx(1, TransactionKind::Earn, 100).with_expiry(Some(now - Duration::days(1)))];

        let summary = expiring_soon(&entries, 30, now);

        assert_eq!(summary.total_expiring, 0);
    }

    #[test]
    fn test_reconcile_consistent() {
        let entries = vec![
            tx(1, TransactionKind::Earn, 500),
            tx(2, TransactionKind::Redeem, 200),
        ];

        let result = reconcile(&entries, 300);

        assert_eq!(result.recomputed, 300);
        assert!(result.is_consistent);
    }

    #[test]
    fn test_reconcile_detects_drift() {
        let entries = vec![tx(1, TransactionKind::Earn, 500)];

        let result = reconcile(&entries, 400);

        assert_eq!(result.cached, 400);
        assert_eq!(result.recomputed, 500);
        assert!(!result.is_consistent);
    }

    #[test]
    fn test_reconcile_counts_reversal_pair_once() {
        // earn 100, reversal: original marked reversed, active deduct 100
        let mut original = tx(1, TransactionKind::Earn, 100);
        original.status = TransactionStatus::Reversed;
        let entries = vec![
            tx(0, TransactionKind::Earn, 500),
            original,
            tx(2, TransactionKind::Deduct, 100),
        ];

        let result = reconcile(&entries, 500);

        assert_eq!(result.recomputed, 500);
        assert!(result.is_consistent);
    }
}
