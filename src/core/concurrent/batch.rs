//! Batch processing with user-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which processes event
//! batches concurrently while keeping each user's events in order.
//!
//! # Design
//!
//! A batch is partitioned by user id; each partition is processed
//! sequentially by its own tokio task, so events for different users run in
//! parallel while events for the same user keep their input order. A
//! transfer links its sender and recipient: both users' events land in the
//! same partition, so a recipient's account-creating event earlier in the
//! file is guaranteed to run before a transfer addressed to it. Partitions
//! are the connected components of users under the batch's transfer edges.
//!
//! Transaction ids are reserved for every record of the batch in input
//! order before any task runs, so the ids a record occupies depend only on
//! its position in the file and match what the single-threaded engine would
//! assign. A reversal can therefore name its target by file-order id; its
//! `user` column names the target's owner and routes it to the partition
//! where the target was written.
//!
//! Batches complete fully before the next batch begins, which bounds how far
//! a reversal can be reordered relative to the earn it references.

use std::collections::HashMap;
use std::sync::Arc;

use super::SharedRewardsEngine;
use crate::types::{EventKind, EventRecord, RewardError, TransactionId, UserId};

/// Result of processing a single reward event
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    /// The event record that was processed
    pub record: EventRecord,

    /// The result of processing (success or error)
    pub result: Result<(), RewardError>,
}

/// Union-find over user ids, used to merge partitions linked by transfers
#[derive(Debug, Default)]
struct UserGroups {
    parent: HashMap<UserId, UserId>,
}

impl UserGroups {
    fn find(&mut self, user: UserId) -> UserId {
        let parent = *self.parent.entry(user).or_insert(user);
        if parent == user {
            return user;
        }
        let root = self.find(parent);
        self.parent.insert(user, root);
        root
    }

    fn union(&mut self, a: UserId, b: UserId) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parent.insert(root_b, root_a);
        }
    }
}

/// Batch processor with user-based partitioning
///
/// Cloneable; clones share the same underlying engine and can be handed to
/// separate tokio tasks.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    /// Thread-safe rewards engine, shared across tasks
    engine: Arc<SharedRewardsEngine>,
}

impl BatchProcessor {
    /// Create a new BatchProcessor over a shared engine
    pub fn new(engine: Arc<SharedRewardsEngine>) -> Self {
        Self { engine }
    }

    /// Partition a batch of id-reserved events by user ID
    ///
    /// Every event lands in exactly one partition and partitions preserve
    /// the input order of their events. Users joined by a transfer anywhere
    /// in the batch share a partition, so both sides of every transfer see
    /// their events in file order.
    pub fn partition_by_user(
        &self,
        batch: Vec<(EventRecord, TransactionId)>,
    ) -> HashMap<UserId, Vec<(EventRecord, TransactionId)>> {
        let mut groups = UserGroups::default();
        for (record, _id) in &batch {
            if record.kind == EventKind::Transfer {
                if let Some(recipient) = record.counterparty {
                    groups.union(record.user, recipient);
                }
            }
        }

        let mut partitions: HashMap<UserId, Vec<(EventRecord, TransactionId)>> = HashMap::new();
        for (record, id) in batch {
            let key = groups.find(record.user);
            partitions.entry(key).or_default().push((record, id));
        }

        partitions
    }

    /// Process one partition's events sequentially
    ///
    /// Errors are captured per event and never stop the rest of the
    /// partition. Results keep the input order.
    pub async fn process_user_events(
        &self,
        events: Vec<(EventRecord, TransactionId)>,
    ) -> Vec<ProcessingOutcome> {
        let mut outcomes = Vec::with_capacity(events.len());

        for (record, id) in events {
            let result = self.engine.process_reserved(record.clone(), id);
            outcomes.push(ProcessingOutcome { record, result });
        }

        outcomes
    }

    /// Process a batch of events with user-based partitioning
    ///
    /// Reserves transaction ids for the whole batch in input order, then
    /// spawns one tokio task per partition, waits for all of them, and
    /// collects the outcomes. Outcomes across partitions may interleave in
    /// any order; within a partition they keep the input order.
    pub async fn process_batch(&self, batch: Vec<EventRecord>) -> Vec<ProcessingOutcome> {
        let batch: Vec<(EventRecord, TransactionId)> = batch
            .into_iter()
            .map(|record| {
                let id = self.engine.reserve_ids(&record);
                (record, id)
            })
            .collect();
        let partitions = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_user, events) in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_events(events).await
            }));
        }

        let mut outcomes = Vec::new();
        for task in tasks {
            match task.await {
                Ok(partition_outcomes) => outcomes.extend(partition_outcomes),
                Err(e) => {
                    eprintln!("Task panicked: {:?}", e);
                }
            }
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::concurrent::{SharedBalanceBook, SharedLedgerStore};
    use crate::types::EventKind;

    fn processor() -> BatchProcessor {
        BatchProcessor::new(Arc::new(SharedRewardsEngine::new(
            Arc::new(SharedBalanceBook::new()),
            Arc::new(SharedLedgerStore::new()),
        )))
    }

    fn earn(user: UserId, points: u64) -> EventRecord {
        EventRecord {
            kind: EventKind::Earn,
            user,
            counterparty: None,
            points: Some(points),
            amount: None,
            tx: None,
            expiry_days: None,
            reference: None,
            description: "grant".to_string(),
        }
    }

    fn redeem(user: UserId, points: u64) -> EventRecord {
        EventRecord {
            kind: EventKind::Redeem,
            user,
            counterparty: None,
            points: Some(points),
            amount: None,
            tx: None,
            expiry_days: None,
            reference: None,
            description: "spend".to_string(),
        }
    }

    fn transfer(sender: UserId, recipient: UserId, points: u64) -> EventRecord {
        EventRecord {
            kind: EventKind::Transfer,
            user: sender,
            counterparty: Some(recipient),
            points: Some(points),
            amount: None,
            tx: None,
            expiry_days: None,
            reference: None,
            description: "gift".to_string(),
        }
    }

    fn reverse(user: UserId, tx: u64) -> EventRecord {
        EventRecord {
            kind: EventKind::Reverse,
            user,
            counterparty: None,
            points: None,
            amount: None,
            tx: Some(tx),
            expiry_days: None,
            reference: None,
            description: String::new(),
        }
    }

    fn with_ids(batch: Vec<EventRecord>) -> Vec<(EventRecord, TransactionId)> {
        let mut next = 1;
        batch
            .into_iter()
            .map(|record| {
                let id = next;
                next += record.kind.id_span();
                (record, id)
            })
            .collect()
    }

    #[test]
    fn test_partition_by_user_preserves_order() {
        let processor = processor();

        let batch = vec![earn(1, 100), earn(2, 200), redeem(1, 50), earn(1, 25)];
        let partitions = processor.partition_by_user(with_ids(batch));

        assert_eq!(partitions.len(), 2);
        let user1: Vec<u64> = partitions[&1].iter().filter_map(|(r, _)| r.points).collect();
        assert_eq!(user1, vec![100, 50, 25]);
        assert_eq!(partitions[&2].len(), 1);
    }

    #[test]
    fn test_partition_merges_transfer_parties() {
        let processor = processor();

        let batch = vec![
            earn(1, 100),
            earn(2, 200),
            earn(3, 300),
            transfer(1, 2, 50),
        ];
        let partitions = processor.partition_by_user(with_ids(batch));

        // Users 1 and 2 share a partition; user 3 stays on its own
        assert_eq!(partitions.len(), 2);
        let merged = partitions
            .values()
            .find(|events| events.len() == 3)
            .unwrap();
        let users: Vec<UserId> = merged.iter().map(|(r, _)| r.user).collect();
        assert_eq!(users, vec![1, 2, 1]);
    }

    #[test]
    fn test_partition_merges_transfer_chain() {
        let processor = processor();

        // 1→2 and 2→3 chain all three users into one partition
        let batch = vec![
            earn(1, 100),
            earn(2, 100),
            earn(3, 100),
            transfer(1, 2, 10),
            transfer(2, 3, 10),
        ];
        let partitions = processor.partition_by_user(with_ids(batch));

        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions.values().next().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_process_batch_empty() {
        let processor = processor();

        let outcomes = processor.process_batch(vec![]).await;

        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_process_user_events_keeps_order_and_continues_after_error() {
        let processor = processor();

        let outcomes = processor
            .process_user_events(with_ids(vec![earn(1, 100), redeem(1, 500), earn(1, 50)]))
            .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(RewardError::InsufficientBalance { .. })
        ));
        assert!(outcomes[2].result.is_ok());
    }

    #[tokio::test]
    async fn test_process_batch_multiple_users() {
        let engine = Arc::new(SharedRewardsEngine::new(
            Arc::new(SharedBalanceBook::new()),
            Arc::new(SharedLedgerStore::new()),
        ));
        let processor = BatchProcessor::new(Arc::clone(&engine));

        let mut batch = Vec::new();
        for user in 1..=20 {
            batch.push(earn(user, 100));
            batch.push(redeem(user, 40));
        }

        let outcomes = processor.process_batch(batch).await;

        assert_eq!(outcomes.len(), 40);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        for user in 1..=20 {
            assert_eq!(engine.balance(user), 60);
            assert!(engine.reconcile(user).is_consistent);
        }
    }

    #[tokio::test]
    async fn test_process_batch_same_user_order_preserved() {
        let engine = Arc::new(SharedRewardsEngine::new(
            Arc::new(SharedBalanceBook::new()),
            Arc::new(SharedLedgerStore::new()),
        ));
        let processor = BatchProcessor::new(Arc::clone(&engine));

        // The redeem only succeeds if the earn ran first
        let outcomes = processor
            .process_batch(vec![earn(1, 100), redeem(1, 100)])
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(engine.balance(1), 0);
    }

    #[tokio::test]
    async fn test_process_batch_transfer_after_recipient_created() {
        let engine = Arc::new(SharedRewardsEngine::new(
            Arc::new(SharedBalanceBook::new()),
            Arc::new(SharedLedgerStore::new()),
        ));
        let processor = BatchProcessor::new(Arc::clone(&engine));

        // The recipient's account is created by its earn in the same batch;
        // the shared partition guarantees that runs before the transfer
        let outcomes = processor
            .process_batch(vec![earn(1, 500), earn(2, 100), transfer(1, 2, 200)])
            .await;

        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(engine.balance(1), 300);
        assert_eq!(engine.balance(2), 300);
    }

    #[tokio::test]
    async fn test_process_batch_ids_follow_input_position() {
        let engine = Arc::new(SharedRewardsEngine::new(
            Arc::new(SharedBalanceBook::new()),
            Arc::new(SharedLedgerStore::new()),
        ));
        let processor = BatchProcessor::new(Arc::clone(&engine));

        // Partitions run in parallel, but ids come from input position
        let outcomes = processor
            .process_batch(vec![earn(3, 100), earn(1, 100), earn(2, 100)])
            .await;

        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(engine.transactions_for(3)[0].id, 1);
        assert_eq!(engine.transactions_for(1)[0].id, 2);
        assert_eq!(engine.transactions_for(2)[0].id, 3);
    }

    #[tokio::test]
    async fn test_process_batch_reverse_hits_file_order_target() {
        let engine = Arc::new(SharedRewardsEngine::new(
            Arc::new(SharedBalanceBook::new()),
            Arc::new(SharedLedgerStore::new()),
        ));
        let processor = BatchProcessor::new(Arc::clone(&engine));

        // Eight users earn in parallel partitions; the reversal names the
        // first record's transaction and must claw back user 1, never a
        // user whose earn happened to run first
        let mut batch: Vec<EventRecord> = (1..=8).map(|user| earn(user, 100)).collect();
        batch.push(reverse(1, 1));

        let outcomes = processor.process_batch(batch).await;

        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert_eq!(engine.balance(1), 0);
        for user in 2..=8 {
            assert_eq!(engine.balance(user), 100, "user {} was clawed back", user);
        }
        assert!(engine.reconcile(1).is_consistent);
    }
}
