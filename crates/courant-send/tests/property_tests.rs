//! Property-based tests for batch partitioning and envelope keys.

use proptest::prelude::*;

use courant_core::{CampaignId, CompanyId};
use courant_send::batch::partition;
use courant_send::dispatch::BatchEnvelope;

fn recipient_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}@example\\.com", 0..400)
}

proptest! {
    /// Every recipient lands in exactly one batch, in input order.
    #[test]
    fn partition_is_exhaustive_and_order_preserving(
        recipients in recipient_list(),
        batch_size in 1usize..200,
    ) {
        let batches = partition(recipients.clone(), batch_size);
        let flattened: Vec<String> = batches
            .iter()
            .flat_map(|b| b.recipients.iter().cloned())
            .collect();
        prop_assert_eq!(flattened, recipients);
    }

    /// Batch count is ceil(N / batch_size) and only the last batch is short.
    #[test]
    fn partition_count_and_sizes(
        recipients in recipient_list(),
        batch_size in 1usize..200,
    ) {
        let n = recipients.len();
        let batches = partition(recipients, batch_size);

        prop_assert_eq!(batches.len(), n.div_ceil(batch_size));
        if let Some((last, full)) = batches.split_last() {
            prop_assert!(full.iter().all(|b| b.recipients.len() == batch_size));
            prop_assert!(last.recipients.len() <= batch_size);
            prop_assert!(!last.recipients.is_empty());
        }
    }

    /// Indices are sequential from zero.
    #[test]
    fn partition_indices_are_sequential(
        recipients in recipient_list(),
        batch_size in 1usize..200,
    ) {
        let batches = partition(recipients, batch_size);
        for (expected, batch) in batches.iter().enumerate() {
            prop_assert_eq!(batch.index, expected);
        }
    }

    /// Idempotency keys are unique across (batch_index, attempt) pairs.
    #[test]
    fn envelope_keys_are_unique_per_batch_and_attempt(
        batch_count in 1usize..50,
        attempts in 1u32..5,
    ) {
        let campaign_id = CampaignId::generate();
        let company_id = CompanyId::generate();

        let mut keys = std::collections::HashSet::new();
        for attempt in 1..=attempts {
            for index in 0..batch_count {
                let envelope = BatchEnvelope::new(
                    campaign_id,
                    company_id,
                    index,
                    batch_count,
                    Vec::new(),
                    attempt,
                );
                prop_assert!(keys.insert(envelope.idempotency_key()));
            }
        }
    }
}
