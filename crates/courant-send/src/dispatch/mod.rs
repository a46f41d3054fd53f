//! Task dispatch abstraction for batch fan-out.
//!
//! This module provides:
//!
//! - [`TaskQueue`]: Trait for enqueueing work onto queue backends
//! - [`BatchEnvelope`]: Serializable batch dispatch payload
//! - [`InMemoryTaskQueue`](memory::InMemoryTaskQueue): In-memory queue for
//!   testing
//!
//! Two logical queues exist: [`ORCHESTRATION_QUEUE`] carries "campaign is
//! due" triggers; [`DISPATCH_QUEUE`] carries batch envelopes, tagged with
//! [`BATCH_PRIORITY`] so batches jump ahead of routine work.
//!
//! ## Design Principles
//!
//! - **Backend agnostic**: Same interface for SQS, Cloud Tasks, or local
//!   workers
//! - **At-least-once**: The substrate may redeliver; envelopes carry an
//!   idempotency key so backends that support deduplication can use it
//! - **Structured payloads**: JSON-serializable envelopes

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courant_core::{CampaignId, CompanyId};

use crate::error::Result;

/// Queue carrying "campaign is due" orchestration triggers.
pub const ORCHESTRATION_QUEUE: &str = "campaigns";

/// Queue carrying batch envelopes for the batch dispatcher.
pub const DISPATCH_QUEUE: &str = "email-batches";

/// Elevated priority hint applied to batch envelopes.
pub const BATCH_PRIORITY: i32 = 9;

/// Envelope for one batch of recipients to be dispatched.
///
/// Contains everything the batch dispatcher needs to attempt every
/// recipient in the batch independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEnvelope {
    /// Campaign the batch belongs to.
    pub campaign_id: CampaignId,
    /// Owning company, for routing and audit.
    pub company_id: CompanyId,
    /// Zero-based position of this batch within the fan-out.
    pub batch_index: usize,
    /// Total batch count of the fan-out this envelope belongs to.
    pub batch_count: usize,
    /// Normalized recipient emails, in partition order.
    pub recipients: Vec<String>,
    /// Orchestration attempt that produced this envelope (1-indexed).
    pub attempt: u32,
    /// When the envelope was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl BatchEnvelope {
    /// Creates a new batch envelope.
    #[must_use]
    pub fn new(
        campaign_id: CampaignId,
        company_id: CompanyId,
        batch_index: usize,
        batch_count: usize,
        recipients: Vec<String>,
        attempt: u32,
    ) -> Self {
        Self {
            campaign_id,
            company_id,
            batch_index,
            batch_count,
            recipients,
            attempt,
            enqueued_at: Utc::now(),
        }
    }

    /// Returns the idempotency key for this envelope.
    ///
    /// Uses campaign, batch index, and attempt so a re-run after a partial
    /// fan-out is distinguishable from the first pass.
    #[must_use]
    pub fn idempotency_key(&self) -> String {
        format!("{}-{}-{}", self.campaign_id, self.batch_index, self.attempt)
    }
}

/// Result of enqueuing a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueResult {
    /// Unit was enqueued successfully.
    Enqueued {
        /// Queue-specific message ID.
        message_id: String,
    },
    /// Unit was deduplicated (already enqueued).
    Deduplicated {
        /// The existing message ID.
        existing_message_id: String,
    },
    /// Queue is at capacity.
    QueueFull,
}

impl EnqueueResult {
    /// Returns true if the unit was successfully enqueued.
    #[must_use]
    pub const fn is_enqueued(&self) -> bool {
        matches!(self, Self::Enqueued { .. })
    }

    /// Returns the message ID if one exists.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Enqueued { message_id }
            | Self::Deduplicated {
                existing_message_id: message_id,
            } => Some(message_id),
            Self::QueueFull => None,
        }
    }
}

/// Options for enqueueing.
#[derive(Debug, Clone, Default)]
pub struct EnqueueOptions {
    /// Delay before the unit becomes visible to workers.
    pub delay: Option<Duration>,
    /// Priority hint (higher = sooner, backend-specific).
    pub priority: Option<i32>,
}

impl EnqueueOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay before the unit becomes visible.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sets the priority hint.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Task queue abstraction with at-least-once delivery.
///
/// ## Thread Safety
///
/// All methods are `Send + Sync` to support concurrent access from multiple
/// orchestration runs.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueues one batch envelope.
    ///
    /// # Returns
    ///
    /// - `EnqueueResult::Enqueued` with message ID on success
    /// - `EnqueueResult::Deduplicated` if the envelope was already enqueued
    /// - `EnqueueResult::QueueFull` if the queue is at capacity
    async fn enqueue(
        &self,
        envelope: BatchEnvelope,
        options: EnqueueOptions,
    ) -> Result<EnqueueResult>;

    /// Enqueues multiple envelopes.
    ///
    /// Default implementation calls `enqueue` for each; implementations may
    /// override for batch optimization.
    async fn enqueue_batch(
        &self,
        batches: Vec<(BatchEnvelope, EnqueueOptions)>,
    ) -> Result<Vec<EnqueueResult>> {
        let mut results = Vec::with_capacity(batches.len());
        for (envelope, options) in batches {
            results.push(self.enqueue(envelope, options).await?);
        }
        Ok(results)
    }

    /// Returns the approximate number of units in the queue.
    async fn queue_depth(&self) -> Result<usize>;

    /// Returns the queue's name or identifier.
    fn queue_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_envelope() -> BatchEnvelope {
        BatchEnvelope::new(
            CampaignId::generate(),
            CompanyId::generate(),
            0,
            1,
            vec!["reader@example.com".into()],
            1,
        )
    }

    #[test]
    fn envelope_idempotency_key() {
        let envelope = create_test_envelope();
        let key = envelope.idempotency_key();
        assert!(key.contains(&envelope.campaign_id.to_string()));
        assert!(key.ends_with("-0-1"));
    }

    #[test]
    fn envelope_attempts_produce_distinct_keys() {
        let mut envelope = create_test_envelope();
        let first = envelope.idempotency_key();
        envelope.attempt = 2;
        assert_ne!(first, envelope.idempotency_key());
    }

    #[test]
    fn envelope_serializes() {
        let envelope = create_test_envelope();
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: BatchEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.campaign_id, envelope.campaign_id);
        assert_eq!(parsed.recipients, envelope.recipients);
    }

    #[test]
    fn enqueue_result_accessors() {
        assert!(EnqueueResult::Enqueued {
            message_id: "msg-1".to_string()
        }
        .is_enqueued());
        assert!(!EnqueueResult::QueueFull.is_enqueued());
        assert_eq!(
            EnqueueResult::Deduplicated {
                existing_message_id: "msg-2".to_string()
            }
            .message_id(),
            Some("msg-2")
        );
        assert_eq!(EnqueueResult::QueueFull.message_id(), None);
    }

    #[test]
    fn enqueue_options_builder() {
        let options = EnqueueOptions::new()
            .with_delay(Duration::from_secs(30))
            .with_priority(BATCH_PRIORITY);
        assert_eq!(options.delay, Some(Duration::from_secs(30)));
        assert_eq!(options.priority, Some(9));
    }
}
