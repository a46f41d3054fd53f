//! Send orchestration: lock, fan out, finalize.
//!
//! The [`SendOrchestrator`] runs once per due campaign. Its run is the only
//! writer allowed to move a campaign from `scheduled` to `sending` and on to
//! `sent`, and the entry CAS (compare-and-swap on the status column) is what
//! makes concurrent triggers safe: when two workers race, exactly one CAS
//! applies and the loser walks away without side effects.
//!
//! A failure after the lock is acquired reverts the campaign to `scheduled`
//! and retries with a fixed backoff, up to the configured attempt cap. Each
//! retry re-acquires the lock, since the revert makes the campaign visible
//! to other workers again. Batches enqueued by a failed pass are not
//! recalled; the envelope's attempt-tagged idempotency key and the send
//! log's per-recipient upsert keep duplicate fan-out convergent.

use chrono::Utc;

use courant_core::CampaignId;

use crate::audience::Subscriber;
use crate::batch;
use crate::campaign::{Campaign, CampaignStatus};
use crate::config::SendConfig;
use crate::dispatch::{BatchEnvelope, EnqueueOptions, TaskQueue, BATCH_PRIORITY};
use crate::error::{Error, Result};
use crate::metrics::SendMetrics;
use crate::store::{CampaignStore, CasStatus, CompanyStore, SubscriberStore};

/// Terminal result of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationOutcome {
    /// Another worker holds or held the campaign; this run did nothing.
    LockNotAcquired,
    /// Fan-out finished and the campaign was finalized as `sent`.
    Completed {
        /// Eligible recipients fanned out.
        recipients: usize,
        /// Batch envelopes enqueued.
        batches: usize,
    },
    /// Every attempt failed; the campaign was left `scheduled`.
    RetriesExhausted {
        /// Attempts made, equal to the configured cap.
        attempts: u32,
        /// The last attempt's error, for the operator.
        last_error: String,
    },
}

/// Orchestrates the send of a single due campaign.
pub struct SendOrchestrator<'a> {
    campaigns: &'a dyn CampaignStore,
    companies: &'a dyn CompanyStore,
    subscribers: &'a dyn SubscriberStore,
    queue: &'a dyn TaskQueue,
    config: SendConfig,
    metrics: SendMetrics,
}

impl<'a> SendOrchestrator<'a> {
    /// Creates an orchestrator over explicit store and queue handles.
    #[must_use]
    pub fn new(
        campaigns: &'a dyn CampaignStore,
        companies: &'a dyn CompanyStore,
        subscribers: &'a dyn SubscriberStore,
        queue: &'a dyn TaskQueue,
        config: SendConfig,
    ) -> Self {
        Self {
            campaigns,
            companies,
            subscribers,
            queue,
            config,
            metrics: SendMetrics::new(),
        }
    }

    /// Runs the orchestration for one campaign.
    ///
    /// Acquires the `scheduled -> sending` lock, fans eligible recipients out
    /// into batch envelopes, and finalizes the campaign as `sent`. A campaign
    /// with zero eligible recipients is finalized immediately with no batches
    /// and no send-log rows.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the lock CAS or the revert path. Fan-out
    /// failures are not errors at this level: they are retried internally and
    /// surface as [`OrchestrationOutcome::RetriesExhausted`].
    #[tracing::instrument(skip(self), fields(%campaign_id))]
    pub async fn run(&self, campaign_id: CampaignId) -> Result<OrchestrationOutcome> {
        if !self.acquire_lock(campaign_id).await? {
            return Ok(OrchestrationOutcome::LockNotAcquired);
        }

        let mut last_error = String::new();
        for attempt in 1..=self.config.max_attempts {
            // Attempts after the first must re-acquire: the revert below made
            // the campaign visible to other workers again.
            if attempt > 1 {
                self.metrics.record_retry();
                tokio::time::sleep(self.config.retry_backoff).await;
                if !self.acquire_lock(campaign_id).await? {
                    return Ok(OrchestrationOutcome::LockNotAcquired);
                }
            }

            match self.fan_out(campaign_id, attempt).await {
                Ok(outcome) => return Ok(outcome),
                Err(error) => {
                    last_error = error.to_string();
                    tracing::warn!(
                        %campaign_id,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        error = %error,
                        "fan-out failed, reverting campaign to scheduled"
                    );
                    self.revert_to_scheduled(campaign_id).await;
                }
            }
        }

        self.metrics.record_campaign_stuck();
        tracing::error!(
            %campaign_id,
            attempts = self.config.max_attempts,
            last_error = %last_error,
            "orchestration retries exhausted, campaign left scheduled"
        );
        Ok(OrchestrationOutcome::RetriesExhausted {
            attempts: self.config.max_attempts,
            last_error,
        })
    }

    /// Attempts the `scheduled -> sending` CAS.
    async fn acquire_lock(&self, campaign_id: CampaignId) -> Result<bool> {
        let cas = self
            .campaigns
            .cas_status(&campaign_id, CampaignStatus::Scheduled, CampaignStatus::Sending)
            .await?;

        match cas {
            CasStatus::Applied => {
                self.metrics.record_lock_attempt("acquired");
                tracing::debug!(%campaign_id, "acquired send lock");
                Ok(true)
            }
            CasStatus::NotFound => {
                self.metrics.record_lock_attempt("lost");
                tracing::warn!(%campaign_id, "campaign missing at lock time, skipping");
                Ok(false)
            }
            CasStatus::StatusMismatch { actual } => {
                self.metrics.record_lock_attempt("lost");
                tracing::info!(
                    %campaign_id,
                    status = %actual,
                    "send lock not acquired, another worker won or campaign moved on"
                );
                Ok(false)
            }
        }
    }

    /// One fan-out pass while holding the lock.
    async fn fan_out(
        &self,
        campaign_id: CampaignId,
        attempt: u32,
    ) -> Result<OrchestrationOutcome> {
        let campaign = self.load_campaign(campaign_id).await?;

        // The company row must still exist; its plan limits were already
        // enforced at schedule time and are not re-checked here.
        self.companies
            .get(&campaign.company_id)
            .await?
            .ok_or_else(|| Error::not_found("company", campaign.company_id))?;

        let recipients: Vec<String> = self
            .subscribers
            .eligible_recipients(&campaign.company_id)
            .await?
            .iter()
            .map(|s: &Subscriber| s.email.clone())
            .collect();

        if recipients.is_empty() {
            self.finalize(campaign_id).await?;
            tracing::info!(%campaign_id, "no eligible recipients, campaign finalized empty");
            return Ok(OrchestrationOutcome::Completed {
                recipients: 0,
                batches: 0,
            });
        }

        let recipient_count = recipients.len();
        let batches = batch::partition(recipients, self.config.batch_size);
        let batch_count = batches.len();

        let work: Vec<(BatchEnvelope, EnqueueOptions)> = batches
            .into_iter()
            .map(|b| {
                (
                    BatchEnvelope::new(
                        campaign.id,
                        campaign.company_id,
                        b.index,
                        batch_count,
                        b.recipients,
                        attempt,
                    ),
                    EnqueueOptions::new().with_priority(BATCH_PRIORITY),
                )
            })
            .collect();

        for result in self.queue.enqueue_batch(work).await? {
            if !result.is_enqueued() && result.message_id().is_none() {
                return Err(Error::dispatch("dispatch queue is full"));
            }
        }

        self.finalize(campaign_id).await?;
        self.metrics.record_batches_enqueued(batch_count as u64);
        self.metrics
            .set_dispatch_queue_depth(self.queue.queue_depth().await?);

        tracing::info!(
            %campaign_id,
            recipients = recipient_count,
            batches = batch_count,
            "campaign fanned out and finalized"
        );
        Ok(OrchestrationOutcome::Completed {
            recipients: recipient_count,
            batches: batch_count,
        })
    }

    async fn load_campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        self.campaigns
            .get(&campaign_id)
            .await?
            .ok_or_else(|| Error::not_found("campaign", campaign_id))
    }

    /// Marks the campaign `sent` and stamps `sent_at`.
    async fn finalize(&self, campaign_id: CampaignId) -> Result<()> {
        self.campaigns
            .set_status(&campaign_id, CampaignStatus::Sent, Some(Utc::now()))
            .await
    }

    /// Releases the lock after a failed pass so a retry (ours or another
    /// worker's) can pick the campaign up again. Best effort: if the row
    /// vanished the retry loop will report that on its next pass.
    async fn revert_to_scheduled(&self, campaign_id: CampaignId) {
        if let Err(error) = self
            .campaigns
            .set_status(&campaign_id, CampaignStatus::Scheduled, None)
            .await
        {
            tracing::warn!(%campaign_id, error = %error, "failed to revert campaign to scheduled");
        }
    }
}
