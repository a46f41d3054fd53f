//! Batch dispatch: rate-limited per-recipient delivery.
//!
//! The [`BatchDispatcher`] consumes one [`BatchEnvelope`] at a time, pacing
//! delivery attempts through a [`RateLimiter`] and recording every outcome
//! in the send log. Each recipient is an isolated failure domain: a provider
//! rejection is logged as a failed row and the batch keeps going. The
//! dispatcher itself only errors on infrastructure faults (missing campaign,
//! storage failure), which the queue substrate handles by redelivery.
//!
//! Providers plug in behind the [`Mailer`] trait; the doubles at the bottom
//! of this module exist for tests and local runs.

use async_trait::async_trait;

use courant_core::CampaignId;

use crate::dispatch::BatchEnvelope;
use crate::error::{Error, Result};
use crate::metrics::SendMetrics;
use crate::ratelimit::RateLimiter;
use crate::send_log::SendLog;
use crate::store::{CampaignStore, SendLogStore};

/// One message handed to the provider.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Campaign the message belongs to.
    pub campaign_id: CampaignId,
    /// Normalized recipient address.
    pub recipient: String,
    /// Subject line, copied from the campaign.
    pub subject: String,
}

/// Email provider seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Attempts delivery of one message.
    ///
    /// # Errors
    ///
    /// Returns a dispatch error when the provider rejects the message; the
    /// dispatcher records it against the recipient and moves on.
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}

/// Per-batch outcome tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    /// Recipients delivered to the provider.
    pub sent: usize,
    /// Recipients the provider rejected.
    pub failed: usize,
}

impl BatchReport {
    /// Total recipients attempted in the batch.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.sent + self.failed
    }
}

/// Dispatches one batch of recipients through a [`Mailer`].
pub struct BatchDispatcher<'a> {
    campaigns: &'a dyn CampaignStore,
    send_logs: &'a dyn SendLogStore,
    mailer: &'a dyn Mailer,
    limiter: RateLimiter,
    metrics: SendMetrics,
}

impl<'a> BatchDispatcher<'a> {
    /// Creates a dispatcher pacing at `send_rate_per_sec` attempts.
    ///
    /// The rate cap is per dispatcher instance, matching the per-worker
    /// provider budget; concurrent batches each carry their own limiter.
    #[must_use]
    pub fn new(
        campaigns: &'a dyn CampaignStore,
        send_logs: &'a dyn SendLogStore,
        mailer: &'a dyn Mailer,
        send_rate_per_sec: u32,
    ) -> Self {
        Self {
            campaigns,
            send_logs,
            mailer,
            limiter: RateLimiter::new(send_rate_per_sec),
            metrics: SendMetrics::new(),
        }
    }

    /// Attempts every recipient in the envelope and logs each outcome.
    ///
    /// Redelivered envelopes converge: the send log upserts on
    /// (campaign, recipient), so a second pass overwrites the first rather
    /// than double-counting.
    ///
    /// # Errors
    ///
    /// Returns an error when the campaign row is gone or the send log cannot
    /// be written. Provider rejections are not errors at this level.
    #[tracing::instrument(
        skip(self, envelope),
        fields(campaign_id = %envelope.campaign_id, batch_index = envelope.batch_index)
    )]
    pub async fn dispatch(&self, envelope: &BatchEnvelope) -> Result<BatchReport> {
        let campaign = self
            .campaigns
            .get(&envelope.campaign_id)
            .await?
            .ok_or_else(|| Error::not_found("campaign", envelope.campaign_id))?;

        let mut report = BatchReport::default();
        for recipient in &envelope.recipients {
            self.limiter.acquire().await;

            let message = OutboundMessage {
                campaign_id: campaign.id,
                recipient: recipient.clone(),
                subject: campaign.subject.clone(),
            };

            match self.mailer.send(&message).await {
                Ok(()) => {
                    self.send_logs
                        .append(SendLog::sent(campaign.id, recipient))
                        .await?;
                    self.metrics.record_recipient("sent");
                    report.sent += 1;
                }
                Err(error) => {
                    tracing::warn!(recipient = %recipient, error = %error, "provider rejected message");
                    self.send_logs
                        .append(SendLog::failed(campaign.id, recipient, error.to_string()))
                        .await?;
                    self.metrics.record_recipient("failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            batch_index = envelope.batch_index,
            batch_count = envelope.batch_count,
            sent = report.sent,
            failed = report.failed,
            "batch dispatched"
        );
        Ok(report)
    }
}

/// Mailer double that accepts every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMailer;

#[async_trait]
impl Mailer for NoOpMailer {
    async fn send(&self, _message: &OutboundMessage) -> Result<()> {
        Ok(())
    }
}

/// Mailer double that rejects a configured set of recipients.
#[derive(Debug, Clone, Default)]
pub struct FailingMailer {
    rejected: Vec<String>,
}

impl FailingMailer {
    /// Creates a mailer rejecting exactly the given recipients.
    #[must_use]
    pub fn rejecting(recipients: Vec<String>) -> Self {
        Self {
            rejected: recipients,
        }
    }
}

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        if self.rejected.iter().any(|r| r == &message.recipient) {
            return Err(Error::dispatch(format!(
                "550 mailbox unavailable: {}",
                message.recipient
            )));
        }
        Ok(())
    }
}
