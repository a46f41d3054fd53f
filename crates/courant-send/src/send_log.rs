//! Per-recipient delivery ledger and status aggregation.
//!
//! One logical row exists per (campaign, recipient) pair. Rows are created
//! only by the batch dispatcher when it attempts a recipient - never by the
//! orchestrator. The aggregated counts are a **live snapshot**: while
//! batches are still in flight the totals keep moving, and this core does
//! not track batch completion itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courant_core::{CampaignId, SendLogId};

use crate::campaign::CampaignStatus;

/// Delivery outcome for one recipient attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendOutcome {
    /// Attempt recorded but not yet resolved.
    Pending,
    /// Handed off to the outbound transport.
    Sent,
    /// Transport rejected or errored; detail in the row.
    Failed,
}

impl std::fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Sent => write!(f, "SENT"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// One delivery-outcome row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLog {
    /// Unique row identifier.
    pub id: SendLogId,
    /// Campaign this attempt belongs to.
    pub campaign_id: CampaignId,
    /// Normalized recipient email; (campaign_id, recipient) is the logical key.
    pub recipient: String,
    /// Outcome of the attempt.
    pub outcome: SendOutcome,
    /// Error detail for failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the attempt was recorded.
    pub logged_at: DateTime<Utc>,
}

impl SendLog {
    /// Records a successful hand-off to the transport.
    #[must_use]
    pub fn sent(campaign_id: CampaignId, recipient: impl Into<String>) -> Self {
        Self {
            id: SendLogId::generate(),
            campaign_id,
            recipient: recipient.into(),
            outcome: SendOutcome::Sent,
            error: None,
            logged_at: Utc::now(),
        }
    }

    /// Records a failed attempt with error detail.
    #[must_use]
    pub fn failed(
        campaign_id: CampaignId,
        recipient: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: SendLogId::generate(),
            campaign_id,
            recipient: recipient.into(),
            outcome: SendOutcome::Failed,
            error: Some(error.into()),
            logged_at: Utc::now(),
        }
    }
}

/// Counts of send-log rows by outcome for one campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCounts {
    /// Rows with outcome `SENT`.
    pub sent: usize,
    /// Rows with outcome `FAILED`.
    pub failed: usize,
    /// Rows with outcome `PENDING`.
    pub pending: usize,
}

impl OutcomeCounts {
    /// Total attempted recipients (all outcomes).
    #[must_use]
    pub const fn total_attempted(&self) -> usize {
        self.sent + self.failed + self.pending
    }
}

/// Point-in-time delivery view of a campaign.
///
/// Built by the status aggregator from the campaign row plus the send-log
/// counts. A `SENT` campaign status means dispatch-complete; the counts
/// here are the per-recipient truth and may still be moving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// Campaign identifier.
    pub campaign_id: CampaignId,
    /// Campaign lifecycle status at snapshot time.
    pub status: CampaignStatus,
    /// Recipients handed off to the transport.
    pub sent_count: usize,
    /// Recipients whose attempt failed.
    pub failed_count: usize,
    /// Attempts recorded but not yet resolved.
    pub pending_count: usize,
    /// Total attempted recipients.
    pub total_recipients: usize,
    /// When the campaign is or was due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// When dispatch completed, if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_row_carries_detail() {
        let row = SendLog::failed(CampaignId::generate(), "reader@example.com", "550 no mailbox");
        assert_eq!(row.outcome, SendOutcome::Failed);
        assert_eq!(row.error.as_deref(), Some("550 no mailbox"));
    }

    #[test]
    fn sent_row_has_no_error() {
        let row = SendLog::sent(CampaignId::generate(), "reader@example.com");
        assert_eq!(row.outcome, SendOutcome::Sent);
        assert!(row.error.is_none());
    }

    #[test]
    fn counts_total() {
        let counts = OutcomeCounts {
            sent: 3,
            failed: 1,
            pending: 2,
        };
        assert_eq!(counts.total_attempted(), 6);
    }
}
