//! Pluggable storage seams for the send-orchestration core.
//!
//! Each collaborator from the system boundary gets its own trait:
//!
//! - [`CampaignStore`]: campaign rows plus the conditional-update lock
//!   primitive
//! - [`CompanyStore`]: plan tier and subscriber cap, read-only
//! - [`SubscriberStore`]: eligible recipients, read-only
//! - [`TemplateStore`]: template summaries, read at creation time
//! - [`SendLogStore`]: the per-recipient delivery ledger
//!
//! ## Design Principles
//!
//! - **CAS semantics**: The `scheduled -> sending` lock is a single atomic
//!   conditional update on one row; no external lock service
//! - **Explicit handles**: Stores are constructed at startup and passed by
//!   reference into the lifecycle manager and orchestrator, never held in
//!   module-level globals
//! - **Testability**: In-memory implementations for tests, SQL for production

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courant_core::{CampaignId, CompanyId, TemplateId};

use crate::audience::{Company, Subscriber};
use crate::campaign::{Campaign, CampaignStatus};
use crate::error::Result;
use crate::send_log::{OutcomeCounts, SendLog};
use crate::template::TemplateSummary;

/// Result of a conditional status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasStatus {
    /// The conditional update matched and was applied (`rowcount == 1`).
    Applied,
    /// No row exists for the campaign.
    NotFound,
    /// The row exists but its status didn't match the expected value
    /// (`rowcount == 0`); another actor got there first.
    StatusMismatch {
        /// The status that was actually found.
        actual: CampaignStatus,
    },
}

impl CasStatus {
    /// Returns true if the update was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Storage abstraction for campaign rows.
///
/// ## CAS Semantics
///
/// `cas_status` is the core primitive for distributed correctness: two
/// orchestration runs racing on the same campaign resolve through it -
/// exactly one observes `Applied` and proceeds, the other observes
/// `StatusMismatch` and no-ops. Cancellation takes the same path, so a
/// cancel racing a lock acquisition loses cleanly once the campaign is
/// `sending`.
///
/// ## Thread Safety
///
/// All methods are `Send + Sync` to support concurrent access from multiple
/// worker processes.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Gets a campaign by ID. Returns `None` if it does not exist.
    async fn get(&self, id: &CampaignId) -> Result<Option<Campaign>>;

    /// Saves a campaign (insert or full-row update).
    ///
    /// Used by the normal read-modify-write lifecycle transitions, which are
    /// guarded by ownership and current-status checks before the write.
    async fn save(&self, campaign: &Campaign) -> Result<()>;

    /// Atomically updates the status if the current status matches expected.
    ///
    /// This is the lock primitive: `cas_status(id, Scheduled, Sending)`
    /// grants exactly one caller the right to orchestrate the campaign.
    async fn cas_status(
        &self,
        id: &CampaignId,
        expected: CampaignStatus,
        target: CampaignStatus,
    ) -> Result<CasStatus>;

    /// Unconditionally updates status and `sent_at`.
    ///
    /// Used only by the orchestrator's finalize (`Sent` + timestamp) and
    /// failure revert (`Scheduled`, clearing nothing).
    async fn set_status(
        &self,
        id: &CampaignId,
        status: CampaignStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Lists a company's campaigns, newest first, optionally filtered by
    /// status.
    async fn list_by_company(
        &self,
        company_id: &CompanyId,
        status: Option<CampaignStatus>,
    ) -> Result<Vec<Campaign>>;
}

/// Read-only access to the company collaborator.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Gets a company by ID. Returns `None` if it does not exist.
    async fn get(&self, id: &CompanyId) -> Result<Option<Company>>;
}

/// Read-only access to the subscriber collaborator.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Returns all `subscribed` recipients for a company, in signup order.
    async fn eligible_recipients(&self, company_id: &CompanyId) -> Result<Vec<Subscriber>>;

    /// Counts `subscribed` recipients for a company.
    ///
    /// Consulted by the plan-limit check at schedule/reschedule time.
    async fn count_subscribed(&self, company_id: &CompanyId) -> Result<usize>;
}

/// Read-only access to the template collaborator.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Gets a template summary by ID. Returns `None` if it does not exist.
    async fn get(&self, id: &TemplateId) -> Result<Option<TemplateSummary>>;
}

/// The per-recipient delivery ledger.
#[async_trait]
pub trait SendLogStore: Send + Sync {
    /// Records a delivery attempt, upserting on (campaign_id, recipient).
    ///
    /// The logical key makes dispatcher redelivery idempotent: a retried
    /// batch overwrites the earlier row for the pair instead of producing a
    /// divergent duplicate; last write wins.
    async fn append(&self, log: SendLog) -> Result<()>;

    /// Returns outcome counts for a campaign.
    ///
    /// A live snapshot - totals keep moving while batches are in flight.
    async fn counts(&self, campaign_id: &CampaignId) -> Result<OutcomeCounts>;

    /// Returns all rows for a campaign.
    async fn logs_for_campaign(&self, campaign_id: &CampaignId) -> Result<Vec<SendLog>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cas_status_is_applied() {
        assert!(CasStatus::Applied.is_applied());
        assert!(!CasStatus::NotFound.is_applied());
        assert!(!CasStatus::StatusMismatch {
            actual: CampaignStatus::Sending
        }
        .is_applied());
    }
}
