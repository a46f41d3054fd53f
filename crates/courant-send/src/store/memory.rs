//! In-memory store implementations for testing.
//!
//! ## Limitations
//!
//! - **NOT suitable for production**: No durability, no cross-process
//!   coordination
//! - **Single-process only**: State is not shared across process boundaries
//!
//! The CAS in [`InMemoryCampaignStore::cas_status`] performs the
//! compare-and-swap under one write lock, which is what makes the
//! concurrent-lock tests meaningful.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courant_core::{CampaignId, CompanyId, TemplateId};

use super::{
    CampaignStore, CasStatus, CompanyStore, SendLogStore, SubscriberStore, TemplateStore,
};
use crate::audience::{Company, Subscriber};
use crate::campaign::{Campaign, CampaignStatus};
use crate::error::{Error, Result};
use crate::send_log::{OutcomeCounts, SendLog, SendOutcome};
use crate::template::TemplateSummary;

/// Converts a lock poison error to a storage error.
fn poison_err<T>(_: PoisonError<T>) -> Error {
    Error::storage("lock poisoned")
}

/// In-memory campaign store for testing.
#[derive(Debug, Default)]
pub struct InMemoryCampaignStore {
    campaigns: RwLock<HashMap<CampaignId, Campaign>>,
}

impl InMemoryCampaignStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of campaigns currently stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn campaign_count(&self) -> Result<usize> {
        let count = {
            let campaigns = self.campaigns.read().map_err(poison_err)?;
            campaigns.len()
        };
        Ok(count)
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn get(&self, id: &CampaignId) -> Result<Option<Campaign>> {
        let result = {
            let campaigns = self.campaigns.read().map_err(poison_err)?;
            campaigns.get(id).cloned()
        };
        Ok(result)
    }

    async fn save(&self, campaign: &Campaign) -> Result<()> {
        {
            let mut campaigns = self.campaigns.write().map_err(poison_err)?;
            campaigns.insert(campaign.id, campaign.clone());
        }
        Ok(())
    }

    async fn cas_status(
        &self,
        id: &CampaignId,
        expected: CampaignStatus,
        target: CampaignStatus,
    ) -> Result<CasStatus> {
        let mut campaigns = self.campaigns.write().map_err(poison_err)?;

        let Some(campaign) = campaigns.get_mut(id) else {
            drop(campaigns);
            return Ok(CasStatus::NotFound);
        };

        if campaign.status != expected {
            let actual = campaign.status;
            drop(campaigns);
            return Ok(CasStatus::StatusMismatch { actual });
        }

        campaign.status = target;
        campaign.updated_at = Utc::now();
        drop(campaigns);
        Ok(CasStatus::Applied)
    }

    async fn set_status(
        &self,
        id: &CampaignId,
        status: CampaignStatus,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut campaigns = self.campaigns.write().map_err(poison_err)?;

        let Some(campaign) = campaigns.get_mut(id) else {
            drop(campaigns);
            return Err(Error::not_found("campaign", id));
        };

        campaign.status = status;
        if sent_at.is_some() {
            campaign.sent_at = sent_at;
        }
        campaign.updated_at = Utc::now();
        drop(campaigns);
        Ok(())
    }

    async fn list_by_company(
        &self,
        company_id: &CompanyId,
        status: Option<CampaignStatus>,
    ) -> Result<Vec<Campaign>> {
        let mut result: Vec<Campaign> = {
            let campaigns = self.campaigns.read().map_err(poison_err)?;
            campaigns
                .values()
                .filter(|c| c.company_id == *company_id)
                .filter(|c| status.is_none_or(|s| c.status == s))
                .cloned()
                .collect()
        };
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

/// In-memory company store for testing.
#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    companies: RwLock<HashMap<CompanyId, Company>>,
}

impl InMemoryCompanyStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a company row.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn insert(&self, company: Company) -> Result<()> {
        let mut companies = self.companies.write().map_err(poison_err)?;
        companies.insert(company.id, company);
        drop(companies);
        Ok(())
    }

    /// Removes a company row, returning it if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn remove(&self, id: &CompanyId) -> Result<Option<Company>> {
        let mut companies = self.companies.write().map_err(poison_err)?;
        let removed = companies.remove(id);
        drop(companies);
        Ok(removed)
    }
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn get(&self, id: &CompanyId) -> Result<Option<Company>> {
        let result = {
            let companies = self.companies.read().map_err(poison_err)?;
            companies.get(id).cloned()
        };
        Ok(result)
    }
}

/// In-memory subscriber store for testing.
#[derive(Debug, Default)]
pub struct InMemorySubscriberStore {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl InMemorySubscriberStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber row.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn add(&self, subscriber: Subscriber) -> Result<()> {
        let mut subscribers = self.subscribers.write().map_err(poison_err)?;
        subscribers.push(subscriber);
        drop(subscribers);
        Ok(())
    }

    /// Adds `count` subscribed recipients with generated addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn add_subscribed(&self, company_id: CompanyId, count: usize) -> Result<()> {
        let mut subscribers = self.subscribers.write().map_err(poison_err)?;
        for i in 0..count {
            subscribers.push(Subscriber::subscribed(
                company_id,
                &format!("reader-{i}@example.com"),
            ));
        }
        drop(subscribers);
        Ok(())
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn eligible_recipients(&self, company_id: &CompanyId) -> Result<Vec<Subscriber>> {
        let result = {
            let subscribers = self.subscribers.read().map_err(poison_err)?;
            subscribers
                .iter()
                .filter(|s| s.company_id == *company_id && s.is_eligible())
                .cloned()
                .collect()
        };
        Ok(result)
    }

    async fn count_subscribed(&self, company_id: &CompanyId) -> Result<usize> {
        let count = {
            let subscribers = self.subscribers.read().map_err(poison_err)?;
            subscribers
                .iter()
                .filter(|s| s.company_id == *company_id && s.is_eligible())
                .count()
        };
        Ok(count)
    }
}

/// In-memory template store for testing.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<HashMap<TemplateId, TemplateSummary>>,
}

impl InMemoryTemplateStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a template summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn insert(&self, template: TemplateSummary) -> Result<()> {
        let mut templates = self.templates.write().map_err(poison_err)?;
        templates.insert(template.id, template);
        drop(templates);
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn get(&self, id: &TemplateId) -> Result<Option<TemplateSummary>> {
        let result = {
            let templates = self.templates.read().map_err(poison_err)?;
            templates.get(id).cloned()
        };
        Ok(result)
    }
}

/// In-memory send-log store for testing.
///
/// Rows are keyed on (campaign_id, recipient), giving the upsert semantics
/// the trait requires.
#[derive(Debug, Default)]
pub struct InMemorySendLogStore {
    logs: RwLock<HashMap<(CampaignId, String), SendLog>>,
}

impl InMemorySendLogStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of logical rows stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn row_count(&self) -> Result<usize> {
        let count = {
            let logs = self.logs.read().map_err(poison_err)?;
            logs.len()
        };
        Ok(count)
    }
}

#[async_trait]
impl SendLogStore for InMemorySendLogStore {
    async fn append(&self, log: SendLog) -> Result<()> {
        {
            let mut logs = self.logs.write().map_err(poison_err)?;
            logs.insert((log.campaign_id, log.recipient.clone()), log);
        }
        Ok(())
    }

    async fn counts(&self, campaign_id: &CampaignId) -> Result<OutcomeCounts> {
        let counts = {
            let logs = self.logs.read().map_err(poison_err)?;
            let mut counts = OutcomeCounts::default();
            for log in logs.values().filter(|l| l.campaign_id == *campaign_id) {
                match log.outcome {
                    SendOutcome::Sent => counts.sent += 1,
                    SendOutcome::Failed => counts.failed += 1,
                    SendOutcome::Pending => counts.pending += 1,
                }
            }
            counts
        };
        Ok(counts)
    }

    async fn logs_for_campaign(&self, campaign_id: &CampaignId) -> Result<Vec<SendLog>> {
        let mut result: Vec<SendLog> = {
            let logs = self.logs.read().map_err(poison_err)?;
            logs.values()
                .filter(|l| l.campaign_id == *campaign_id)
                .cloned()
                .collect()
        };
        result.sort_by(|a, b| a.recipient.cmp(&b.recipient));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scheduled_campaign() -> Campaign {
        let mut campaign = Campaign::new_draft(
            CompanyId::generate(),
            None,
            "Weekly digest",
            "This week in Courant",
            BTreeMap::new(),
        );
        campaign.scheduled_for = Some(Utc::now() + chrono::Duration::hours(1));
        campaign.status = CampaignStatus::Scheduled;
        campaign
    }

    #[tokio::test]
    async fn cas_applies_once() -> Result<()> {
        let store = InMemoryCampaignStore::new();
        let campaign = scheduled_campaign();
        store.save(&campaign).await?;

        let first = store
            .cas_status(&campaign.id, CampaignStatus::Scheduled, CampaignStatus::Sending)
            .await?;
        assert!(first.is_applied());

        let second = store
            .cas_status(&campaign.id, CampaignStatus::Scheduled, CampaignStatus::Sending)
            .await?;
        assert_eq!(
            second,
            CasStatus::StatusMismatch {
                actual: CampaignStatus::Sending
            }
        );

        Ok(())
    }

    #[tokio::test]
    async fn cas_on_missing_row_is_not_found() -> Result<()> {
        let store = InMemoryCampaignStore::new();
        let result = store
            .cas_status(
                &CampaignId::generate(),
                CampaignStatus::Scheduled,
                CampaignStatus::Sending,
            )
            .await?;
        assert_eq!(result, CasStatus::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn set_status_stamps_sent_at() -> Result<()> {
        let store = InMemoryCampaignStore::new();
        let campaign = scheduled_campaign();
        store.save(&campaign).await?;

        let now = Utc::now();
        store
            .set_status(&campaign.id, CampaignStatus::Sent, Some(now))
            .await?;

        let stored = store
            .get(&campaign.id)
            .await?
            .ok_or_else(|| Error::not_found("campaign", campaign.id))?;
        assert_eq!(stored.status, CampaignStatus::Sent);
        assert_eq!(stored.sent_at, Some(now));
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_status_and_company() -> Result<()> {
        let store = InMemoryCampaignStore::new();
        let campaign = scheduled_campaign();
        let company_id = campaign.company_id;
        store.save(&campaign).await?;
        store.save(&scheduled_campaign()).await?;

        let listed = store
            .list_by_company(&company_id, Some(CampaignStatus::Scheduled))
            .await?;
        assert_eq!(listed.len(), 1);

        let drafts = store
            .list_by_company(&company_id, Some(CampaignStatus::Draft))
            .await?;
        assert!(drafts.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn send_log_upserts_on_campaign_and_recipient() -> Result<()> {
        let store = InMemorySendLogStore::new();
        let campaign_id = CampaignId::generate();

        store
            .append(SendLog::failed(campaign_id, "reader@example.com", "451 try later"))
            .await?;
        store
            .append(SendLog::sent(campaign_id, "reader@example.com"))
            .await?;

        assert_eq!(store.row_count()?, 1);
        let counts = store.counts(&campaign_id).await?;
        assert_eq!(counts.sent, 1);
        assert_eq!(counts.failed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn subscriber_store_filters_unsubscribed() -> Result<()> {
        let store = InMemorySubscriberStore::new();
        let company_id = CompanyId::generate();
        store.add(Subscriber::subscribed(company_id, "a@example.com"))?;
        store.add(Subscriber::unsubscribed(company_id, "b@example.com"))?;
        store.add(Subscriber::subscribed(CompanyId::generate(), "c@example.com"))?;

        let eligible = store.eligible_recipients(&company_id).await?;
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].email, "a@example.com");
        assert_eq!(store.count_subscribed(&company_id).await?, 1);
        Ok(())
    }
}
