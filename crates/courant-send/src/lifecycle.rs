//! Validated campaign lifecycle transitions.
//!
//! The [`LifecycleManager`] owns every transition except the orchestrator's
//! lock/finalize pair: create, schedule, reschedule, and cancel, plus the
//! ownership-checked reads. Every operation is guarded by an ownership check
//! (the campaign must belong to the requesting company) and a
//! current-status check; violations surface as typed validation or
//! permission errors, never a silent no-op.
//!
//! Store handles are constructed at startup and passed in by reference -
//! there is no module-level client state.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use courant_core::{CampaignId, CompanyId, TemplateId};

use crate::audience::Company;
use crate::campaign::{Campaign, CampaignStatus};
use crate::error::{Error, Result};
use crate::send_log::DeliveryReport;
use crate::store::{
    CampaignStore, CasStatus, CompanyStore, SendLogStore, SubscriberStore, TemplateStore,
};

/// Request to create a new draft campaign.
#[derive(Debug, Clone)]
pub struct CreateCampaign {
    /// Requesting (owning) company.
    pub company_id: CompanyId,
    /// Template the campaign renders; must belong to the company.
    pub template_id: TemplateId,
    /// Human-readable campaign name.
    pub name: String,
    /// Values for the template's declared constants.
    pub constants_values: BTreeMap<String, String>,
    /// Intended send time; validated as future when provided.
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Display-only timezone.
    pub send_timezone: Option<String>,
}

/// Service owning validated campaign transitions.
pub struct LifecycleManager<'a> {
    campaigns: &'a dyn CampaignStore,
    companies: &'a dyn CompanyStore,
    subscribers: &'a dyn SubscriberStore,
    templates: &'a dyn TemplateStore,
    send_logs: &'a dyn SendLogStore,
}

impl<'a> LifecycleManager<'a> {
    /// Creates a manager over explicit store handles.
    #[must_use]
    pub fn new(
        campaigns: &'a dyn CampaignStore,
        companies: &'a dyn CompanyStore,
        subscribers: &'a dyn SubscriberStore,
        templates: &'a dyn TemplateStore,
        send_logs: &'a dyn SendLogStore,
    ) -> Self {
        Self {
            campaigns,
            companies,
            subscribers,
            templates,
            send_logs,
        }
    }

    /// Creates a new campaign in `draft` status.
    ///
    /// The template must exist and belong to the company; the subject is
    /// copied from it. `constants_values` keys must exactly match the
    /// template's declared constants, with no blank values.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` if the template is missing or foreign-owned;
    /// `Validation` on constants mismatch, blank values, or a past
    /// `scheduled_for`.
    #[tracing::instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create_campaign(&self, request: CreateCampaign) -> Result<Campaign> {
        let template = self
            .templates
            .get(&request.template_id)
            .await?
            .filter(|t| t.company_id == request.company_id)
            .ok_or_else(|| Error::not_found("template", request.template_id))?;

        validate_constants(&template.constants, &request.constants_values)?;

        if let Some(scheduled_for) = request.scheduled_for {
            validate_future(scheduled_for)?;
        }

        let mut campaign = Campaign::new_draft(
            request.company_id,
            Some(template.id),
            request.name,
            template.subject,
            request.constants_values,
        );
        campaign.scheduled_for = request.scheduled_for;
        campaign.send_timezone = request.send_timezone;

        self.campaigns.save(&campaign).await?;
        tracing::info!(campaign_id = %campaign.id, "created campaign");
        Ok(campaign)
    }

    /// Schedules a draft campaign (`draft -> scheduled`).
    ///
    /// First entry into `scheduled` enforces the owning company's subscriber
    /// cap against the current count of subscribed recipients. The cap is
    /// not re-checked at send time.
    ///
    /// # Errors
    ///
    /// `EntityNotFound`, `Permission`, or `Validation` (wrong status, past
    /// time, or plan limit exceeded).
    #[tracing::instrument(skip(self), fields(%campaign_id))]
    pub async fn schedule(
        &self,
        company_id: CompanyId,
        campaign_id: CampaignId,
        scheduled_for: DateTime<Utc>,
        send_timezone: Option<String>,
    ) -> Result<Campaign> {
        let mut campaign = self.owned_campaign(company_id, campaign_id).await?;

        if campaign.status != CampaignStatus::Draft {
            return Err(Error::validation(format!(
                "campaign must be in 'draft' status, but is '{}'",
                campaign.status
            )));
        }

        validate_future(scheduled_for)?;
        self.enforce_subscriber_cap(company_id).await?;

        campaign.transition_to(CampaignStatus::Scheduled)?;
        campaign.scheduled_for = Some(scheduled_for);
        campaign.send_timezone = send_timezone;
        self.campaigns.save(&campaign).await?;

        tracing::info!(%campaign_id, %scheduled_for, "scheduled campaign");
        Ok(campaign)
    }

    /// Reschedules a campaign (`draft|scheduled -> scheduled`).
    ///
    /// The subscriber cap is enforced only when this is the first entry into
    /// `scheduled` (current status `draft`).
    ///
    /// # Errors
    ///
    /// `EntityNotFound`, `Permission`, or `Validation` (already sending or
    /// terminal, or past time).
    #[tracing::instrument(skip(self), fields(%campaign_id))]
    pub async fn reschedule(
        &self,
        company_id: CompanyId,
        campaign_id: CampaignId,
        scheduled_for: DateTime<Utc>,
        send_timezone: Option<String>,
    ) -> Result<Campaign> {
        let mut campaign = self.owned_campaign(company_id, campaign_id).await?;

        if !matches!(
            campaign.status,
            CampaignStatus::Draft | CampaignStatus::Scheduled
        ) {
            return Err(Error::validation(format!(
                "can only reschedule campaigns in 'draft' or 'scheduled' status, \
                 but this campaign is '{}'",
                campaign.status
            )));
        }

        validate_future(scheduled_for)?;
        if campaign.status == CampaignStatus::Draft {
            self.enforce_subscriber_cap(company_id).await?;
        }

        campaign.transition_to(CampaignStatus::Scheduled)?;
        campaign.scheduled_for = Some(scheduled_for);
        campaign.send_timezone = send_timezone;
        self.campaigns.save(&campaign).await?;

        tracing::info!(%campaign_id, %scheduled_for, "rescheduled campaign");
        Ok(campaign)
    }

    /// Cancels a campaign (`draft|scheduled -> cancelled`).
    ///
    /// The write is a conditional status update, so a cancel racing a lock
    /// acquisition resolves cleanly: once the orchestrator has moved the row
    /// to `sending`, the cancel's CAS misses and the request fails even if
    /// it was issued moments earlier.
    ///
    /// # Errors
    ///
    /// `EntityNotFound`, `Permission`, or `Validation` once the campaign is
    /// sending or terminal.
    #[tracing::instrument(skip(self), fields(%campaign_id))]
    pub async fn cancel(
        &self,
        company_id: CompanyId,
        campaign_id: CampaignId,
    ) -> Result<Campaign> {
        // Ownership check before any write.
        let campaign = self.owned_campaign(company_id, campaign_id).await?;

        for expected in [CampaignStatus::Draft, CampaignStatus::Scheduled] {
            let cas = self
                .campaigns
                .cas_status(&campaign_id, expected, CampaignStatus::Cancelled)
                .await?;
            if cas.is_applied() {
                tracing::info!(%campaign_id, "cancelled campaign");
                return self
                    .campaigns
                    .get(&campaign_id)
                    .await?
                    .ok_or_else(|| Error::not_found("campaign", campaign_id));
            }
            if cas == CasStatus::NotFound {
                return Err(Error::not_found("campaign", campaign_id));
            }
        }

        // Both CAS attempts missed; report the status we re-read last.
        let actual = self
            .campaigns
            .get(&campaign_id)
            .await?
            .map_or(campaign.status, |c| c.status);
        Err(Error::validation(format!(
            "can only cancel campaigns in 'draft' or 'scheduled' status, \
             but this campaign is '{actual}'"
        )))
    }

    /// Gets a campaign, enforcing ownership.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` or `Permission`.
    pub async fn get(
        &self,
        company_id: CompanyId,
        campaign_id: CampaignId,
    ) -> Result<Campaign> {
        self.owned_campaign(company_id, campaign_id).await
    }

    /// Lists a company's campaigns, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the underlying store.
    pub async fn list(
        &self,
        company_id: CompanyId,
        status: Option<CampaignStatus>,
    ) -> Result<Vec<Campaign>> {
        self.campaigns.list_by_company(&company_id, status).await
    }

    /// Builds the live delivery snapshot for a campaign (§send-log counts).
    ///
    /// Counts keep moving while batches are in flight; a `SENT` status means
    /// dispatch-complete, not delivery-complete.
    ///
    /// # Errors
    ///
    /// `EntityNotFound` or `Permission`.
    pub async fn delivery_report(
        &self,
        company_id: CompanyId,
        campaign_id: CampaignId,
    ) -> Result<DeliveryReport> {
        let campaign = self.owned_campaign(company_id, campaign_id).await?;
        let counts = self.send_logs.counts(&campaign_id).await?;

        Ok(DeliveryReport {
            campaign_id,
            status: campaign.status,
            sent_count: counts.sent,
            failed_count: counts.failed,
            pending_count: counts.pending,
            total_recipients: counts.total_attempted(),
            scheduled_for: campaign.scheduled_for,
            sent_at: campaign.sent_at,
        })
    }

    async fn owned_campaign(
        &self,
        company_id: CompanyId,
        campaign_id: CampaignId,
    ) -> Result<Campaign> {
        let campaign = self
            .campaigns
            .get(&campaign_id)
            .await?
            .ok_or_else(|| Error::not_found("campaign", campaign_id))?;

        if campaign.company_id != company_id {
            return Err(Error::permission(
                "campaign doesn't belong to your company",
            ));
        }
        Ok(campaign)
    }

    async fn enforce_subscriber_cap(&self, company_id: CompanyId) -> Result<()> {
        let company: Company = self
            .companies
            .get(&company_id)
            .await?
            .ok_or_else(|| Error::not_found("company", company_id))?;

        if let Some(limit) = company.subscriber_limit() {
            let count = self.subscribers.count_subscribed(&company_id).await?;
            if count > limit {
                return Err(Error::validation(format!(
                    "{} plan limited to {limit} subscribers; your company has {count}. \
                     Upgrade your plan to send to more subscribers.",
                    company.subscription_tier
                )));
            }
        }
        Ok(())
    }
}

fn validate_future(scheduled_for: DateTime<Utc>) -> Result<()> {
    if scheduled_for <= Utc::now() {
        return Err(Error::validation("scheduled_for must be in the future (UTC)"));
    }
    Ok(())
}

fn validate_constants(
    declared: &[String],
    values: &BTreeMap<String, String>,
) -> Result<()> {
    let missing: Vec<&str> = declared
        .iter()
        .filter(|name| !values.contains_key(*name))
        .map(String::as_str)
        .collect();
    let extra: Vec<&str> = values
        .keys()
        .filter(|name| !declared.contains(name))
        .map(String::as_str)
        .collect();

    if !missing.is_empty() || !extra.is_empty() {
        let mut message = String::from("constants mismatch: ");
        if !missing.is_empty() {
            message.push_str(&format!("missing {missing:?}"));
        }
        if !extra.is_empty() {
            if !missing.is_empty() {
                message.push_str(", ");
            }
            message.push_str(&format!("extra {extra:?}"));
        }
        return Err(Error::validation(message));
    }

    let blank: Vec<&str> = values
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k.as_str())
        .collect();
    if !blank.is_empty() {
        return Err(Error::validation(format!(
            "empty values for constants: {blank:?}"
        )));
    }
    Ok(())
}
