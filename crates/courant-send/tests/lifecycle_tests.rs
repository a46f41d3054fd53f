//! Campaign lifecycle scenarios across the public API.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};

use courant_core::{CampaignId, CompanyId, TemplateId};
use courant_send::audience::Company;
use courant_send::campaign::CampaignStatus;
use courant_send::error::Result;
use courant_send::lifecycle::{CreateCampaign, LifecycleManager};
use courant_send::store::memory::{
    InMemoryCampaignStore, InMemoryCompanyStore, InMemorySendLogStore, InMemorySubscriberStore,
    InMemoryTemplateStore,
};
use courant_send::template::TemplateSummary;

struct Harness {
    campaigns: InMemoryCampaignStore,
    companies: InMemoryCompanyStore,
    subscribers: InMemorySubscriberStore,
    templates: InMemoryTemplateStore,
    send_logs: InMemorySendLogStore,
    company_id: CompanyId,
    template_id: TemplateId,
}

impl Harness {
    fn new() -> Result<Self> {
        let companies = InMemoryCompanyStore::new();
        let company_id = CompanyId::generate();
        companies.insert(Company::free(company_id))?;

        let templates = InMemoryTemplateStore::new();
        let template = TemplateSummary::new(
            company_id,
            "This week in Courant",
            vec!["issue_number".into(), "editor_note".into()],
        );
        let template_id = template.id;
        templates.insert(template)?;

        Ok(Self {
            campaigns: InMemoryCampaignStore::new(),
            companies,
            subscribers: InMemorySubscriberStore::new(),
            templates,
            send_logs: InMemorySendLogStore::new(),
            company_id,
            template_id,
        })
    }

    fn lifecycle(&self) -> LifecycleManager<'_> {
        LifecycleManager::new(
            &self.campaigns,
            &self.companies,
            &self.subscribers,
            &self.templates,
            &self.send_logs,
        )
    }

    fn request(&self) -> CreateCampaign {
        CreateCampaign {
            company_id: self.company_id,
            template_id: self.template_id,
            name: "Issue 42".into(),
            constants_values: BTreeMap::from([
                ("issue_number".into(), "42".into()),
                ("editor_note".into(), "Back after the summer break.".into()),
            ]),
            scheduled_for: None,
            send_timezone: None,
        }
    }
}

#[tokio::test]
async fn draft_to_scheduled_to_rescheduled_to_cancelled() -> Result<()> {
    let harness = Harness::new()?;
    let lifecycle = harness.lifecycle();

    let campaign = lifecycle.create_campaign(harness.request()).await?;
    assert_eq!(campaign.status, CampaignStatus::Draft);
    assert!(campaign.sent_at.is_none());

    let first_slot = Utc::now() + Duration::hours(2);
    let scheduled = lifecycle
        .schedule(harness.company_id, campaign.id, first_slot, Some("UTC".into()))
        .await?;
    assert_eq!(scheduled.status, CampaignStatus::Scheduled);
    assert_eq!(scheduled.scheduled_for, Some(first_slot));

    let second_slot = Utc::now() + Duration::days(1);
    let rescheduled = lifecycle
        .reschedule(
            harness.company_id,
            campaign.id,
            second_slot,
            Some("America/New_York".into()),
        )
        .await?;
    assert_eq!(rescheduled.scheduled_for, Some(second_slot));
    assert_eq!(
        rescheduled.send_timezone.as_deref(),
        Some("America/New_York")
    );

    let cancelled = lifecycle.cancel(harness.company_id, campaign.id).await?;
    assert_eq!(cancelled.status, CampaignStatus::Cancelled);

    // Terminal: no further transitions.
    let err = lifecycle
        .reschedule(harness.company_id, campaign.id, second_slot, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    Ok(())
}

#[tokio::test]
async fn list_filters_by_status() -> Result<()> {
    let harness = Harness::new()?;
    let lifecycle = harness.lifecycle();

    let draft = lifecycle.create_campaign(harness.request()).await?;
    let scheduled = lifecycle.create_campaign(harness.request()).await?;
    lifecycle
        .schedule(
            harness.company_id,
            scheduled.id,
            Utc::now() + Duration::hours(1),
            None,
        )
        .await?;

    let drafts = lifecycle
        .list(harness.company_id, Some(CampaignStatus::Draft))
        .await?;
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].id, draft.id);

    let all = lifecycle.list(harness.company_id, None).await?;
    assert_eq!(all.len(), 2);

    let other_company = lifecycle.list(CompanyId::generate(), None).await?;
    assert!(other_company.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_campaign_is_not_found() -> Result<()> {
    let harness = Harness::new()?;
    let err = harness
        .lifecycle()
        .get(harness.company_id, CampaignId::generate())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    Ok(())
}

#[tokio::test]
async fn create_with_future_schedule_stays_draft() -> Result<()> {
    let harness = Harness::new()?;
    let mut request = harness.request();
    request.scheduled_for = Some(Utc::now() + Duration::hours(3));

    let campaign = harness.lifecycle().create_campaign(request).await?;
    // A pre-filled time is advisory until schedule() moves the status.
    assert_eq!(campaign.status, CampaignStatus::Draft);
    assert!(campaign.scheduled_for.is_some());
    Ok(())
}

#[tokio::test]
async fn create_with_past_schedule_is_rejected() -> Result<()> {
    let harness = Harness::new()?;
    let mut request = harness.request();
    request.scheduled_for = Some(Utc::now() - Duration::minutes(5));

    let err = harness
        .lifecycle()
        .create_campaign(request)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    Ok(())
}

#[tokio::test]
async fn delivery_report_for_fresh_campaign_is_empty() -> Result<()> {
    let harness = Harness::new()?;
    let lifecycle = harness.lifecycle();
    let campaign = lifecycle.create_campaign(harness.request()).await?;

    let report = lifecycle
        .delivery_report(harness.company_id, campaign.id)
        .await?;
    assert_eq!(report.sent_count, 0);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.pending_count, 0);
    assert_eq!(report.total_recipients, 0);
    assert_eq!(report.status, CampaignStatus::Draft);
    Ok(())
}
