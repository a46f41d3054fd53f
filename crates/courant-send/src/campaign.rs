//! Campaign entity and status state machine.
//!
//! A campaign moves through a strict lifecycle:
//!
//! ```text
//! draft ──> scheduled ──> sending ──> sent
//!   │           │  ^          │
//!   │           │  └──────────┘  (failure revert)
//!   v           v
//! cancelled  cancelled
//! ```
//!
//! The `status` column is the single source of truth acting as a mutex: the
//! `scheduled -> sending` edge is only ever taken through the store's
//! conditional update (see [`crate::store::CampaignStore::cas_status`]), so
//! at most one orchestration run proceeds per due campaign.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courant_core::{CampaignId, CompanyId, TemplateId};

use crate::error::{Error, Result};

/// Campaign state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    /// Created, not yet scheduled. `scheduled_for` may be unset.
    Draft,
    /// Waiting for its `scheduled_for` instant to pass.
    Scheduled,
    /// An orchestration run holds the lock and is fanning out batches.
    Sending,
    /// All batches were enqueued (dispatch-complete, not delivery-complete).
    Sent,
    /// Cancelled by the owner before any send started.
    Cancelled,
}

impl CampaignStatus {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Cancelled)
    }

    /// Returns true if the transition from self to target is valid.
    ///
    /// `Scheduled -> Scheduled` is the reschedule edge; `Sending ->
    /// Scheduled` is the orchestrator's failure-recovery revert.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        match self {
            Self::Draft => matches!(target, Self::Scheduled | Self::Cancelled),
            Self::Scheduled => {
                matches!(target, Self::Scheduled | Self::Sending | Self::Cancelled)
            }
            Self::Sending => matches!(target, Self::Sent | Self::Scheduled),
            Self::Sent | Self::Cancelled => false,
        }
    }
}

impl Default for CampaignStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Sending => write!(f, "SENDING"),
            Self::Sent => write!(f, "SENT"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A scheduled send instruction tied to a template and recipient set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Unique campaign identifier.
    pub id: CampaignId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Referenced newsletter template, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,
    /// Human-readable campaign name.
    pub name: String,
    /// Email subject, copied from the template at creation time.
    pub subject: String,
    /// UTC instant the campaign is due. `None` is only legal in draft.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Display-only timezone for the owner's UI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub send_timezone: Option<String>,
    /// Current lifecycle status.
    pub status: CampaignStatus,
    /// Set only when the campaign reaches terminal success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    /// Substitution values for the template's declared constants.
    #[serde(default)]
    pub constants_values: BTreeMap<String, String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Creates a new draft campaign.
    #[must_use]
    pub fn new_draft(
        company_id: CompanyId,
        template_id: Option<TemplateId>,
        name: impl Into<String>,
        subject: impl Into<String>,
        constants_values: BTreeMap<String, String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CampaignId::generate(),
            company_id,
            template_id,
            name: name.into(),
            subject: subject.into(),
            scheduled_for: None,
            send_timezone: None,
            status: CampaignStatus::Draft,
            sent_at: None,
            constants_values,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the campaign is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transitions to a new status.
    ///
    /// Stamps `sent_at` on the `Sending -> Sent` edge and `updated_at` on
    /// every edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition is invalid.
    #[tracing::instrument(skip(self), fields(campaign_id = %self.id, from = %self.status, to = %target))]
    pub fn transition_to(&mut self, target: CampaignStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.status.to_string(),
                to: target.to_string(),
                reason: "invalid campaign status transition".into(),
            });
        }

        let now = Utc::now();
        if target == CampaignStatus::Sent {
            self.sent_at = Some(now);
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Campaign {
        Campaign::new_draft(
            CompanyId::generate(),
            Some(TemplateId::generate()),
            "March digest",
            "The March digest is here",
            BTreeMap::new(),
        )
    }

    #[test]
    fn only_specified_transitions_are_reachable() {
        use CampaignStatus::{Cancelled, Draft, Scheduled, Sending, Sent};

        let all = [Draft, Scheduled, Sending, Sent, Cancelled];
        let allowed = [
            (Draft, Scheduled),
            (Draft, Cancelled),
            (Scheduled, Scheduled),
            (Scheduled, Sending),
            (Scheduled, Cancelled),
            (Sending, Sent),
            (Sending, Scheduled),
        ];

        for from in all {
            for to in all {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn terminal_states() {
        assert!(CampaignStatus::Sent.is_terminal());
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(!CampaignStatus::Draft.is_terminal());
        assert!(!CampaignStatus::Scheduled.is_terminal());
        assert!(!CampaignStatus::Sending.is_terminal());
    }

    #[test]
    fn sent_transition_stamps_sent_at() -> Result<()> {
        let mut campaign = draft();
        campaign.transition_to(CampaignStatus::Scheduled)?;
        campaign.transition_to(CampaignStatus::Sending)?;
        assert!(campaign.sent_at.is_none());
        campaign.transition_to(CampaignStatus::Sent)?;
        assert!(campaign.sent_at.is_some());
        Ok(())
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let mut campaign = draft();
        let err = campaign.transition_to(CampaignStatus::Sent).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition { .. }));
        assert_eq!(campaign.status, CampaignStatus::Draft);
    }

    #[test]
    fn revert_edge_keeps_campaign_reschedulable() -> Result<()> {
        let mut campaign = draft();
        campaign.transition_to(CampaignStatus::Scheduled)?;
        campaign.transition_to(CampaignStatus::Sending)?;
        campaign.transition_to(CampaignStatus::Scheduled)?;
        assert!(campaign.status.can_transition_to(CampaignStatus::Sending));
        Ok(())
    }

    #[test]
    fn status_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&CampaignStatus::Scheduled).unwrap();
        assert_eq!(json, "\"SCHEDULED\"");
    }
}
