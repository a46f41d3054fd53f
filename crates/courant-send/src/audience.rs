//! Read models for the company and subscriber collaborators.
//!
//! This core never mutates companies or subscribers. It reads the owning
//! company's plan limits at schedule time and the eligible recipient set at
//! send time. The cap is deliberately **not** re-checked at send time, so a
//! tier downgrade between scheduling and sending is not re-enforced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courant_core::{CompanyId, SubscriberId};

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionTier {
    /// Free plan, capped subscriber count.
    Free,
    /// Paid plan, uncapped.
    Premium,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "FREE"),
            Self::Premium => write!(f, "PREMIUM"),
        }
    }
}

/// The owning tenant of campaigns, templates, and subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    /// Unique company identifier.
    pub id: CompanyId,
    /// Current subscription tier.
    pub subscription_tier: SubscriptionTier,
    /// True for companies on a paid plan.
    pub is_premium: bool,
    /// Maximum subscribed recipients allowed on the current plan.
    pub max_subscribers: usize,
}

impl Company {
    /// Creates a free-tier company with the default subscriber cap.
    #[must_use]
    pub fn free(id: CompanyId) -> Self {
        Self {
            id,
            subscription_tier: SubscriptionTier::Free,
            is_premium: false,
            max_subscribers: 250,
        }
    }

    /// Creates a premium company.
    #[must_use]
    pub fn premium(id: CompanyId) -> Self {
        Self {
            id,
            subscription_tier: SubscriptionTier::Premium,
            is_premium: true,
            max_subscribers: usize::MAX,
        }
    }

    /// Returns the subscriber cap enforced at schedule time, or `None` for
    /// uncapped plans.
    #[must_use]
    pub const fn subscriber_limit(&self) -> Option<usize> {
        match self.subscription_tier {
            SubscriptionTier::Free => Some(self.max_subscribers),
            SubscriptionTier::Premium => None,
        }
    }
}

/// Subscriber opt-in state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriberStatus {
    /// Opted in; eligible recipient.
    Subscribed,
    /// Opted out; never receives campaign mail.
    Unsubscribed,
}

/// A newsletter recipient belonging to one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    /// Unique subscriber identifier.
    pub id: SubscriberId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Normalized (lowercased, trimmed) email address.
    pub email: String,
    /// Opt-in state.
    pub status: SubscriberStatus,
    /// When the subscriber signed up.
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    /// Creates a subscribed recipient, normalizing the email address.
    #[must_use]
    pub fn subscribed(company_id: CompanyId, email: &str) -> Self {
        Self {
            id: SubscriberId::generate(),
            company_id,
            email: email.trim().to_lowercase(),
            status: SubscriberStatus::Subscribed,
            created_at: Utc::now(),
        }
    }

    /// Creates an unsubscribed row, normalizing the email address.
    #[must_use]
    pub fn unsubscribed(company_id: CompanyId, email: &str) -> Self {
        Self {
            status: SubscriberStatus::Unsubscribed,
            ..Self::subscribed(company_id, email)
        }
    }

    /// Returns true if the subscriber is an eligible recipient.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.status == SubscriberStatus::Subscribed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_is_capped() {
        let company = Company::free(CompanyId::generate());
        assert_eq!(company.subscriber_limit(), Some(250));
    }

    #[test]
    fn premium_tier_is_uncapped() {
        let company = Company::premium(CompanyId::generate());
        assert_eq!(company.subscriber_limit(), None);
    }

    #[test]
    fn subscriber_email_is_normalized() {
        let sub = Subscriber::subscribed(CompanyId::generate(), "  Reader@Example.COM ");
        assert_eq!(sub.email, "reader@example.com");
    }

    #[test]
    fn unsubscribed_is_not_eligible() {
        let sub = Subscriber::unsubscribed(CompanyId::generate(), "reader@example.com");
        assert!(!sub.is_eligible());
    }
}
