//! Strongly-typed identifiers for Courant entities.
//!
//! All identifiers in Courant are:
//! - **Strongly typed**: Prevents mixing up different ID types at compile time
//! - **Lexicographically sortable**: ULIDs encode creation time and sort naturally
//! - **Globally unique**: No coordination required for generation
//!
//! # Example
//!
//! ```rust
//! use courant_core::id::{CampaignId, CompanyId};
//!
//! let campaign = CampaignId::generate();
//! let company = CompanyId::generate();
//!
//! // IDs are different types - this won't compile:
//! // let wrong: CampaignId = company;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

use crate::error::{Error, Result};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Generates a new unique identifier.
            ///
            /// Uses ULID generation which is:
            /// - Lexicographically sortable by creation time
            /// - Globally unique without coordination
            /// - URL-safe and case-insensitive
            #[must_use]
            pub fn generate() -> Self {
                Self(Ulid::new())
            }

            /// Creates an identifier from a raw ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }

            /// Returns the creation timestamp encoded in the ID.
            #[must_use]
            pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
                let ms = self.0.timestamp_ms();
                chrono::DateTime::from_timestamp_millis(
                    i64::try_from(ms).unwrap_or_default(),
                )
                .unwrap_or_else(chrono::Utc::now)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Ulid::from_string(s)
                    .map(Self)
                    .map_err(|e| Error::InvalidId {
                        message: format!(concat!("invalid ", $label, " ID '{}': {}"), s, e),
                    })
            }
        }
    };
}

entity_id!(
    /// A unique identifier for a campaign.
    ///
    /// A campaign is a scheduled send instruction tied to a template and a
    /// recipient set - not itself an email.
    CampaignId,
    "campaign"
);

entity_id!(
    /// A unique identifier for a company (the owning tenant of campaigns,
    /// templates, and subscribers).
    CompanyId,
    "company"
);

entity_id!(
    /// A unique identifier for a subscriber.
    SubscriberId,
    "subscriber"
);

entity_id!(
    /// A unique identifier for a newsletter template.
    TemplateId,
    "template"
);

entity_id!(
    /// A unique identifier for a campaign send-log row.
    SendLogId,
    "send log"
);
