//! # courant-core
//!
//! Core abstractions for the Courant newsletter platform.
//!
//! This crate provides the foundational types used across all Courant
//! components:
//!
//! - **Identifiers**: Strongly-typed IDs for campaigns, companies,
//!   subscribers, templates, and send-log rows
//! - **Error Types**: Shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `courant-core` is the **only** crate allowed to define shared primitives.
//! Cross-component interaction happens via the contracts defined here.
//!
//! ## Example
//!
//! ```rust
//! use courant_core::prelude::*;
//!
//! let campaign_id = CampaignId::generate();
//! let company_id = CompanyId::generate();
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use courant_core::prelude::*;
///
/// let id = CampaignId::generate();
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::id::{CampaignId, CompanyId, SendLogId, SubscriberId, TemplateId};
}

pub use error::{Error, Result};
pub use id::{CampaignId, CompanyId, SendLogId, SubscriberId, TemplateId};
