//! Read model for the newsletter template collaborator.
//!
//! Template storage and versioning live outside this core. At campaign
//! creation the lifecycle manager only needs the template's owner, its
//! subject line (copied onto the campaign), and its declared constant names
//! (validated against the campaign's substitution values).

use serde::{Deserialize, Serialize};

use courant_core::{CompanyId, TemplateId};

/// The slice of a newsletter template this core reads at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Unique template identifier.
    pub id: TemplateId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Subject line, copied onto campaigns at creation.
    pub subject: String,
    /// Declared constant names the campaign must supply values for.
    pub constants: Vec<String>,
}

impl TemplateSummary {
    /// Creates a template summary.
    #[must_use]
    pub fn new(
        company_id: CompanyId,
        subject: impl Into<String>,
        constants: Vec<String>,
    ) -> Self {
        Self {
            id: TemplateId::generate(),
            company_id,
            subject: subject.into(),
            constants,
        }
    }
}
