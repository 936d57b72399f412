//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Authorization role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SystemAdmin,
    CompanyAdmin,
    User,
}

impl Role {
    /// Roles a company admin may hand out (invitations, role changes).
    pub fn is_assignable_by_company(self) -> bool {
        matches!(self, Role::CompanyAdmin | Role::User)
    }
}

/// User profile stored in the row store.
///
/// The profile id is shared with the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    /// Company membership (None until an invitation is accepted)
    pub company_id: Option<Uuid>,
    pub role: Role,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Name shown on leaderboards.
    pub fn display_name(&self) -> String {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNKNOWN_NAME)
            .to_string()
    }
}

/// Placeholder for profiles without a name.
pub const UNKNOWN_NAME: &str = "Unknown";
