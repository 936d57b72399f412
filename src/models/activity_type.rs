//! Activity type model: how a logged quantity converts to points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

/// Unit an activity value is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityUnit {
    Steps,
    Km,
    Minutes,
    Sessions,
}

/// Activity type, either owned by a company or a global default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityType {
    pub id: Uuid,
    pub name: String,
    pub unit: ActivityUnit,
    /// Rate; treated as 1.0 when unset
    pub points_per_unit: Option<f64>,
    /// None for global defaults shared by all tenants
    pub company_id: Option<Uuid>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl ActivityType {
    /// Whether members of `company_id` may log this type.
    pub fn is_visible_to(&self, company_id: Uuid) -> bool {
        self.company_id.map_or(true, |owner| owner == company_id)
    }
}
