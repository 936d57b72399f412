//! Competitions and their participants.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use crate::models::DateWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionType {
    Individual,
    Team,
    Department,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

/// A time-boxed point race inside one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub competition_type: CompetitionType,
    /// Only activities of this type count, when set
    pub activity_type_id: Option<Uuid>,
    pub status: CompetitionStatus,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Competition {
    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            CompetitionStatus::Draft | CompetitionStatus::Active
        )
    }
}

/// Join record, unique per (competition_id, user_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionParticipant {
    pub competition_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}
