//! Leaderboard result types. Never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

use crate::models::Profile;

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Returns None if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Candidate user for a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardMember {
    pub user_id: Uuid,
    pub name: String,
}

impl From<&Profile> for LeaderboardMember {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id,
            name: profile.display_name(),
        }
    }
}

/// One ranked row of a points leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub name: String,
    /// Summed raw points
    pub points: f64,
    /// 1-based position
    pub rank: u32,
}

/// One ranked row of the streak leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakEntry {
    pub user_id: Uuid,
    pub name: String,
    pub streak: u32,
    pub rank: u32,
}
