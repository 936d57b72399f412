// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod company;
pub mod competition;
pub mod invitation;
pub mod kudos;
pub mod leaderboard;
pub mod scoring;
pub mod streak;

pub use activity::{ActivityService, DashboardSummary, RecordedActivity};
pub use company::{ActivityTypeInput, CompanyInput, CompanyService};
pub use competition::{
    CompetitionDetail, CompetitionInput, CompetitionService, CompetitionSummary,
    CompetitionUpdate,
};
pub use invitation::{InvitationSender, InvitationService, LogInvitationSender};
pub use kudos::KudosService;
pub use leaderboard::{CompanyLeaderboards, LeaderboardOptions, LeaderboardService};
pub use streak::StreakTracker;

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Profile;

/// The caller's company, or `Forbidden` if they have not joined one yet.
pub fn company_of(profile: &Profile) -> Result<Uuid> {
    profile
        .company_id
        .ok_or_else(|| AppError::Forbidden("You are not a member of any company".to_string()))
}
