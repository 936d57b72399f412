// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod activity_type;
pub mod company;
pub mod competition;
pub mod invitation;
pub mod kudos;
pub mod leaderboard;
pub mod profile;
pub mod streak;

pub use activity::{Activity, NewActivity};
pub use activity_type::{ActivityType, ActivityUnit};
pub use company::Company;
pub use competition::{Competition, CompetitionParticipant, CompetitionStatus, CompetitionType};
pub use invitation::Invitation;
pub use kudos::Kudos;
pub use leaderboard::{DateWindow, LeaderboardEntry, LeaderboardMember, StreakEntry};
pub use profile::{Profile, Role};
pub use streak::{Streak, StreakChange};
