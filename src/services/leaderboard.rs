// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard aggregation.
//!
//! [`build_leaderboard`] and [`build_streak_leaderboard`] are pure: they work
//! on rows already fetched from the store and keep no state, so the same
//! input always yields the same ranking. Ties are broken by name, then user
//! id; rank is the 1-based position after sorting.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::Store;
use crate::error::Result;
use crate::models::{Activity, DateWindow, LeaderboardEntry, LeaderboardMember, Streak, StreakEntry};
use crate::time_utils::{month_to_date, week_to_date};

/// Knobs for [`build_leaderboard`].
#[derive(Debug, Clone, Default)]
pub struct LeaderboardOptions {
    /// Count only activities of this type
    pub activity_type_id: Option<Uuid>,
    /// List members without qualifying activities with 0 points
    pub include_zero_scorers: bool,
    /// Keep only the first `limit` rows
    pub limit: Option<usize>,
}

/// Rank members by summed points of their activities inside `window`.
///
/// Activities of users not in `members` are ignored.
pub fn build_leaderboard(
    members: &[LeaderboardMember],
    activities: &[Activity],
    window: DateWindow,
    options: &LeaderboardOptions,
) -> Vec<LeaderboardEntry> {
    let known: HashSet<Uuid> = members.iter().map(|m| m.user_id).collect();

    let mut totals: HashMap<Uuid, f64> = HashMap::new();
    for activity in activities {
        if !window.contains(activity.activity_date) || !known.contains(&activity.user_id) {
            continue;
        }
        if let Some(type_id) = options.activity_type_id {
            if activity.activity_type_id != type_id {
                continue;
            }
        }
        *totals.entry(activity.user_id).or_insert(0.0) += activity.points;
    }

    let mut seen = HashSet::new();
    let mut rows: Vec<LeaderboardEntry> = members
        .iter()
        .filter(|m| seen.insert(m.user_id))
        .filter_map(|m| {
            let points = match totals.get(&m.user_id) {
                Some(&points) => points,
                None if options.include_zero_scorers => 0.0,
                None => return None,
            };
            Some(LeaderboardEntry {
                user_id: m.user_id,
                name: m.name.clone(),
                points,
                rank: 0,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| tie_break(&a.name, a.user_id, &b.name, b.user_id))
    });
    if let Some(limit) = options.limit {
        rows.truncate(limit);
    }
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }
    rows
}

/// Rank members with an active streak (current streak > 0).
pub fn build_streak_leaderboard(
    members: &[LeaderboardMember],
    streaks: &[Streak],
    limit: Option<usize>,
) -> Vec<StreakEntry> {
    let names: HashMap<Uuid, &str> = members
        .iter()
        .map(|m| (m.user_id, m.name.as_str()))
        .collect();

    let mut rows: Vec<StreakEntry> = streaks
        .iter()
        .filter(|s| s.current_streak > 0)
        .filter_map(|s| {
            names.get(&s.user_id).map(|name| StreakEntry {
                user_id: s.user_id,
                name: name.to_string(),
                streak: s.current_streak,
                rank: 0,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.streak
            .cmp(&a.streak)
            .then_with(|| tie_break(&a.name, a.user_id, &b.name, b.user_id))
    });
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }
    rows
}

fn tie_break(a_name: &str, a_id: Uuid, b_name: &str, b_id: Uuid) -> Ordering {
    a_name.cmp(b_name).then_with(|| a_id.cmp(&b_id))
}

/// The three company-wide boards.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyLeaderboards {
    pub weekly: Vec<LeaderboardEntry>,
    pub monthly: Vec<LeaderboardEntry>,
    pub streaks: Vec<StreakEntry>,
}

/// Loads rows for company-wide leaderboards.
#[derive(Clone)]
pub struct LeaderboardService {
    db: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    limit: usize,
}

impl LeaderboardService {
    pub fn new(db: Arc<dyn Store>, clock: Arc<dyn Clock>, limit: usize) -> Self {
        Self { db, clock, limit }
    }

    /// This week's, this month's and the streak leaderboard for a company.
    pub async fn company_leaderboards(
        &self,
        company_id: Uuid,
        include_zero_scorers: bool,
    ) -> Result<CompanyLeaderboards> {
        let today = self.clock.today();
        let week = week_to_date(today);
        let month = month_to_date(today);
        // The week may start in the previous month.
        let start = week.start.min(month.start);

        let (profiles, activities, streaks) = tokio::try_join!(
            self.db.list_profiles_for_company(company_id),
            self.db.list_activities_in_window(company_id, start, today),
            self.db.list_streaks_for_company(company_id),
        )?;

        let members: Vec<LeaderboardMember> = profiles.iter().map(LeaderboardMember::from).collect();
        let options = LeaderboardOptions {
            activity_type_id: None,
            include_zero_scorers,
            limit: Some(self.limit),
        };

        tracing::debug!(
            %company_id,
            members = members.len(),
            activities = activities.len(),
            "Building company leaderboards"
        );

        Ok(CompanyLeaderboards {
            weekly: build_leaderboard(&members, &activities, week, &options),
            monthly: build_leaderboard(&members, &activities, month, &options),
            streaks: build_streak_leaderboard(&members, &streaks, Some(self.limit)),
        })
    }
}
