// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity recording service.
//!
//! Handles the core workflow:
//! 1. Validate value and date
//! 2. Resolve the activity type visible to the company
//! 3. Score the activity
//! 4. Store the activity and the owner's updated streak in one atomic unit
//!
//! Deletion reverses this: the activity is removed and the streak is rebuilt
//! from the remaining activity dates.

use futures_util::future::try_join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, Authorizer};
use crate::clock::Clock;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{Activity, CompetitionStatus, NewActivity, Profile, Streak};
use crate::services::scoring;
use crate::services::StreakTracker;
use crate::time_utils::month_to_date;

/// Number of activities shown on the dashboard.
const RECENT_ACTIVITIES: usize = 5;

/// Upper bound for `per_page`.
pub const MAX_PER_PAGE: u32 = 100;

/// Record, delete and list activities.
#[derive(Clone)]
pub struct ActivityService {
    db: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
    streaks: StreakTracker,
}

/// Result of recording or deleting an activity.
#[derive(Debug)]
pub struct RecordedActivity {
    pub activity: Activity,
    pub streak: Streak,
}

/// Data for the personal dashboard.
#[derive(Debug)]
pub struct DashboardSummary {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub points_this_month: f64,
    /// Kudos on the user's activities
    pub kudos_received: usize,
    /// Joined competitions that are currently active
    pub active_competitions: usize,
    pub recent_activities: Vec<Activity>,
}

impl ActivityService {
    pub fn new(db: Arc<dyn Store>, clock: Arc<dyn Clock>, authorizer: Arc<dyn Authorizer>) -> Self {
        let streaks = StreakTracker::new(clock.clone());
        Self {
            db,
            clock,
            authorizer,
            streaks,
        }
    }

    /// Record a new activity and update the owner's streak.
    ///
    /// Nothing is written unless validation passes; the activity and the
    /// streak are then stored together.
    pub async fn record_activity(&self, new: NewActivity) -> Result<RecordedActivity> {
        let value = scoring::validate_value(new.value)?;
        scoring::validate_activity_date(new.activity_date, self.clock.today())?;

        let activity_type = self
            .db
            .get_activity_type(new.activity_type_id)
            .await?
            .filter(|t| t.is_visible_to(new.company_id))
            .ok_or_else(|| {
                AppError::InvalidActivityType(format!(
                    "Activity type {} does not exist",
                    new.activity_type_id
                ))
            })?;

        let points = scoring::score(&activity_type, value)?;

        let activity = Activity {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            company_id: new.company_id,
            activity_type_id: activity_type.id,
            value,
            points,
            activity_date: new.activity_date,
            notes: new
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            source: new.source,
            created_at: self.clock.now(),
        };

        let update = self.streaks.on_add(
            activity.user_id,
            activity.company_id,
            activity.activity_date,
        );
        let streak = self.db.insert_activity_with_streak(&activity, update).await?;

        tracing::info!(
            activity_id = %activity.id,
            user_id = %activity.user_id,
            company_id = %activity.company_id,
            activity_type = %activity_type.name,
            value,
            points,
            current_streak = streak.current_streak,
            "Activity recorded"
        );

        Ok(RecordedActivity { activity, streak })
    }

    /// Delete an activity owned by `requester` (or any activity in the
    /// company, for admins) and rebuild the owner's streak.
    pub async fn delete_activity(
        &self,
        activity_id: Uuid,
        requester: &Profile,
    ) -> Result<RecordedActivity> {
        let activity = self.load_activity(activity_id).await?;

        if activity.user_id != requester.id {
            self.authorizer.authorize(
                requester,
                Action::DeleteAnyActivity {
                    company_id: activity.company_id,
                },
            )?;
        }

        let update = self.streaks.on_delete(activity.user_id, activity.company_id);
        // A concurrent delete may have won between the load and the transaction.
        let (activity, streak) = self
            .db
            .delete_activity_with_streak(activity.id, update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))?;

        tracing::info!(
            %activity_id,
            user_id = %activity.user_id,
            requester = %requester.id,
            current_streak = streak.current_streak,
            longest_streak = streak.longest_streak,
            "Activity deleted"
        );

        Ok(RecordedActivity { activity, streak })
    }

    /// A page of the user's activities, newest first.
    pub async fn list_activities(
        &self,
        user_id: Uuid,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Activity>> {
        if page < 1 {
            return Err(AppError::BadRequest(
                "Page must be greater than 0".to_string(),
            ));
        }
        let limit = per_page.clamp(1, MAX_PER_PAGE);
        let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
            AppError::BadRequest("Page number causes overflow".to_string())
        })?;

        Ok(self
            .db
            .page_activities_for_user(user_id, limit, offset)
            .await?)
    }

    /// Streak, this month's points, kudos, competitions and recent
    /// activities for a user.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardSummary> {
        let (streak, activities, kudos_received, participations) = tokio::try_join!(
            self.db.get_streak(user_id),
            self.db.list_activities_for_user(user_id),
            self.db.count_kudos_received(user_id),
            self.db.list_participations_for_user(user_id),
        )?;

        let competitions = try_join_all(
            participations
                .iter()
                .map(|p| self.db.get_competition(p.competition_id)),
        )
        .await?;
        let active_competitions = competitions
            .into_iter()
            .flatten()
            .filter(|c| c.status == CompetitionStatus::Active)
            .count();

        let month = month_to_date(self.clock.today());
        let points_this_month = activities
            .iter()
            .filter(|a| month.contains(a.activity_date))
            .map(|a| a.points)
            .sum();

        let (current_streak, longest_streak) = streak
            .map(|s| (s.current_streak, s.longest_streak))
            .unwrap_or((0, 0));

        Ok(DashboardSummary {
            current_streak,
            longest_streak,
            points_this_month,
            kudos_received,
            active_competitions,
            recent_activities: activities.into_iter().take(RECENT_ACTIVITIES).collect(),
        })
    }

    async fn load_activity(&self, activity_id: Uuid) -> Result<Activity> {
        self.db
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))
    }
}
