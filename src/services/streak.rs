// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak maintenance on activity add/delete.
//!
//! Streak updates are read-modify-write on one row per user. The tracker only
//! builds the update; the store runs it inside the same atomic unit that
//! writes the activity change, so writers on different instances cannot
//! overwrite each other with a stale streak.

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::StreakUpdate;
use crate::models::{Streak, StreakChange};

#[derive(Clone)]
pub struct StreakTracker {
    clock: Arc<dyn Clock>,
}

impl StreakTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Update for an activity added on `date`.
    ///
    /// Forward days are applied incrementally; a backdated day can bridge a
    /// gap in the middle of history, so it triggers a full recompute.
    pub fn on_add(&self, user_id: Uuid, company_id: Uuid, date: NaiveDate) -> StreakUpdate {
        let clock = self.clock.clone();
        Arc::new(move |existing: Option<Streak>, dates: Vec<NaiveDate>| {
            let mut streak = existing.unwrap_or_else(|| Streak::new(user_id, company_id));

            let change = streak.record_day(date);
            if change == StreakChange::Backdated {
                streak = Streak::recompute(user_id, company_id, dates);
            }

            streak.company_id = company_id;
            streak.updated_at = Some(clock.now());

            tracing::debug!(
                %user_id,
                ?change,
                current = streak.current_streak,
                longest = streak.longest_streak,
                "Streak updated"
            );
            streak
        })
    }

    /// Update after an activity is removed: rebuilt from the remaining dates.
    pub fn on_delete(&self, user_id: Uuid, company_id: Uuid) -> StreakUpdate {
        let clock = self.clock.clone();
        Arc::new(move |_existing: Option<Streak>, dates: Vec<NaiveDate>| {
            let mut streak = Streak::recompute(user_id, company_id, dates);
            streak.updated_at = Some(clock.now());

            tracing::debug!(
                %user_id,
                current = streak.current_streak,
                longest = streak.longest_streak,
                "Streak recomputed"
            );
            streak
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn tracker() -> StreakTracker {
        StreakTracker::new(Arc::new(FixedClock::at_date(day(20))))
    }

    #[test]
    fn test_add_uses_stored_row() {
        let (user, company) = (Uuid::new_v4(), Uuid::new_v4());
        let stored = Streak::recompute(user, company, [day(8), day(9)]);

        let update = tracker().on_add(user, company, day(10));
        let streak = update(Some(stored), vec![day(8), day(9), day(10)]);

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.last_activity_date, Some(day(10)));
        assert!(streak.updated_at.is_some());
    }

    #[test]
    fn test_backdated_add_recomputes_from_dates() {
        let (user, company) = (Uuid::new_v4(), Uuid::new_v4());
        let stored = Streak::recompute(user, company, [day(8), day(10)]);

        let update = tracker().on_add(user, company, day(9));
        let streak = update(Some(stored), vec![day(8), day(10), day(9)]);

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
    }

    #[test]
    fn test_update_is_repeatable() {
        // Retried transactions call the update again with fresh reads.
        let (user, company) = (Uuid::new_v4(), Uuid::new_v4());
        let update = tracker().on_add(user, company, day(11));

        let first = update(Some(Streak::recompute(user, company, [day(9)])), vec![day(9), day(11)]);
        let retried = update(
            Some(Streak::recompute(user, company, [day(9), day(10)])),
            vec![day(9), day(10), day(11)],
        );

        assert_eq!(first.current_streak, 1);
        assert_eq!(retried.current_streak, 3);
    }

    #[test]
    fn test_delete_ignores_stored_row() {
        let (user, company) = (Uuid::new_v4(), Uuid::new_v4());
        let stored = Streak::recompute(user, company, [day(1), day(2), day(3)]);

        let update = tracker().on_delete(user, company);
        let streak = update(Some(stored), vec![day(1), day(3)]);

        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
    }
}
