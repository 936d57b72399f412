//! Per-user consecutive-day activity streaks.
//!
//! The streak row is a running aggregate `(current, longest, last_date)`.
//! Forward-moving additions are applied incrementally; anything that can
//! insert into or remove from the middle of a run (backdated entries,
//! deletions) is handled by recomputing from the distinct activity dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Streak state stored per user (document ID = user_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    pub user_id: Uuid,
    pub company_id: Uuid,
    /// Consecutive active days ending at `last_activity_date`
    #[serde(default)]
    pub current_streak: u32,
    /// Longest run of consecutive active days
    #[serde(default)]
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of applying an activity day to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// First active day ever
    Started,
    /// Day after the last active day
    Extended,
    /// Day already counted
    Unchanged,
    /// Gap of more than one day
    Reset,
    /// Earlier than the last active day; state untouched, caller must recompute
    Backdated,
}

impl Streak {
    pub fn new(user_id: Uuid, company_id: Uuid) -> Self {
        Self {
            user_id,
            company_id,
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: None,
            updated_at: None,
        }
    }

    /// Apply an activity logged on `date`.
    pub fn record_day(&mut self, date: NaiveDate) -> StreakChange {
        let change = match self.last_activity_date {
            None => {
                self.current_streak = 1;
                StreakChange::Started
            }
            Some(last) if date == last => return StreakChange::Unchanged,
            Some(last) if date < last => return StreakChange::Backdated,
            Some(last) if last.succ_opt() == Some(date) => {
                self.current_streak += 1;
                StreakChange::Extended
            }
            Some(_) => {
                self.current_streak = 1;
                StreakChange::Reset
            }
        };

        self.last_activity_date = Some(date);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        change
    }

    /// Rebuild a streak from scratch over a user's activity dates.
    ///
    /// Duplicate dates collapse to one active day. `longest_streak` is the
    /// longest run the given dates can prove, so it may go down after a
    /// deletion.
    pub fn recompute<I>(user_id: Uuid, company_id: Uuid, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let days: BTreeSet<NaiveDate> = dates.into_iter().collect();

        let mut streak = Self::new(user_id, company_id);
        let mut run = 0u32;
        let mut prev: Option<NaiveDate> = None;

        for day in days {
            run = match prev {
                Some(p) if p.succ_opt() == Some(day) => run + 1,
                _ => 1,
            };
            streak.longest_streak = streak.longest_streak.max(run);
            prev = Some(day);
        }

        streak.current_streak = run;
        streak.last_activity_date = prev;
        streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let (u, c) = ids();
        let mut streak = Streak::new(u, c);
        assert_eq!(streak.record_day(day(10)), StreakChange::Started);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_activity_date, Some(day(10)));
    }

    #[test]
    fn test_consecutive_days_count_up() {
        let (u, c) = ids();
        let mut streak = Streak::new(u, c);
        for n in 1..=7 {
            streak.record_day(day(n));
            assert_eq!(streak.current_streak, n);
            assert!(streak.longest_streak >= streak.current_streak);
        }
    }

    #[test]
    fn test_same_day_does_not_double_count() {
        let (u, c) = ids();
        let mut streak = Streak::new(u, c);
        streak.record_day(day(3));
        assert_eq!(streak.record_day(day(3)), StreakChange::Unchanged);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_gap_resets_but_keeps_longest() {
        let (u, c) = ids();
        let mut streak = Streak::new(u, c);
        for n in 1..=4 {
            streak.record_day(day(n));
        }
        assert_eq!(streak.record_day(day(6)), StreakChange::Reset);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 4);
    }

    #[test]
    fn test_backdated_day_leaves_state_untouched() {
        let (u, c) = ids();
        let mut streak = Streak::new(u, c);
        streak.record_day(day(5));
        let before = streak.clone();
        assert_eq!(streak.record_day(day(2)), StreakChange::Backdated);
        assert_eq!(streak, before);
    }

    #[test]
    fn test_month_boundary_is_consecutive() {
        let (u, c) = ids();
        let mut streak = Streak::new(u, c);
        streak.record_day(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(
            streak.record_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            StreakChange::Extended
        );
        assert_eq!(streak.current_streak, 2);
    }

    #[test]
    fn test_recompute_counts_back_from_latest_day() {
        let (u, c) = ids();
        let streak = Streak::recompute(u, c, [day(1), day(2), day(3), day(5)]);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.last_activity_date, Some(day(5)));

        let streak = Streak::recompute(u, c, [day(1), day(2), day(3)]);
        assert_eq!(streak.current_streak, 3);
    }

    #[test]
    fn test_recompute_after_deleting_latest_day() {
        let (u, c) = ids();
        // Days 2 and 3 remain after day 1 and day 5 are gone
        let streak = Streak::recompute(u, c, [day(2), day(3)]);
        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.longest_streak, 2);
    }

    #[test]
    fn test_recompute_collapses_duplicate_days() {
        let (u, c) = ids();
        let streak = Streak::recompute(u, c, [day(9), day(8), day(9), day(8), day(10)]);
        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
    }

    #[test]
    fn test_recompute_empty_history() {
        let (u, c) = ids();
        let streak = Streak::recompute(u, c, []);
        assert_eq!(streak.current_streak, 0);
        assert_eq!(streak.longest_streak, 0);
        assert_eq!(streak.last_activity_date, None);
    }

    #[test]
    fn test_incremental_matches_recompute_for_forward_days() {
        let (u, c) = ids();
        let days = [day(1), day(2), day(2), day(4), day(5), day(6), day(9)];
        let mut incremental = Streak::new(u, c);
        for d in days {
            incremental.record_day(d);
        }
        assert_eq!(incremental, Streak::recompute(u, c, days));
    }
}
