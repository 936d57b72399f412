// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process row store for local development and tests.
//!
//! Each table is a `DashMap`; uniqueness constraints are enforced through the
//! entry API so concurrent inserts of the same key resolve to exactly one row.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::db::{
    constraints, invitation_doc_id, kudos_doc_id, newest_first, participant_doc_id, Store,
    StoreError, StoreResult, StreakUpdate,
};
use crate::models::{
    Activity, ActivityType, Company, Competition, CompetitionParticipant, Invitation, Kudos,
    Profile, Streak,
};

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    companies: DashMap<Uuid, Company>,
    profiles: DashMap<Uuid, Profile>,
    activity_types: DashMap<Uuid, ActivityType>,
    activities: DashMap<Uuid, Activity>,
    streaks: DashMap<Uuid, Streak>,
    competitions: DashMap<Uuid, Competition>,
    participants: DashMap<String, CompetitionParticipant>,
    kudos: DashMap<String, Kudos>,
    invitations: DashMap<String, Invitation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of kudos rows (test helper).
    pub fn kudos_count(&self) -> usize {
        self.kudos.len()
    }

    fn activity_dates(&self, user_id: Uuid) -> Vec<NaiveDate> {
        self.activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.activity_date)
            .collect()
    }
}

fn insert_unique<T>(table: &DashMap<String, T>, key: String, row: &T, constraint: &str) -> StoreResult<()>
where
    T: Clone,
{
    match table.entry(key) {
        Entry::Occupied(_) => Err(StoreError::unique(constraint)),
        Entry::Vacant(slot) => {
            slot.insert(row.clone());
            Ok(())
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    // ─── Companies ───────────────────────────────────────────────

    async fn get_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.companies.get(&id).map(|c| c.clone()))
    }

    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        let mut companies: Vec<Company> = self.companies.iter().map(|c| c.clone()).collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }

    async fn upsert_company(&self, company: &Company) -> StoreResult<()> {
        self.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn delete_company(&self, id: Uuid) -> StoreResult<()> {
        self.companies.remove(&id);
        Ok(())
    }

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|p| p.clone()))
    }

    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn list_profiles_for_company(&self, company_id: Uuid) -> StoreResult<Vec<Profile>> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| p.company_id == Some(company_id))
            .map(|p| p.clone())
            .collect())
    }

    // ─── Activity Types ──────────────────────────────────────────

    async fn get_activity_type(&self, id: Uuid) -> StoreResult<Option<ActivityType>> {
        Ok(self.activity_types.get(&id).map(|t| t.clone()))
    }

    async fn list_activity_types(&self, company_id: Uuid) -> StoreResult<Vec<ActivityType>> {
        let mut types: Vec<ActivityType> = self
            .activity_types
            .iter()
            .filter(|t| t.is_visible_to(company_id))
            .map(|t| t.clone())
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn upsert_activity_type(&self, activity_type: &ActivityType) -> StoreResult<()> {
        self.activity_types
            .insert(activity_type.id, activity_type.clone());
        Ok(())
    }

    // ─── Activities ──────────────────────────────────────────────

    async fn get_activity(&self, id: Uuid) -> StoreResult<Option<Activity>> {
        Ok(self.activities.get(&id).map(|a| a.clone()))
    }

    async fn list_activities_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .activities
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.clone())
            .collect();
        activities.sort_by(newest_first);
        Ok(activities)
    }

    async fn page_activities_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<Activity>> {
        Ok(self
            .list_activities_for_user(user_id)
            .await?
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_activities_in_window(
        &self,
        company_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Activity>> {
        let mut activities: Vec<Activity> = self
            .activities
            .iter()
            .filter(|a| {
                a.company_id == company_id && start <= a.activity_date && a.activity_date <= end
            })
            .map(|a| a.clone())
            .collect();
        activities.sort_by(newest_first);
        Ok(activities)
    }

    async fn insert_activity_with_streak(
        &self,
        activity: &Activity,
        update: StreakUpdate,
    ) -> StoreResult<Streak> {
        // The streak entry guard serializes writers for this user.
        let slot = self.streaks.entry(activity.user_id);
        let existing = match &slot {
            Entry::Occupied(e) => Some(e.get().clone()),
            Entry::Vacant(_) => None,
        };

        let mut dates = self.activity_dates(activity.user_id);
        dates.push(activity.activity_date);
        let streak = update(existing, dates);

        self.activities.insert(activity.id, activity.clone());
        slot.insert(streak.clone());
        Ok(streak)
    }

    async fn delete_activity_with_streak(
        &self,
        activity_id: Uuid,
        update: StreakUpdate,
    ) -> StoreResult<Option<(Activity, Streak)>> {
        let Some(user_id) = self.activities.get(&activity_id).map(|a| a.user_id) else {
            return Ok(None);
        };

        let slot = self.streaks.entry(user_id);
        // Re-check under the guard: a concurrent delete may have won.
        let Some((_, activity)) = self.activities.remove(&activity_id) else {
            return Ok(None);
        };
        let existing = match &slot {
            Entry::Occupied(e) => Some(e.get().clone()),
            Entry::Vacant(_) => None,
        };

        let streak = update(existing, self.activity_dates(user_id));
        self.kudos.retain(|_, k| k.activity_id != activity_id);
        slot.insert(streak.clone());
        Ok(Some((activity, streak)))
    }

    // ─── Streaks ─────────────────────────────────────────────────

    async fn get_streak(&self, user_id: Uuid) -> StoreResult<Option<Streak>> {
        Ok(self.streaks.get(&user_id).map(|s| s.clone()))
    }

    async fn list_streaks_for_company(&self, company_id: Uuid) -> StoreResult<Vec<Streak>> {
        Ok(self
            .streaks
            .iter()
            .filter(|s| s.company_id == company_id)
            .map(|s| s.clone())
            .collect())
    }

    // ─── Competitions ────────────────────────────────────────────

    async fn get_competition(&self, id: Uuid) -> StoreResult<Option<Competition>> {
        Ok(self.competitions.get(&id).map(|c| c.clone()))
    }

    async fn list_competitions(&self, company_id: Uuid) -> StoreResult<Vec<Competition>> {
        let mut competitions: Vec<Competition> = self
            .competitions
            .iter()
            .filter(|c| c.company_id == company_id)
            .map(|c| c.clone())
            .collect();
        competitions.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(competitions)
    }

    async fn upsert_competition(&self, competition: &Competition) -> StoreResult<()> {
        self.competitions
            .insert(competition.id, competition.clone());
        Ok(())
    }

    async fn delete_competition(&self, id: Uuid) -> StoreResult<()> {
        self.competitions.remove(&id);
        self.participants.retain(|_, p| p.competition_id != id);
        Ok(())
    }

    // ─── Participants ────────────────────────────────────────────

    async fn insert_participant(&self, participant: &CompetitionParticipant) -> StoreResult<()> {
        insert_unique(
            &self.participants,
            participant_doc_id(participant.competition_id, participant.user_id),
            participant,
            constraints::PARTICIPANT_UNIQUE,
        )
    }

    async fn delete_participant(&self, competition_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .participants
            .remove(&participant_doc_id(competition_id, user_id))
            .is_some())
    }

    async fn list_participants(
        &self,
        competition_id: Uuid,
    ) -> StoreResult<Vec<CompetitionParticipant>> {
        let mut participants: Vec<CompetitionParticipant> = self
            .participants
            .iter()
            .filter(|p| p.competition_id == competition_id)
            .map(|p| p.clone())
            .collect();
        participants.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(participants)
    }

    async fn list_participations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<CompetitionParticipant>> {
        Ok(self
            .participants
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.clone())
            .collect())
    }

    // ─── Kudos ───────────────────────────────────────────────────

    async fn insert_kudos(&self, kudos: &Kudos) -> StoreResult<()> {
        insert_unique(
            &self.kudos,
            kudos_doc_id(kudos.from_user_id, kudos.activity_id),
            kudos,
            constraints::KUDOS_UNIQUE,
        )
    }

    async fn count_kudos_received(&self, user_id: Uuid) -> StoreResult<usize> {
        Ok(self.kudos.iter().filter(|k| k.to_user_id == user_id).count())
    }

    // ─── Invitations ─────────────────────────────────────────────

    async fn insert_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        insert_unique(
            &self.invitations,
            invitation_doc_id(invitation.company_id, &invitation.email),
            invitation,
            constraints::INVITATION_UNIQUE,
        )
    }

    async fn get_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(self
            .invitations
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.clone()))
    }

    async fn get_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        Ok(self
            .invitations
            .iter()
            .find(|i| i.token == token)
            .map(|i| i.clone()))
    }

    async fn list_invitations(&self, company_id: Uuid) -> StoreResult<Vec<Invitation>> {
        let mut invitations: Vec<Invitation> = self
            .invitations
            .iter()
            .filter(|i| i.company_id == company_id)
            .map(|i| i.clone())
            .collect();
        invitations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invitations)
    }

    async fn update_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        self.invitations.insert(
            invitation_doc_id(invitation.company_id, &invitation.email),
            invitation.clone(),
        );
        Ok(())
    }

    async fn delete_invitation(&self, id: Uuid) -> StoreResult<()> {
        self.invitations.retain(|_, i| i.id != id);
        Ok(())
    }
}
