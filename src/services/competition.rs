// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Competition management, participation and standings.

use chrono::NaiveDate;
use futures_util::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, Authorizer};
use crate::clock::Clock;
use crate::db::{constraints, Store};
use crate::error::{AppError, Result};
use crate::models::{
    Competition, CompetitionParticipant, CompetitionStatus, CompetitionType, DateWindow,
    LeaderboardEntry, LeaderboardMember, Profile,
};
use crate::services::company_of;
use crate::services::leaderboard::{build_leaderboard, LeaderboardOptions};

/// Fields for a new competition.
#[derive(Debug, Clone)]
pub struct CompetitionInput {
    pub name: String,
    pub description: Option<String>,
    pub competition_type: CompetitionType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub activity_type_id: Option<Uuid>,
}

/// Editable fields of an existing competition.
#[derive(Debug, Clone)]
pub struct CompetitionUpdate {
    pub name: String,
    pub description: Option<String>,
    pub status: CompetitionStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CompetitionSummary {
    pub competition: Competition,
    pub participant_count: usize,
    pub is_participating: bool,
}

#[derive(Debug, Clone)]
pub struct CompetitionDetail {
    pub competition: Competition,
    pub is_participating: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Clone)]
pub struct CompetitionService {
    db: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
}

fn validate_window(start: NaiveDate, end: NaiveDate) -> Result<DateWindow> {
    DateWindow::new(start, end).ok_or_else(|| {
        AppError::InvalidDate(format!(
            "End date {} is before start date {}",
            end, start
        ))
    })
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    Ok(name.to_string())
}

impl CompetitionService {
    pub fn new(db: Arc<dyn Store>, clock: Arc<dyn Clock>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            db,
            clock,
            authorizer,
        }
    }

    /// Load a competition, hiding competitions of other companies.
    async fn load(&self, id: Uuid, company_id: Uuid) -> Result<Competition> {
        self.db
            .get_competition(id)
            .await?
            .filter(|c| c.company_id == company_id)
            .ok_or_else(|| AppError::NotFound(format!("Competition {} not found", id)))
    }

    pub async fn create(&self, actor: &Profile, input: CompetitionInput) -> Result<Competition> {
        let company_id = company_of(actor)?;
        self.authorizer
            .authorize(actor, Action::ManageCompetitions { company_id })?;

        let name = clean_name(&input.name)?;
        validate_window(input.start_date, input.end_date)?;

        if let Some(type_id) = input.activity_type_id {
            let visible = self
                .db
                .get_activity_type(type_id)
                .await?
                .is_some_and(|t| t.is_visible_to(company_id));
            if !visible {
                return Err(AppError::InvalidActivityType(format!(
                    "Activity type {} does not exist",
                    type_id
                )));
            }
        }

        let competition = Competition {
            id: Uuid::new_v4(),
            company_id,
            name,
            description: input.description.filter(|d| !d.trim().is_empty()),
            competition_type: input.competition_type,
            activity_type_id: input.activity_type_id,
            status: CompetitionStatus::Active,
            start_date: input.start_date,
            end_date: input.end_date,
            created_by: actor.id,
            created_at: self.clock.now(),
        };
        self.db.upsert_competition(&competition).await?;

        tracing::info!(
            competition_id = %competition.id,
            %company_id,
            created_by = %actor.id,
            "Competition created"
        );
        Ok(competition)
    }

    pub async fn update(
        &self,
        actor: &Profile,
        id: Uuid,
        update: CompetitionUpdate,
    ) -> Result<Competition> {
        let company_id = company_of(actor)?;
        self.authorizer
            .authorize(actor, Action::ManageCompetitions { company_id })?;

        let mut competition = self.load(id, company_id).await?;
        competition.name = clean_name(&update.name)?;
        validate_window(update.start_date, update.end_date)?;
        competition.description = update.description.filter(|d| !d.trim().is_empty());
        competition.status = update.status;
        competition.start_date = update.start_date;
        competition.end_date = update.end_date;

        self.db.upsert_competition(&competition).await?;
        tracing::info!(competition_id = %id, status = ?competition.status, "Competition updated");
        Ok(competition)
    }

    pub async fn delete(&self, actor: &Profile, id: Uuid) -> Result<()> {
        let company_id = company_of(actor)?;
        self.authorizer
            .authorize(actor, Action::ManageCompetitions { company_id })?;

        self.load(id, company_id).await?;
        self.db.delete_competition(id).await?;
        tracing::info!(competition_id = %id, "Competition deleted");
        Ok(())
    }

    /// Competitions of the caller's company, newest start first.
    pub async fn list(&self, profile: &Profile) -> Result<Vec<CompetitionSummary>> {
        let company_id = company_of(profile)?;
        let competitions = self.db.list_competitions(company_id).await?;

        let participants = try_join_all(
            competitions
                .iter()
                .map(|c| self.db.list_participants(c.id)),
        )
        .await?;

        Ok(competitions
            .into_iter()
            .zip(participants)
            .map(|(competition, participants)| CompetitionSummary {
                is_participating: participants.iter().any(|p| p.user_id == profile.id),
                participant_count: participants.len(),
                competition,
            })
            .collect())
    }

    /// Competition with its standings.
    pub async fn detail(&self, profile: &Profile, id: Uuid) -> Result<CompetitionDetail> {
        let company_id = company_of(profile)?;
        let competition = self.load(id, company_id).await?;
        let participants = self.db.list_participants(id).await?;
        let is_participating = participants.iter().any(|p| p.user_id == profile.id);
        let leaderboard = self.standings(&competition, &participants).await?;

        Ok(CompetitionDetail {
            competition,
            is_participating,
            leaderboard,
        })
    }

    /// Join an open competition in the caller's company.
    ///
    /// A second join for the same user fails with `AlreadyJoined`, also when
    /// two joins race: the store's uniqueness constraint decides.
    pub async fn join(&self, profile: &Profile, id: Uuid) -> Result<CompetitionParticipant> {
        let company_id = company_of(profile)?;
        let competition = self.load(id, company_id).await?;
        if !competition.is_open() {
            return Err(AppError::BadRequest(
                "This competition is no longer open".to_string(),
            ));
        }

        let participant = CompetitionParticipant {
            competition_id: id,
            user_id: profile.id,
            joined_at: self.clock.now(),
        };

        match self.db.insert_participant(&participant).await {
            Ok(()) => {
                tracing::info!(competition_id = %id, user_id = %profile.id, "Joined competition");
                Ok(participant)
            }
            Err(e) if e.is_unique_violation(constraints::PARTICIPANT_UNIQUE) => {
                tracing::debug!(competition_id = %id, user_id = %profile.id, "Already joined");
                Err(AppError::AlreadyJoined)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn leave(&self, profile: &Profile, id: Uuid) -> Result<()> {
        let company_id = company_of(profile)?;
        self.load(id, company_id).await?;

        if !self.db.delete_participant(id, profile.id).await? {
            return Err(AppError::NotFound(
                "You are not participating in this competition".to_string(),
            ));
        }
        tracing::info!(competition_id = %id, user_id = %profile.id, "Left competition");
        Ok(())
    }

    /// Participants ranked by points inside the competition window.
    async fn standings(
        &self,
        competition: &Competition,
        participants: &[CompetitionParticipant],
    ) -> Result<Vec<LeaderboardEntry>> {
        let participant_ids: HashSet<Uuid> = participants.iter().map(|p| p.user_id).collect();

        let (profiles, activities) = tokio::try_join!(
            self.db.list_profiles_for_company(competition.company_id),
            self.db.list_activities_in_window(
                competition.company_id,
                competition.start_date,
                competition.end_date
            ),
        )?;

        let members: Vec<LeaderboardMember> = profiles
            .iter()
            .filter(|p| participant_ids.contains(&p.id))
            .map(LeaderboardMember::from)
            .collect();

        Ok(build_leaderboard(
            &members,
            &activities,
            competition.window(),
            &LeaderboardOptions {
                activity_type_id: competition.activity_type_id,
                include_zero_scorers: true,
                limit: None,
            },
        ))
    }
}
