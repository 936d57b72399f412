// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Competition routes for members.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Competition, CompetitionStatus, CompetitionType, LeaderboardEntry};
use crate::routes::api::display_entries;
use crate::routes::current_profile;
use crate::services::{CompetitionDetail, CompetitionSummary};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/competitions", get(list_competitions))
        .route("/api/competitions/{id}", get(get_competition))
        .route(
            "/api/competitions/{id}/participants",
            post(join_competition).delete(leave_competition),
        )
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompetitionResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub competition_type: CompetitionType,
    pub activity_type_id: Option<Uuid>,
    pub status: CompetitionStatus,
    pub start_date: String,
    pub end_date: String,
    pub created_by: Uuid,
}

impl From<Competition> for CompetitionResponse {
    fn from(c: Competition) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            competition_type: c.competition_type,
            activity_type_id: c.activity_type_id,
            status: c.status,
            start_date: c.start_date.to_string(),
            end_date: c.end_date.to_string(),
            created_by: c.created_by,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompetitionListItem {
    #[serde(flatten)]
    pub competition: CompetitionResponse,
    pub participant_count: usize,
    pub is_participating: bool,
}

impl From<CompetitionSummary> for CompetitionListItem {
    fn from(s: CompetitionSummary) -> Self {
        Self {
            competition: s.competition.into(),
            participant_count: s.participant_count,
            is_participating: s.is_participating,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompetitionDetailResponse {
    pub competition: CompetitionResponse,
    pub is_participating: bool,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl From<CompetitionDetail> for CompetitionDetailResponse {
    fn from(d: CompetitionDetail) -> Self {
        Self {
            competition: d.competition.into(),
            is_participating: d.is_participating,
            leaderboard: display_entries(d.leaderboard),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipationResponse {
    pub competition_id: Uuid,
    pub is_participating: bool,
}

async fn list_competitions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CompetitionListItem>>> {
    let profile = current_profile(&state, &user).await?;
    let summaries = state.competitions.list(&profile).await?;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

async fn get_competition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompetitionDetailResponse>> {
    let profile = current_profile(&state, &user).await?;
    let detail = state.competitions.detail(&profile, id).await?;
    Ok(Json(detail.into()))
}

async fn join_competition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ParticipationResponse>)> {
    let profile = current_profile(&state, &user).await?;
    state.competitions.join(&profile, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ParticipationResponse {
            competition_id: id,
            is_participating: true,
        }),
    ))
}

async fn leave_competition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ParticipationResponse>> {
    let profile = current_profile(&state, &user).await?;
    state.competitions.leave(&profile, id).await?;
    Ok(Json(ParticipationResponse {
        competition_id: id,
        is_participating: false,
    }))
}
