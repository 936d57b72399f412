// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Activity, ActivityUnit, LeaderboardEntry, NewActivity, Role, StreakEntry};
use crate::models::activity::SOURCE_MANUAL;
use crate::routes::{current_profile, validated, wire_date, ApiJson};
use crate::services::scoring::round_points;
use crate::services::{company_of, RecordedActivity};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/activity-types", get(get_activity_types))
        .route("/api/activities", get(get_activities).post(create_activity))
        .route("/api/activities/{id}", delete(delete_activity))
        .route("/api/activities/{id}/kudos", post(give_kudos))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/invitations/accept", post(accept_invitation))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub company_name: Option<String>,
}

async fn me_response(state: &AppState, profile: crate::models::Profile) -> Result<MeResponse> {
    let company_name = match profile.company_id {
        Some(id) => state.db.get_company(id).await?.map(|c| c.name),
        None => None,
    };
    Ok(MeResponse {
        id: profile.id,
        full_name: profile.full_name,
        email: profile.email,
        role: profile.role,
        company_id: profile.company_id,
        company_name,
    })
}

/// Get current user profile, creating it on first login.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let profile = current_profile(&state, &user).await?;
    Ok(Json(me_response(&state, profile).await?))
}

// ─── Activity Types ──────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityTypeResponse {
    pub id: Uuid,
    pub name: String,
    pub unit: ActivityUnit,
    pub points_per_unit: Option<f64>,
    pub is_default: bool,
    /// Shared by all companies
    pub is_global: bool,
}

impl From<crate::models::ActivityType> for ActivityTypeResponse {
    fn from(t: crate::models::ActivityType) -> Self {
        Self {
            id: t.id,
            is_global: t.company_id.is_none(),
            name: t.name,
            unit: t.unit,
            points_per_unit: t.points_per_unit,
            is_default: t.is_default,
        }
    }
}

async fn get_activity_types(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ActivityTypeResponse>>> {
    let profile = current_profile(&state, &user).await?;
    let types = state.companies.list_activity_types(&profile).await?;
    Ok(Json(types.into_iter().map(Into::into).collect()))
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivitiesQuery {
    /// Pagination: page number (1-indexed)
    #[serde(default = "default_page")]
    page: u32,
    /// Pagination: items per page
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type_id: Uuid,
    pub activity_type_name: Option<String>,
    pub value: f64,
    /// Rounded to 2 decimals
    pub points: f64,
    pub activity_date: String,
    pub notes: Option<String>,
    pub source: String,
    pub created_at: String,
}

impl ActivityResponse {
    fn new(activity: Activity, type_names: &HashMap<Uuid, String>) -> Self {
        Self {
            activity_type_name: type_names.get(&activity.activity_type_id).cloned(),
            id: activity.id,
            user_id: activity.user_id,
            activity_type_id: activity.activity_type_id,
            value: activity.value,
            points: round_points(activity.points),
            activity_date: activity.activity_date.to_string(),
            notes: activity.notes,
            source: activity.source,
            created_at: format_utc_rfc3339(activity.created_at),
        }
    }
}

/// Names of the activity types visible to a company.
async fn type_names(state: &AppState, company_id: Option<Uuid>) -> Result<HashMap<Uuid, String>> {
    let Some(company_id) = company_id else {
        return Ok(HashMap::new());
    };
    Ok(state
        .db
        .list_activity_types(company_id)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect())
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivitiesResponse {
    pub activities: Vec<ActivityResponse>,
    pub page: u32,
    pub per_page: u32,
}

/// Get user's activities, newest first.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ActivitiesQuery>,
) -> Result<Json<ActivitiesResponse>> {
    tracing::debug!(
        user_id = %user.user_id,
        page = params.page,
        per_page = params.per_page,
        "Fetching activities"
    );

    let profile = current_profile(&state, &user).await?;
    let activities = state
        .activities
        .list_activities(profile.id, params.page, params.per_page)
        .await?;
    let names = type_names(&state, profile.company_id).await?;

    Ok(Json(ActivitiesResponse {
        activities: activities
            .into_iter()
            .map(|a| ActivityResponse::new(a, &names))
            .collect(),
        page: params.page,
        per_page: params
            .per_page
            .clamp(1, crate::services::activity::MAX_PER_PAGE),
    }))
}

#[derive(Deserialize, Validate)]
pub struct CreateActivityRequest {
    pub activity_type_id: Uuid,
    pub value: Option<f64>,
    /// `YYYY-MM-DD`
    pub activity_date: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityChangeResponse {
    pub activity: ActivityResponse,
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl ActivityChangeResponse {
    fn new(recorded: RecordedActivity, type_names: &HashMap<Uuid, String>) -> Self {
        Self {
            activity: ActivityResponse::new(recorded.activity, type_names),
            current_streak: recorded.streak.current_streak,
            longest_streak: recorded.streak.longest_streak,
        }
    }
}

/// Log an activity for the caller.
async fn create_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ActivityChangeResponse>)> {
    let body = validated(body)?;
    let profile = current_profile(&state, &user).await?;
    let company_id = company_of(&profile)?;
    let activity_date = wire_date("activity_date", &body.activity_date)?;

    let recorded = state
        .activities
        .record_activity(NewActivity {
            user_id: profile.id,
            company_id,
            activity_type_id: body.activity_type_id,
            value: body.value,
            activity_date,
            notes: body.notes,
            source: SOURCE_MANUAL.to_string(),
        })
        .await?;

    let names = type_names(&state, Some(company_id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActivityChangeResponse::new(recorded, &names)),
    ))
}

/// Delete an activity (owner, or an admin of the company).
async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActivityChangeResponse>> {
    let profile = current_profile(&state, &user).await?;
    let removed = state.activities.delete_activity(id, &profile).await?;
    let names = type_names(&state, Some(removed.activity.company_id)).await?;
    Ok(Json(ActivityChangeResponse::new(removed, &names)))
}

// ─── Kudos ───────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct KudosResponse {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub to_user_id: Uuid,
    pub created_at: String,
}

async fn give_kudos(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(activity_id): Path<Uuid>,
) -> Result<(StatusCode, Json<KudosResponse>)> {
    let profile = current_profile(&state, &user).await?;
    let kudos = state.kudos.give_kudos(&profile, activity_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(KudosResponse {
            id: kudos.id,
            activity_id: kudos.activity_id,
            to_user_id: kudos.to_user_id,
            created_at: format_utc_rfc3339(kudos.created_at),
        }),
    ))
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DashboardResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub points_this_month: f64,
    pub kudos_received: usize,
    pub active_competitions: usize,
    pub recent_activities: Vec<ActivityResponse>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let profile = current_profile(&state, &user).await?;
    let summary = state.activities.dashboard(profile.id).await?;
    let names = type_names(&state, profile.company_id).await?;

    Ok(Json(DashboardResponse {
        current_streak: summary.current_streak,
        longest_streak: summary.longest_streak,
        points_this_month: round_points(summary.points_this_month),
        kudos_received: summary.kudos_received,
        active_competitions: summary.active_competitions,
        recent_activities: summary
            .recent_activities
            .into_iter()
            .map(|a| ActivityResponse::new(a, &names))
            .collect(),
    }))
}

// ─── Leaderboard ─────────────────────────────────────────────

#[derive(Deserialize)]
struct LeaderboardQuery {
    /// Include members without points in the period
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LeaderboardResponse {
    pub weekly: Vec<LeaderboardEntry>,
    pub monthly: Vec<LeaderboardEntry>,
    pub streaks: Vec<StreakEntry>,
}

/// Round points of ranked rows for display.
pub(crate) fn display_entries(entries: Vec<LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .map(|e| LeaderboardEntry {
            points: round_points(e.points),
            ..e
        })
        .collect()
}

async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>> {
    let profile = current_profile(&state, &user).await?;
    let company_id = company_of(&profile)?;
    let boards = state
        .leaderboards
        .company_leaderboards(company_id, params.include_inactive)
        .await?;

    Ok(Json(LeaderboardResponse {
        weekly: display_entries(boards.weekly),
        monthly: display_entries(boards.monthly),
        streaks: boards.streaks,
    }))
}

// ─── Invitations ─────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct AcceptInvitationRequest {
    #[validate(length(min = 1, max = 128))]
    pub token: String,
}

/// Accept an invitation and join its company.
async fn accept_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<AcceptInvitationRequest>,
) -> Result<Json<MeResponse>> {
    let body = validated(body)?;
    let profile = current_profile(&state, &user).await?;
    let profile = state.invitations.accept(&profile, body.token.trim()).await?;
    Ok(Json(me_response(&state, profile).await?))
}
