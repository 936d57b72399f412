// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Administration routes.
//!
//! `/api/admin/*` is for company admins acting on their own company,
//! `/api/system/*` for system admins. Role checks happen in the services.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ActivityUnit, Company, CompetitionStatus, CompetitionType, Invitation, Profile, Role};
use crate::routes::api::ActivityTypeResponse;
use crate::routes::competitions::CompetitionResponse;
use crate::routes::{current_profile, validated, wire_date, ApiJson};
use crate::services::{ActivityTypeInput, CompanyInput, CompetitionInput, CompetitionUpdate};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", put(update_role))
        .route("/api/admin/invitations", post(create_invitation))
        .route("/api/admin/invitations/{id}", delete(delete_invitation))
        .route("/api/admin/activity-types", post(create_activity_type))
        .route("/api/admin/competitions", post(create_competition))
        .route(
            "/api/admin/competitions/{id}",
            put(update_competition).delete(delete_competition),
        )
        .route(
            "/api/system/companies",
            get(list_companies).post(create_company),
        )
        .route(
            "/api/system/companies/{id}",
            put(update_company).delete(delete_company),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuccessResponse {
    pub success: bool,
}

// ─── Members & Invitations ───────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MemberResponse {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: String,
}

impl From<Profile> for MemberResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            role: p.role,
            created_at: format_utc_rfc3339(p.created_at),
        }
    }
}

/// Invitation as shown to admins. The token is never returned.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct InvitationResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub expires_at: String,
    pub accepted_at: Option<String>,
    pub created_at: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(i: Invitation) -> Self {
        Self {
            id: i.id,
            email: i.email,
            role: i.role,
            expires_at: format_utc_rfc3339(i.expires_at),
            accepted_at: i.accepted_at.map(format_utc_rfc3339),
            created_at: format_utc_rfc3339(i.created_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UsersResponse {
    pub members: Vec<MemberResponse>,
    pub invitations: Vec<InvitationResponse>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UsersResponse>> {
    let admin = current_profile(&state, &user).await?;
    let (members, invitations) = tokio::try_join!(
        state.companies.list_members(&admin),
        state.invitations.list(&admin),
    )?;

    Ok(Json(UsersResponse {
        members: members.into_iter().map(Into::into).collect(),
        invitations: invitations.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

async fn update_role(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateRoleRequest>,
) -> Result<Json<MemberResponse>> {
    let admin = current_profile(&state, &user).await?;
    let profile = state
        .companies
        .update_user_role(&admin, id, body.role)
        .await?;
    Ok(Json(profile.into()))
}

#[derive(Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_invite_role")]
    pub role: Role,
}

fn default_invite_role() -> Role {
    Role::User
}

async fn create_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>)> {
    let body = validated(body)?;
    let admin = current_profile(&state, &user).await?;
    let invitation = state
        .invitations
        .invite(&admin, &body.email, body.role)
        .await?;
    Ok((StatusCode::CREATED, Json(invitation.into())))
}

async fn delete_invitation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>> {
    let admin = current_profile(&state, &user).await?;
    state.invitations.delete(&admin, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ─── Activity Types ──────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateActivityTypeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub unit: ActivityUnit,
    pub points_per_unit: Option<f64>,
}

async fn create_activity_type(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateActivityTypeRequest>,
) -> Result<(StatusCode, Json<ActivityTypeResponse>)> {
    let body = validated(body)?;
    let admin = current_profile(&state, &user).await?;
    let activity_type = state
        .companies
        .create_activity_type(
            &admin,
            ActivityTypeInput {
                name: body.name,
                unit: body.unit,
                points_per_unit: body.points_per_unit,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(activity_type.into())))
}

// ─── Competitions ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateCompetitionRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_competition_type")]
    pub competition_type: CompetitionType,
    pub start_date: String,
    pub end_date: String,
    pub activity_type_id: Option<Uuid>,
}

fn default_competition_type() -> CompetitionType {
    CompetitionType::Individual
}

#[derive(Deserialize, Validate)]
pub struct UpdateCompetitionRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: CompetitionStatus,
    pub start_date: String,
    pub end_date: String,
}

async fn create_competition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateCompetitionRequest>,
) -> Result<(StatusCode, Json<CompetitionResponse>)> {
    let body = validated(body)?;
    let admin = current_profile(&state, &user).await?;
    let competition = state
        .competitions
        .create(
            &admin,
            CompetitionInput {
                start_date: wire_date("start_date", &body.start_date)?,
                end_date: wire_date("end_date", &body.end_date)?,
                name: body.name,
                description: body.description,
                competition_type: body.competition_type,
                activity_type_id: body.activity_type_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(competition.into())))
}

async fn update_competition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<UpdateCompetitionRequest>,
) -> Result<Json<CompetitionResponse>> {
    let body = validated(body)?;
    let admin = current_profile(&state, &user).await?;
    let competition = state
        .competitions
        .update(
            &admin,
            id,
            CompetitionUpdate {
                start_date: wire_date("start_date", &body.start_date)?,
                end_date: wire_date("end_date", &body.end_date)?,
                name: body.name,
                description: body.description,
                status: body.status,
            },
        )
        .await?;
    Ok(Json(competition.into()))
}

async fn delete_competition(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>> {
    let admin = current_profile(&state, &user).await?;
    state.competitions.delete(&admin, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ─── Companies (system admin) ────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Company> for CompanyResponse {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            name: c.name,
            domain: c.domain,
            is_active: c.is_active,
            created_at: format_utc_rfc3339(c.created_at),
        }
    }
}

#[derive(Deserialize, Validate)]
pub struct CompanyRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 253))]
    pub domain: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<CompanyRequest> for CompanyInput {
    fn from(r: CompanyRequest) -> Self {
        Self {
            name: r.name,
            domain: r.domain,
            is_active: r.is_active,
        }
    }
}

async fn list_companies(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<CompanyResponse>>> {
    let admin = current_profile(&state, &user).await?;
    let companies = state.companies.list_companies(&admin).await?;
    Ok(Json(companies.into_iter().map(Into::into).collect()))
}

async fn create_company(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>)> {
    let body = validated(body)?;
    let admin = current_profile(&state, &user).await?;
    let company = state.companies.create_company(&admin, body.into()).await?;
    Ok((StatusCode::CREATED, Json(company.into())))
}

async fn update_company(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<CompanyRequest>,
) -> Result<Json<CompanyResponse>> {
    let body = validated(body)?;
    let admin = current_profile(&state, &user).await?;
    let company = state
        .companies
        .update_company(&admin, id, body.into())
        .await?;
    Ok(Json(company.into()))
}

async fn delete_company(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>> {
    let admin = current_profile(&state, &user).await?;
    state.companies.delete_company(&admin, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
