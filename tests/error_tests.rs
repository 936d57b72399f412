// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Store outages surface as `store_unavailable` without leaking details.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;
use utogsykle::authz::RoleAuthorizer;
use utogsykle::clock::FixedClock;
use utogsykle::config::Config;
use utogsykle::error::AppError;
use utogsykle::routes::create_router;
use utogsykle::services::LogInvitationSender;
use utogsykle::AppState;
use uuid::Uuid;

mod common;
use common::{create_test_jwt, test_db_offline, test_today};

fn offline_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Config::test_default(),
        Arc::new(test_db_offline()),
        Arc::new(FixedClock::at_date(test_today())),
        Arc::new(RoleAuthorizer),
        Arc::new(LogInvitationSender::new("http://localhost:5173")),
    ))
}

#[tokio::test]
async fn test_offline_store_is_service_unavailable() {
    let state = offline_state();
    let token = create_test_jwt(
        &Uuid::new_v4().to_string(),
        None,
        &state.config.jwt_signing_key,
    );

    let response = create_router(state)
        .oneshot(
            Request::builder()
                .uri("/api/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "store_unavailable");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_offline_store_in_services() {
    let state = offline_state();
    let result = state.companies.ensure_profile(Uuid::new_v4(), None).await;
    assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
}

#[test]
fn test_conflict_codes() {
    assert_eq!(AppError::AlreadyJoined.code(), "already_joined");
    assert_eq!(AppError::DuplicateInvitation.code(), "duplicate_invitation");
    assert_eq!(AppError::DuplicateKudos.code(), "duplicate_kudos");
    assert_eq!(AppError::AlreadyJoined.status(), StatusCode::CONFLICT);
}
