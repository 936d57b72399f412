// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP surface tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens
//! 2. Wire formats (dates, rounding, error bodies) are as documented
//! 3. Admin routes enforce roles

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{create_test_jwt, TestEnv};

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn with_json(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let env = TestEnv::new().await;
    let (status, body) = send(
        env.app(),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let env = TestEnv::new().await;
    let (status, body) = send(
        env.app(),
        Request::builder().uri("/api/me").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_bad_token() {
    let env = TestEnv::new().await;
    let forged = create_test_jwt(
        &env.alice.id.to_string(),
        None,
        b"some-other-signing-key-32-bytes!",
    );
    let (status, body) = send(env.app(), get("/api/me", &forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let not_uuid = create_test_jwt("12345", None, &env.state.config.jwt_signing_key);
    let (status, _) = send(env.app(), get("/api/me", &not_uuid)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_accepted() {
    let env = TestEnv::new().await;
    let token = env.token_for(&env.alice);
    let request = Request::builder()
        .uri("/api/me")
        .header(header::COOKIE, format!("utogsykle_token={}", token))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(env.app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], env.alice.id.to_string());
    assert_eq!(body["company_name"], "Acme");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_first_login_auto_joins_by_domain() {
    let env = TestEnv::new().await;
    let id = uuid::Uuid::new_v4();
    let token = create_test_jwt(
        &id.to_string(),
        Some("nina@acme.no"),
        &env.state.config.jwt_signing_key,
    );

    let (status, body) = send(env.app(), get("/api/me", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["company_id"], env.company.id.to_string());
    assert_eq!(body["email"], "nina@acme.no");
}

#[tokio::test]
async fn test_record_and_list_activities() {
    let env = TestEnv::new().await;
    let token = env.token_for(&env.alice);

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/activities",
            &token,
            json!({
                "activity_type_id": env.walking.id,
                "value": 1234.5,
                "activity_date": "2024-01-11",
                "notes": "Morning walk"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["activity"]["points"], 123.45);
    assert_eq!(body["activity"]["activity_type_name"], "Walking");
    assert_eq!(body["activity"]["activity_date"], "2024-01-11");
    assert_eq!(body["current_streak"], 1);

    let (status, body) = send(env.app(), get("/api/activities?page=1&per_page=500", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["per_page"], 100);
    assert_eq!(body["activities"].as_array().unwrap().len(), 1);

    let activity_id = body["activities"][0]["id"].as_str().unwrap().to_string();
    let kudos = Request::builder()
        .method("POST")
        .uri(format!("/api/activities/{}/kudos", activity_id))
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", env.token_for(&env.bob)),
        )
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(env.app(), kudos).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(env.app(), get("/api/dashboard", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points_this_month"], 123.45);
    assert_eq!(body["current_streak"], 1);
    assert_eq!(body["kudos_received"], 1);
    assert_eq!(body["active_competitions"], 0);
}

#[tokio::test]
async fn test_activity_errors() {
    let env = TestEnv::new().await;
    let token = env.token_for(&env.alice);

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/activities",
            &token,
            json!({
                "activity_type_id": env.walking.id,
                "value": 10,
                "activity_date": "11/01/2024"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_date");

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/activities",
            &token,
            json!({
                "activity_type_id": env.walking.id,
                "value": -5,
                "activity_date": "2024-01-11"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_value");

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/activities",
            &token,
            json!({
                "activity_type_id": env.walking.id,
                "value": 1,
                "activity_date": "2024-01-11",
                "notes": "x".repeat(501)
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = send(env.app(), get("/api/activities?page=0", &token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Finite value whose points overflow.
    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/activities",
            &token,
            json!({
                "activity_type_id": env.cycling.id,
                "value": 1e308,
                "activity_date": "2024-01-11"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_value");

    let (_, body) = send(env.app(), get("/api/activities", &token)).await;
    assert!(body["activities"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_uses_error_format() {
    let env = TestEnv::new().await;
    let token = env.token_for(&env.alice);

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/activities",
            &token,
            json!({
                "activity_type_id": env.walking.id,
                "value": "abc",
                "activity_date": "2024-01-11"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(body["details"].is_string());

    let broken = Request::builder()
        .method("POST")
        .uri("/api/activities")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(env.app(), broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_user_without_company_is_forbidden() {
    let env = TestEnv::new().await;
    let token = create_test_jwt(
        &uuid::Uuid::new_v4().to_string(),
        Some("loner@nowhere.org"),
        &env.state.config.jwt_signing_key,
    );

    let (status, body) = send(env.app(), get("/api/leaderboard", &token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_competition_flow_over_http() {
    let env = TestEnv::new().await;
    let admin = env.token_for(&env.admin);
    let alice = env.token_for(&env.alice);

    let (status, _) = send(
        env.app(),
        with_json(
            "POST",
            "/api/admin/competitions",
            &alice,
            json!({"name": "Nope", "start_date": "2024-01-01", "end_date": "2024-01-31"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = send(
        env.app(),
        with_json(
            "POST",
            "/api/admin/competitions",
            &admin,
            json!({
                "name": "January",
                "type": "individual",
                "start_date": "2024-01-01",
                "end_date": "2024-01-31"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "active");
    let id = created["id"].as_str().unwrap().to_string();

    let join_uri = format!("/api/competitions/{}/participants", id);
    let (status, _) = send(env.app(), with_json("POST", &join_uri, &alice, json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(env.app(), with_json("POST", &join_uri, &alice, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_joined");

    let (status, detail) = send(env.app(), get(&format!("/api/competitions/{}", id), &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["is_participating"], true);
    assert_eq!(detail["leaderboard"][0]["rank"], 1);

    let (status, list) = send(env.app(), get("/api/competitions", &alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["participant_count"], 1);
}

#[tokio::test]
async fn test_admin_invitation_routes() {
    let env = TestEnv::new().await;
    let admin = env.token_for(&env.admin);

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/admin/invitations",
            &admin,
            json!({"email": "not-an-email"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, invitation) = send(
        env.app(),
        with_json(
            "POST",
            "/api/admin/invitations",
            &admin,
            json!({"email": "kari@example.com", "role": "user"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(invitation.get("token").is_none());

    let (status, body) = send(
        env.app(),
        with_json(
            "POST",
            "/api/admin/invitations",
            &admin,
            json!({"email": "kari@example.com"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_invitation");

    let (status, users) = send(env.app(), get("/api/admin/users", &admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users["members"].as_array().unwrap().len(), 3);
    assert_eq!(users["invitations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_system_routes_require_system_admin() {
    let env = TestEnv::new().await;
    let admin = env.token_for(&env.admin);

    let (status, _) = send(env.app(), get("/api/system/companies", &admin)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_security_headers_on_api() {
    let env = TestEnv::new().await;
    let response = env
        .app()
        .oneshot(get("/api/me", &env.token_for(&env.bob)))
        .await
        .unwrap();
    assert_eq!(response.headers().get("X-Frame-Options").unwrap(), "DENY");
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
}
