// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Competition lifecycle, participation and standings.

use utogsykle::error::AppError;
use utogsykle::models::activity::SOURCE_MANUAL;
use utogsykle::db::Store;
use utogsykle::models::{CompetitionStatus, CompetitionType, NewActivity, Profile, Role};
use utogsykle::services::scoring::round_points;
use utogsykle::services::{CompetitionInput, CompetitionUpdate};
use uuid::Uuid;

mod common;
use common::{date, seed_profile, TestEnv};

fn input(activity_type_id: Option<Uuid>) -> CompetitionInput {
    CompetitionInput {
        name: "January Steps".to_string(),
        description: Some("Walk more".to_string()),
        competition_type: CompetitionType::Individual,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 1, 31),
        activity_type_id,
    }
}

async fn record(env: &TestEnv, user: &Profile, type_id: Uuid, value: f64, day: u32) {
    env.state
        .activities
        .record_activity(NewActivity {
            user_id: user.id,
            company_id: env.company.id,
            activity_type_id: type_id,
            value: Some(value),
            activity_date: date(2024, 1, day),
            notes: None,
            source: SOURCE_MANUAL.to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_only_admins_create() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;

    assert!(matches!(
        svc.create(&env.alice, input(None)).await,
        Err(AppError::Forbidden(_))
    ));

    let competition = svc.create(&env.admin, input(None)).await.unwrap();
    assert_eq!(competition.status, CompetitionStatus::Active);
    assert_eq!(competition.created_by, env.admin.id);
}

#[tokio::test]
async fn test_create_validation() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;

    let mut reversed = input(None);
    reversed.end_date = date(2023, 12, 31);
    assert!(matches!(
        svc.create(&env.admin, reversed).await,
        Err(AppError::InvalidDate(_))
    ));

    assert!(matches!(
        svc.create(&env.admin, input(Some(Uuid::new_v4()))).await,
        Err(AppError::InvalidActivityType(_))
    ));
}

#[tokio::test]
async fn test_join_twice_is_already_joined() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;
    let competition = svc.create(&env.admin, input(None)).await.unwrap();

    svc.join(&env.alice, competition.id).await.unwrap();
    assert!(matches!(
        svc.join(&env.alice, competition.id).await,
        Err(AppError::AlreadyJoined)
    ));

    let list = svc.list(&env.alice).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].participant_count, 1);
    assert!(list[0].is_participating);
}

#[tokio::test]
async fn test_concurrent_join_creates_one_participant() {
    let env = TestEnv::new().await;
    let competition = env
        .state
        .competitions
        .create(&env.admin, input(None))
        .await
        .unwrap();

    let mut handles = vec![];
    for _ in 0..8 {
        let svc = env.state.competitions.clone();
        let alice = env.alice.clone();
        handles.push(tokio::spawn(async move { svc.join(&alice, competition.id).await }));
    }

    let mut ok = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.expect("Task join failed") {
            Ok(_) => ok += 1,
            Err(AppError::AlreadyJoined) => already += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(already, 7);

    let detail = env
        .state
        .competitions
        .detail(&env.alice, competition.id)
        .await
        .unwrap();
    assert_eq!(detail.leaderboard.len(), 1);
}

#[tokio::test]
async fn test_closed_and_foreign_competitions() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;
    let competition = svc.create(&env.admin, input(None)).await.unwrap();

    svc.update(
        &env.admin,
        competition.id,
        CompetitionUpdate {
            name: competition.name.clone(),
            description: None,
            status: CompetitionStatus::Completed,
            start_date: competition.start_date,
            end_date: competition.end_date,
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        svc.join(&env.bob, competition.id).await,
        Err(AppError::BadRequest(_))
    ));

    let outsider = seed_profile(&env.store, Some(Uuid::new_v4()), Role::User, "Outsider").await;
    assert!(matches!(
        svc.join(&outsider, competition.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_leave() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;
    let competition = svc.create(&env.admin, input(None)).await.unwrap();

    assert!(matches!(
        svc.leave(&env.bob, competition.id).await,
        Err(AppError::NotFound(_))
    ));

    svc.join(&env.bob, competition.id).await.unwrap();
    svc.leave(&env.bob, competition.id).await.unwrap();
    let detail = svc.detail(&env.bob, competition.id).await.unwrap();
    assert!(!detail.is_participating);
    assert!(detail.leaderboard.is_empty());
}

#[tokio::test]
async fn test_standings_use_window_and_type_filter() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;

    let mut walking_only = input(Some(env.walking.id));
    walking_only.start_date = date(2024, 1, 5);
    walking_only.end_date = date(2024, 1, 10);
    let competition = svc.create(&env.admin, walking_only).await.unwrap();

    svc.join(&env.alice, competition.id).await.unwrap();
    svc.join(&env.bob, competition.id).await.unwrap();

    // Inside the window, walking: counts
    record(&env, &env.alice, env.walking.id, 1000.0, 6).await;
    // Outside the window
    record(&env, &env.alice, env.walking.id, 9000.0, 11).await;
    // Cycling is filtered out
    record(&env, &env.bob, env.cycling.id, 50.0, 7).await;
    // Admin is not a participant
    record(&env, &env.admin, env.walking.id, 5000.0, 8).await;

    let detail = svc.detail(&env.alice, competition.id).await.unwrap();
    let rows: Vec<_> = detail
        .leaderboard
        .iter()
        .map(|e| (e.name.as_str(), round_points(e.points), e.rank))
        .collect();
    assert_eq!(rows, vec![("Alice", 100.0, 1), ("Bob", 0.0, 2)]);
}

#[tokio::test]
async fn test_delete_removes_participants() {
    let env = TestEnv::new().await;
    let svc = &env.state.competitions;
    let competition = svc.create(&env.admin, input(None)).await.unwrap();
    svc.join(&env.alice, competition.id).await.unwrap();

    assert!(matches!(
        svc.delete(&env.alice, competition.id).await,
        Err(AppError::Forbidden(_))
    ));
    svc.delete(&env.admin, competition.id).await.unwrap();

    assert!(matches!(
        svc.detail(&env.alice, competition.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(env.store.list_participants(competition.id).await.unwrap().is_empty());
}
