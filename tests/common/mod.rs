// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use utogsykle::authz::RoleAuthorizer;
use utogsykle::clock::FixedClock;
use utogsykle::config::Config;
use utogsykle::db::{FirestoreDb, MemoryStore, Store};
use utogsykle::models::{ActivityType, ActivityUnit, Company, Profile, Role};
use utogsykle::routes::create_router;
use utogsykle::services::{InvitationSender, LogInvitationSender};
use utogsykle::AppState;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Default "today" for tests: Thursday 2024-01-11.
#[allow(dead_code)]
pub fn test_today() -> NaiveDate {
    date(2024, 1, 11)
}

/// Seeded application over an in-memory store and a fixed clock.
#[allow(dead_code)]
pub struct TestEnv {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub company: Company,
    pub admin: Profile,
    pub alice: Profile,
    pub bob: Profile,
    /// Company-owned, 0.1 points per step
    pub walking: ActivityType,
    /// Global default, 10 points per km
    pub cycling: ActivityType,
}

#[allow(dead_code)]
impl TestEnv {
    pub async fn new() -> Self {
        Self::at(test_today()).await
    }

    pub async fn at(today: NaiveDate) -> Self {
        Self::with_sender(today, Arc::new(LogInvitationSender::new("http://localhost:5173"))).await
    }

    pub async fn with_sender(today: NaiveDate, sender: Arc<dyn InvitationSender>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = Arc::new(AppState::new(
            Config::test_default(),
            store.clone(),
            Arc::new(FixedClock::at_date(today)),
            Arc::new(RoleAuthorizer),
            sender,
        ));

        let company = Company {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            domain: Some("acme.no".to_string()),
            is_active: true,
            created_at: Utc::now(),
        };
        store.upsert_company(&company).await.unwrap();

        let admin = seed_profile(&store, Some(company.id), Role::CompanyAdmin, "Admin Person").await;
        let alice = seed_profile(&store, Some(company.id), Role::User, "Alice").await;
        let bob = seed_profile(&store, Some(company.id), Role::User, "Bob").await;

        let walking = ActivityType {
            id: Uuid::new_v4(),
            name: "Walking".to_string(),
            unit: ActivityUnit::Steps,
            points_per_unit: Some(0.1),
            company_id: Some(company.id),
            is_default: false,
            created_at: Utc::now(),
        };
        let cycling = ActivityType {
            id: Uuid::new_v4(),
            name: "Cycling".to_string(),
            unit: ActivityUnit::Km,
            points_per_unit: Some(10.0),
            company_id: None,
            is_default: true,
            created_at: Utc::now(),
        };
        store.upsert_activity_type(&walking).await.unwrap();
        store.upsert_activity_type(&cycling).await.unwrap();

        Self {
            state,
            store,
            company,
            admin,
            alice,
            bob,
            walking,
            cycling,
        }
    }

    pub fn app(&self) -> axum::Router {
        create_router(self.state.clone())
    }

    pub fn token_for(&self, profile: &Profile) -> String {
        create_test_jwt(
            &profile.id.to_string(),
            profile.email.as_deref(),
            &self.state.config.jwt_signing_key,
        )
    }
}

/// Insert a profile with an `@acme.no` email.
#[allow(dead_code)]
pub async fn seed_profile(
    store: &MemoryStore,
    company_id: Option<Uuid>,
    role: Role,
    name: &str,
) -> Profile {
    let profile = Profile {
        id: Uuid::new_v4(),
        company_id,
        role,
        full_name: Some(name.to_string()),
        email: Some(format!("{}@acme.no", name.to_lowercase().replace(' ', "."))),
        created_at: Utc::now(),
    };
    store.upsert_profile(&profile).await.unwrap();
    profile
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(sub: &str, email: Option<&str>, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<&'a str>,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub,
        email,
        exp: now + 86400,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}
