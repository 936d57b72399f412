// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper implementing the row store.
//!
//! Provides typed operations for:
//! - Companies, profiles, activity types
//! - Activities and streaks (written together in one transaction)
//! - Competitions and participants
//! - Kudos and invitations
//!
//! Uniqueness constraints are encoded in document IDs; a create on an
//! existing ID fails with a data conflict, reported as `UniqueViolation`.
//!
//! Streak updates run inside `run_transaction`: the streak document and the
//! user's activities are read in the transaction, so a concurrent writer on
//! another instance makes the commit fail and the update is retried.

use async_trait::async_trait;
use chrono::NaiveDate;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{FirestoreQueryDirection, FirestoreTransaction};
use futures_util::FutureExt;
use uuid::Uuid;

use crate::db::{
    collections, constraints, invitation_doc_id, kudos_doc_id, participant_doc_id, Store,
    StoreError, StoreResult, StreakUpdate,
};
use crate::models::{
    Activity, ActivityType, Company, Competition, CompetitionParticipant, Invitation, Kudos,
    Profile, Streak,
};

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

fn unavailable(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Map a create error, turning "document already exists" into a constraint violation.
fn create_error(e: FirestoreError, constraint: &str) -> StoreError {
    match e {
        FirestoreError::DataConflictError(_) => StoreError::unique(constraint),
        other => unavailable(other),
    }
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> StoreResult<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| unavailable(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> StoreResult<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| unavailable(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return `StoreError::Unavailable`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> StoreResult<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| unavailable("Database not connected (offline mode)"))
    }

    async fn get_doc<T>(&self, collection: &str, id: &str) -> StoreResult<Option<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(unavailable)
    }

    async fn set_doc<T>(&self, collection: &str, id: &str, object: &T) -> StoreResult<()>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Sync + Send,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn delete_doc(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(id)
            .execute()
            .await
            .map_err(unavailable)
    }

    /// Create a document that must not exist yet.
    async fn create_doc<T>(
        &self,
        collection: &str,
        id: &str,
        object: &T,
        constraint: &str,
    ) -> StoreResult<()>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Sync + Send,
    {
        let _: T = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .document_id(id)
            .object(object)
            .execute()
            .await
            .map_err(|e| create_error(e, constraint))?;
        Ok(())
    }

    /// Query all documents in a collection whose `field` equals `value`.
    async fn query_eq<T>(&self, collection: &str, field: &str, value: String) -> StoreResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(|q| q.for_all([q.field(field).eq(value.clone())]))
            .obj()
            .query()
            .await
            .map_err(unavailable)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> StoreResult<()>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| unavailable(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        unavailable(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction
                .commit()
                .await
                .map_err(|e| unavailable(format!("Failed to commit batch deletion: {}", e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl Store for FirestoreDb {
    // ─── Companies ───────────────────────────────────────────────

    async fn get_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        self.get_doc(collections::COMPANIES, &id.to_string()).await
    }

    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMPANIES)
            .order_by([("name", FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(unavailable)
    }

    async fn upsert_company(&self, company: &Company) -> StoreResult<()> {
        self.set_doc(collections::COMPANIES, &company.id.to_string(), company)
            .await
    }

    async fn delete_company(&self, id: Uuid) -> StoreResult<()> {
        self.delete_doc(collections::COMPANIES, &id.to_string())
            .await
    }

    // ─── Profiles ────────────────────────────────────────────────

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        self.get_doc(collections::PROFILES, &id.to_string()).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.set_doc(collections::PROFILES, &profile.id.to_string(), profile)
            .await
    }

    async fn list_profiles_for_company(&self, company_id: Uuid) -> StoreResult<Vec<Profile>> {
        self.query_eq(collections::PROFILES, "company_id", company_id.to_string())
            .await
    }

    // ─── Activity Types ──────────────────────────────────────────

    async fn get_activity_type(&self, id: Uuid) -> StoreResult<Option<ActivityType>> {
        self.get_doc(collections::ACTIVITY_TYPES, &id.to_string())
            .await
    }

    async fn list_activity_types(&self, company_id: Uuid) -> StoreResult<Vec<ActivityType>> {
        let mut types: Vec<ActivityType> = self
            .query_eq(
                collections::ACTIVITY_TYPES,
                "company_id",
                company_id.to_string(),
            )
            .await?;

        let defaults: Vec<ActivityType> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITY_TYPES)
            .filter(|q| q.for_all([q.field("company_id").is_null()]))
            .obj()
            .query()
            .await
            .map_err(unavailable)?;

        types.extend(defaults);
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn upsert_activity_type(&self, activity_type: &ActivityType) -> StoreResult<()> {
        self.set_doc(
            collections::ACTIVITY_TYPES,
            &activity_type.id.to_string(),
            activity_type,
        )
        .await
    }

    // ─── Activities ──────────────────────────────────────────────

    async fn get_activity(&self, id: Uuid) -> StoreResult<Option<Activity>> {
        self.get_doc(collections::ACTIVITIES, &id.to_string()).await
    }

    async fn list_activities_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Activity>> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([
                ("activity_date", FirestoreQueryDirection::Descending),
                ("created_at", FirestoreQueryDirection::Descending),
            ])
            .obj()
            .query()
            .await
            .map_err(unavailable)
    }

    async fn page_activities_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<Activity>> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .order_by([
                ("activity_date", FirestoreQueryDirection::Descending),
                ("created_at", FirestoreQueryDirection::Descending),
            ])
            .limit(limit)
            .offset(offset)
            .obj()
            .query()
            .await
            .map_err(unavailable)
    }

    async fn list_activities_in_window(
        &self,
        company_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Activity>> {
        // Dates are stored as YYYY-MM-DD strings, which sort chronologically.
        let company_id = company_id.to_string();
        let start = start.to_string();
        let end = end.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ACTIVITIES)
            .filter(move |q| {
                q.for_all([
                    q.field("company_id").eq(company_id.clone()),
                    q.field("activity_date")
                        .greater_than_or_equal(start.clone()),
                    q.field("activity_date").less_than_or_equal(end.clone()),
                ])
            })
            .order_by([("activity_date", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(unavailable)
    }

    /// Atomically store a new activity and the owner's updated streak.
    async fn insert_activity_with_streak(
        &self,
        activity: &Activity,
        update: StreakUpdate,
    ) -> StoreResult<Streak> {
        let client = self.get_client()?;

        let streak = client
            .run_transaction(|db, transaction| {
                insert_in_transaction(db, transaction, activity.clone(), update.clone()).boxed()
            })
            .await
            .map_err(|e| unavailable(format!("Activity transaction failed: {}", e)))?;

        tracing::debug!(
            activity_id = %activity.id,
            user_id = %activity.user_id,
            current_streak = streak.current_streak,
            "Activity and streak written atomically"
        );

        Ok(streak)
    }

    /// Atomically remove an activity (with its kudos) and store the recomputed streak.
    async fn delete_activity_with_streak(
        &self,
        activity_id: Uuid,
        update: StreakUpdate,
    ) -> StoreResult<Option<(Activity, Streak)>> {
        let client = self.get_client()?;

        let deleted = client
            .run_transaction(|db, transaction| {
                delete_in_transaction(db, transaction, activity_id, update.clone()).boxed()
            })
            .await
            .map_err(|e| unavailable(format!("Activity deletion transaction failed: {}", e)))?;

        if deleted.is_some() {
            tracing::debug!(%activity_id, "Activity deleted and streak recomputed atomically");
        }
        Ok(deleted)
    }

    // ─── Streaks ─────────────────────────────────────────────────

    async fn get_streak(&self, user_id: Uuid) -> StoreResult<Option<Streak>> {
        self.get_doc(collections::STREAKS, &user_id.to_string())
            .await
    }

    async fn list_streaks_for_company(&self, company_id: Uuid) -> StoreResult<Vec<Streak>> {
        self.query_eq(collections::STREAKS, "company_id", company_id.to_string())
            .await
    }

    // ─── Competitions ────────────────────────────────────────────

    async fn get_competition(&self, id: Uuid) -> StoreResult<Option<Competition>> {
        self.get_doc(collections::COMPETITIONS, &id.to_string())
            .await
    }

    async fn list_competitions(&self, company_id: Uuid) -> StoreResult<Vec<Competition>> {
        let company_id = company_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::COMPETITIONS)
            .filter(move |q| q.for_all([q.field("company_id").eq(company_id.clone())]))
            .order_by([("start_date", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(unavailable)
    }

    async fn upsert_competition(&self, competition: &Competition) -> StoreResult<()> {
        self.set_doc(
            collections::COMPETITIONS,
            &competition.id.to_string(),
            competition,
        )
        .await
    }

    async fn delete_competition(&self, id: Uuid) -> StoreResult<()> {
        let participants = self.list_participants(id).await?;
        self.batch_delete(
            &participants,
            collections::COMPETITION_PARTICIPANTS,
            |p: &CompetitionParticipant| participant_doc_id(p.competition_id, p.user_id),
        )
        .await?;

        self.delete_doc(collections::COMPETITIONS, &id.to_string())
            .await?;

        tracing::debug!(
            competition_id = %id,
            participants = participants.len(),
            "Deleted competition"
        );
        Ok(())
    }

    // ─── Participants ────────────────────────────────────────────

    async fn insert_participant(&self, participant: &CompetitionParticipant) -> StoreResult<()> {
        self.create_doc(
            collections::COMPETITION_PARTICIPANTS,
            &participant_doc_id(participant.competition_id, participant.user_id),
            participant,
            constraints::PARTICIPANT_UNIQUE,
        )
        .await
    }

    async fn delete_participant(&self, competition_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let doc_id = participant_doc_id(competition_id, user_id);
        let existing: Option<CompetitionParticipant> = self
            .get_doc(collections::COMPETITION_PARTICIPANTS, &doc_id)
            .await?;
        if existing.is_none() {
            return Ok(false);
        }
        self.delete_doc(collections::COMPETITION_PARTICIPANTS, &doc_id)
            .await?;
        Ok(true)
    }

    async fn list_participants(
        &self,
        competition_id: Uuid,
    ) -> StoreResult<Vec<CompetitionParticipant>> {
        self.query_eq(
            collections::COMPETITION_PARTICIPANTS,
            "competition_id",
            competition_id.to_string(),
        )
        .await
    }

    async fn list_participations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<CompetitionParticipant>> {
        self.query_eq(
            collections::COMPETITION_PARTICIPANTS,
            "user_id",
            user_id.to_string(),
        )
        .await
    }

    // ─── Kudos ───────────────────────────────────────────────────

    async fn insert_kudos(&self, kudos: &Kudos) -> StoreResult<()> {
        self.create_doc(
            collections::KUDOS,
            &kudos_doc_id(kudos.from_user_id, kudos.activity_id),
            kudos,
            constraints::KUDOS_UNIQUE,
        )
        .await
    }

    async fn count_kudos_received(&self, user_id: Uuid) -> StoreResult<usize> {
        let received: Vec<Kudos> = self
            .query_eq(collections::KUDOS, "to_user_id", user_id.to_string())
            .await?;
        Ok(received.len())
    }

    // ─── Invitations ─────────────────────────────────────────────

    async fn insert_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        self.create_doc(
            collections::INVITATIONS,
            &invitation_doc_id(invitation.company_id, &invitation.email),
            invitation,
            constraints::INVITATION_UNIQUE,
        )
        .await
    }

    async fn get_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        let mut found: Vec<Invitation> = self
            .query_eq(collections::INVITATIONS, "id", id.to_string())
            .await?;
        Ok(found.pop())
    }

    async fn get_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>> {
        let mut found: Vec<Invitation> = self
            .query_eq(collections::INVITATIONS, "token", token.to_string())
            .await?;
        Ok(found.pop())
    }

    async fn list_invitations(&self, company_id: Uuid) -> StoreResult<Vec<Invitation>> {
        self.query_eq(
            collections::INVITATIONS,
            "company_id",
            company_id.to_string(),
        )
        .await
    }

    async fn update_invitation(&self, invitation: &Invitation) -> StoreResult<()> {
        self.set_doc(
            collections::INVITATIONS,
            &invitation_doc_id(invitation.company_id, &invitation.email),
            invitation,
        )
        .await
    }

    async fn delete_invitation(&self, id: Uuid) -> StoreResult<()> {
        match self.get_invitation(id).await? {
            Some(invitation) => {
                self.delete_doc(
                    collections::INVITATIONS,
                    &invitation_doc_id(invitation.company_id, &invitation.email),
                )
                .await
            }
            None => Ok(()),
        }
    }
}

type TransactionResult<T> = std::result::Result<T, BackoffError<FirestoreError>>;

/// Activity dates of a user, read through a transaction-bound client.
async fn dates_in_transaction(
    db: &firestore::FirestoreDb,
    user_id: &str,
) -> TransactionResult<Vec<NaiveDate>> {
    let user_id = user_id.to_string();
    let activities: Vec<Activity> = db
        .fluent()
        .select()
        .from(collections::ACTIVITIES)
        .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
        .obj()
        .query()
        .await?;
    Ok(activities.into_iter().map(|a| a.activity_date).collect())
}

async fn insert_in_transaction(
    db: firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    activity: Activity,
    update: StreakUpdate,
) -> TransactionResult<Streak> {
    let user_id = activity.user_id.to_string();

    let existing: Option<Streak> = db
        .fluent()
        .select()
        .by_id_in(collections::STREAKS)
        .obj()
        .one(&user_id)
        .await?;
    let mut dates = dates_in_transaction(&db, &user_id).await?;
    dates.push(activity.activity_date);

    let streak = update(existing, dates);

    db.fluent()
        .update()
        .in_col(collections::ACTIVITIES)
        .document_id(activity.id.to_string())
        .object(&activity)
        .add_to_transaction(transaction)?;

    db.fluent()
        .update()
        .in_col(collections::STREAKS)
        .document_id(&user_id)
        .object(&streak)
        .add_to_transaction(transaction)?;

    Ok(streak)
}

async fn delete_in_transaction(
    db: firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    activity_id: Uuid,
    update: StreakUpdate,
) -> TransactionResult<Option<(Activity, Streak)>> {
    let activity: Option<Activity> = db
        .fluent()
        .select()
        .by_id_in(collections::ACTIVITIES)
        .obj()
        .one(activity_id.to_string())
        .await?;
    let Some(activity) = activity else {
        return Ok(None);
    };
    let user_id = activity.user_id.to_string();

    let existing: Option<Streak> = db
        .fluent()
        .select()
        .by_id_in(collections::STREAKS)
        .obj()
        .one(&user_id)
        .await?;

    let mut dates = dates_in_transaction(&db, &user_id).await?;
    // The activity itself is still visible inside the transaction.
    if let Some(pos) = dates.iter().position(|d| *d == activity.activity_date) {
        dates.swap_remove(pos);
    }

    let activity_key = activity_id.to_string();
    let kudos: Vec<Kudos> = db
        .fluent()
        .select()
        .from(collections::KUDOS)
        .filter(move |q| q.for_all([q.field("activity_id").eq(activity_key.clone())]))
        .obj()
        .query()
        .await?;

    let streak = update(existing, dates);

    db.fluent()
        .delete()
        .from(collections::ACTIVITIES)
        .document_id(activity_id.to_string())
        .add_to_transaction(transaction)?;

    for k in &kudos {
        db.fluent()
            .delete()
            .from(collections::KUDOS)
            .document_id(kudos_doc_id(k.from_user_id, k.activity_id))
            .add_to_transaction(transaction)?;
    }

    db.fluent()
        .update()
        .in_col(collections::STREAKS)
        .document_id(&user_id)
        .object(&streak)
        .add_to_transaction(transaction)?;

    Ok(Some((activity, streak)))
}
