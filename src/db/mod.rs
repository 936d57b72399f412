//! Database layer: the tenant-scoped row store.
//!
//! Services talk to the [`Store`] trait only. `FirestoreDb` is the production
//! backend; `MemoryStore` backs local development and tests.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    Activity, ActivityType, Company, Competition, CompetitionParticipant, Invitation, Kudos,
    Profile, Streak,
};

/// Collection names as constants.
pub mod collections {
    pub const COMPANIES: &str = "companies";
    pub const PROFILES: &str = "profiles";
    pub const ACTIVITY_TYPES: &str = "activity_types";
    pub const ACTIVITIES: &str = "activities";
    /// Streak aggregates (keyed by user_id)
    pub const STREAKS: &str = "streaks";
    pub const COMPETITIONS: &str = "competitions";
    /// Keyed by `{competition_id}_{user_id}`
    pub const COMPETITION_PARTICIPANTS: &str = "competition_participants";
    /// Keyed by `{company_id}_{email}`
    pub const INVITATIONS: &str = "invitations";
    /// Keyed by `{from_user_id}_{activity_id}`
    pub const KUDOS: &str = "kudos";
}

/// Uniqueness constraint names reported in [`StoreError::UniqueViolation`].
pub mod constraints {
    pub const PARTICIPANT_UNIQUE: &str = "competition_participants_competition_id_user_id_key";
    pub const INVITATION_UNIQUE: &str = "invitations_company_id_email_key";
    pub const KUDOS_UNIQUE: &str = "kudos_from_user_id_activity_id_key";
}

/// Row store errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Postgres SQLSTATE for unique violations.
    pub const UNIQUE_VIOLATION_CODE: &'static str = "23505";

    pub fn unique(constraint: &str) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.to_string(),
        }
    }

    /// Machine-readable code, when the store reports one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            StoreError::UniqueViolation { .. } => Some(Self::UNIQUE_VIOLATION_CODE),
            StoreError::Unavailable(_) => None,
        }
    }

    /// Whether this is a violation of the given constraint.
    pub fn is_unique_violation(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Derives a user's next streak row from the stored row and the user's
/// activity dates, both read inside the store's atomic unit.
///
/// Backends may call it more than once when a conflicting write forces a retry.
pub type StreakUpdate = Arc<dyn Fn(Option<Streak>, Vec<NaiveDate>) -> Streak + Send + Sync>;

/// Tenant-scoped row store.
///
/// Single-row operations are atomic. The `*_with_streak` operations read the
/// owner's streak row and activity dates, apply a [`StreakUpdate`], and write
/// the activity change and the new streak together or not at all. Concurrent
/// writers for the same user, in this process or another, serialize there.
#[async_trait]
pub trait Store: Send + Sync {
    // ─── Companies ───────────────────────────────────────────────
    async fn get_company(&self, id: Uuid) -> StoreResult<Option<Company>>;
    async fn list_companies(&self) -> StoreResult<Vec<Company>>;
    async fn upsert_company(&self, company: &Company) -> StoreResult<()>;
    async fn delete_company(&self, id: Uuid) -> StoreResult<()>;

    // ─── Profiles ────────────────────────────────────────────────
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()>;
    async fn list_profiles_for_company(&self, company_id: Uuid) -> StoreResult<Vec<Profile>>;

    // ─── Activity Types ──────────────────────────────────────────
    async fn get_activity_type(&self, id: Uuid) -> StoreResult<Option<ActivityType>>;
    /// Company-owned types plus global defaults.
    async fn list_activity_types(&self, company_id: Uuid) -> StoreResult<Vec<ActivityType>>;
    async fn upsert_activity_type(&self, activity_type: &ActivityType) -> StoreResult<()>;

    // ─── Activities ──────────────────────────────────────────────
    async fn get_activity(&self, id: Uuid) -> StoreResult<Option<Activity>>;
    /// All activities of a user, newest first.
    async fn list_activities_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Activity>>;
    /// A page of a user's activities, newest first.
    async fn page_activities_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> StoreResult<Vec<Activity>>;
    /// Company activities with `start <= activity_date <= end`.
    async fn list_activities_in_window(
        &self,
        company_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Activity>>;
    /// Stores `activity` and the owner's streak. `update` sees the user's
    /// dates including the new activity.
    async fn insert_activity_with_streak(
        &self,
        activity: &Activity,
        update: StreakUpdate,
    ) -> StoreResult<Streak>;
    /// Deletes the activity and its kudos and writes the owner's streak.
    /// `update` sees the remaining dates. Returns `None` if the activity no
    /// longer exists.
    async fn delete_activity_with_streak(
        &self,
        activity_id: Uuid,
        update: StreakUpdate,
    ) -> StoreResult<Option<(Activity, Streak)>>;

    // ─── Streaks ─────────────────────────────────────────────────
    async fn get_streak(&self, user_id: Uuid) -> StoreResult<Option<Streak>>;
    async fn list_streaks_for_company(&self, company_id: Uuid) -> StoreResult<Vec<Streak>>;

    // ─── Competitions ────────────────────────────────────────────
    async fn get_competition(&self, id: Uuid) -> StoreResult<Option<Competition>>;
    async fn list_competitions(&self, company_id: Uuid) -> StoreResult<Vec<Competition>>;
    async fn upsert_competition(&self, competition: &Competition) -> StoreResult<()>;
    /// Deletes the competition and its participants.
    async fn delete_competition(&self, id: Uuid) -> StoreResult<()>;

    // ─── Participants ────────────────────────────────────────────
    /// Fails with `UniqueViolation` if the pair already exists.
    async fn insert_participant(&self, participant: &CompetitionParticipant) -> StoreResult<()>;
    /// Returns `false` if there was nothing to delete.
    async fn delete_participant(&self, competition_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    async fn list_participants(
        &self,
        competition_id: Uuid,
    ) -> StoreResult<Vec<CompetitionParticipant>>;
    /// Competitions a user has joined.
    async fn list_participations_for_user(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<CompetitionParticipant>>;

    // ─── Kudos ───────────────────────────────────────────────────
    /// Fails with `UniqueViolation` if the giver already endorsed the activity.
    async fn insert_kudos(&self, kudos: &Kudos) -> StoreResult<()>;
    /// Number of kudos on the user's activities.
    async fn count_kudos_received(&self, user_id: Uuid) -> StoreResult<usize>;

    // ─── Invitations ─────────────────────────────────────────────
    /// Fails with `UniqueViolation` if the company already invited the email.
    async fn insert_invitation(&self, invitation: &Invitation) -> StoreResult<()>;
    async fn get_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>>;
    async fn get_invitation_by_token(&self, token: &str) -> StoreResult<Option<Invitation>>;
    async fn list_invitations(&self, company_id: Uuid) -> StoreResult<Vec<Invitation>>;
    async fn update_invitation(&self, invitation: &Invitation) -> StoreResult<()>;
    async fn delete_invitation(&self, id: Uuid) -> StoreResult<()>;
}

/// Document ID for a participant row.
pub fn participant_doc_id(competition_id: Uuid, user_id: Uuid) -> String {
    format!("{}_{}", competition_id, user_id)
}

/// Document ID for a kudos row.
pub fn kudos_doc_id(from_user_id: Uuid, activity_id: Uuid) -> String {
    format!("{}_{}", from_user_id, activity_id)
}

/// Document ID for an invitation row.
pub fn invitation_doc_id(company_id: Uuid, email: &str) -> String {
    format!("{}_{}", company_id, urlencoding::encode(&email.to_lowercase()))
}

/// Newest-first ordering shared by both backends.
pub(crate) fn newest_first(a: &Activity, b: &Activity) -> std::cmp::Ordering {
    b.activity_date
        .cmp(&a.activity_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}
