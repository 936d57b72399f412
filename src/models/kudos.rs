//! Kudos: one user's endorsement of another user's activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique per (from_user_id, activity_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kudos {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub activity_id: Uuid,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
}
