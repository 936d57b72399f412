// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Logged activity model for storage and API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity ID (also used as document ID)
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub activity_type_id: Uuid,
    /// Quantity in the activity type's unit
    pub value: f64,
    /// `value * points_per_unit`, unrounded
    pub points: f64,
    /// Calendar day the activity happened
    pub activity_date: NaiveDate,
    pub notes: Option<String>,
    /// Source: "manual" for the logging form
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording an activity.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub activity_type_id: Uuid,
    pub value: Option<f64>,
    pub activity_date: NaiveDate,
    pub notes: Option<String>,
    pub source: String,
}

/// Source tag for activities logged through the API.
pub const SOURCE_MANUAL: &str = "manual";
