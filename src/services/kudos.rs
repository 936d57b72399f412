// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Kudos on colleagues' activities.

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::{constraints, Store};
use crate::error::{AppError, Result};
use crate::models::{Kudos, Profile};
use crate::services::company_of;

#[derive(Clone)]
pub struct KudosService {
    db: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl KudosService {
    pub fn new(db: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Endorse an activity in the giver's company. The recipient is the
    /// activity's owner.
    pub async fn give_kudos(&self, giver: &Profile, activity_id: Uuid) -> Result<Kudos> {
        let company_id = company_of(giver)?;
        let activity = self
            .db
            .get_activity(activity_id)
            .await?
            .filter(|a| a.company_id == company_id)
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))?;

        let kudos = Kudos {
            id: Uuid::new_v4(),
            from_user_id: giver.id,
            to_user_id: activity.user_id,
            activity_id,
            company_id,
            created_at: self.clock.now(),
        };

        match self.db.insert_kudos(&kudos).await {
            Ok(()) => {
                tracing::info!(
                    %activity_id,
                    from = %giver.id,
                    to = %activity.user_id,
                    "Kudos given"
                );
                Ok(kudos)
            }
            Err(e) if e.is_unique_violation(constraints::KUDOS_UNIQUE) => {
                Err(AppError::DuplicateKudos)
            }
            Err(e) => Err(e.into()),
        }
    }
}
