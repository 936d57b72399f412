// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role-based authorization checks.
//!
//! Ownership checks ("only the owner may delete their activity") live in the
//! services; this module answers whether a role may perform an action on
//! behalf of others.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Profile, Role};

/// Privileged actions, scoped to a company where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ManageCompanies,
    ManageCompetitions { company_id: Uuid },
    ManageUsers { company_id: Uuid },
    ManageActivityTypes { company_id: Uuid },
    DeleteAnyActivity { company_id: Uuid },
}

impl Action {
    fn company_id(&self) -> Option<Uuid> {
        match *self {
            Action::ManageCompanies => None,
            Action::ManageCompetitions { company_id }
            | Action::ManageUsers { company_id }
            | Action::ManageActivityTypes { company_id }
            | Action::DeleteAnyActivity { company_id } => Some(company_id),
        }
    }
}

/// Authorization predicate.
pub trait Authorizer: Send + Sync {
    fn is_allowed(&self, actor: &Profile, action: Action) -> bool;

    /// `Forbidden` unless allowed.
    fn authorize(&self, actor: &Profile, action: Action) -> Result<()> {
        if self.is_allowed(actor, action) {
            Ok(())
        } else {
            tracing::debug!(user_id = %actor.id, ?action, "Authorization denied");
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

/// Default policy: system admins may do anything, company admins may manage
/// their own company, plain users nothing beyond their own records.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleAuthorizer;

impl Authorizer for RoleAuthorizer {
    fn is_allowed(&self, actor: &Profile, action: Action) -> bool {
        match actor.role {
            Role::SystemAdmin => true,
            Role::CompanyAdmin => match action.company_id() {
                Some(company_id) => actor.company_id == Some(company_id),
                None => false,
            },
            Role::User => false,
        }
    }
}
