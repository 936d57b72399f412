// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Company invitations.
//!
//! Delivery (email / magic link) is an external concern behind
//! [`InvitationSender`]; the default sender only logs the accept link.

use async_trait::async_trait;
use chrono::Duration;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, Authorizer};
use crate::clock::Clock;
use crate::db::{constraints, Store};
use crate::error::{AppError, Result};
use crate::models::{Company, Invitation, Profile, Role};
use crate::services::company_of;

/// Bytes of randomness in an invitation token.
const TOKEN_BYTES: usize = 32;

/// Delivers invitations to invitees.
#[async_trait]
pub trait InvitationSender: Send + Sync {
    async fn send(&self, invitation: &Invitation, company: &Company) -> Result<()>;
}

/// Sender that writes the accept link to the log.
pub struct LogInvitationSender {
    frontend_url: String,
}

impl LogInvitationSender {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }

    pub fn accept_url(&self, invitation: &Invitation) -> String {
        format!(
            "{}/auth/callback?invitation={}",
            self.frontend_url.trim_end_matches('/'),
            invitation.token
        )
    }
}

#[async_trait]
impl InvitationSender for LogInvitationSender {
    async fn send(&self, invitation: &Invitation, company: &Company) -> Result<()> {
        tracing::info!(
            invitation_id = %invitation.id,
            company = %company.name,
            email = %invitation.email,
            url = %self.accept_url(invitation),
            "Invitation ready for delivery"
        );
        Ok(())
    }
}

fn generate_token() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate invitation token")))?;
    Ok(hex::encode(bytes))
}

#[derive(Clone)]
pub struct InvitationService {
    db: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
    sender: Arc<dyn InvitationSender>,
    ttl: Duration,
}

impl InvitationService {
    pub fn new(
        db: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        authorizer: Arc<dyn Authorizer>,
        sender: Arc<dyn InvitationSender>,
        ttl: Duration,
    ) -> Self {
        Self {
            db,
            clock,
            authorizer,
            sender,
            ttl,
        }
    }

    /// Invite `email` to the admin's company.
    pub async fn invite(&self, admin: &Profile, email: &str, role: Role) -> Result<Invitation> {
        let company_id = company_of(admin)?;
        self.authorizer
            .authorize(admin, Action::ManageUsers { company_id })?;

        if !role.is_assignable_by_company() {
            return Err(AppError::BadRequest(
                "Invitations can only grant the user or company_admin role".to_string(),
            ));
        }

        let company = self
            .db
            .get_company(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company {} not found", company_id)))?;

        let now = self.clock.now();
        let invitation = Invitation {
            id: Uuid::new_v4(),
            company_id,
            email: email.trim().to_lowercase(),
            role,
            token: generate_token()?,
            invited_by: Some(admin.id),
            expires_at: now + self.ttl,
            accepted_at: None,
            created_at: now,
        };

        match self.db.insert_invitation(&invitation).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation(constraints::INVITATION_UNIQUE) => {
                return Err(AppError::DuplicateInvitation)
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.sender.send(&invitation, &company).await {
            tracing::warn!(invitation_id = %invitation.id, error = %e, "Invitation delivery failed");
            self.db.delete_invitation(invitation.id).await?;
            return Err(e);
        }

        tracing::info!(
            invitation_id = %invitation.id,
            %company_id,
            role = ?role,
            "Invitation created"
        );
        Ok(invitation)
    }

    pub async fn delete(&self, admin: &Profile, id: Uuid) -> Result<()> {
        let company_id = company_of(admin)?;
        self.authorizer
            .authorize(admin, Action::ManageUsers { company_id })?;

        let invitation = self
            .db
            .get_invitation(id)
            .await?
            .filter(|i| i.company_id == company_id)
            .ok_or_else(|| AppError::NotFound(format!("Invitation {} not found", id)))?;

        self.db.delete_invitation(invitation.id).await?;
        tracing::info!(invitation_id = %id, "Invitation deleted");
        Ok(())
    }

    pub async fn list(&self, admin: &Profile) -> Result<Vec<Invitation>> {
        let company_id = company_of(admin)?;
        self.authorizer
            .authorize(admin, Action::ManageUsers { company_id })?;
        Ok(self.db.list_invitations(company_id).await?)
    }

    /// Accept a pending invitation: the profile joins the company with the
    /// invited role.
    pub async fn accept(&self, profile: &Profile, token: &str) -> Result<Profile> {
        let mut invitation = self
            .db
            .get_invitation_by_token(token)
            .await?
            .filter(Invitation::is_pending)
            .ok_or_else(|| {
                AppError::NotFound("Invitation not found or already used".to_string())
            })?;

        let now = self.clock.now();
        if invitation.is_expired(now) {
            return Err(AppError::BadRequest("Invitation has expired".to_string()));
        }

        if let Some(email) = profile.email.as_deref() {
            if !email.eq_ignore_ascii_case(&invitation.email) {
                return Err(AppError::Forbidden(
                    "Invitation was sent to a different email address".to_string(),
                ));
            }
        }

        let mut profile = profile.clone();
        profile.company_id = Some(invitation.company_id);
        profile.role = invitation.role;
        self.db.upsert_profile(&profile).await?;

        invitation.accepted_at = Some(now);
        self.db.update_invitation(&invitation).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %profile.id,
            company_id = %invitation.company_id,
            "Invitation accepted"
        );
        Ok(profile)
    }
}
