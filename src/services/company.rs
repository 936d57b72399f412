// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tenants, members and activity types.

use std::sync::Arc;
use uuid::Uuid;

use crate::authz::{Action, Authorizer};
use crate::clock::Clock;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{ActivityType, ActivityUnit, Company, Profile, Role};
use crate::services::{company_of, scoring};

/// Fields of a company (create and update).
#[derive(Debug, Clone)]
pub struct CompanyInput {
    pub name: String,
    pub domain: Option<String>,
    pub is_active: bool,
}

/// Fields of a new company-owned activity type.
#[derive(Debug, Clone)]
pub struct ActivityTypeInput {
    pub name: String,
    pub unit: ActivityUnit,
    pub points_per_unit: Option<f64>,
}

#[derive(Clone)]
pub struct CompanyService {
    db: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    authorizer: Arc<dyn Authorizer>,
}

fn normalize_domain(domain: Option<String>) -> Option<String> {
    domain
        .map(|d| d.trim().trim_start_matches('@').to_lowercase())
        .filter(|d| !d.is_empty())
}

fn required_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    Ok(name.to_string())
}

impl CompanyService {
    pub fn new(db: Arc<dyn Store>, clock: Arc<dyn Clock>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            db,
            clock,
            authorizer,
        }
    }

    // ─── Onboarding ──────────────────────────────────────────────

    /// Load the caller's profile, creating it on first sight.
    ///
    /// A profile without a company whose email domain matches an active
    /// company joins that company as a plain user.
    pub async fn ensure_profile(&self, user_id: Uuid, email: Option<&str>) -> Result<Profile> {
        let existing = self.db.get_profile(user_id).await?;
        let created = existing.is_none();

        let mut profile = existing.unwrap_or_else(|| Profile {
            id: user_id,
            company_id: None,
            role: Role::User,
            full_name: None,
            email: None,
            created_at: self.clock.now(),
        });

        let mut changed = created;
        if profile.email.is_none() {
            if let Some(email) = email {
                profile.email = Some(email.trim().to_lowercase());
                changed = true;
            }
        }

        if profile.company_id.is_none() {
            if let Some(email) = profile.email.as_deref() {
                let companies = self.db.list_companies().await?;
                if let Some(company) = companies.iter().find(|c| c.matches_email(email)) {
                    tracing::info!(
                        %user_id,
                        company_id = %company.id,
                        "Joined company by email domain"
                    );
                    profile.company_id = Some(company.id);
                    profile.role = Role::User;
                    changed = true;
                }
            }
        }

        if changed {
            self.db.upsert_profile(&profile).await?;
        }
        if created {
            tracing::info!(%user_id, "Created profile");
        }
        Ok(profile)
    }

    // ─── Companies (system admin) ────────────────────────────────

    pub async fn list_companies(&self, actor: &Profile) -> Result<Vec<Company>> {
        self.authorizer.authorize(actor, Action::ManageCompanies)?;
        Ok(self.db.list_companies().await?)
    }

    pub async fn create_company(&self, actor: &Profile, input: CompanyInput) -> Result<Company> {
        self.authorizer.authorize(actor, Action::ManageCompanies)?;

        let company = Company {
            id: Uuid::new_v4(),
            name: required_name(&input.name)?,
            domain: normalize_domain(input.domain),
            is_active: input.is_active,
            created_at: self.clock.now(),
        };
        self.db.upsert_company(&company).await?;

        tracing::info!(company_id = %company.id, name = %company.name, "Company created");
        Ok(company)
    }

    pub async fn update_company(
        &self,
        actor: &Profile,
        id: Uuid,
        input: CompanyInput,
    ) -> Result<Company> {
        self.authorizer.authorize(actor, Action::ManageCompanies)?;

        let mut company = self.load_company(id).await?;
        company.name = required_name(&input.name)?;
        company.domain = normalize_domain(input.domain);
        company.is_active = input.is_active;
        self.db.upsert_company(&company).await?;

        tracing::info!(company_id = %id, is_active = company.is_active, "Company updated");
        Ok(company)
    }

    pub async fn delete_company(&self, actor: &Profile, id: Uuid) -> Result<()> {
        self.authorizer.authorize(actor, Action::ManageCompanies)?;
        self.load_company(id).await?;
        self.db.delete_company(id).await?;
        tracing::info!(company_id = %id, "Company deleted");
        Ok(())
    }

    async fn load_company(&self, id: Uuid) -> Result<Company> {
        self.db
            .get_company(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company {} not found", id)))
    }

    // ─── Members (company admin) ─────────────────────────────────

    /// Members of the admin's company, sorted by display name.
    pub async fn list_members(&self, actor: &Profile) -> Result<Vec<Profile>> {
        let company_id = company_of(actor)?;
        self.authorizer
            .authorize(actor, Action::ManageUsers { company_id })?;

        let mut members = self.db.list_profiles_for_company(company_id).await?;
        members.sort_by(|a, b| a.display_name().cmp(&b.display_name()).then(a.id.cmp(&b.id)));
        Ok(members)
    }

    pub async fn update_user_role(
        &self,
        actor: &Profile,
        user_id: Uuid,
        role: Role,
    ) -> Result<Profile> {
        let company_id = company_of(actor)?;
        self.authorizer
            .authorize(actor, Action::ManageUsers { company_id })?;

        if !role.is_assignable_by_company() {
            return Err(AppError::BadRequest(
                "Role must be user or company_admin".to_string(),
            ));
        }
        if user_id == actor.id {
            return Err(AppError::BadRequest(
                "You cannot change your own role".to_string(),
            ));
        }

        let mut profile = self
            .db
            .get_profile(user_id)
            .await?
            .filter(|p| p.company_id == Some(company_id))
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if profile.role == Role::SystemAdmin {
            return Err(AppError::Forbidden(
                "System administrators cannot be changed here".to_string(),
            ));
        }

        profile.role = role;
        self.db.upsert_profile(&profile).await?;
        tracing::info!(%user_id, role = ?role, changed_by = %actor.id, "User role updated");
        Ok(profile)
    }

    // ─── Activity types ──────────────────────────────────────────

    /// Company-owned types plus global defaults, by name.
    pub async fn list_activity_types(&self, profile: &Profile) -> Result<Vec<ActivityType>> {
        let company_id = company_of(profile)?;
        Ok(self.db.list_activity_types(company_id).await?)
    }

    pub async fn create_activity_type(
        &self,
        actor: &Profile,
        input: ActivityTypeInput,
    ) -> Result<ActivityType> {
        let company_id = company_of(actor)?;
        self.authorizer
            .authorize(actor, Action::ManageActivityTypes { company_id })?;

        let points_per_unit = input
            .points_per_unit
            .map(scoring::validate_points_per_unit)
            .transpose()?;

        let activity_type = ActivityType {
            id: Uuid::new_v4(),
            name: required_name(&input.name)?,
            unit: input.unit,
            points_per_unit,
            company_id: Some(company_id),
            is_default: false,
            created_at: self.clock.now(),
        };
        self.db.upsert_activity_type(&activity_type).await?;

        tracing::info!(
            activity_type_id = %activity_type.id,
            %company_id,
            name = %activity_type.name,
            "Activity type created"
        );
        Ok(activity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(
            normalize_domain(Some(" @Acme.NO ".to_string())),
            Some("acme.no".to_string())
        );
        assert_eq!(normalize_domain(Some("  ".to_string())), None);
        assert_eq!(normalize_domain(None), None);
    }
}
