//! Company (tenant) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant. Owns every other tenant-scoped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    /// Email domain for automatic membership (e.g. "example.no")
    pub domain: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Company {
    /// Whether an email address belongs to this company's auto-join domain.
    pub fn matches_email(&self, email: &str) -> bool {
        let Some(domain) = self.domain.as_deref() else {
            return false;
        };
        match email.rsplit_once('@') {
            Some((_, email_domain)) => {
                self.is_active && email_domain.eq_ignore_ascii_case(domain.trim_start_matches('@'))
            }
            None => false,
        }
    }
}
