use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role, fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Applicant,
}

impl Role {
    /// Maps the registration form's "register as employer" choice onto a role.
    pub fn from_employer_choice(is_employer: bool) -> Self {
        if is_employer {
            Role::Employer
        } else {
            Role::Applicant
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_employer(&self) -> bool {
        self.role == Role::Employer
    }

    pub fn is_applicant(&self) -> bool {
        self.role == Role::Applicant
    }
}

/// Insert payload for a freshly registered account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
