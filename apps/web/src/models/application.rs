use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Strict parse against the allow-list; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Review ordering key: undecided applications sort ahead of decided ones.
    pub fn review_priority(self) -> u8 {
        match self {
            ApplicationStatus::Pending => 0,
            ApplicationStatus::Approved | ApplicationStatus::Rejected => 1,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub applicant_id: i64,
    pub resume_path: String,
    pub resume_name: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// An application joined with the applicant's identity, as the job owner sees it.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationWithApplicant {
    #[sqlx(flatten)]
    pub application: Application,
    pub applicant_username: String,
    pub applicant_email: String,
}

/// An application joined with its job, as the applicant sees it.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationWithJob {
    #[sqlx(flatten)]
    pub application: Application,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: i64,
    pub applicant_id: i64,
    pub resume_path: String,
    pub resume_name: String,
    pub cover_letter: String,
}
