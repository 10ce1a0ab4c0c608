use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Freelance,
        JobType::Internship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Freelance => "freelance",
            JobType::Internship => "internship",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full Time",
            JobType::PartTime => "Part Time",
            JobType::Contract => "Contract",
            JobType::Freelance => "Freelance",
            JobType::Internship => "Internship",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: String,
    pub description: String,
    pub requirements: String,
    pub benefits: String,
    pub posted_by: i64,
    pub created_at: DateTime<Utc>,
}

/// The writable columns of a job posting. `posted_by` and `created_at` are
/// owned by the store and never travel through here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFields {
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: String,
    pub description: String,
    pub requirements: String,
    pub benefits: String,
}

impl From<&Job> for JobFields {
    fn from(job: &Job) -> Self {
        JobFields {
            title: job.title.clone(),
            company_name: job.company_name.clone(),
            location: job.location.clone(),
            job_type: job.job_type,
            salary: job.salary.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            benefits: job.benefits.clone(),
        }
    }
}
