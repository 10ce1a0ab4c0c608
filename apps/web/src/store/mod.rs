//! Persistence seam. Handlers talk to `dyn Store`; production wires in
//! `PgStore`, tests wire in the in-memory `MemoryStore`.
//!
//! Every method is a single storage round trip. Nothing here wraps calls in a
//! transaction: a read followed by a write (status updates, the "already
//! applied" check) is last-write-wins. The duplicate-application case is
//! closed by the `(job_id, applicant_id)` uniqueness constraint instead, which
//! surfaces as `AppError::Conflict`.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationStatus, ApplicationWithApplicant, ApplicationWithJob, NewApplication,
};
use crate::models::flash::Flash;
use crate::models::job::{Job, JobFields};
use crate::models::user::{NewUser, User};

pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    // ── users ───────────────────────────────────────────────────────────────

    /// Fails with `AppError::Conflict(<constraint>)` if the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    // ── sessions & flash messages ───────────────────────────────────────────

    async fn create_session(&self, user_id: i64) -> Result<Uuid, AppError>;
    async fn session_user(&self, token: Uuid) -> Result<Option<User>, AppError>;
    async fn delete_session(&self, token: Uuid) -> Result<(), AppError>;
    async fn push_flash(&self, token: Uuid, flash: &Flash) -> Result<(), AppError>;
    /// Returns the session's pending flashes in insertion order and deletes them.
    async fn take_flashes(&self, token: Uuid) -> Result<Vec<Flash>, AppError>;

    // ── jobs ────────────────────────────────────────────────────────────────

    async fn insert_job(&self, posted_by: i64, fields: &JobFields) -> Result<Job, AppError>;
    /// Updates a job only if `owner_id` posted it; `AppError::NotFound` otherwise.
    async fn update_job(
        &self,
        job_id: i64,
        owner_id: i64,
        fields: &JobFields,
    ) -> Result<Job, AppError>;
    async fn find_job(&self, job_id: i64) -> Result<Option<Job>, AppError>;
    async fn find_owned_job(&self, job_id: i64, owner_id: i64) -> Result<Option<Job>, AppError>;
    /// Number of jobs matching the optional search query.
    async fn count_jobs(&self, query: Option<&str>) -> Result<i64, AppError>;
    /// One page of matching jobs, newest first.
    async fn search_jobs(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, AppError>;
    async fn jobs_posted_by(&self, owner_id: i64) -> Result<Vec<Job>, AppError>;

    // ── applications ────────────────────────────────────────────────────────

    async fn count_applications(
        &self,
        job_id: i64,
        status: Option<ApplicationStatus>,
    ) -> Result<i64, AppError>;
    async fn has_applied(&self, job_id: i64, applicant_id: i64) -> Result<bool, AppError>;
    /// Fails with `AppError::Conflict` if the applicant already applied to the job.
    async fn insert_application(
        &self,
        application: &NewApplication,
    ) -> Result<Application, AppError>;
    async fn find_application(&self, application_id: i64)
        -> Result<Option<Application>, AppError>;
    /// All applications for a job, most recent first.
    async fn applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<ApplicationWithApplicant>, AppError>;
    /// An applicant's own applications, most recent first.
    async fn applications_by_applicant(
        &self,
        applicant_id: i64,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithJob>, AppError>;
    async fn set_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<(), AppError>;
}

/// Builds an `ILIKE` pattern that matches `query` as a literal substring.
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
