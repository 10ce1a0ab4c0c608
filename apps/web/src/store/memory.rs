use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationStatus, ApplicationWithApplicant, ApplicationWithJob, NewApplication,
};
use crate::models::flash::Flash;
use crate::models::job::{Job, JobFields};
use crate::models::user::{NewUser, User};
use crate::store::Store;

/// In-memory `Store` for tests. Mirrors the PostgreSQL constraints that the
/// handlers rely on: unique username, unique email, unique (job, applicant).
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    sessions: HashMap<Uuid, i64>,
    flashes: Vec<(Uuid, Flash)>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn job(&self, id: i64) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    fn matching_jobs(&self, query: Option<&str>) -> Vec<Job> {
        let needle = query.map(str::to_lowercase);
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|job| match &needle {
                None => true,
                Some(n) => [&job.title, &job.company_name, &job.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(n.as_str())),
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        jobs
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store poisoned")
    }

    /// Overrides a job's creation time.
    pub fn set_job_created_at(&self, job_id: i64, created_at: DateTime<Utc>) {
        if let Some(job) = self.lock().jobs.iter_mut().find(|j| j.id == job_id) {
            job.created_at = created_at;
        }
    }

    /// Overrides an application's submission time.
    pub fn set_applied_at(&self, application_id: i64, applied_at: DateTime<Utc>) {
        if let Some(app) = self
            .lock()
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
        {
            app.applied_at = applied_at;
        }
    }

    pub fn user_count_with_email(&self, email: &str) -> usize {
        self.lock().users.iter().filter(|u| u.email == email).count()
    }

    pub fn application_count(&self) -> usize {
        self.lock().applications.len()
    }

    pub fn pending_flashes(&self, token: Uuid) -> Vec<Flash> {
        self.lock()
            .flashes
            .iter()
            .filter(|(t, _)| *t == token)
            .map(|(_, f)| f.clone())
            .collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("users_username_key".into()));
        }
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("users_email_key".into()));
        }
        let created = User {
            id: inner.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.lock().users.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.lock().users.iter().any(|u| u.email == email))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_session(&self, user_id: i64) -> Result<Uuid, AppError> {
        let token = Uuid::new_v4();
        self.lock().sessions.insert(token, user_id);
        Ok(token)
    }

    async fn session_user(&self, token: Uuid) -> Result<Option<User>, AppError> {
        let inner = self.lock();
        Ok(inner
            .sessions
            .get(&token)
            .and_then(|id| inner.user(*id))
            .cloned())
    }

    async fn delete_session(&self, token: Uuid) -> Result<(), AppError> {
        let mut inner = self.lock();
        inner.sessions.remove(&token);
        inner.flashes.retain(|(t, _)| *t != token);
        Ok(())
    }

    async fn push_flash(&self, token: Uuid, flash: &Flash) -> Result<(), AppError> {
        self.lock().flashes.push((token, flash.clone()));
        Ok(())
    }

    async fn take_flashes(&self, token: Uuid) -> Result<Vec<Flash>, AppError> {
        let mut inner = self.lock();
        let (taken, kept): (Vec<_>, Vec<_>) = inner
            .flashes
            .drain(..)
            .partition(|(t, _)| *t == token);
        inner.flashes = kept;
        Ok(taken.into_iter().map(|(_, f)| f).collect())
    }

    async fn insert_job(&self, posted_by: i64, fields: &JobFields) -> Result<Job, AppError> {
        let mut inner = self.lock();
        let job = Job {
            id: inner.next_id(),
            title: fields.title.clone(),
            company_name: fields.company_name.clone(),
            location: fields.location.clone(),
            job_type: fields.job_type,
            salary: fields.salary.clone(),
            description: fields.description.clone(),
            requirements: fields.requirements.clone(),
            benefits: fields.benefits.clone(),
            posted_by,
            created_at: Utc::now(),
        };
        inner.jobs.push(job.clone());
        Ok(job)
    }

    async fn update_job(
        &self,
        job_id: i64,
        owner_id: i64,
        fields: &JobFields,
    ) -> Result<Job, AppError> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.posted_by == owner_id)
            .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
        job.title = fields.title.clone();
        job.company_name = fields.company_name.clone();
        job.location = fields.location.clone();
        job.job_type = fields.job_type;
        job.salary = fields.salary.clone();
        job.description = fields.description.clone();
        job.requirements = fields.requirements.clone();
        job.benefits = fields.benefits.clone();
        Ok(job.clone())
    }

    async fn find_job(&self, job_id: i64) -> Result<Option<Job>, AppError> {
        Ok(self.lock().job(job_id).cloned())
    }

    async fn find_owned_job(&self, job_id: i64, owner_id: i64) -> Result<Option<Job>, AppError> {
        Ok(self
            .lock()
            .job(job_id)
            .filter(|j| j.posted_by == owner_id)
            .cloned())
    }

    async fn count_jobs(&self, query: Option<&str>) -> Result<i64, AppError> {
        Ok(self.lock().matching_jobs(query).len() as i64)
    }

    async fn search_jobs(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, AppError> {
        Ok(self
            .lock()
            .matching_jobs(query)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn jobs_posted_by(&self, owner_id: i64) -> Result<Vec<Job>, AppError> {
        let mut jobs: Vec<Job> = self
            .lock()
            .jobs
            .iter()
            .filter(|j| j.posted_by == owner_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }

    async fn count_applications(
        &self,
        job_id: i64,
        status: Option<ApplicationStatus>,
    ) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .applications
            .iter()
            .filter(|a| a.job_id == job_id && status.map_or(true, |s| a.status == s))
            .count() as i64)
    }

    async fn has_applied(&self, job_id: i64, applicant_id: i64) -> Result<bool, AppError> {
        Ok(self
            .lock()
            .applications
            .iter()
            .any(|a| a.job_id == job_id && a.applicant_id == applicant_id))
    }

    async fn insert_application(
        &self,
        application: &NewApplication,
    ) -> Result<Application, AppError> {
        let mut inner = self.lock();
        if inner
            .applications
            .iter()
            .any(|a| a.job_id == application.job_id && a.applicant_id == application.applicant_id)
        {
            return Err(AppError::Conflict("applications_job_applicant_key".into()));
        }
        let created = Application {
            id: inner.next_id(),
            job_id: application.job_id,
            applicant_id: application.applicant_id,
            resume_path: application.resume_path.clone(),
            resume_name: application.resume_name.clone(),
            cover_letter: application.cover_letter.clone(),
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        };
        inner.applications.push(created.clone());
        Ok(created)
    }

    async fn find_application(
        &self,
        application_id: i64,
    ) -> Result<Option<Application>, AppError> {
        Ok(self
            .lock()
            .applications
            .iter()
            .find(|a| a.id == application_id)
            .cloned())
    }

    async fn applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<ApplicationWithApplicant>, AppError> {
        let inner = self.lock();
        let mut rows: Vec<ApplicationWithApplicant> = inner
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .filter_map(|a| {
                inner.user(a.applicant_id).map(|u| ApplicationWithApplicant {
                    application: a.clone(),
                    applicant_username: u.username.clone(),
                    applicant_email: u.email.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.application
                .applied_at
                .cmp(&a.application.applied_at)
                .then(b.application.id.cmp(&a.application.id))
        });
        Ok(rows)
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: i64,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithJob>, AppError> {
        let inner = self.lock();
        let mut rows: Vec<ApplicationWithJob> = inner
            .applications
            .iter()
            .filter(|a| a.applicant_id == applicant_id)
            .filter(|a| status.map_or(true, |s| a.status == s))
            .filter_map(|a| {
                inner.job(a.job_id).map(|j| ApplicationWithJob {
                    application: a.clone(),
                    job_title: j.title.clone(),
                    company_name: j.company_name.clone(),
                    location: j.location.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.application
                .applied_at
                .cmp(&a.application.applied_at)
                .then(b.application.id.cmp(&a.application.id))
        });
        Ok(rows)
    }

    async fn set_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        let app = inner
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
        app.status = status;
        Ok(())
    }
}
