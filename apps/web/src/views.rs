//! Page templates and the flat view models they render.

use askama::Template;
use axum::response::Html;

use crate::errors::AppError;
use crate::models::application::{ApplicationWithApplicant, ApplicationWithJob};
use crate::models::flash::Flash;
use crate::models::job::Job;
use crate::models::user::User;
use crate::presentation::{display_date, StatusCounts};

/// Navigation state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
    pub is_employer: bool,
}

impl Nav {
    pub fn for_user(user: Option<&User>) -> Self {
        match user {
            Some(user) => Nav {
                signed_in: true,
                username: user.username.clone(),
                is_employer: user.is_employer(),
            },
            None => Nav::default(),
        }
    }
}

/// Everything `base.html` needs besides the page body.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    pub nav: Nav,
    pub flashes: Vec<Flash>,
}

/// A status filter tab (`?status=`).
#[derive(Debug, Clone)]
pub struct FilterTab {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JobCard {
    pub id: i64,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: &'static str,
    pub salary: String,
    pub posted: String,
    pub is_new: bool,
}

impl JobCard {
    pub fn new(job: &Job, is_new: bool) -> Self {
        JobCard {
            id: job.id,
            title: job.title.clone(),
            company_name: job.company_name.clone(),
            location: job.location.clone(),
            job_type: job.job_type.label(),
            salary: job.salary.clone(),
            posted: display_date(job.created_at),
            is_new,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub number: i64,
    pub num_pages: i64,
    pub previous_href: String,
    pub next_href: String,
}

#[derive(Template)]
#[template(path = "jobs/list.html")]
pub struct JobListPage {
    pub chrome: Chrome,
    pub jobs: Vec<JobCard>,
    pub query: String,
    pub total: i64,
    pub pages: PageLinks,
}

#[derive(Debug, Clone)]
pub struct JobView {
    pub id: i64,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub job_type: &'static str,
    pub salary: String,
    pub description: String,
    pub requirements: String,
    pub benefits: String,
    pub posted: String,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        JobView {
            id: job.id,
            title: job.title.clone(),
            company_name: job.company_name.clone(),
            location: job.location.clone(),
            job_type: job.job_type.label(),
            salary: job.salary.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            benefits: job.benefits.clone(),
            posted: display_date(job.created_at),
        }
    }
}

#[derive(Template)]
#[template(path = "jobs/detail.html")]
pub struct JobDetailPage {
    pub chrome: Chrome,
    pub job: JobView,
    pub has_applied: bool,
    pub is_owner: bool,
    /// Rendered application form fields; empty when no form is offered.
    pub form_fields: Vec<String>,
}

#[derive(Template)]
#[template(path = "jobs/post.html")]
pub struct PostJobPage {
    pub chrome: Chrome,
    /// Set when editing; the form posts back to `?edit=<id>`.
    pub editing: bool,
    pub job_id: i64,
    pub fields: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Accounts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "accounts/register.html")]
pub struct RegisterPage {
    pub chrome: Chrome,
    pub fields: Vec<String>,
}

#[derive(Template)]
#[template(path = "accounts/login.html")]
pub struct LoginPage {
    pub chrome: Chrome,
    pub fields: Vec<String>,
    /// Authentication failure message; empty when there is none.
    pub error: String,
    pub next: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Dashboards
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JobSummaryView {
    pub id: i64,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub posted: String,
    pub counts: StatusCounts,
}

#[derive(Template)]
#[template(path = "dashboard/employer.html")]
pub struct EmployerDashboardPage {
    pub chrome: Chrome,
    pub jobs: Vec<JobSummaryView>,
}

#[derive(Debug, Clone)]
pub struct SubmittedView {
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub applied: String,
}

impl From<&ApplicationWithJob> for SubmittedView {
    fn from(row: &ApplicationWithJob) -> Self {
        SubmittedView {
            job_id: row.application.job_id,
            job_title: row.job_title.clone(),
            company_name: row.company_name.clone(),
            location: row.location.clone(),
            status: row.application.status.as_str(),
            status_label: row.application.status.label(),
            applied: display_date(row.application.applied_at),
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard/applicant.html")]
pub struct ApplicantDashboardPage {
    pub chrome: Chrome,
    pub tabs: Vec<FilterTab>,
    pub applications: Vec<SubmittedView>,
}

// ────────────────────────────────────────────────────────────────────────────
// Application review
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReviewView {
    pub id: i64,
    pub applicant_username: String,
    pub applicant_email: String,
    pub cover_letter: String,
    pub resume_name: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub is_pending: bool,
    pub applied: String,
}

impl From<&ApplicationWithApplicant> for ReviewView {
    fn from(row: &ApplicationWithApplicant) -> Self {
        let status = row.application.status;
        ReviewView {
            id: row.application.id,
            applicant_username: row.applicant_username.clone(),
            applicant_email: row.applicant_email.clone(),
            cover_letter: row.application.cover_letter.clone(),
            resume_name: row.application.resume_name.clone(),
            status: status.as_str(),
            status_label: status.label(),
            is_pending: status.review_priority() == 0,
            applied: display_date(row.application.applied_at),
        }
    }
}

#[derive(Template)]
#[template(path = "applications/manage.html")]
pub struct ManageApplicationsPage {
    pub chrome: Chrome,
    pub job: JobView,
    pub counts: StatusCounts,
    pub tabs: Vec<FilterTab>,
    pub applications: Vec<ReviewView>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub chrome: Chrome,
    pub status: u16,
    pub title: String,
    pub message: String,
}

impl ErrorPage {
    pub fn new(status: u16, title: &str, message: String) -> Self {
        ErrorPage {
            chrome: Chrome::default(),
            status,
            title: title.to_string(),
            message,
        }
    }
}

/// Renders a page into an HTML response body.
pub fn html<T: Template>(page: T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}
