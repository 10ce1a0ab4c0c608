use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::accounts::session::{self, Session};
use crate::errors::AppError;
use crate::jobs::applying::{
    application_fields, check_eligibility, read_application_form, submit_application,
    ApplyOutcome, Eligibility, ALREADY_APPLIED, APPLICANTS_ONLY, APPLICATION_SUBMITTED,
};
use crate::jobs::find_job_or_404;
use crate::jobs::listing::{self, page_href};
use crate::jobs::posting::{
    job_fields, load_job_for_edit, parse_edit_id, rejected_job_fields, save_job, JOB_POSTED,
    JOB_UPDATED,
};
use crate::models::flash::Flash;
use crate::models::job::Job;
use crate::presentation::{render_fields, FormField};
use crate::state::AppState;
use crate::validation::{FormErrors, JobForm, Submission};
use crate::views::{html, JobCard, JobDetailPage, JobListPage, JobView, PageLinks, PostJobPage};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<String>,
}

/// GET / and GET /jobs/
pub async fn list_jobs(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    Query(params): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let listing = listing::list_jobs(
        state.store.as_ref(),
        params.q.as_deref(),
        params.page.as_deref(),
        Utc::now(),
    )
    .await?;

    let pages = PageLinks {
        number: listing.page.number,
        num_pages: listing.page.num_pages,
        previous_href: listing
            .page
            .previous()
            .map(|n| page_href(n, &listing.query))
            .unwrap_or_default(),
        next_href: listing
            .page
            .next()
            .map(|n| page_href(n, &listing.query))
            .unwrap_or_default(),
    };
    let chrome = session::chrome(state.store.as_ref(), session.as_deref()).await?;
    html(JobListPage {
        chrome,
        jobs: listing
            .jobs
            .iter()
            .map(|(job, fresh)| JobCard::new(job, *fresh))
            .collect(),
        query: listing.query,
        total: listing.total,
        pages,
    })
}

#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub edit: Option<String>,
}

async fn render_post_page(
    state: &AppState,
    session: &Session,
    editing: Option<&Job>,
    fields: &[FormField],
) -> Result<Response, AppError> {
    let chrome = session::chrome(state.store.as_ref(), Some(session)).await?;
    let page = html(PostJobPage {
        chrome,
        editing: editing.is_some(),
        job_id: editing.map(|j| j.id).unwrap_or_default(),
        fields: render_fields(fields)?,
    })?;
    Ok(page.into_response())
}

/// GET /jobs/post/ (`?edit=<id>`)
pub async fn post_job_form(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<EditQuery>,
) -> Result<Response, AppError> {
    if !session.user.is_employer() {
        return Ok(Redirect::to(session::DEFAULT_LANDING).into_response());
    }
    let edit_id = parse_edit_id(params.edit.as_deref())?;
    let existing = load_job_for_edit(state.store.as_ref(), edit_id, &session.user).await?;
    render_post_page(
        &state,
        &session,
        existing.as_ref(),
        &job_fields(existing.as_ref()),
    )
    .await
}

/// POST /jobs/post/ (`?edit=<id>`)
pub async fn post_job(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<EditQuery>,
    Form(form): Form<JobForm>,
) -> Result<Response, AppError> {
    if !session.user.is_employer() {
        return Ok(Redirect::to(session::DEFAULT_LANDING).into_response());
    }
    let edit_id = parse_edit_id(params.edit.as_deref())?;
    let existing = load_job_for_edit(state.store.as_ref(), edit_id, &session.user).await?;

    match save_job(
        state.store.as_ref(),
        &session.user,
        existing.as_ref(),
        form.clone(),
    )
    .await?
    {
        Submission::Accepted(_) => {
            let message = if existing.is_some() {
                JOB_UPDATED
            } else {
                JOB_POSTED
            };
            session::flash(&state, &session, Flash::success(message)).await?;
            Ok(Redirect::to(session::DEFAULT_LANDING).into_response())
        }
        Submission::Rejected(errors) => {
            render_post_page(
                &state,
                &session,
                existing.as_ref(),
                &rejected_job_fields(&form, &errors),
            )
            .await
        }
    }
}

async fn render_detail_page(
    state: &AppState,
    session: &Session,
    job: &Job,
    form: Option<(&str, &FormErrors)>,
) -> Result<Response, AppError> {
    let has_applied = state.store.has_applied(job.id, session.user.id).await?;
    let no_errors = FormErrors::new();
    let form_fields = if session.user.is_applicant() && !has_applied {
        let (cover_letter, errors) = form.unwrap_or(("", &no_errors));
        render_fields(&application_fields(cover_letter, errors))?
    } else {
        Vec::new()
    };

    let chrome = session::chrome(state.store.as_ref(), Some(session)).await?;
    let page = html(JobDetailPage {
        chrome,
        job: JobView::from(job),
        has_applied,
        is_owner: job.posted_by == session.user.id,
        form_fields,
    })?;
    Ok(page.into_response())
}

/// GET /jobs/:job_id/
pub async fn job_detail(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(job_id): Path<i64>,
) -> Result<Response, AppError> {
    let job = find_job_or_404(state.store.as_ref(), job_id).await?;
    render_detail_page(&state, &session, &job, None).await
}

/// POST /jobs/:job_id/
pub async fn apply(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(job_id): Path<i64>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let job = find_job_or_404(state.store.as_ref(), job_id).await?;

    match check_eligibility(state.store.as_ref(), job.id, &session.user).await? {
        Eligibility::NotApplicant => {
            warn!(
                "{} tried to apply to job {} without an applicant account",
                session.user.username, job.id
            );
            session::flash(&state, &session, Flash::error(APPLICANTS_ONLY)).await?;
            return Ok(Redirect::to(&format!("/jobs/{}/", job.id)).into_response());
        }
        Eligibility::AlreadyApplied => {
            session::flash(&state, &session, Flash::error(ALREADY_APPLIED)).await?;
            return Ok(Redirect::to("/jobs/").into_response());
        }
        Eligibility::Eligible => {}
    }

    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let form = read_application_form(multipart).await?;
    let cover_letter = form.cover_letter.clone();
    let outcome = submit_application(
        state.store.as_ref(),
        state.resumes.as_ref(),
        job.id,
        &session.user,
        form,
    )
    .await?;

    match outcome {
        ApplyOutcome::Submitted(_) => {
            session::flash(&state, &session, Flash::success(APPLICATION_SUBMITTED)).await?;
            Ok(Redirect::to(session::DEFAULT_LANDING).into_response())
        }
        ApplyOutcome::AlreadyApplied => {
            session::flash(&state, &session, Flash::error(ALREADY_APPLIED)).await?;
            Ok(Redirect::to("/jobs/").into_response())
        }
        ApplyOutcome::Rejected(errors) => {
            render_detail_page(&state, &session, &job, Some((&cover_letter, &errors))).await
        }
    }
}
