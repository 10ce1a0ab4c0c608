use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use tracing::info;

use crate::accounts::session::{self, Session};
use crate::applications::review::{change_status, review_applications, ReviewAccess, VIEW_DENIED};
use crate::dashboard::handlers::StatusQuery;
use crate::errors::AppError;
use crate::models::flash::Flash;
use crate::presentation::StatusFilter;
use crate::resumes::{content_type_for, sanitize_file_name};
use crate::state::AppState;
use crate::validation::StatusForm;
use crate::views::{html, JobView, ManageApplicationsPage, ReviewView};

/// GET /jobs/:job_id/applications/
pub async fn manage_applications(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(job_id): Path<i64>,
    Query(params): Query<StatusQuery>,
) -> Result<Response, AppError> {
    let filter = StatusFilter::parse(params.status.as_deref());
    let review =
        match review_applications(state.store.as_ref(), job_id, &session.user, filter).await? {
            ReviewAccess::Granted(review) => review,
            ReviewAccess::Denied => {
                session::flash(&state, &session, Flash::error(VIEW_DENIED)).await?;
                return Ok(Redirect::to(session::DEFAULT_LANDING).into_response());
            }
        };

    let chrome = session::chrome(state.store.as_ref(), Some(&session)).await?;
    let page = html(ManageApplicationsPage {
        chrome,
        job: JobView::from(&review.job),
        counts: review.counts,
        tabs: filter.tabs(),
        applications: review.applications.iter().map(ReviewView::from).collect(),
    })?;
    Ok(page.into_response())
}

/// POST /applications/:application_id/status/
pub async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(application_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let change = change_status(
        state.store.as_ref(),
        application_id,
        &session.user,
        form.status.as_deref(),
    )
    .await?;
    for flash in change.flashes() {
        session::flash(&state, &session, flash).await?;
    }
    Ok(Redirect::to(&change.redirect_to()))
}

/// GET /applications/:application_id/status/
pub async fn status_redirect() -> Redirect {
    Redirect::to(session::DEFAULT_LANDING)
}

/// GET /applications/:application_id/resume/
///
/// Served to the job's owner and to the applicant; everyone else gets a 404.
pub async fn download_resume(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(application_id): Path<i64>,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("Resume for application {application_id}"));

    let application = state
        .store
        .find_application(application_id)
        .await?
        .ok_or_else(not_found)?;
    let job = state
        .store
        .find_job(application.job_id)
        .await?
        .ok_or_else(not_found)?;
    let viewer = session.user.id;
    if viewer != job.posted_by && viewer != application.applicant_id {
        return Err(not_found());
    }

    let content = state.resumes.load(&application.resume_path).await?;
    info!(
        "Resume for application {} downloaded by {}",
        application.id, session.user.username
    );
    let headers = [
        (
            header::CONTENT_TYPE,
            content_type_for(&application.resume_name).to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                sanitize_file_name(&application.resume_name)
            ),
        ),
    ];
    Ok((headers, content).into_response())
}
