use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use serde::Deserialize;

use crate::accounts::session::{self, Session};
use crate::dashboard::{applicant_overview, employer_overview};
use crate::errors::AppError;
use crate::presentation::{display_date, StatusFilter};
use crate::state::AppState;
use crate::views::{
    html, ApplicantDashboardPage, EmployerDashboardPage, JobSummaryView, SubmittedView,
};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// GET /dashboard/
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<StatusQuery>,
) -> Result<Html<String>, AppError> {
    let store = state.store.as_ref();

    if session.user.is_employer() {
        let jobs = employer_overview(store, session.user.id)
            .await?
            .into_iter()
            .map(|(job, counts)| JobSummaryView {
                id: job.id,
                posted: display_date(job.created_at),
                title: job.title,
                company_name: job.company_name,
                location: job.location,
                counts,
            })
            .collect();
        let chrome = session::chrome(store, Some(&session)).await?;
        return html(EmployerDashboardPage { chrome, jobs });
    }

    let filter = StatusFilter::parse(params.status.as_deref());
    let applications = applicant_overview(store, session.user.id, filter).await?;
    let chrome = session::chrome(store, Some(&session)).await?;
    html(ApplicantDashboardPage {
        chrome,
        tabs: filter.tabs(),
        applications: applications.iter().map(SubmittedView::from).collect(),
    })
}
