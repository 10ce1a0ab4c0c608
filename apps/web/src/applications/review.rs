use tracing::{info, warn};

use crate::errors::AppError;
use crate::jobs::find_job_or_404;
use crate::models::application::{ApplicationStatus, ApplicationWithApplicant};
use crate::models::flash::Flash;
use crate::models::job::Job;
use crate::models::user::User;
use crate::presentation::{StatusCounts, StatusFilter};
use crate::store::Store;

pub const VIEW_DENIED: &str = "You don't have permission to view these applications.";
pub const UPDATE_DENIED: &str = "You don't have permission to update this application.";
pub const INVALID_STATUS: &str = "Invalid status value";

/// Pending first, then most recent first.
pub fn sort_for_review(rows: &mut [ApplicationWithApplicant]) {
    rows.sort_by(|a, b| {
        let (a, b) = (&a.application, &b.application);
        a.status
            .review_priority()
            .cmp(&b.status.review_priority())
            .then_with(|| b.applied_at.cmp(&a.applied_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[derive(Debug)]
pub struct Review {
    pub job: Job,
    /// Counts over every application to the job, regardless of the filter.
    pub counts: StatusCounts,
    pub applications: Vec<ApplicationWithApplicant>,
}

#[derive(Debug)]
pub enum ReviewAccess {
    Granted(Review),
    Denied,
}

/// The owner's view of a job's applications.
pub async fn review_applications(
    store: &dyn Store,
    job_id: i64,
    viewer: &User,
    filter: StatusFilter,
) -> Result<ReviewAccess, AppError> {
    let job = find_job_or_404(store, job_id).await?;
    if job.posted_by != viewer.id {
        warn!(
            "{} denied access to applications for job {}",
            viewer.username, job.id
        );
        return Ok(ReviewAccess::Denied);
    }

    let all = store.applications_for_job(job.id).await?;
    let counts = StatusCounts::tally(&all);
    let mut applications = filter.apply(all);
    sort_for_review(&mut applications);

    Ok(ReviewAccess::Granted(Review {
        job,
        counts,
        applications,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Denied,
    Invalid {
        job_id: i64,
    },
    Updated {
        job_id: i64,
        previous: ApplicationStatus,
        current: ApplicationStatus,
    },
}

impl StatusChange {
    pub fn flashes(&self) -> Vec<Flash> {
        match self {
            StatusChange::Denied => vec![Flash::error(UPDATE_DENIED)],
            StatusChange::Invalid { .. } => vec![Flash::error(INVALID_STATUS)],
            StatusChange::Updated {
                previous, current, ..
            } => {
                let mut flashes = vec![Flash::success(match current {
                    ApplicationStatus::Approved => "Application approved successfully!",
                    ApplicationStatus::Rejected => "Application rejected.",
                    ApplicationStatus::Pending => "Application marked as pending.",
                })];
                if *previous == ApplicationStatus::Pending && *current != ApplicationStatus::Pending
                {
                    flashes.push(Flash::info(format!(
                        "The applicant will be notified that their application was {}.",
                        current.as_str()
                    )));
                }
                flashes
            }
        }
    }

    pub fn redirect_to(&self) -> String {
        match self {
            StatusChange::Denied => "/dashboard/".to_string(),
            StatusChange::Invalid { job_id } | StatusChange::Updated { job_id, .. } => {
                format!("/jobs/{job_id}/applications/")
            }
        }
    }
}

/// Sets an application's status. Any allowed status may follow any other.
pub async fn change_status(
    store: &dyn Store,
    application_id: i64,
    actor: &User,
    requested: Option<&str>,
) -> Result<StatusChange, AppError> {
    let application = store
        .find_application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;
    let job = find_job_or_404(store, application.job_id).await?;
    if job.posted_by != actor.id {
        warn!(
            "{} denied status change on application {}",
            actor.username, application_id
        );
        return Ok(StatusChange::Denied);
    }

    let Some(current) = requested.and_then(ApplicationStatus::parse) else {
        return Ok(StatusChange::Invalid { job_id: job.id });
    };
    store
        .set_application_status(application.id, current)
        .await?;
    info!(
        "Application {} moved from {} to {} by {}",
        application.id,
        application.status.as_str(),
        current.as_str(),
        actor.username
    );

    Ok(StatusChange::Updated {
        job_id: job.id,
        previous: application.status,
        current,
    })
}
