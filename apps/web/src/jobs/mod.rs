//! Job postings: public listing and search, employer create/edit, and the
//! detail page where applicants submit applications.

pub mod applying;
pub mod handlers;
pub mod listing;
pub mod posting;

use crate::errors::AppError;
use crate::models::job::Job;
use crate::store::Store;

pub async fn find_job_or_404(store: &dyn Store, job_id: i64) -> Result<Job, AppError> {
    store
        .find_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}
