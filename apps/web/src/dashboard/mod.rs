//! Role-specific landing page after login.

pub mod handlers;

use crate::errors::AppError;
use crate::models::application::{ApplicationStatus, ApplicationWithJob};
use crate::models::job::Job;
use crate::presentation::{StatusCounts, StatusFilter};
use crate::store::Store;

/// An employer's postings, newest first, each with per-status counts.
pub async fn employer_overview(
    store: &dyn Store,
    owner_id: i64,
) -> Result<Vec<(Job, StatusCounts)>, AppError> {
    let jobs = store.jobs_posted_by(owner_id).await?;
    let mut overview = Vec::with_capacity(jobs.len());
    for job in jobs {
        // One aggregate query per figure.
        let counts = StatusCounts {
            total: store.count_applications(job.id, None).await?,
            pending: store
                .count_applications(job.id, Some(ApplicationStatus::Pending))
                .await?,
            approved: store
                .count_applications(job.id, Some(ApplicationStatus::Approved))
                .await?,
            rejected: store
                .count_applications(job.id, Some(ApplicationStatus::Rejected))
                .await?,
        };
        overview.push((job, counts));
    }
    Ok(overview)
}

/// An applicant's own applications, newest first.
pub async fn applicant_overview(
    store: &dyn Store,
    applicant_id: i64,
    filter: StatusFilter,
) -> Result<Vec<ApplicationWithJob>, AppError> {
    store
        .applications_by_applicant(applicant_id, filter.status())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::NewApplication;
    use crate::models::job::JobFields;
    use crate::models::user::{NewUser, Role, User};
    use crate::store::memory::MemoryStore;
    use chrono::{Duration, Utc};

    async fn user(store: &MemoryStore, name: &str, role: Role) -> User {
        store
            .create_user(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
                password_hash: "x".into(),
                role,
            })
            .await
            .unwrap()
    }

    async fn job(store: &MemoryStore, owner: &User, title: &str) -> Job {
        store
            .insert_job(
                owner.id,
                &JobFields {
                    title: title.into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    async fn apply(store: &MemoryStore, job_id: i64, applicant: &User) -> i64 {
        store
            .insert_application(&NewApplication {
                job_id,
                applicant_id: applicant.id,
                resume_path: "resumes/x_cv.pdf".into(),
                resume_name: "cv.pdf".into(),
                cover_letter: "c".repeat(60),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_employer_overview_counts() {
        let store = MemoryStore::new();
        let employer = user(&store, "acme", Role::Employer).await;
        let first = job(&store, &employer, "Backend Engineer").await;
        let second = job(&store, &employer, "Frontend Engineer").await;
        store.set_job_created_at(first.id, Utc::now() - Duration::days(2));

        for name in ["a", "b", "c"] {
            let applicant = user(&store, name, Role::Applicant).await;
            let id = apply(&store, first.id, &applicant).await;
            if name == "a" {
                store
                    .set_application_status(id, ApplicationStatus::Approved)
                    .await
                    .unwrap();
            }
        }

        let overview = employer_overview(&store, employer.id).await.unwrap();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].0.id, second.id);
        assert_eq!(overview[0].1, StatusCounts::default());
        assert_eq!(
            overview[1].1,
            StatusCounts {
                total: 3,
                pending: 2,
                approved: 1,
                rejected: 0
            }
        );
    }

    #[tokio::test]
    async fn test_applicant_overview_filters_by_status() {
        let store = MemoryStore::new();
        let employer = user(&store, "acme", Role::Employer).await;
        let applicant = user(&store, "ada", Role::Applicant).await;
        let first = job(&store, &employer, "Backend Engineer").await;
        let second = job(&store, &employer, "Frontend Engineer").await;
        let approved = apply(&store, first.id, &applicant).await;
        apply(&store, second.id, &applicant).await;
        store
            .set_application_status(approved, ApplicationStatus::Approved)
            .await
            .unwrap();

        let all = applicant_overview(&store, applicant.id, StatusFilter::All)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let only = applicant_overview(&store, applicant.id, StatusFilter::parse(Some("approved")))
            .await
            .unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].job_title, "Backend Engineer");

        let unknown = applicant_overview(&store, applicant.id, StatusFilter::parse(Some("archived")))
            .await
            .unwrap();
        assert_eq!(unknown.len(), 2);
    }
}
