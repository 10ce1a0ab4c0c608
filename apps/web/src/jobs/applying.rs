use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::application::{Application, NewApplication};
use crate::models::user::User;
use crate::presentation::{FormField, TEXTAREA_CLASS};
use crate::resumes::ResumeStore;
use crate::store::Store;
use crate::validation::{ApplicationForm, FormErrors, UploadedResume, MAX_RESUME_BYTES};

pub const APPLICANTS_ONLY: &str = "Only applicants can apply for jobs.";
pub const ALREADY_APPLIED: &str = "You have already applied for this position.";
pub const APPLICATION_SUBMITTED: &str = "Application submitted successfully!";

/// Longest cover letter read from an upload; anything past it is dropped.
pub const MAX_COVER_LETTER_BYTES: usize = 1024 * 1024;

/// Whether a user may submit an application to a job at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    NotApplicant,
    AlreadyApplied,
}

pub async fn check_eligibility(
    store: &dyn Store,
    job_id: i64,
    user: &User,
) -> Result<Eligibility, AppError> {
    if !user.is_applicant() {
        return Ok(Eligibility::NotApplicant);
    }
    if store.has_applied(job_id, user.id).await? {
        return Ok(Eligibility::AlreadyApplied);
    }
    Ok(Eligibility::Eligible)
}

#[derive(Debug)]
pub enum ApplyOutcome {
    Submitted(Application),
    AlreadyApplied,
    Rejected(FormErrors),
}

/// Validates the submission, stores the résumé and records the application.
/// Nothing is written when validation fails.
pub async fn submit_application(
    store: &dyn Store,
    resumes: &dyn ResumeStore,
    job_id: i64,
    applicant: &User,
    form: ApplicationForm,
) -> Result<ApplyOutcome, AppError> {
    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return Ok(ApplyOutcome::Rejected(errors)),
    };

    let resume_path = resumes
        .save(&input.resume.file_name, input.resume.content)
        .await?;
    let inserted = store
        .insert_application(&NewApplication {
            job_id,
            applicant_id: applicant.id,
            resume_path: resume_path.clone(),
            resume_name: input.resume.file_name,
            cover_letter: input.cover_letter,
        })
        .await;

    match inserted {
        Ok(application) => {
            info!(
                "Application {} submitted by {} for job {}",
                application.id, applicant.username, job_id
            );
            Ok(ApplyOutcome::Submitted(application))
        }
        Err(AppError::Conflict(_)) => {
            warn!(
                "Duplicate application by {} for job {}",
                applicant.username, job_id
            );
            discard_resume(resumes, &resume_path).await;
            Ok(ApplyOutcome::AlreadyApplied)
        }
        Err(e) => {
            discard_resume(resumes, &resume_path).await;
            Err(e)
        }
    }
}

/// Best-effort removal of a résumé that no application points to.
async fn discard_resume(resumes: &dyn ResumeStore, resume_path: &str) {
    if let Err(cleanup) = resumes.delete(resume_path).await {
        warn!("Could not remove orphaned resume {resume_path}: {cleanup}");
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed upload: {e}"))
}

/// Reads a whole part but keeps at most `keep` bytes of it.
async fn read_capped(field: &mut Field<'_>, keep: usize) -> Result<Bytes, AppError> {
    let mut kept = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        let room = keep.saturating_sub(kept.len());
        kept.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok(kept.freeze())
}

/// Reads the `resume` and `cover_letter` parts. A file part with no name or
/// no content counts as no file. At most one byte past the résumé size limit
/// is kept, which is enough for validation to reject it.
pub async fn read_application_form(mut multipart: Multipart) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content = read_capped(&mut field, MAX_RESUME_BYTES + 1).await?;
                if !file_name.is_empty() && !content.is_empty() {
                    form.resume = Some(UploadedResume { file_name, content });
                }
            }
            "cover_letter" => {
                let text = read_capped(&mut field, MAX_COVER_LETTER_BYTES).await?;
                form.cover_letter = String::from_utf8_lossy(&text).into_owned();
            }
            _ => {}
        }
    }
    Ok(form)
}

pub fn application_fields(cover_letter: &str, errors: &FormErrors) -> Vec<FormField> {
    vec![
        FormField::input("resume", "Resume (PDF or Word, max 5MB)", "file")
            .with_attr("accept", ".pdf,.doc,.docx")
            .with_errors(errors),
        FormField::textarea("cover_letter", "Cover letter", 6)
            .with_attr("class", TEXTAREA_CLASS)
            .with_attr(
                "placeholder",
                "Tell the employer why you are a good fit (at least 50 characters)",
            )
            .initial(cover_letter)
            .with_errors(errors),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobFields;
    use crate::models::user::{NewUser, Role};
    use crate::resumes::MemoryResumeStore;
    use crate::store::memory::MemoryStore;
    use crate::validation::{COVER_LETTER_TOO_SHORT, RESUME_BAD_FORMAT, RESUME_TOO_LARGE};

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

    async fn job(store: &MemoryStore, owner: &User) -> i64 {
        store
            .insert_job(
                owner.id,
                &JobFields {
                    title: "Backend Engineer".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    fn form(file_name: &str, size: usize, cover_letter: &str) -> ApplicationForm {
        ApplicationForm {
            resume: Some(UploadedResume {
                file_name: file_name.into(),
                content: Bytes::from(vec![b'%'; size]),
            }),
            cover_letter: cover_letter.into(),
        }
    }

    fn letter() -> String {
        "I have shipped production Rust services for five years.".into()
    }

    #[tokio::test]
    async fn test_eligibility() {
        let store = MemoryStore::new();
        let employer = user(&store, "acme", Role::Employer).await;
        let applicant = user(&store, "ada", Role::Applicant).await;
        let job_id = job(&store, &employer).await;

        assert_eq!(
            check_eligibility(&store, job_id, &employer).await.unwrap(),
            Eligibility::NotApplicant
        );
        assert_eq!(
            check_eligibility(&store, job_id, &applicant).await.unwrap(),
            Eligibility::Eligible
        );
    }

    #[tokio::test]
    async fn test_submit_then_blocked() {
        let store = MemoryStore::new();
        let resumes = MemoryResumeStore::default();
        let employer = user(&store, "acme", Role::Employer).await;
        let applicant = user(&store, "ada", Role::Applicant).await;
        let job_id = job(&store, &employer).await;

        let outcome = submit_application(
            &store,
            &resumes,
            job_id,
            &applicant,
            form("resume.pdf", 1024, &letter()),
        )
        .await
        .unwrap();
        let application = match outcome {
            ApplyOutcome::Submitted(application) => application,
            other => panic!("expected submission, got {other:?}"),
        };
        assert_eq!(application.resume_name, "resume.pdf");
        assert!(application.resume_path.starts_with("resumes/"));
        assert_eq!(resumes.len(), 1);

        assert_eq!(
            check_eligibility(&store, job_id, &applicant).await.unwrap(),
            Eligibility::AlreadyApplied
        );
    }

    #[tokio::test]
    async fn test_racing_duplicate_maps_to_already_applied() {
        let store = MemoryStore::new();
        let resumes = MemoryResumeStore::default();
        let employer = user(&store, "acme", Role::Employer).await;
        let applicant = user(&store, "ada", Role::Applicant).await;
        let job_id = job(&store, &employer).await;

        submit_application(&store, &resumes, job_id, &applicant, form("a.pdf", 10, &letter()))
            .await
            .unwrap();
        // Second submission skips the eligibility pre-check, as a concurrent request would.
        let outcome =
            submit_application(&store, &resumes, job_id, &applicant, form("b.pdf", 10, &letter()))
                .await
                .unwrap();
        assert!(matches!(outcome, ApplyOutcome::AlreadyApplied));
        assert_eq!(store.application_count(), 1);
        assert_eq!(resumes.len(), 1);
    }

    /// Saves and loads normally; every delete fails.
    #[derive(Default)]
    struct UndeletableResumes(MemoryResumeStore);

    #[async_trait::async_trait]
    impl ResumeStore for UndeletableResumes {
        async fn save(&self, file_name: &str, content: Bytes) -> Result<String, AppError> {
            self.0.save(file_name, content).await
        }

        async fn load(&self, key: &str) -> Result<Bytes, AppError> {
            self.0.load(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), AppError> {
            Err(AppError::Storage(format!("cannot delete {key}")))
        }
    }

    #[tokio::test]
    async fn test_racing_duplicate_survives_failed_cleanup() {
        let store = MemoryStore::new();
        let resumes = UndeletableResumes::default();
        let employer = user(&store, "acme", Role::Employer).await;
        let applicant = user(&store, "ada", Role::Applicant).await;
        let job_id = job(&store, &employer).await;

        submit_application(&store, &resumes, job_id, &applicant, form("a.pdf", 10, &letter()))
            .await
            .unwrap();
        let outcome =
            submit_application(&store, &resumes, job_id, &applicant, form("b.pdf", 10, &letter()))
                .await;
        assert!(matches!(outcome, Ok(ApplyOutcome::AlreadyApplied)));
        assert_eq!(store.application_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_submission_writes_nothing() {
        let store = MemoryStore::new();
        let resumes = MemoryResumeStore::default();
        let employer = user(&store, "acme", Role::Employer).await;
        let applicant = user(&store, "ada", Role::Applicant).await;
        let job_id = job(&store, &employer).await;

        let cases = [
            (form("photo.png", 10, &letter()), "resume", RESUME_BAD_FORMAT),
            (
                form("resume.pdf", 6 * 1024 * 1024, &letter()),
                "resume",
                RESUME_TOO_LARGE,
            ),
            (
                form("resume.pdf", 10, &"a".repeat(49)),
                "cover_letter",
                COVER_LETTER_TOO_SHORT,
            ),
        ];
        for (submission, field, message) in cases {
            let outcome = submit_application(&store, &resumes, job_id, &applicant, submission)
                .await
                .unwrap();
            match outcome {
                ApplyOutcome::Rejected(errors) => {
                    assert_eq!(errors.field(field), [message.to_string()])
                }
                other => panic!("expected rejection, got {other:?}"),
            }
        }
        assert_eq!(store.application_count(), 0);
        assert_eq!(resumes.len(), 0);
    }

    #[test]
    fn test_application_fields_keep_cover_letter() {
        let fields = application_fields("Dear team", &FormErrors::new());
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].value, "Dear team");
    }
}
