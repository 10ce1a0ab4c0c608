use tracing::info;

use crate::errors::AppError;
use crate::models::job::{Job, JobType};
use crate::models::user::User;
use crate::presentation::{FormField, INPUT_CLASS, TEXTAREA_CLASS};
use crate::store::Store;
use crate::validation::{FormErrors, JobForm, Submission};

pub const JOB_POSTED: &str = "Job posted successfully!";
pub const JOB_UPDATED: &str = "Job updated successfully!";

/// Parses `?edit=`. Blank means "create"; anything non-numeric is a 404.
pub fn parse_edit_id(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::NotFound(format!("Job {v} not found"))),
    }
}

/// The job being edited, scoped to its owner.
pub async fn load_job_for_edit(
    store: &dyn Store,
    edit_id: Option<i64>,
    owner: &User,
) -> Result<Option<Job>, AppError> {
    let Some(job_id) = edit_id else {
        return Ok(None);
    };
    store
        .find_owned_job(job_id, owner.id)
        .await?
        .map(Some)
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Creates a posting, or applies a partial update to `existing`.
pub async fn save_job(
    store: &dyn Store,
    owner: &User,
    existing: Option<&Job>,
    form: JobForm,
) -> Result<Submission<Job>, AppError> {
    let input = match form.clean() {
        Ok(input) => input,
        Err(errors) => return Ok(Submission::Rejected(errors)),
    };

    let job = match existing {
        Some(job) => {
            let fields = input.merged_over(job);
            let updated = store.update_job(job.id, owner.id, &fields).await?;
            info!("Job {} updated by {}", updated.id, owner.username);
            updated
        }
        None => {
            let created = store.insert_job(owner.id, &input.into_new_fields()).await?;
            info!("Job {} posted by {}", created.id, owner.username);
            created
        }
    };
    Ok(Submission::Accepted(job))
}

fn job_type_options() -> Vec<(String, String)> {
    JobType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), t.label().to_string()))
        .collect()
}

fn blank_fields() -> Vec<FormField> {
    vec![
        FormField::input("title", "Job title", "text")
            .with_attr("class", INPUT_CLASS)
            .with_attr("maxlength", "200"),
        FormField::input("company_name", "Company name", "text")
            .with_attr("class", INPUT_CLASS)
            .with_attr("maxlength", "200"),
        FormField::input("location", "Location", "text")
            .with_attr("class", INPUT_CLASS)
            .with_attr("maxlength", "200"),
        FormField::select("job_type", "Job type", job_type_options())
            .with_attr("class", INPUT_CLASS),
        FormField::input("salary", "Salary", "text")
            .with_attr("class", INPUT_CLASS)
            .with_attr("maxlength", "100"),
        FormField::textarea("description", "Description", 6).with_attr("class", TEXTAREA_CLASS),
        FormField::textarea("requirements", "Requirements", 4).with_attr("class", TEXTAREA_CLASS),
        FormField::textarea("benefits", "Benefits", 4).with_attr("class", TEXTAREA_CLASS),
    ]
}

/// The job form, prefilled with the stored values when editing.
pub fn job_fields(existing: Option<&Job>) -> Vec<FormField> {
    let fields = blank_fields();
    let Some(job) = existing else {
        return fields;
    };
    fields
        .into_iter()
        .map(|field| {
            let value = match field.name {
                "title" => job.title.as_str(),
                "company_name" => job.company_name.as_str(),
                "location" => job.location.as_str(),
                "job_type" => job.job_type.as_str(),
                "salary" => job.salary.as_str(),
                "description" => job.description.as_str(),
                "requirements" => job.requirements.as_str(),
                "benefits" => job.benefits.as_str(),
                _ => "",
            };
            field.with_value(value)
        })
        .collect()
}

/// The job form echoing a rejected submission with its errors.
pub fn rejected_job_fields(form: &JobForm, errors: &FormErrors) -> Vec<FormField> {
    blank_fields()
        .into_iter()
        .map(|field| {
            let submitted = match field.name {
                "title" => form.title.as_deref(),
                "company_name" => form.company_name.as_deref(),
                "location" => form.location.as_deref(),
                "job_type" => form.job_type.as_deref(),
                "salary" => form.salary.as_deref(),
                "description" => form.description.as_deref(),
                "requirements" => form.requirements.as_deref(),
                "benefits" => form.benefits.as_deref(),
                _ => None,
            };
            field
                .initial(submitted.unwrap_or_default())
                .with_errors(errors)
        })
        .collect()
}
