//! Form payloads and their field rules.
//!
//! Each form cleans itself into a typed input or a `FormErrors` map keyed by
//! field name. Checks that need storage (username/email uniqueness) live with
//! the operation that needs them and add to the same map.

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::models::job::{Job, JobFields, JobType};

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;
pub const RESUME_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

pub const REQUIRED: &str = "This field is required.";
pub const TITLE_TOO_SHORT: &str = "Title must be at least 5 characters long.";
pub const RESUME_REQUIRED: &str = "Resume is required.";
pub const RESUME_BAD_FORMAT: &str =
    "Unsupported file format. Please upload PDF or Word documents only.";
pub const RESUME_TOO_LARGE: &str = "File size exceeds the 5MB limit. Please upload a smaller file.";
pub const COVER_LETTER_TOO_SHORT: &str = "Cover letter should be at least 50 characters long.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";
pub const EMAIL_TAKEN: &str = "This email address is already in use.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const USERNAME_CHARS: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

/// Field-level validation messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Replaces whatever was reported for `field` with the single required-field message.
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.insert(field.to_string(), vec![REQUIRED.to_string()]);
        }
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}

/// Outcome of a form submission that passed transport-level parsing.
#[derive(Debug)]
pub enum Submission<T> {
    Accepted(T),
    Rejected(FormErrors),
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Registration
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterForm {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "The two password fields didn't match."))]
    pub password2: String,
    /// Radio value: "true" registers an employer, anything else an applicant.
    pub is_employer: Option<String>,
}

impl RegisterForm {
    pub fn wants_employer(&self) -> bool {
        matches!(
            self.is_employer.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "on" | "1" | "yes")
        )
    }

    /// Trims the identity fields the same way they will be stored.
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_string();
        self
    }

    /// Syntactic checks only; uniqueness is checked against the store by the caller.
    pub fn errors(&self) -> FormErrors {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => e.into(),
        };
        if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add("username", USERNAME_CHARS);
        }
        errors.require("username", &self.username);
        errors.require("email", &self.email);
        errors.require("password1", &self.password1);
        errors.require("password2", &self.password2);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Job posting
// ────────────────────────────────────────────────────────────────────────────

/// Raw job form. Every field is optional at the transport level so that a
/// submission carrying only some fields still parses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobForm {
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
}

/// A cleaned job submission. `None` means "not supplied".
#[derive(Debug, Clone, Default, Validate)]
pub struct JobInput {
    #[validate(length(min = 5, message = "Title must be at least 5 characters long."))]
    pub title: String,
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub company_name: Option<String>,
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub salary: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
}

impl JobForm {
    pub fn clean(self) -> Result<JobInput, FormErrors> {
        let raw_job_type = blank_to_none(self.job_type);
        let job_type = raw_job_type.as_deref().map(JobType::parse);

        let input = JobInput {
            title: self.title.unwrap_or_default().trim().to_string(),
            company_name: blank_to_none(self.company_name),
            location: blank_to_none(self.location),
            job_type: job_type.flatten(),
            salary: blank_to_none(self.salary),
            description: blank_to_none(self.description),
            requirements: blank_to_none(self.requirements),
            benefits: blank_to_none(self.benefits),
        };

        let mut errors = match input.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };
        if input.title.chars().count() > 200 {
            errors.add("title", "Ensure this value has at most 200 characters.");
        }
        errors.require("title", &input.title);
        if matches!(job_type, Some(None)) {
            errors.add("job_type", INVALID_CHOICE);
        }

        if errors.is_empty() {
            Ok(input)
        } else {
            Err(errors)
        }
    }
}

impl JobInput {
    /// Fields for a brand-new posting: anything not supplied is left empty.
    pub fn into_new_fields(self) -> JobFields {
        JobFields {
            title: self.title,
            company_name: self.company_name.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            job_type: self.job_type.unwrap_or_default(),
            salary: self.salary.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            requirements: self.requirements.unwrap_or_default(),
            benefits: self.benefits.unwrap_or_default(),
        }
    }

    /// Fields for an edit: anything not supplied keeps its stored value.
    pub fn merged_over(self, existing: &Job) -> JobFields {
        let current = JobFields::from(existing);
        JobFields {
            title: self.title,
            company_name: self.company_name.unwrap_or(current.company_name),
            location: self.location.unwrap_or(current.location),
            job_type: self.job_type.unwrap_or(current.job_type),
            salary: self.salary.unwrap_or(current.salary),
            description: self.description.unwrap_or(current.description),
            requirements: self.requirements.unwrap_or(current.requirements),
            benefits: self.benefits.unwrap_or(current.benefits),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Application submission
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub file_name: String,
    pub content: Bytes,
}

/// Multipart application payload, assembled by the handler.
#[derive(Debug, Clone, Default, Validate)]
pub struct ApplicationForm {
    pub resume: Option<UploadedResume>,
    #[validate(length(min = 50, message = "Cover letter should be at least 50 characters long."))]
    pub cover_letter: String,
}

#[derive(Debug, Clone)]
pub struct ApplicationInput {
    pub resume: UploadedResume,
    pub cover_letter: String,
}

/// Résumé rules: present, `.pdf`/`.doc`/`.docx` (any case), at most 5 MiB.
pub fn check_resume(resume: Option<&UploadedResume>) -> Result<(), &'static str> {
    let resume = resume.ok_or(RESUME_REQUIRED)?;
    let extension = Path::new(&resume.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !RESUME_EXTENSIONS.contains(&extension.as_str()) {
        return Err(RESUME_BAD_FORMAT);
    }
    if resume.content.len() > MAX_RESUME_BYTES {
        return Err(RESUME_TOO_LARGE);
    }
    Ok(())
}

impl ApplicationForm {
    pub fn clean(mut self) -> Result<ApplicationInput, FormErrors> {
        self.cover_letter = self.cover_letter.trim().to_string();

        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => FormErrors::from(e),
        };
        errors.require("cover_letter", &self.cover_letter);
        if let Err(message) = check_resume(self.resume.as_ref()) {
            errors.add("resume", message);
        }

        match self.resume {
            Some(resume) if errors.is_empty() => Ok(ApplicationInput {
                resume,
                cover_letter: self.cover_letter,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    pub status: Option<String>,
}
