use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationStatus, ApplicationWithApplicant, ApplicationWithJob, NewApplication,
};
use crate::models::flash::Flash;
use crate::models::job::{Job, JobFields};
use crate::models::user::{NewUser, User};
use crate::store::{contains_pattern, Store};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at";

const JOB_COLUMNS: &str = "id, title, company_name, location, job_type, salary, description, \
                           requirements, benefits, posted_by, created_at";

const APPLICATION_COLUMNS: &str =
    "id, job_id, applicant_id, resume_path, resume_name, cover_letter, status, applied_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turns a unique-constraint violation into `AppError::Conflict(<constraint>)`.
fn conflict_or_database(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or("unique").to_string();
            return AppError::Conflict(constraint);
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let created: User = sqlx::query_as(&format!(
            "INSERT INTO users (username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_database)?;

        info!("Created user {} ({:?})", created.id, created.role);
        Ok(created)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_session(&self, user_id: i64) -> Result<Uuid, AppError> {
        let token = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(token)
    }

    async fn session_user(&self, token: Uuid) -> Result<Option<User>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_session(&self, token: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn push_flash(&self, token: Uuid, flash: &Flash) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO flash_messages (session_token, level, message) VALUES ($1, $2, $3)",
        )
        .bind(token)
        .bind(flash.level)
        .bind(&flash.message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take_flashes(&self, token: Uuid) -> Result<Vec<Flash>, AppError> {
        Ok(sqlx::query_as(
            r#"
            WITH taken AS (
                DELETE FROM flash_messages
                WHERE session_token = $1
                RETURNING id, level, message
            )
            SELECT level, message FROM taken ORDER BY id
            "#,
        )
        .bind(token)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn insert_job(&self, posted_by: i64, fields: &JobFields) -> Result<Job, AppError> {
        Ok(sqlx::query_as(&format!(
            r#"
            INSERT INTO jobs
                (title, company_name, location, job_type, salary,
                 description, requirements, benefits, posted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&fields.title)
        .bind(&fields.company_name)
        .bind(&fields.location)
        .bind(fields.job_type)
        .bind(&fields.salary)
        .bind(&fields.description)
        .bind(&fields.requirements)
        .bind(&fields.benefits)
        .bind(posted_by)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_job(
        &self,
        job_id: i64,
        owner_id: i64,
        fields: &JobFields,
    ) -> Result<Job, AppError> {
        let updated: Option<Job> = sqlx::query_as(&format!(
            r#"
            UPDATE jobs
            SET title = $1, company_name = $2, location = $3, job_type = $4, salary = $5,
                description = $6, requirements = $7, benefits = $8
            WHERE id = $9 AND posted_by = $10
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&fields.title)
        .bind(&fields.company_name)
        .bind(&fields.location)
        .bind(fields.job_type)
        .bind(&fields.salary)
        .bind(&fields.description)
        .bind(&fields.requirements)
        .bind(&fields.benefits)
        .bind(job_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
    }

    async fn find_job(&self, job_id: i64) -> Result<Option<Job>, AppError> {
        Ok(
            sqlx::query_as(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_owned_job(&self, job_id: i64, owner_id: i64) -> Result<Option<Job>, AppError> {
        Ok(sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1 AND posted_by = $2"
        ))
        .bind(job_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn count_jobs(&self, query: Option<&str>) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM jobs
            WHERE $1::text IS NULL
               OR title ILIKE $1 OR company_name ILIKE $1 OR location ILIKE $1
            "#,
        )
        .bind(query.map(contains_pattern))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn search_jobs(
        &self,
        query: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, AppError> {
        Ok(sqlx::query_as(&format!(
            r#"
            SELECT {JOB_COLUMNS} FROM jobs
            WHERE $1::text IS NULL
               OR title ILIKE $1 OR company_name ILIKE $1 OR location ILIKE $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(query.map(contains_pattern))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn jobs_posted_by(&self, owner_id: i64) -> Result<Vec<Job>, AppError> {
        Ok(sqlx::query_as(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE posted_by = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_applications(
        &self,
        job_id: i64,
        status: Option<ApplicationStatus>,
    ) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE job_id = $1 AND ($2::application_status IS NULL OR status = $2)
            "#,
        )
        .bind(job_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn has_applied(&self, job_id: i64, applicant_id: i64) -> Result<bool, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE job_id = $1 AND applicant_id = $2)",
        )
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_application(
        &self,
        application: &NewApplication,
    ) -> Result<Application, AppError> {
        sqlx::query_as(&format!(
            r#"
            INSERT INTO applications
                (job_id, applicant_id, resume_path, resume_name, cover_letter)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(application.job_id)
        .bind(application.applicant_id)
        .bind(&application.resume_path)
        .bind(&application.resume_name)
        .bind(&application.cover_letter)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_or_database)
    }

    async fn find_application(
        &self,
        application_id: i64,
    ) -> Result<Option<Application>, AppError> {
        Ok(sqlx::query_as(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<ApplicationWithApplicant>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT a.id, a.job_id, a.applicant_id, a.resume_path, a.resume_name,
                   a.cover_letter, a.status, a.applied_at,
                   u.username AS applicant_username, u.email AS applicant_email
            FROM applications a
            JOIN users u ON u.id = a.applicant_id
            WHERE a.job_id = $1
            ORDER BY a.applied_at DESC, a.id DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: i64,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<ApplicationWithJob>, AppError> {
        Ok(sqlx::query_as(
            r#"
            SELECT a.id, a.job_id, a.applicant_id, a.resume_path, a.resume_name,
                   a.cover_letter, a.status, a.applied_at,
                   j.title AS job_title, j.company_name, j.location
            FROM applications a
            JOIN jobs j ON j.id = a.job_id
            WHERE a.applicant_id = $1
              AND ($2::application_status IS NULL OR a.status = $2)
            ORDER BY a.applied_at DESC, a.id DESC
            "#,
        )
        .bind(applicant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE applications SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(application_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Application {application_id} not found"
            )));
        }
        Ok(())
    }
}
