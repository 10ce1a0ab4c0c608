use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where uploaded résumés live.
#[derive(Debug, Clone)]
pub enum ResumeStorage {
    /// Files under `<media_root>/resumes/`.
    Local,
    S3(S3Settings),
}

impl ResumeStorage {
    pub fn label(&self) -> &'static str {
        match self {
            ResumeStorage::Local => "local",
            ResumeStorage::S3(_) => "s3",
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub media_root: PathBuf,
    pub resume_storage: ResumeStorage,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let resume_storage = match lookup("RESUME_STORAGE").as_deref().unwrap_or("local") {
            "local" => ResumeStorage::Local,
            "s3" => ResumeStorage::S3(S3Settings {
                bucket: require("S3_BUCKET")?,
                endpoint: require("S3_ENDPOINT")?,
                access_key_id: require("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
            }),
            other => bail!("RESUME_STORAGE must be 'local' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            media_root: PathBuf::from(lookup("MEDIA_ROOT").unwrap_or_else(|| "media".to_string())),
            resume_storage,
            secure_cookies: lookup("SECURE_COOKIES")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}
