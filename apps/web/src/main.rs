mod accounts;
mod applications;
mod config;
mod dashboard;
mod db;
mod errors;
mod jobs;
mod models;
mod presentation;
mod resumes;
mod routes;
mod state;
mod store;
mod validation;
mod views;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, ResumeStorage, S3Settings};
use crate::db::create_pool;
use crate::resumes::{LocalResumeStore, ResumeStore, S3ResumeStore};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs pending migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize résumé storage
    let resumes: Arc<dyn ResumeStore> = match &config.resume_storage {
        ResumeStorage::Local => {
            info!("Storing resumes under {}", config.media_root.display());
            Arc::new(LocalResumeStore::new(config.media_root.clone()))
        }
        ResumeStorage::S3(settings) => {
            let s3 = build_s3_client(settings).await;
            info!("Storing resumes in S3 bucket {}", settings.bucket);
            Arc::new(S3ResumeStore::new(s3, settings.bucket.clone()))
        }
    };

    let state = AppState {
        store: Arc::new(PgStore::new(db)),
        resumes,
        config: config.clone(),
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(settings: &S3Settings) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &settings.access_key_id,
        &settings.secret_access_key,
        None,
        None,
        "jobboard-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&settings.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
