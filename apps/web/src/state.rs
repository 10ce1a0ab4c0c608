use std::sync::Arc;

use crate::config::Config;
use crate::resumes::ResumeStore;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Relational records: users, jobs, applications, sessions, flashes.
    pub store: Arc<dyn Store>,
    /// Uploaded résumé documents. Local disk or S3, chosen at startup.
    pub resumes: Arc<dyn ResumeStore>,
    pub config: Config,
}
