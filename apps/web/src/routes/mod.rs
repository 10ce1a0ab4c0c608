pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    middleware,
    routing::get,
    Router,
};

use crate::accounts::handlers as accounts;
use crate::accounts::session::{load_session, require_login};
use crate::applications::handlers as applications;
use crate::dashboard::handlers as dashboard;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// Request bodies above this are refused outright. Applications are exempt:
/// their parts are streamed and the résumé size is reported on the form.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout/", get(accounts::logout).post(accounts::logout))
        .route("/dashboard/", get(dashboard::dashboard))
        .route("/jobs/post/", get(jobs::post_job_form).post(jobs::post_job))
        .route(
            "/jobs/:job_id/",
            get(jobs::job_detail).post(jobs::apply.layer(DefaultBodyLimit::disable())),
        )
        .route(
            "/jobs/:job_id/applications/",
            get(applications::manage_applications),
        )
        .route(
            "/applications/:application_id/status/",
            get(applications::status_redirect).post(applications::update_status),
        )
        .route(
            "/applications/:application_id/resume/",
            get(applications::download_resume),
        )
        .route_layer(middleware::from_fn(require_login));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/", get(jobs::list_jobs))
        .route("/jobs/", get(jobs::list_jobs))
        .route(
            "/register/",
            get(accounts::register_form).post(accounts::register),
        )
        .route("/login/", get(accounts::login_form).post(accounts::login))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
