use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::flash::Flash;
use crate::models::user::User;
use crate::state::AppState;
use crate::store::Store;
use crate::views::{Chrome, Nav};

pub const SESSION_COOKIE: &str = "jobboard_session";

/// Where a signed-in user lands when there is no (safe) `next` target.
pub const DEFAULT_LANDING: &str = "/dashboard/";

/// The signed-in user for the current request, inserted as a request
/// extension by `load_session`.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user: User,
}

/// Resolves the session cookie to a user. Unknown or malformed tokens leave
/// the request anonymous.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    if let Some(token) = token {
        if let Some(user) = state.store.session_user(token).await? {
            request.extensions_mut().insert(Session { token, user });
        }
    }
    Ok(next.run(request).await)
}

/// Login guard for protected routes.
pub async fn require_login(request: Request, next: Next) -> Response {
    if request.extensions().get::<Session>().is_some() {
        return next.run(request).await;
    }
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    tracing::debug!("Anonymous request to {target}, redirecting to login");
    Redirect::to(&login_url(target)).into_response()
}

pub fn login_url(next: &str) -> String {
    format!("/login/?next={}", urlencoding::encode(next))
}

/// Only local absolute paths are followed after login.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => DEFAULT_LANDING,
    }
}

/// Opens a session for `user` and attaches its cookie.
pub async fn start(state: &AppState, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
    let token = state.store.create_session(user.id).await?;
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.secure_cookies);
    Ok(jar.add(cookie))
}

pub async fn end(state: &AppState, jar: CookieJar, session: &Session) -> Result<CookieJar, AppError> {
    state.store.delete_session(session.token).await?;
    Ok(jar.remove(Cookie::build(SESSION_COOKIE).path("/")))
}

/// Queues a message for the next page this session renders.
pub async fn flash(state: &AppState, session: &Session, flash: Flash) -> Result<(), AppError> {
    state.store.push_flash(session.token, &flash).await
}

/// Nav plus any pending flash messages, which are consumed here.
pub async fn chrome(store: &dyn Store, session: Option<&Session>) -> Result<Chrome, AppError> {
    let flashes = match session {
        Some(session) => store.take_flashes(session.token).await?,
        None => Vec::new(),
    };
    Ok(Chrome {
        nav: Nav::for_user(session.map(|s| &s.user)),
        flashes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{NewUser, Role};
    use crate::store::memory::MemoryStore;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/jobs/3/")), "/jobs/3/");
        assert_eq!(safe_next(Some("/jobs/?q=rust&page=2")), "/jobs/?q=rust&page=2");
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(None), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("https://evil.test/")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("//evil.test/")), DEFAULT_LANDING);
        assert_eq!(safe_next(Some("/\\evil.test")), DEFAULT_LANDING);
    }

    #[test]
    fn test_login_url_encodes_target() {
        assert_eq!(
            login_url("/jobs/?q=a b&page=2"),
            "/login/?next=%2Fjobs%2F%3Fq%3Da%20b%26page%3D2"
        );
    }

    #[tokio::test]
    async fn test_chrome_consumes_flashes_once() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "ada".into(),
                email: "ada@example.com".into(),
                password_hash: "x".into(),
                role: Role::Employer,
            })
            .await
            .unwrap();
        let token = store.create_session(user.id).await.unwrap();
        store
            .push_flash(token, &Flash::success("Job posted successfully!"))
            .await
            .unwrap();
        let session = Session { token, user };

        let first = chrome(&store, Some(&session)).await.unwrap();
        assert!(first.nav.signed_in && first.nav.is_employer);
        assert_eq!(first.flashes, vec![Flash::success("Job posted successfully!")]);

        let second = chrome(&store, Some(&session)).await.unwrap();
        assert!(second.flashes.is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_chrome() {
        let store = MemoryStore::new();
        let chrome = chrome(&store, None).await.unwrap();
        assert!(!chrome.nav.signed_in);
        assert!(chrome.flashes.is_empty());
    }
}
