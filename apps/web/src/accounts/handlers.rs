use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tracing::info;

use crate::accounts::registration::{authenticate, register_user};
use crate::accounts::session::{self, safe_next, Session};
use crate::errors::AppError;
use crate::presentation::{render_fields, FormField, INPUT_CLASS};
use crate::state::AppState;
use crate::validation::{FormErrors, LoginForm, RegisterForm, Submission};
use crate::views::{html, LoginPage, RegisterPage};

pub const LOGIN_FAILED: &str = "Please enter a correct username and password.";

fn register_fields(form: &RegisterForm, errors: &FormErrors) -> Vec<FormField> {
    let role = if form.wants_employer() { "true" } else { "false" };
    vec![
        FormField::input("username", "Username", "text")
            .with_attr("class", INPUT_CLASS)
            .with_attr("maxlength", "150")
            .initial(&form.username)
            .with_errors(errors),
        FormField::input("email", "Email", "email")
            .with_attr("class", INPUT_CLASS)
            .initial(&form.email)
            .with_errors(errors),
        FormField::input("password1", "Password", "password")
            .with_attr("class", INPUT_CLASS)
            .with_errors(errors),
        FormField::input("password2", "Password confirmation", "password")
            .with_attr("class", INPUT_CLASS)
            .with_errors(errors),
        FormField::radio(
            "is_employer",
            "Register as",
            vec![
                ("false".to_string(), "Applicant".to_string()),
                ("true".to_string(), "Employer".to_string()),
            ],
        )
        .initial(role)
        .with_errors(errors),
    ]
}

fn login_fields(username: &str) -> Vec<FormField> {
    vec![
        FormField::input("username", "Username", "text")
            .with_attr("class", INPUT_CLASS)
            .with_attr("autofocus", "autofocus")
            .initial(username),
        FormField::input("password", "Password", "password").with_attr("class", INPUT_CLASS),
    ]
}

/// GET /register/
pub async fn register_form(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
) -> Result<Html<String>, AppError> {
    let chrome = session::chrome(state.store.as_ref(), session.as_deref()).await?;
    html(RegisterPage {
        chrome,
        fields: render_fields(&register_fields(
            &RegisterForm::default(),
            &FormErrors::new(),
        ))?,
    })
}

/// POST /register/
pub async fn register(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match register_user(state.store.as_ref(), form.clone()).await? {
        Submission::Accepted(user) => {
            if let Some(Extension(previous)) = &session {
                state.store.delete_session(previous.token).await?;
            }
            let jar = session::start(&state, jar, &user).await?;
            Ok((jar, Redirect::to(session::DEFAULT_LANDING)).into_response())
        }
        Submission::Rejected(errors) => {
            let chrome = session::chrome(state.store.as_ref(), session.as_deref()).await?;
            let page = html(RegisterPage {
                chrome,
                fields: render_fields(&register_fields(&form, &errors))?,
            })?;
            Ok(page.into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// GET /login/
pub async fn login_form(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    Query(query): Query<NextQuery>,
) -> Result<Html<String>, AppError> {
    let chrome = session::chrome(state.store.as_ref(), session.as_deref()).await?;
    html(LoginPage {
        chrome,
        fields: render_fields(&login_fields(""))?,
        error: String::new(),
        next: query.next.unwrap_or_default(),
    })
}

/// POST /login/
pub async fn login(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match authenticate(state.store.as_ref(), &form.username, &form.password).await? {
        Some(user) => {
            if let Some(Extension(previous)) = &session {
                state.store.delete_session(previous.token).await?;
            }
            let jar = session::start(&state, jar, &user).await?;
            info!("User {} logged in", user.username);
            let target = safe_next(form.next.as_deref()).to_string();
            Ok((jar, Redirect::to(&target)).into_response())
        }
        None => {
            let chrome = session::chrome(state.store.as_ref(), session.as_deref()).await?;
            let page = html(LoginPage {
                chrome,
                fields: render_fields(&login_fields(form.username.trim()))?,
                error: LOGIN_FAILED.to_string(),
                next: form.next.unwrap_or_default(),
            })?;
            Ok(page.into_response())
        }
    }
}

/// GET|POST /logout/
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let jar = session::end(&state, jar, &session).await?;
    info!("User {} logged out", session.user.username);
    Ok((jar, Redirect::to("/")).into_response())
}
