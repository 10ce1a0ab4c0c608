use tracing::{info, warn};

use crate::accounts::password::{hash_password, verify_password};
use crate::errors::AppError;
use crate::models::user::{NewUser, Role, User};
use crate::store::Store;
use crate::validation::{FormErrors, RegisterForm, Submission, EMAIL_TAKEN, USERNAME_TAKEN};

/// Validates the registration form, checks username/email availability and
/// creates the account.
pub async fn register_user(
    store: &dyn Store,
    form: RegisterForm,
) -> Result<Submission<User>, AppError> {
    let form = form.normalized();
    let mut errors = form.errors();

    if !errors.has("username") && store.username_exists(&form.username).await? {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.has("email") && store.email_exists(&form.email).await? {
        errors.add("email", EMAIL_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(Submission::Rejected(errors));
    }

    let role = Role::from_employer_choice(form.wants_employer());
    let password_hash = hash_password(form.password1).await?;
    let created = store
        .create_user(NewUser {
            username: form.username,
            email: form.email,
            password_hash,
            role,
        })
        .await;

    match created {
        Ok(user) => {
            info!("Registered user {} ({:?})", user.username, user.role);
            Ok(Submission::Accepted(user))
        }
        // Lost a race with a concurrent registration.
        Err(AppError::Conflict(constraint)) => {
            let mut errors = FormErrors::new();
            if constraint.contains("email") {
                errors.add("email", EMAIL_TAKEN);
            } else {
                errors.add("username", USERNAME_TAKEN);
            }
            Ok(Submission::Rejected(errors))
        }
        Err(e) => Err(e),
    }
}

/// Returns the user if the credentials match.
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let username = username.trim();
    let Some(user) = store.find_user_by_username(username).await? else {
        warn!("Login failed for unknown user {username}");
        return Ok(None);
    };
    if verify_password(user.password_hash.clone(), password.to_string()).await? {
        Ok(Some(user))
    } else {
        warn!("Login failed for {username}: wrong password");
        Ok(None)
    }
}
