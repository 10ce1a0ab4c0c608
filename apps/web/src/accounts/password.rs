use tokio::task;
use uuid::Uuid;

use crate::errors::AppError;

/// Hashes a password into an encoded argon2 string. Runs off the async executor.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    let encoded = task::spawn_blocking(move || {
        let salt = Uuid::new_v4();
        argon2::hash_encoded(
            password.as_bytes(),
            salt.as_bytes(),
            &argon2::Config::default(),
        )
    })
    .await
    .map_err(anyhow::Error::from)?
    .map_err(anyhow::Error::from)?;
    Ok(encoded)
}

pub async fn verify_password(encoded: String, password: String) -> Result<bool, AppError> {
    let matches = task::spawn_blocking(move || argon2::verify_encoded(&encoded, password.as_bytes()))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(matches)
}
