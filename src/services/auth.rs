use crate::error::{AppError, Result};
use crate::models::admin::Admin;
use crate::repositories::admin as admin_repo;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use deadpool_postgres::Pool;
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 2;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 1;

/// The message for every credential failure, so usernames cannot be enumerated.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Hashes a password using Argon2id.
///
/// # Arguments
///
/// * `password` - The password to hash.
///
/// # Returns
///
/// A `Result` containing the PHC-formatted hash.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    tracing::debug!("Password hashed successfully with Argon2");
    Ok(password_hash)
}

/// Verifies a password against a stored hash.
///
/// The parameters are read from the PHC string, so hashes made with other
/// settings still verify. A hash that is not a PHC string (bcrypt rows from
/// the old admin script) never verifies.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!("⚠️  Stored password hash is not a PHC string: {}", e);
            return Ok(false);
        }
    };
    let mut password_bytes = password.as_bytes().to_vec();
    let result = Argon2::default()
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    tracing::debug!("Password verification completed");
    Ok(result)
}

/// Checks an admin's credentials.
///
/// # Arguments
///
/// * `db` - The database connection pool.
/// * `username` - The admin's login name.
/// * `password` - The admin's password.
///
/// # Returns
///
/// A `Result` containing the authenticated `Admin`.
pub async fn authenticate_admin(db: &Pool, username: &str, password: &str) -> Result<Admin> {
    tracing::debug!("🔐 Authenticating admin: {}", username);

    let admin = admin_repo::find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

    if !admin.is_active {
        tracing::warn!("❌ Login refused for inactive admin: {}", admin.id);
        return Err(AppError::Authentication("Account is disabled".to_string()));
    }

    let hash = admin.password.clone();
    let candidate = password.to_string();
    let valid = tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))??;

    if !valid {
        return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
    }

    if let Err(e) = admin_repo::touch_last_login(db, &admin.id).await {
        tracing::warn!("⚠️  Failed to update last login for {}: {}", admin.id, e);
    }

    tracing::info!("✅ Admin authenticated: {}", admin.id);

    Ok(admin)
}

/// Creates an admin unless the username or email is already taken.
///
/// # Returns
///
/// `Ok(None)` when an admin with the same username or email exists.
pub async fn create_admin(
    db: &Pool,
    username: &str,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<Option<Admin>> {
    if admin_repo::exists_by_username_or_email(db, username, email).await? {
        tracing::info!("Admin {} or {} already exists", username, email);
        return Ok(None);
    }

    let password_hash = hash_password(password)?;
    let admin = admin_repo::create_admin(db, username, name, email, &password_hash, role).await?;

    tracing::info!("✅ Admin created with ID: {}", admin.id);
    Ok(Some(admin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(
            hash_password("same password").unwrap(),
            hash_password("same password").unwrap()
        );
    }

    #[test]
    fn unparseable_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string").unwrap());
        assert!(!verify_password(
            "admin55",
            "$2b$12$KIXQJ1b3Hk0dE0m0vI4f8uVv0wq9QnN8WlFQ0yZx7M5eYtI1m2O7e"
        )
        .unwrap());
    }
}
