use crate::error::{AppError, Result};

/// Validates an admin login name.
///
/// # Arguments
///
/// * `username` - The username to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the username is valid.
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if username.len() > 255 {
        return Err(AppError::Validation(
            "Username must be at most 255 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.') {
        return Err(AppError::Validation(
            "Username can only contain letters, numbers, dots, underscores, and hyphens".to_string(),
        ));
    }

    Ok(())
}

/// Validates a login password.
///
/// Only presence and an upper bound are checked here; strength rules apply
/// when a password is set.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password being set for a new admin.
pub fn validate_new_password(password: &str) -> Result<()> {
    validate_password(password)?;

    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("j.doe-01").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("admin; drop").is_err());
        assert!(validate_username(&"a".repeat(256)).is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("x").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"a".repeat(129)).is_err());
        assert!(validate_new_password("short").is_err());
        assert!(validate_new_password("long enough").is_ok());
    }
}
