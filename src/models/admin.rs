use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Represents an administrator account.
#[derive(Clone, Debug)]
pub struct Admin {
    /// The unique identifier for the admin.
    pub id: Uuid,
    /// The admin's login name.
    pub username: String,
    /// The admin's display name.
    pub name: String,
    /// The admin's email address.
    pub email: String,
    /// The admin's Argon2 password hash.
    pub password: String,
    /// The admin's role tag.
    pub role: String,
    /// Whether the admin may log in.
    pub is_active: bool,
    /// The timestamp of the admin's last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// The timestamp when the admin was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The public view of an admin returned after login.
#[derive(Debug, Serialize)]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<&Admin> for AdminProfile {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: admin.role.clone(),
        }
    }
}
