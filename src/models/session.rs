use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::admin::Admin;

/// The identity snapshot captured when a session token is issued.
///
/// The token does not follow later changes to the admin record (role,
/// activation). Callers that need the live state look the admin up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The admin's ID.
    pub id: Uuid,
    /// The admin's login name.
    pub username: String,
    /// The admin's role tag.
    pub role: String,
}

impl From<&Admin> for Principal {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            role: admin.role.clone(),
        }
    }
}

/// The signed payload of an `admin-token` session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminClaims {
    /// The admin's ID.
    #[serde(rename = "sub")]
    pub admin_id: Uuid,
    /// The admin's login name at issuance.
    pub username: String,
    /// The admin's role at issuance.
    pub role: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

impl AdminClaims {
    /// The timestamp when the token was issued.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    /// The timestamp when the token expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    /// Whether the token is expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
