use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use deadpool_postgres::Pool;
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    middleware_layer::gate::SessionGate,
    models::{admin::Admin, session::AdminClaims},
    repositories::admin as admin_repo,
    state::AppState,
};

/// What the live admin lookup found for a session.
#[derive(Debug, Clone, Copy)]
pub enum AdminRecord<'a> {
    /// The lookup is disabled.
    Unchecked,
    /// The admin no longer exists.
    Missing,
    /// The current admin record.
    Found(&'a Admin),
}

/// The outcome of the admin API check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminDecision {
    /// Continue with the verified claims.
    Admit(AdminClaims),
    /// Answer `401`, optionally dropping the session cookie.
    Reject { clear_cookie: bool },
}

/// Decides whether a request may reach the admin API.
///
/// `claims` is the verified session, if any. A revoked account (inactive or
/// deleted) also loses its cookie.
pub fn admit(claims: Option<AdminClaims>, record: AdminRecord<'_>) -> AdminDecision {
    let Some(claims) = claims else {
        return AdminDecision::Reject { clear_cookie: false };
    };

    match record {
        AdminRecord::Unchecked => AdminDecision::Admit(claims),
        AdminRecord::Found(admin) if admin.id != claims.admin_id => {
            tracing::warn!("❌ Admin record {} does not match session {}", admin.id, claims.admin_id);
            AdminDecision::Reject { clear_cookie: true }
        }
        AdminRecord::Found(admin) if admin.is_active => AdminDecision::Admit(claims),
        AdminRecord::Found(admin) => {
            tracing::warn!("❌ Admin {} is inactive", admin.id);
            AdminDecision::Reject { clear_cookie: true }
        }
        AdminRecord::Missing => {
            tracing::warn!("❌ Admin {} no longer exists", claims.admin_id);
            AdminDecision::Reject { clear_cookie: true }
        }
    }
}

/// State for [`require_admin`].
#[derive(Clone)]
pub struct AdminGuard {
    gate: SessionGate,
    /// Re-reads the admin record on every call when set.
    accounts: Option<Pool>,
}

impl AdminGuard {
    /// Creates a new `AdminGuard`. Pass `None` to trust the token alone.
    pub fn new(gate: SessionGate, accounts: Option<Pool>) -> Self {
        Self { gate, accounts }
    }

    /// Builds the guard from the application state, honouring
    /// `check_active_admin`.
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.gate.clone(),
            state.config.check_active_admin.then(|| state.db.clone()),
        )
    }
}

/// A middleware that requires a valid admin session on API routes.
///
/// Unlike the page gate this answers `401` instead of redirecting.
///
/// # Arguments
///
/// * `guard` - The session gate and the optional account lookup.
/// * `cookies` - The request cookies.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn require_admin(
    State(guard): State<AdminGuard>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    tracing::debug!("🔐 Checking admin session...");

    let claims = guard.gate.verify_session(&cookies);

    let found = match (&claims, &guard.accounts) {
        (Some(claims), Some(pool)) => match admin_repo::find_by_id(pool, &claims.admin_id).await {
            Ok(found) => Some(found),
            Err(e) => return e.into_response(),
        },
        _ => None,
    };

    let record = match &found {
        None => AdminRecord::Unchecked,
        Some(None) => AdminRecord::Missing,
        Some(Some(admin)) => AdminRecord::Found(admin),
    };

    match admit(claims, record) {
        AdminDecision::Admit(claims) => {
            tracing::debug!("✅ Admin authenticated: {}", claims.username);
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        AdminDecision::Reject { clear_cookie } => {
            if clear_cookie {
                guard.gate.cookie().clear(&cookies);
            }
            AppError::Authentication("Unauthorized".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn claims(admin_id: Uuid) -> AdminClaims {
        let now = Utc::now().timestamp();
        AdminClaims {
            admin_id,
            username: "admin".to_string(),
            role: "admin".to_string(),
            iat: now,
            exp: now + 3600,
        }
    }

    fn admin(id: Uuid, is_active: bool) -> Admin {
        Admin {
            id,
            username: "admin".to_string(),
            name: "System Administrator".to_string(),
            email: "admin@example.ac.th".to_string(),
            password: "$argon2id$placeholder".to_string(),
            role: "admin".to_string(),
            is_active,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_session_is_rejected_without_touching_the_cookie() {
        assert_eq!(
            admit(None, AdminRecord::Unchecked),
            AdminDecision::Reject { clear_cookie: false }
        );
    }

    #[test]
    fn verified_session_is_admitted_when_unchecked() {
        let session = claims(Uuid::new_v4());
        assert_eq!(
            admit(Some(session.clone()), AdminRecord::Unchecked),
            AdminDecision::Admit(session)
        );
    }

    #[test]
    fn active_admin_is_admitted() {
        let id = Uuid::new_v4();
        let record = admin(id, true);
        let session = claims(id);

        assert_eq!(
            admit(Some(session.clone()), AdminRecord::Found(&record)),
            AdminDecision::Admit(session)
        );
    }

    #[test]
    fn inactive_admin_is_rejected_and_cookie_cleared() {
        let id = Uuid::new_v4();
        let record = admin(id, false);

        assert_eq!(
            admit(Some(claims(id)), AdminRecord::Found(&record)),
            AdminDecision::Reject { clear_cookie: true }
        );
    }

    #[test]
    fn deleted_admin_is_rejected_and_cookie_cleared() {
        assert_eq!(
            admit(Some(claims(Uuid::new_v4())), AdminRecord::Missing),
            AdminDecision::Reject { clear_cookie: true }
        );
    }

    #[test]
    fn record_for_another_admin_is_rejected() {
        let record = admin(Uuid::new_v4(), true);

        assert_eq!(
            admit(Some(claims(Uuid::new_v4())), AdminRecord::Found(&record)),
            AdminDecision::Reject { clear_cookie: true }
        );
    }
}
