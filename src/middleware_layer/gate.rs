use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::{
    cookies::{ADMIN_TOKEN_COOKIE, CookieSource, SessionCookie},
    crypto::token::{TokenError, TokenSigner},
    models::session::AdminClaims,
};

/// How a request path is treated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Always allowed (login page, APIs that guard themselves).
    Unprotected,
    /// Requires a valid session.
    Protected,
    /// Matches no rule; allowed.
    Public,
}

/// Which paths the gate protects and where it sends people.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    /// Paths allowed as-is, checked first.
    pub unprotected_exact: Vec<String>,
    /// Path prefixes allowed as-is, checked second.
    pub unprotected_prefixes: Vec<String>,
    /// Path prefixes that need a session, checked last.
    pub protected_prefixes: Vec<String>,
    /// The bare protected root that collapses to `landing_path`.
    pub protected_root: String,
    /// Where an authenticated visitor of `protected_root` is sent.
    pub landing_path: String,
    /// Where unauthenticated visitors are sent.
    pub login_path: String,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            unprotected_exact: vec!["/admin/login".to_string()],
            unprotected_prefixes: vec!["/api/".to_string()],
            protected_prefixes: vec!["/admin".to_string()],
            protected_root: "/admin".to_string(),
            landing_path: "/admin/dashboard".to_string(),
            login_path: "/admin/login".to_string(),
        }
    }
}

/// Matches `prefix` on whole path segments. A prefix ending in `/` is
/// matched literally.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix.ends_with('/') {
        return path.starts_with(prefix);
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl GatePolicy {
    /// Classifies a path. Exact unprotected paths win over unprotected
    /// prefixes, which win over protected prefixes.
    pub fn classify(&self, path: &str) -> PathClass {
        if self.unprotected_exact.iter().any(|p| p == path) {
            return PathClass::Unprotected;
        }
        if self
            .unprotected_prefixes
            .iter()
            .any(|p| matches_prefix(path, p))
        {
            return PathClass::Unprotected;
        }
        if self
            .protected_prefixes
            .iter()
            .any(|p| matches_prefix(path, p))
        {
            return PathClass::Protected;
        }
        PathClass::Public
    }
}

/// The outcome of running the gate on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Continue to the handler, with the principal when one was verified.
    Allow(Option<AdminClaims>),
    /// Send the visitor to the login page, optionally dropping a bad cookie.
    RedirectToLogin { clear_cookie: bool },
    /// Authenticated, but the canonical page lives elsewhere.
    AllowWithRedirect(String),
}

/// Per-request admission control for the admin area.
#[derive(Clone, Debug)]
pub struct SessionGate {
    policy: Arc<GatePolicy>,
    signer: TokenSigner,
    cookie: SessionCookie,
}

impl SessionGate {
    /// Creates a new `SessionGate`.
    pub fn new(policy: GatePolicy, signer: TokenSigner, cookie: SessionCookie) -> Self {
        Self {
            policy: Arc::new(policy),
            signer,
            cookie,
        }
    }

    /// The token signer used to verify sessions.
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// The session cookie settings.
    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// The gate's path policy.
    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    fn verify_cookie(
        &self,
        cookies: &impl CookieSource,
        now: DateTime<Utc>,
    ) -> Option<Result<AdminClaims, TokenError>> {
        cookies
            .get_cookie(ADMIN_TOKEN_COOKIE)
            .filter(|token| !token.is_empty())
            .map(|token| self.signer.verify_at(&token, now))
    }

    /// Returns the principal of a valid session cookie, if any.
    pub fn verify_session(&self, cookies: &impl CookieSource) -> Option<AdminClaims> {
        match self.verify_cookie(cookies, Utc::now())? {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::warn!("❌ Session rejected: {}", e);
                None
            }
        }
    }

    /// Decides what to do with a request for `path`.
    pub fn decide(&self, path: &str, cookies: &impl CookieSource) -> GateDecision {
        self.decide_at(path, cookies, Utc::now())
    }

    /// Decides as if the current time were `now`.
    pub fn decide_at(
        &self,
        path: &str,
        cookies: &impl CookieSource,
        now: DateTime<Utc>,
    ) -> GateDecision {
        match self.policy.classify(path) {
            PathClass::Unprotected | PathClass::Public => GateDecision::Allow(None),
            PathClass::Protected => match self.verify_cookie(cookies, now) {
                None => {
                    tracing::debug!("❌ No session cookie for {}", path);
                    GateDecision::RedirectToLogin { clear_cookie: false }
                }
                Some(Err(e)) => {
                    tracing::warn!("❌ Session rejected for {}: {}", path, e);
                    GateDecision::RedirectToLogin { clear_cookie: true }
                }
                Some(Ok(_)) if path == self.policy.protected_root => {
                    GateDecision::AllowWithRedirect(self.policy.landing_path.clone())
                }
                Some(Ok(claims)) => {
                    tracing::debug!("✅ Session accepted for {}", claims.username);
                    GateDecision::Allow(Some(claims))
                }
            },
        }
    }
}

/// A middleware that applies the [`SessionGate`] to every request.
///
/// Verified claims are inserted as a request extension.
pub async fn session_gate(
    State(gate): State<SessionGate>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match gate.decide(request.uri().path(), &cookies) {
        GateDecision::Allow(Some(claims)) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        GateDecision::Allow(None) => next.run(request).await,
        GateDecision::AllowWithRedirect(target) => Redirect::temporary(&target).into_response(),
        GateDecision::RedirectToLogin { clear_cookie } => {
            if clear_cookie {
                gate.cookie.clear(&cookies);
            }
            Redirect::temporary(&gate.policy.login_path).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Principal;
    use chrono::Duration;
    use std::collections::HashMap;
    use uuid::Uuid;

    #[derive(Default)]
    struct Jar(HashMap<String, String>);

    impl Jar {
        fn with_token(token: &str) -> Self {
            let mut map = HashMap::new();
            map.insert(ADMIN_TOKEN_COOKIE.to_string(), token.to_string());
            Self(map)
        }
    }

    impl CookieSource for Jar {
        fn get_cookie(&self, name: &str) -> Option<String> {
            self.0.get(name).cloned()
        }
    }

    fn gate() -> SessionGate {
        let signer = TokenSigner::new(b"gate-test-secret", Duration::hours(24)).unwrap();
        SessionGate::new(GatePolicy::default(), signer, SessionCookie::new(false, 86400))
    }

    fn valid_token(gate: &SessionGate) -> String {
        let principal = Principal {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            role: "admin".to_string(),
        };
        gate.signer().issue(&principal).unwrap().value
    }

    #[test]
    fn classification_priority() {
        let policy = GatePolicy::default();
        assert_eq!(policy.classify("/admin/login"), PathClass::Unprotected);
        assert_eq!(policy.classify("/api/auth/login"), PathClass::Unprotected);
        assert_eq!(policy.classify("/admin"), PathClass::Protected);
        assert_eq!(policy.classify("/admin/dashboard"), PathClass::Protected);
        assert_eq!(policy.classify("/admin/login/extra"), PathClass::Protected);
        assert_eq!(policy.classify("/administrator"), PathClass::Public);
        assert_eq!(policy.classify("/"), PathClass::Public);
        assert_eq!(policy.classify("/api"), PathClass::Public);
    }

    #[test]
    fn login_page_allowed_without_cookie() {
        let gate = gate();
        assert_eq!(
            gate.decide("/admin/login", &Jar::default()),
            GateDecision::Allow(None)
        );
    }

    #[test]
    fn protected_page_without_cookie_redirects() {
        let gate = gate();
        assert_eq!(
            gate.decide("/admin/dashboard", &Jar::default()),
            GateDecision::RedirectToLogin { clear_cookie: false }
        );
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let gate = gate();
        assert_eq!(
            gate.decide("/admin/dashboard", &Jar::with_token("")),
            GateDecision::RedirectToLogin { clear_cookie: false }
        );
    }

    #[test]
    fn invalid_cookie_redirects_and_clears() {
        let gate = gate();
        let jar = Jar::with_token("this-is-a-long-but-forged-token-value");
        assert_eq!(
            gate.decide("/admin/dashboard", &jar),
            GateDecision::RedirectToLogin { clear_cookie: true }
        );
    }

    #[test]
    fn expired_cookie_redirects_and_clears() {
        let gate = gate();
        let token = valid_token(&gate);
        let later = Utc::now() + Duration::hours(25);
        assert_eq!(
            gate.decide_at("/admin/registrations", &Jar::with_token(&token), later),
            GateDecision::RedirectToLogin { clear_cookie: true }
        );
    }

    #[test]
    fn root_collapses_to_dashboard() {
        let gate = gate();
        let jar = Jar::with_token(&valid_token(&gate));
        assert_eq!(
            gate.decide("/admin", &jar),
            GateDecision::AllowWithRedirect("/admin/dashboard".to_string())
        );
    }

    #[test]
    fn valid_cookie_allows_with_claims() {
        let gate = gate();
        let jar = Jar::with_token(&valid_token(&gate));
        match gate.decide("/admin/registrations", &jar) {
            GateDecision::Allow(Some(claims)) => assert_eq!(claims.username, "admin"),
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn api_paths_are_not_gated() {
        let gate = gate();
        assert_eq!(
            gate.decide("/api/admin/registrations", &Jar::with_token("garbage")),
            GateDecision::Allow(None)
        );
    }

    #[test]
    fn verify_session_collapses_failures() {
        let gate = gate();
        assert!(gate.verify_session(&Jar::default()).is_none());
        assert!(gate.verify_session(&Jar::with_token("garbage")).is_none());
        assert!(gate
            .verify_session(&Jar::with_token(&valid_token(&gate)))
            .is_some());
    }
}
