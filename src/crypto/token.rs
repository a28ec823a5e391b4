use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::error::{AppError, Result};
use crate::models::session::{AdminClaims, Principal};

type HmacSha256 = Hmac<Sha256>;

/// Separates the encoded payload from the encoded signature.
const SEPARATOR: char = '.';

/// Why a token was rejected.
///
/// Both variants mean "not authenticated" to the outside world; the
/// distinction is kept for server-side logs.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, or the signature does not match.
    #[error("invalid session token")]
    Invalid,

    /// Correctly signed but past its expiry.
    #[error("expired session token")]
    Expired,
}

/// A freshly issued token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The encoded token, ready to go into a cookie.
    pub value: String,
    /// The claims signed into `value`.
    pub claims: AdminClaims,
}

/// Issues and verifies HMAC-SHA256 signed session tokens.
///
/// Token layout: `base64url(json claims) "." base64url(hmac)`.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<Zeroizing<Vec<u8>>>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Creates a new `TokenSigner`.
    ///
    /// # Arguments
    ///
    /// * `secret` - The signing secret. Must not be empty.
    /// * `ttl` - How long issued tokens stay valid.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(AppError::Configuration(
                "Token signing secret must not be empty".to_string(),
            ));
        }
        if ttl <= Duration::zero() {
            return Err(AppError::Configuration(
                "Token TTL must be positive".to_string(),
            ));
        }

        Ok(Self {
            secret: Arc::new(Zeroizing::new(secret.to_vec())),
            ttl,
        })
    }

    /// The lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC keys have no length limit"))
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Issues a token for `principal`, valid for the configured TTL from now.
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken> {
        self.issue_at(principal, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, principal: &Principal, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            AppError::Configuration("Token TTL overflows the representable time range".to_string())
        })?;

        let claims = AdminClaims {
            admin_id: principal.id,
            username: principal.username.clone(),
            role: principal.role.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let payload = sonic_rs::to_vec(&claims)
            .map_err(|e| AppError::Internal(format!("Token serialization failed: {}", e)))?;
        let encoded_payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.sign(encoded_payload.as_bytes()));

        Ok(IssuedToken {
            value: format!("{encoded_payload}{SEPARATOR}{signature}"),
            claims,
        })
    }

    /// Verifies a token against the current time.
    pub fn verify(&self, token: &str) -> std::result::Result<AdminClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token as if the current time were `now`.
    ///
    /// The signature is checked before the payload is parsed, so a forged
    /// payload never reaches the JSON decoder.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<AdminClaims, TokenError> {
        let (encoded_payload, encoded_signature) =
            token.split_once(SEPARATOR).ok_or(TokenError::Invalid)?;

        let signature = URL_SAFE_NO_PAD
            .decode(encoded_signature)
            .map_err(|_| TokenError::Invalid)?;
        let expected = self.sign(encoded_payload.as_bytes());

        if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
            return Err(TokenError::Invalid);
        }

        let payload = URL_SAFE_NO_PAD
            .decode(encoded_payload)
            .map_err(|_| TokenError::Invalid)?;
        let claims: AdminClaims =
            sonic_rs::from_slice(&payload).map_err(|_| TokenError::Invalid)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn principal() -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            role: "admin".to_string(),
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-signing-secret", Duration::hours(24)).unwrap()
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 8, 30, 0).unwrap()
    }

    #[test]
    fn issued_token_verifies_and_carries_principal() {
        let signer = signer();
        let principal = principal();
        let issued = signer.issue_at(&principal, epoch()).unwrap();

        let claims = signer.verify_at(&issued.value, epoch()).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.admin_id, principal.id);
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn expiry_boundary() {
        let signer = signer();
        let issued = signer.issue_at(&principal(), epoch()).unwrap();
        let ttl = signer.ttl();

        assert!(signer
            .verify_at(&issued.value, epoch() + ttl - Duration::seconds(1))
            .is_ok());
        assert_eq!(
            signer.verify_at(&issued.value, epoch() + ttl + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn tokens_issued_at_different_times_differ() {
        let signer = signer();
        let principal = principal();
        let first = signer.issue_at(&principal, epoch()).unwrap();
        let second = signer
            .issue_at(&principal, epoch() + Duration::seconds(1))
            .unwrap();

        assert_ne!(first.value, second.value);
    }

    #[test]
    fn flipping_any_character_invalidates_the_token() {
        let signer = signer();
        let token = signer.issue_at(&principal(), epoch()).unwrap().value;

        for (index, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(index..index + 1, &replacement.to_string());

            assert_eq!(
                signer.verify_at(&tampered, epoch()),
                Err(TokenError::Invalid),
                "tampering at {index} was not detected"
            );
        }
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = signer().issue_at(&principal(), epoch()).unwrap().value;
        let other = TokenSigner::new(b"another-secret", Duration::hours(24)).unwrap();

        assert_eq!(other.verify_at(&token, epoch()), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_and_forged_token_reports_invalid() {
        let signer = signer();
        let token = signer.issue_at(&principal(), epoch()).unwrap().value;
        let (payload, _) = token.split_once('.').unwrap();
        let forged = format!("{payload}.{}", URL_SAFE_NO_PAD.encode([0u8; 32]));

        let later = epoch() + Duration::days(30);
        assert_eq!(signer.verify_at(&forged, later), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_invalid() {
        let signer = signer();
        for token in ["", ".", "abc", "abc.def", "a.b.c", "short-token-over-twenty-chars"] {
            assert_eq!(signer.verify_at(token, epoch()), Err(TokenError::Invalid));
        }
    }

    #[test]
    fn overflowing_ttl_is_an_error_not_a_panic() {
        let signer = TokenSigner::new(b"test-signing-secret", Duration::hours(3_000_000_000)).unwrap();

        assert!(matches!(
            signer.issue_at(&principal(), epoch()),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(signer.issue(&principal()), Err(AppError::Configuration(_))));
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        assert!(matches!(
            TokenSigner::new(b"", Duration::hours(24)),
            Err(AppError::Configuration(_))
        ));
    }
}
