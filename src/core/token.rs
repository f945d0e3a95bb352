//! # Bearer token issuance and verification
//!
//! Tokens are HS256 JWTs carrying the subject id, the issue time and the expiry.
//! Validation is stateless: there is no revocation list, a leaked token stays
//! valid until it expires.
//!
//! Verification failures are deliberately uniform. Expired, tampered and
//! malformed tokens all come back as [`AuthError::InvalidToken`]; the underlying
//! cause is only logged.

use super::auth::{AuthError, AuthResult};
use crate::config::TokenSettings;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default token lifetime in hours
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Longest accepted token lifetime in hours (100 years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 100;

/// Opaque identifier of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectId {
    Numeric(i64),
    Text(String),
}

impl SubjectId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SubjectId::Numeric(id) => Some(*id),
            SubjectId::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Numeric(id) => write!(f, "{}", id),
            SubjectId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for SubjectId {
    fn from(id: i64) -> Self {
        SubjectId::Numeric(id)
    }
}

impl From<i32> for SubjectId {
    fn from(id: i32) -> Self {
        SubjectId::Numeric(id.into())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        SubjectId::Text(id)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId::Text(id.to_string())
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Subject
    pub user_id: SubjectId,

    /// Issued at (Unix epoch seconds)
    pub iat: i64,

    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

/// Issues and verifies bearer tokens
pub trait TokenService: Send + Sync {
    fn issue(&self, subject: SubjectId) -> AuthResult<String>;

    /// Any failure is reported as [`AuthError::InvalidToken`]
    fn verify(&self, token: &str) -> AuthResult<AuthClaims>;
}

/// JWT implementation of [`TokenService`] signed with a shared secret
#[derive(Clone)]
pub struct JwtTokenService {
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenService {
    pub fn new(settings: &TokenSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = settings.leeway_secs;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            // Out-of-range lifetimes saturate; `issue` then fails instead of panicking
            ttl: Duration::try_hours(settings.ttl_hours).unwrap_or(Duration::MAX),
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
        }
    }

    /// Service with the default lifetime and no leeway
    pub fn from_secret(secret: impl Into<String>) -> Self {
        Self::new(&TokenSettings {
            secret: secret.into(),
            ..TokenSettings::default()
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, subject: SubjectId) -> AuthResult<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(ttl = ?self.ttl, "token expiry out of range");
            AuthError::TokenGenerationFailed
        })?;
        let claims = AuthClaims {
            user_id: subject,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    fn verify(&self, token: &str) -> AuthResult<AuthClaims> {
        decode::<AuthClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "token rejected");
                AuthError::InvalidToken
            })
    }
}

impl fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtTokenService {
        JwtTokenService::from_secret("test_secret_key_for_testing_only")
    }

    #[test]
    fn test_token_has_three_parts() {
        let token = create_test_service().issue(SubjectId::Numeric(7)).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_issue_then_verify() {
        let service = create_test_service();
        let token = service.issue(SubjectId::Numeric(42)).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id, SubjectId::Numeric(42));
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL_HOURS * 3600);
    }

    #[test]
    fn test_string_subject_round_trips() {
        let service = create_test_service();
        let token = service.issue(SubjectId::from("user-abc")).unwrap();
        assert_eq!(
            service.verify(&token).unwrap().user_id,
            SubjectId::Text("user-abc".into())
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtTokenService::from_secret("secret_one")
            .issue(SubjectId::Numeric(1))
            .unwrap();
        let result = JwtTokenService::from_secret("secret_two").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = JwtTokenService::new(&TokenSettings {
            secret: "s".into(),
            ttl_hours: -1,
            leeway_secs: 0,
        });
        let token = expired.issue(SubjectId::Numeric(1)).unwrap();
        let result = JwtTokenService::from_secret("s").verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_unrepresentable_ttl_fails_to_issue() {
        for ttl_hours in [3_000_000_000, i64::MAX] {
            let service = JwtTokenService::new(&TokenSettings {
                secret: "s".into(),
                ttl_hours,
                leeway_secs: 0,
            });
            let result = service.issue(SubjectId::Numeric(1));
            assert!(matches!(result, Err(AuthError::TokenGenerationFailed)));
        }
    }

    #[test]
    fn test_longest_accepted_ttl_issues() {
        let service = JwtTokenService::new(&TokenSettings {
            secret: "s".into(),
            ttl_hours: MAX_TOKEN_TTL_HOURS,
            leeway_secs: 0,
        });
        let token = service.issue(SubjectId::Numeric(1)).unwrap();
        assert!(service.verify(&token).is_ok());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let result = create_test_service().verify("invalid.token.here");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
        assert!(create_test_service().verify("").is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let service = create_test_service();
        let token = service.issue(SubjectId::Numeric(1)).unwrap();
        let other = service.issue(SubjectId::Numeric(2)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(
            service.verify(&forged),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_subject_display_and_numeric_view() {
        assert_eq!(SubjectId::Numeric(5).to_string(), "5");
        assert_eq!(SubjectId::from("17").as_i64(), Some(17));
        assert_eq!(SubjectId::from("abc").as_i64(), None);
    }
}
