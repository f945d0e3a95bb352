//! Authentication primitives
//!
//! - [`AuthError`]: failures of token handling and credential exchange
//! - [`extract_bearer`]: pulls the token out of `Authorization: Bearer <token>`
//! - [`Authenticator`]: business-side credential check, supplied by the application
//! - [`CredentialExchange`]: authenticate, then issue a token
//!
//! The core never stores or compares credentials itself. It only verifies tokens
//! and hands the subject id to the handler.

use super::error::GateError;
use super::token::{SubjectId, TokenService};
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use std::sync::Arc;

/// Scheme prefix expected in the authorization header
pub const BEARER_PREFIX: &str = "Bearer ";

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredential,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Failed to generate token")]
    TokenGenerationFailed,
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AuthError::MissingCredential
            | AuthError::InvalidToken
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenGenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for GateError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => GateError::MissingCredential,
            AuthError::InvalidToken | AuthError::InvalidCredentials => {
                GateError::InvalidCredential
            }
            AuthError::TokenGenerationFailed => GateError::Internal(err.to_string()),
        }
    }
}

/// Token from an `Authorization: Bearer <token>` header
///
/// `None` when the header is absent, not valid UTF-8, or uses another scheme.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Checks an identifier/secret pair against the application's user store
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Return the subject on success, [`AuthError::InvalidCredentials`] otherwise
    async fn authenticate(&self, identifier: &str, secret: &str) -> AuthResult<SubjectId>;
}

/// Exchanges credentials for a bearer token
#[derive(Clone)]
pub struct CredentialExchange {
    authenticator: Arc<dyn Authenticator>,
    tokens: Arc<dyn TokenService>,
}

impl CredentialExchange {
    pub fn new(authenticator: Arc<dyn Authenticator>, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            authenticator,
            tokens,
        }
    }

    pub async fn sign_in(&self, identifier: &str, secret: &str) -> AuthResult<String> {
        let subject = self
            .authenticator
            .authenticate(identifier, secret)
            .await
            .inspect_err(|_| tracing::debug!("sign-in rejected"))?;

        tracing::debug!(subject = %subject, "issuing token");
        self.tokens.issue(subject)
    }

    pub fn tokens(&self) -> &Arc<dyn TokenService> {
        &self.tokens
    }
}
