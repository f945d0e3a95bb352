//! Typed error handling for the request pipeline
//!
//! Every failure the pipeline can produce is a [`GateError`]. Each variant knows
//! its HTTP status, a stable error code, and how to render itself as a response
//! body, so middleware and extractors can simply return it.
//!
//! # Error Categories
//!
//! - [`GateError::StructuralDecode`]: input could not be parsed into the expected shape
//! - [`GateError::Validation`]: one or more field rules failed
//! - [`GateError::MissingCredential`] / [`GateError::InvalidCredential`]: authentication failed
//! - [`GateError::MissingValidatedInput`]: a handler asked for input its route never validated
//! - [`GateError::Internal`]: should not happen in normal operation
//!
//! Single-cause failures render as `{"error": "..."}`; constraint failures render
//! as `{"errors": ["...", ...]}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Message returned when the authorization header is absent or malformed
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Missing authorization header";

/// Message returned for any token that does not verify
pub const INVALID_CREDENTIAL_MESSAGE: &str = "Invalid or expired token";

/// The main error type of the pipeline
#[derive(Debug)]
pub enum GateError {
    /// Body or query could not be decoded into the schema's shape
    StructuralDecode { message: String },

    /// Field constraints failed
    Validation(ValidationErrors),

    /// No usable bearer credential on a protected route
    MissingCredential,

    /// Credential present but bad signature, malformed or expired
    InvalidCredential,

    /// Handler requested validated input that is not in the request scope
    MissingValidatedInput,

    /// Internal errors
    Internal(String),
}

impl GateError {
    pub fn structural(message: impl Into<String>) -> Self {
        GateError::StructuralDecode {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            GateError::StructuralDecode { .. } => StatusCode::BAD_REQUEST,
            GateError::Validation(_) => StatusCode::BAD_REQUEST,
            GateError::MissingCredential => StatusCode::UNAUTHORIZED,
            GateError::InvalidCredential => StatusCode::UNAUTHORIZED,
            GateError::MissingValidatedInput => StatusCode::BAD_REQUEST,
            GateError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GateError::StructuralDecode { .. } => "INVALID_DATA_FORMAT",
            GateError::Validation(_) => "VALIDATION_ERROR",
            GateError::MissingCredential => "UNAUTHORIZED",
            GateError::InvalidCredential => "UNAUTHORIZED",
            GateError::MissingValidatedInput => "INVALID_INPUT",
            GateError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Render the response body
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            GateError::Validation(errors) => json!({ "errors": errors.messages() }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::StructuralDecode { message } => write!(f, "{}", message),
            GateError::Validation(errors) => write!(f, "{}", errors),
            GateError::MissingCredential => write!(f, "{}", MISSING_CREDENTIAL_MESSAGE),
            GateError::InvalidCredential => write!(f, "{}", INVALID_CREDENTIAL_MESSAGE),
            GateError::MissingValidatedInput => {
                write!(f, "Invalid input: no validated payload for this route")
            }
            GateError::Internal(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GateError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_body())).into_response()
    }
}

impl From<ValidationErrors> for GateError {
    fn from(errors: ValidationErrors) -> Self {
        GateError::Validation(errors)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single failed rule on a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    /// Rule name (`required`, `min`, `email`, ...)
    pub rule: String,
    pub message: String,
}

/// Every failed rule of one request, in field-declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: &str, rule: &str, message: String) {
        self.0.push(FieldViolation {
            field: field.to_string(),
            rule: rule.to_string(),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.message.as_str()).collect()
    }

    /// Violations for one field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.0.iter().filter(move |v| v.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation errors: {}", self.messages().join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
