//! Axum extractors over the request scope
//!
//! The pipeline middleware inserts a [`RequestScope`] into the request extensions.
//! These extractors read from it so handlers never touch the extensions directly.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::core::error::GateError;
use crate::core::path::PathParams;
use crate::core::scope::RequestScope;
use crate::core::token::{AuthClaims, SubjectId};

/// Scope installed by the pipeline, if it ran for this request
pub(crate) fn scope_of(parts: &Parts) -> Option<&RequestScope> {
    parts.extensions.get::<RequestScope>()
}

/// Claims of the authenticated caller
///
/// Rejects with 401 when the route was bypassed or the pipeline did not run.
///
/// ```rust,ignore
/// async fn me(Authenticated(claims): Authenticated) -> String {
///     claims.user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthClaims);

impl Authenticated {
    pub fn subject(&self) -> &SubjectId {
        &self.0.user_id
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        scope_of(parts)
            .and_then(RequestScope::claims)
            .cloned()
            .map(Authenticated)
            .ok_or(GateError::MissingCredential)
    }
}

/// Path parameters captured by the matched route template
///
/// Empty when the route has no registered template.
#[derive(Debug, Clone, Default)]
pub struct RouteParams(pub PathParams);

impl<S> FromRequestParts<S> for RouteParams
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RouteParams(
            scope_of(parts)
                .map(|scope| scope.params().clone())
                .unwrap_or_default(),
        ))
    }
}

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        scope_of(parts)
            .cloned()
            .ok_or_else(|| GateError::Internal("request scope not installed".to_string()))
    }
}
