//! Axum extractor for validated input
//!
//! The pipeline validates the request before the handler runs and leaves the typed
//! instance in the request scope. `Validated<T>` takes it back out.
//!
//! ```rust,ignore
//! pub async fn create_user(Validated(input): Validated<CreateUser>) -> StatusCode {
//!     // input already passed every rule of CreateUser's descriptor
//! }
//! ```

use crate::core::error::GateError;
use crate::core::extractors::scope_of;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::any::Any;
use std::sync::Arc;

/// The validated instance stored for this request
///
/// Rejects with [`GateError::MissingValidatedInput`] when the route has no schema,
/// and with an internal error when the schema decoded into another type.
pub struct Validated<T>(pub Arc<T>);

impl<T> Validated<T> {
    pub fn into_arc(self) -> Arc<T> {
        self.0
    }
}

impl<T: Clone> Validated<T> {
    pub fn into_inner(self) -> T {
        Arc::unwrap_or_clone(self.0)
    }
}

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Validated<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Validated").field(&self.0).finish()
    }
}

impl<S, T> FromRequestParts<S> for Validated<T>
where
    S: Send + Sync,
    T: Any + Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scope = scope_of(parts).ok_or(GateError::MissingValidatedInput)?;
        match scope.validated_arc::<T>() {
            Some(Ok(data)) => Ok(Validated(data)),
            Some(Err(())) => Err(GateError::Internal(format!(
                "validated input is not a {}",
                std::any::type_name::<T>()
            ))),
            None => Err(GateError::MissingValidatedInput),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scope::RequestScope;
    use axum::http::Request;

    #[derive(Debug, Clone, PartialEq)]
    struct SignIn {
        username: String,
    }

    fn parts_with(scope: RequestScope) -> Parts {
        let mut request = Request::builder().uri("/signin").body(()).unwrap();
        request.extensions_mut().insert(scope);
        request.into_parts().0
    }

    #[tokio::test]
    async fn test_extracts_stored_instance() {
        let mut scope = RequestScope::new();
        scope
            .set_validated(Arc::new(SignIn {
                username: "alice".into(),
            }))
            .unwrap();
        let mut parts = parts_with(scope);

        let validated = Validated::<SignIn>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(validated.username, "alice");
        assert_eq!(validated.into_inner().username, "alice");
    }

    #[tokio::test]
    async fn test_missing_instance_rejected() {
        let mut parts = parts_with(RequestScope::new());
        let err = Validated::<SignIn>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::MissingValidatedInput));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_type_is_internal() {
        let mut scope = RequestScope::new();
        scope.set_validated(Arc::new(42_i32)).unwrap();
        let mut parts = parts_with(scope);

        let err = Validated::<SignIn>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Internal(_)));
    }
}
