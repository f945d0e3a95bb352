//! Per-request scope
//!
//! The pipeline fills a [`RequestScope`] while it runs and hands it to the
//! handler through the request extensions. It holds at most one validated input
//! and at most one set of claims; each may be written once.

use crate::core::error::GateError;
use crate::core::path::PathParams;
use crate::core::token::{AuthClaims, SubjectId};
use crate::core::validation::ValidatedData;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// Transient storage for one request
#[derive(Clone)]
pub struct RequestScope {
    request_id: Uuid,
    validated: Option<ValidatedData>,
    claims: Option<AuthClaims>,
    params: PathParams,
}

impl RequestScope {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            validated: None,
            claims: None,
            params: PathParams::default(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Store the validated input; fails if one was already stored
    pub fn set_validated(&mut self, data: ValidatedData) -> Result<(), GateError> {
        if self.validated.is_some() {
            return Err(GateError::Internal(
                "validated input already set for this request".to_string(),
            ));
        }
        self.validated = Some(data);
        Ok(())
    }

    /// Store the authenticated claims; fails if claims were already stored
    pub fn set_claims(&mut self, claims: AuthClaims) -> Result<(), GateError> {
        if self.claims.is_some() {
            return Err(GateError::Internal(
                "claims already set for this request".to_string(),
            ));
        }
        self.claims = Some(claims);
        Ok(())
    }

    pub fn set_params(&mut self, params: PathParams) {
        self.params = params;
    }

    pub fn has_validated(&self) -> bool {
        self.validated.is_some()
    }

    /// The validated input as `T`, if present and of that type
    pub fn validated<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.validated.as_ref().and_then(|d| d.downcast_ref::<T>())
    }

    /// Shared handle to the validated input as `T`
    ///
    /// `Err(())` when input exists but is of another type.
    #[allow(clippy::result_unit_err)]
    pub fn validated_arc<T: Any + Send + Sync>(&self) -> Option<Result<Arc<T>, ()>> {
        self.validated
            .as_ref()
            .map(|d| Arc::clone(d).downcast::<T>().map_err(|_| ()))
    }

    pub fn claims(&self) -> Option<&AuthClaims> {
        self.claims.as_ref()
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        self.claims.as_ref().map(|c| &c.user_id)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

impl Default for RequestScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("request_id", &self.request_id)
            .field("validated", &self.validated.is_some())
            .field("claims", &self.claims)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(id: i64) -> AuthClaims {
        AuthClaims {
            user_id: SubjectId::Numeric(id),
            iat: 0,
            exp: 60,
        }
    }

    #[test]
    fn test_new_scope_is_empty() {
        let scope = RequestScope::new();
        assert!(!scope.has_validated());
        assert!(scope.claims().is_none());
        assert!(scope.params().is_empty());
    }

    #[test]
    fn test_validated_is_write_once() {
        let mut scope = RequestScope::new();
        scope.set_validated(Arc::new(5_u32)).unwrap();
        assert!(scope.set_validated(Arc::new(6_u32)).is_err());
        assert_eq!(scope.validated::<u32>(), Some(&5));
    }

    #[test]
    fn test_claims_are_write_once() {
        let mut scope = RequestScope::new();
        scope.set_claims(claims(1)).unwrap();
        assert!(scope.set_claims(claims(2)).is_err());
        assert_eq!(scope.subject(), Some(&SubjectId::Numeric(1)));
    }

    #[test]
    fn test_validated_wrong_type() {
        let mut scope = RequestScope::new();
        scope.set_validated(Arc::new("text".to_string())).unwrap();
        assert!(scope.validated::<u32>().is_none());
        assert!(matches!(scope.validated_arc::<u32>(), Some(Err(()))));
        assert!(matches!(scope.validated_arc::<String>(), Some(Ok(_))));
    }

    #[test]
    fn test_scopes_have_distinct_ids() {
        assert_ne!(RequestScope::new().request_id(), RequestScope::new().request_id());
    }
}
