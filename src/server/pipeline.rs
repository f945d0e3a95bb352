//! Request pipeline: validation, then authentication, then the handler
//!
//! ```text
//! Start → MatchSchema → Validated | SkipValidation → AuthCheck → Authenticated | Bypassed → Handler
//!                  ↘ Rejected(400)                          ↘ Rejected(401)
//! ```
//!
//! [`gate_middleware`] runs the stages for every routed request. The route is
//! resolved once against the [`SchemaRegistry`]; the same resolution decides the
//! schema and the auth bypass. On success a [`RequestScope`] carrying the
//! validated input, the claims and the path parameters is inserted into the
//! request extensions before the handler runs.

use super::registry::SchemaRegistry;
use crate::config::DEFAULT_BODY_LIMIT;
use crate::core::auth::{AuthError, extract_bearer};
use crate::core::error::GateError;
use crate::core::scope::RequestScope;
use crate::core::token::TokenService;
use crate::core::validation::{RawInput, ValidationEngine};
use axum::body::{Body, Bytes};
use axum::extract::{OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::sync::Arc;

/// Pipeline stages, as reported in trace logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    MatchSchema,
    Validated,
    SkipValidation,
    AuthCheck,
    Authenticated,
    Bypassed,
    Rejected(u16),
}

/// Shared, immutable pipeline state
pub struct Gate {
    registry: Arc<SchemaRegistry>,
    tokens: Arc<dyn TokenService>,
    engine: ValidationEngine,
    body_limit: usize,
}

impl Gate {
    /// Takes ownership of the registry; it can no longer change afterwards
    pub fn new(registry: SchemaRegistry, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            registry: Arc::new(registry),
            tokens,
            engine: ValidationEngine::new(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Run every stage before the handler
    ///
    /// Returns the request, with its scope installed, when the handler may run.
    pub async fn admit(&self, request: Request) -> Result<Request, GateError> {
        let (mut parts, body) = request.into_parts();
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let mut scope = RequestScope::new();
        let mut stage = Stage::Start;
        trace_stage(&scope, stage);

        let resolved = self.registry.resolve(&parts.method, &path);
        if let Some(route) = &resolved {
            let params = route
                .params(&path)
                .map_err(|e| GateError::structural(e.to_string()))
                .inspect_err(|err| reject(&scope, err))?;
            scope.set_params(params);
        }

        // Validation
        stage = Stage::MatchSchema;
        trace_stage(&scope, stage);

        let body = match resolved.as_ref().and_then(|route| route.entry.schema()) {
            Some(schema) => {
                let bytes = self.read_body(body).await.inspect_err(|err| {
                    reject(&scope, err);
                })?;
                let input = RawInput::new(&parts.method)
                    .with_query(parts.uri.query().unwrap_or(""))
                    .with_body(&bytes);

                let validated = self
                    .engine
                    .validate(schema, &input)
                    .inspect_err(|err| reject(&scope, err))?;
                scope.set_validated(validated)?;

                stage = Stage::Validated;
                Body::from(bytes)
            }
            None => {
                stage = Stage::SkipValidation;
                body
            }
        };
        trace_stage(&scope, stage);

        // Authentication
        stage = Stage::AuthCheck;
        trace_stage(&scope, stage);

        if resolved.is_some_and(|route| route.entry.skips_auth()) {
            stage = Stage::Bypassed;
        } else {
            let claims = extract_bearer(&parts.headers)
                .ok_or(AuthError::MissingCredential)
                .and_then(|token| self.tokens.verify(token))
                .map_err(GateError::from)
                .inspect_err(|err| reject(&scope, err))?;
            scope.set_claims(claims)?;
            stage = Stage::Authenticated;
        }
        trace_stage(&scope, stage);

        parts.extensions.insert(scope);
        Ok(Request::from_parts(parts, body))
    }

    async fn read_body(&self, body: Body) -> Result<Bytes, GateError> {
        axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|e| GateError::structural(format!("Invalid data format: {}", e)))
    }
}

impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("routes", &self.registry.len())
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}

fn trace_stage(scope: &RequestScope, stage: Stage) {
    tracing::debug!(request_id = %scope.request_id(), ?stage, "pipeline stage");
}

fn reject(scope: &RequestScope, err: &GateError) {
    let stage = Stage::Rejected(err.status_code().as_u16());
    tracing::warn!(
        request_id = %scope.request_id(),
        ?stage,
        code = err.error_code(),
        "request rejected: {}",
        err
    );
}

/// Axum middleware running the [`Gate`] in front of every routed handler
///
/// ```rust,ignore
/// let gate = Arc::new(Gate::new(registry, tokens));
/// let app = Router::new()
///     .route("/users", post(create_user))
///     .layer(axum::middleware::from_fn_with_state(gate, gate_middleware));
/// ```
pub async fn gate_middleware(
    State(gate): State<Arc<Gate>>,
    request: Request,
    next: Next,
) -> Response {
    match gate.admit(request).await {
        Ok(request) => next.run(request).await,
        Err(err) => err.into_response(),
    }
}
