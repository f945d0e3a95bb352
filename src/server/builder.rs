//! GateBuilder for fluent API to build HTTP servers behind the pipeline

use super::pipeline::{Gate, gate_middleware};
use super::registry::{RouteKey, SchemaRegistry};
use crate::config::GateConfig;
use crate::core::path::PathTemplate;
use crate::core::token::{JwtTokenService, TokenService};
use crate::core::validation::{RegisteredSchema, Schema};
use anyhow::{Result, bail};
use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{MethodFilter, on};
use axum::{Extension, Router, middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

type RouterLayer = Box<dyn FnOnce(Router) -> Router + Send>;

/// One route declaration: method, template, optional schema and auth bypass
///
/// Templates use `:name` parameter segments and are given without the API prefix.
///
/// ```ignore
/// RouteSpec::post("/signin").schema::<SignIn>().skip_auth()
/// ```
#[derive(Debug, Clone)]
pub struct RouteSpec {
    method: Method,
    filter: MethodFilter,
    template: String,
    schema: Option<RegisteredSchema>,
    skip_auth: bool,
}

impl RouteSpec {
    fn new(method: Method, filter: MethodFilter, template: &str) -> Self {
        Self {
            method,
            filter,
            template: template.to_string(),
            schema: None,
            skip_auth: false,
        }
    }

    pub fn get(template: &str) -> Self {
        Self::new(Method::GET, MethodFilter::GET, template)
    }

    pub fn post(template: &str) -> Self {
        Self::new(Method::POST, MethodFilter::POST, template)
    }

    pub fn put(template: &str) -> Self {
        Self::new(Method::PUT, MethodFilter::PUT, template)
    }

    pub fn patch(template: &str) -> Self {
        Self::new(Method::PATCH, MethodFilter::PATCH, template)
    }

    pub fn delete(template: &str) -> Self {
        Self::new(Method::DELETE, MethodFilter::DELETE, template)
    }

    /// Validate requests on this route against `T` before the handler runs
    pub fn schema<T: Schema>(mut self) -> Self {
        self.schema = Some(RegisteredSchema::of::<T>());
        self
    }

    /// Let requests through without a bearer token
    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

/// Builder for the routed, gated application
///
/// # Example
///
/// ```ignore
/// let app = GateBuilder::new(config)
///     .route(RouteSpec::post("/signin").schema::<SignIn>().skip_auth(), sign_in)?
///     .route(RouteSpec::get("/users/:id"), get_user)?
///     .with_extension(store)
///     .build()?;
/// ```
pub struct GateBuilder {
    config: GateConfig,
    registry: SchemaRegistry,
    router: Router,
    tokens: Option<Arc<dyn TokenService>>,
    layers: Vec<RouterLayer>,
}

impl GateBuilder {
    /// Create a new GateBuilder
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            registry: SchemaRegistry::new(),
            router: Router::new(),
            tokens: None,
            layers: Vec::new(),
        }
    }

    /// Use a custom token service instead of one built from the config
    pub fn with_token_service(mut self, tokens: Arc<dyn TokenService>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Make `value` available to handlers through `Extension<T>`
    pub fn with_extension<T>(mut self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.layers
            .push(Box::new(move |router: Router| router.layer(Extension(value))));
        self
    }

    /// Register a route with the registry and the router
    ///
    /// The template is mounted under the configured API prefix. Declaring the same
    /// method and template twice is an error.
    pub fn route<H, T>(mut self, spec: RouteSpec, handler: H) -> Result<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let full = self.config.prefixed(&spec.template);
        if !full.starts_with('/') {
            bail!("Route template must start with '/': {}", spec.template);
        }

        let key = RouteKey::new(spec.method.clone(), full.as_str());
        if self.registry.get(&key).is_some() {
            bail!("Route {} is declared twice", key);
        }

        self.registry.declare(spec.method.clone(), &full);
        if let Some(schema) = spec.schema {
            self.registry.register(spec.method.clone(), &full, schema);
        }
        if spec.skip_auth {
            self.registry.skip_auth(spec.method.clone(), &full);
        }

        let router_path = PathTemplate::parse(&full).to_router_path();
        tracing::debug!(route = %key, path = %router_path, "route registered");
        self.router = self.router.route(&router_path, on(spec.filter, handler));

        Ok(self)
    }

    /// Routes registered so far
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Build the final router with the pipeline in front of every route
    pub fn build(self) -> Result<Router> {
        let tokens = match self.tokens {
            Some(tokens) => {
                self.config.validate_mount()?;
                tokens
            }
            None => {
                self.config.validate()?;
                Arc::new(JwtTokenService::new(&self.config.token)) as Arc<dyn TokenService>
            }
        };

        tracing::info!(routes = self.registry.len(), "building gated router");
        let gate = Arc::new(
            Gate::new(self.registry, tokens).with_body_limit(self.config.body_limit_bytes),
        );

        let mut router = self
            .router
            .route_layer(middleware::from_fn_with_state(gate, gate_middleware));
        for layer in self.layers {
            router = layer(router);
        }

        Ok(router.layer(TraceLayer::new_for_http()))
    }

    /// Build and serve on the configured listen address
    ///
    /// This is the simplest way to start a server. It:
    /// 1. Builds the router
    /// 2. Binds to the address
    /// 3. Serves until Ctrl+C or SIGTERM, then drains in-flight requests
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.listen_addr.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
