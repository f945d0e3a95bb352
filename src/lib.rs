//! # Gatehouse
//!
//! A request pipeline for axum services: declarative input validation, bearer
//! token authentication and per-route auth bypass, in front of plain handlers.
//!
//! ## Features
//!
//! - **Declarative schemas**: each route names the input it expects through a
//!   [`SchemaDescriptor`](core::validation::SchemaDescriptor)
//! - **Accumulated errors**: every failed rule is reported, in field order
//! - **Tri-state fields**: [`NullableField`](core::NullableField) tells absent from null
//! - **JWT authentication**: HS256 tokens, a uniform 401 for any bad token
//! - **Explicit bypass**: sign-in style routes opt out of authentication per route
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatehouse::prelude::*;
//!
//! #[derive(Deserialize)]
//! struct SignIn {
//!     username: String,
//!     password: String,
//! }
//!
//! impl Schema for SignIn {
//!     fn descriptor() -> SchemaDescriptor {
//!         SchemaDescriptor::new("SignIn")
//!             .field(FieldSpec::new("username").required())
//!             .field(FieldSpec::new("password").required().credential().min_length(8))
//!     }
//! }
//!
//! async fn sign_in(Validated(input): Validated<SignIn>) -> String {
//!     input.username.clone()
//! }
//!
//! async fn me(user: Authenticated) -> String {
//!     user.subject().to_string()
//! }
//!
//! let app = GateBuilder::new(config)
//!     .route(RouteSpec::post("/signin").schema::<SignIn>().skip_auth(), sign_in)?
//!     .route(RouteSpec::get("/me"), me)?
//!     .build()?;
//! ```

pub mod config;
pub mod core;
pub mod server;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthError, Authenticator, CredentialExchange, extract_bearer},
        error::{GateError, ValidationErrors},
        extractors::{Authenticated, RouteParams},
        nullable::NullableField,
        path::{PathParams, PathTemplate},
        scope::RequestScope,
        token::{AuthClaims, JwtTokenService, SubjectId, TokenService},
    };

    // === Validation ===
    pub use crate::core::validation::{
        CharClass, Constraint, FieldSpec, FieldType, RawInput, Schema, SchemaDescriptor,
        Validated, ValidationEngine,
    };

    // === Config ===
    pub use crate::config::{GateConfig, TokenSettings};

    // === Server ===
    pub use crate::server::{Gate, GateBuilder, RouteSpec, SchemaRegistry, gate_middleware};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{
        Extension, Json, Router,
        http::{Method, StatusCode},
    };
}
