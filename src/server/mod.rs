//! Server module for building the gated HTTP application
//!
//! - [`SchemaRegistry`]: which routes validate which schema and which skip auth
//! - [`Gate`] / [`gate_middleware`]: the validation and authentication pipeline
//! - [`GateBuilder`]: registers routes on both the registry and the axum router

pub mod builder;
pub mod pipeline;
pub mod registry;

pub use builder::{GateBuilder, RouteSpec};
pub use pipeline::{Gate, Stage, gate_middleware};
pub use registry::{ResolvedRoute, RouteEntry, RouteKey, SchemaRegistry};
