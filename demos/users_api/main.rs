//! Users API
//!
//! A small user service mounted under an API prefix:
//! - `POST /signin` and `POST /signup` are public
//! - every other route needs `Authorization: Bearer <token>`
//! - request bodies and list queries are validated before any handler runs
//!
//! Configuration comes from the YAML file named by `GATEHOUSE_CONFIG` (if set),
//! then `JWT_SECRET`, `API_PREFIX` and `PORT` from the environment.
//!
//! ```bash
//! JWT_SECRET=dev-secret cargo run --example users_api
//! ```

mod dto;
mod handlers;
mod store;

use anyhow::{Context, Result};
use dto::{CreateUser, ListUsersQuery, SignIn, UpdateUser};
use gatehouse::prelude::*;
use std::sync::Arc;
use store::UserStore;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "GATEHOUSE_CONFIG";

fn load_config() -> Result<GateConfig> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => GateConfig::from_yaml_file(&path)
            .with_context(|| format!("loading {}", path))?,
        Err(_) => GateConfig {
            api_prefix: "/api/v1".to_string(),
            ..GateConfig::default()
        },
    };
    Ok(config.apply_env_overrides()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    config.validate()?;

    let store = UserStore::new();
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(&config.token));
    let exchange = CredentialExchange::new(Arc::new(store.clone()), tokens.clone());

    tracing::info!(prefix = %config.api_prefix, "starting users API");

    GateBuilder::new(config)
        .with_token_service(tokens)
        .with_extension(store)
        .with_extension(exchange)
        // public
        .route(
            RouteSpec::post("/signin").schema::<SignIn>().skip_auth(),
            handlers::sign_in,
        )?
        .route(
            RouteSpec::post("/signup").schema::<CreateUser>().skip_auth(),
            handlers::sign_up,
        )?
        // protected
        .route(RouteSpec::post("/signout"), handlers::sign_out)?
        .route(RouteSpec::get("/me"), handlers::me)?
        .route(
            RouteSpec::get("/users").schema::<ListUsersQuery>(),
            handlers::list_users,
        )?
        .route(
            RouteSpec::post("/users").schema::<CreateUser>(),
            handlers::create_user,
        )?
        .route(RouteSpec::get("/users/:id"), handlers::get_user)?
        .route(
            RouteSpec::patch("/users/:id").schema::<UpdateUser>(),
            handlers::update_user,
        )?
        .route(RouteSpec::delete("/users/:id"), handlers::delete_user)?
        .route(
            RouteSpec::get("/users/username/:username"),
            handlers::get_user_by_username,
        )?
        .serve()
        .await
}
