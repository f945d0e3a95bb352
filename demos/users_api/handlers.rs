//! User HTTP handlers

use crate::dto::{CreateUser, ListUsersQuery, SignIn, UpdateUser};
use crate::store::{StoreError, User, UserStore};
use axum::response::{IntoResponse, Response};
use gatehouse::prelude::*;
use serde_json::{Value, json};

pub const ERR_INVALID_ID: &str = "Invalid ID";
pub const ERR_USER_NOT_FOUND: &str = "User not found";

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Handler-level failure rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match err {
            StoreError::NotFound => StatusCode::NOT_FOUND,
            StoreError::Conflict => StatusCode::CONFLICT,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::new(err.status_code(), err.to_string())
    }
}

fn user_id(params: &PathParams) -> ApiResult<i64> {
    params
        .parse::<i64>("id")
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, ERR_INVALID_ID))
}

pub async fn sign_in(
    Extension(exchange): Extension<CredentialExchange>,
    Validated(input): Validated<SignIn>,
) -> ApiResult<Json<Value>> {
    let token = exchange.sign_in(&input.username, &input.password).await?;
    Ok(Json(json!({ "token": token })))
}

pub async fn sign_up(
    Extension(store): Extension<UserStore>,
    Validated(input): Validated<CreateUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = store.create(input.as_ref().clone()).await?;
    tracing::info!(user_id = user.id, "user signed up");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn sign_out() -> Json<Value> {
    Json(json!({ "message": "Successfully signed out" }))
}

pub async fn me(
    Extension(store): Extension<UserStore>,
    user: Authenticated,
) -> ApiResult<Json<User>> {
    let id = user
        .subject()
        .as_i64()
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;
    store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, ERR_USER_NOT_FOUND))
}

pub async fn list_users(
    Extension(store): Extension<UserStore>,
    Validated(query): Validated<ListUsersQuery>,
) -> Json<Vec<User>> {
    Json(store.search(&query).await)
}

pub async fn get_user(
    Extension(store): Extension<UserStore>,
    RouteParams(params): RouteParams,
) -> ApiResult<Json<User>> {
    let id = user_id(&params)?;
    store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, ERR_USER_NOT_FOUND))
}

pub async fn get_user_by_username(
    Extension(store): Extension<UserStore>,
    RouteParams(params): RouteParams,
) -> ApiResult<Json<User>> {
    let username = params.get("username").unwrap_or_default();
    store
        .get_by_username(username)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, ERR_USER_NOT_FOUND))
}

pub async fn create_user(
    Extension(store): Extension<UserStore>,
    Validated(input): Validated<CreateUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = store.create(input.as_ref().clone()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    Extension(store): Extension<UserStore>,
    RouteParams(params): RouteParams,
    Validated(input): Validated<UpdateUser>,
) -> ApiResult<Json<User>> {
    let id = user_id(&params)?;
    let user = store.update(id, input.as_ref().clone()).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    Extension(store): Extension<UserStore>,
    RouteParams(params): RouteParams,
) -> ApiResult<StatusCode> {
    let id = user_id(&params)?;
    store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
