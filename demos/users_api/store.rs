//! In-memory user store
//!
//! Passwords are kept as given; this store only exists to drive the demo.

use crate::dto::{CreateUser, DEFAULT_LIMIT, ListUsersQuery, UpdateUser};
use chrono::{DateTime, NaiveDate, Utc};
use gatehouse::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("User not found")]
    NotFound,

    #[error("Username or email already taken")]
    Conflict,
}

/// Apply a tri-state update to an optional column
fn apply_optional(column: &mut Option<String>, update: NullableField<String>) {
    match update {
        NullableField::Present(value) => *column = Some(value),
        NullableField::Null => *column = None,
        NullableField::Absent => {}
    }
}

#[derive(Clone, Default)]
pub struct UserStore {
    users: Arc<RwLock<BTreeMap<i64, User>>>,
    next_id: Arc<AtomicI64>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, input: CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == input.username || u.email == input.email)
        {
            return Err(StoreError::Conflict);
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: input.username,
            email: input.email,
            password: input.password,
            full_name: input.full_name.into_value(),
            bio: input.bio.into_value(),
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn get_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub async fn update(&self, id: i64, input: UpdateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;

        // Required columns cannot be cleared; null leaves them unchanged
        if let Some(username) = input.username.into_value() {
            user.username = username;
        }
        if let Some(email) = input.email.into_value() {
            user.email = email;
        }
        if let Some(password) = input.password.into_value() {
            user.password = password;
        }
        apply_optional(&mut user.full_name, input.full_name);
        apply_optional(&mut user.bio, input.bio);
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    pub async fn search(&self, query: &ListUsersQuery) -> Vec<User> {
        let users = self.users.read().await;
        let created_from = parse_day(query.created_from.as_deref());
        let created_to = parse_day(query.created_to.as_deref());

        let mut found: Vec<User> = users
            .values()
            .filter(|u| contains(&u.username, query.username.as_deref()))
            .filter(|u| contains(&u.email, query.email.as_deref()))
            .filter(|u| contains_opt(u.full_name.as_deref(), query.full_name.as_deref()))
            .filter(|u| contains_opt(u.bio.as_deref(), query.bio.as_deref()))
            .filter(|u| created_from.is_none_or(|day| u.created_at.date_naive() >= day))
            .filter(|u| created_to.is_none_or(|day| u.created_at.date_naive() <= day))
            .cloned()
            .collect();

        match query.sort_by.as_deref() {
            Some("username_asc") => found.sort_by(|a, b| a.username.cmp(&b.username)),
            Some("username_desc") => found.sort_by(|a, b| b.username.cmp(&a.username)),
            Some("created_at_desc") => found.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            _ => found.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT) as usize;
        found.into_iter().skip(offset).take(limit).collect()
    }
}

fn parse_day(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn contains(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

fn contains_opt(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(_) => haystack.is_some_and(|h| contains(h, needle)),
    }
}

#[async_trait]
impl Authenticator for UserStore {
    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<SubjectId, AuthError> {
        self.get_by_username(identifier)
            .await
            .filter(|user| user.password == secret)
            .map(|user| SubjectId::Numeric(user.id))
            .ok_or(AuthError::InvalidCredentials)
    }
}
