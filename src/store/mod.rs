/// Persistence collaborators
///
/// Users and statuses live behind async traits so the service runs the same
/// way against Postgres or against the in-memory stores used in tests and
/// single-node setups.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::UserIdentity;
use crate::error::StoreError;

pub use memory::{InMemoryStatusStore, InMemoryUserStore};
pub use postgres::{connect, PgStatusStore, PgUserStore};

/// Most statuses returned by a listing
pub const STATUS_LIST_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Lowercased
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub id: Uuid,
    /// Author's username
    pub user: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStatus {
    pub user: String,
    pub message: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Persist a new user. Fails with `StoreError::Duplicate` when the
    /// username or email is already taken, even if a prior lookup said
    /// otherwise.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Newest first, at most `limit`
    async fn list_recent(&self, limit: usize) -> Result<Vec<Status>, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Status>, StoreError>;

    async fn insert(&self, status: NewStatus) -> Result<Status, StoreError>;

    async fn update_message(&self, id: Uuid, message: &str) -> Result<Option<Status>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<Option<Status>, StoreError>;
}
