use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{DuplicateField, StoreError};
use crate::store::{NewStatus, NewUser, Status, StatusStore, User, UserStore};

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.write()?;

        // Uniqueness is re-checked under the write lock
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(DuplicateField::Username));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

/// Statuses kept in insertion order
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    statuses: RwLock<Vec<Status>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Status>>, StoreError> {
        self.statuses.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Status>>, StoreError> {
        self.statuses.write().map_err(|_| poisoned())
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Status>, StoreError> {
        Ok(self.read()?.iter().rev().take(limit).cloned().collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Status>, StoreError> {
        Ok(self.read()?.iter().find(|s| s.id == id).cloned())
    }

    async fn insert(&self, status: NewStatus) -> Result<Status, StoreError> {
        let status = Status {
            id: Uuid::new_v4(),
            user: status.user,
            message: status.message,
            created_at: Utc::now(),
        };
        self.write()?.push(status.clone());
        Ok(status)
    }

    async fn update_message(&self, id: Uuid, message: &str) -> Result<Option<Status>, StoreError> {
        let mut statuses = self.write()?;
        Ok(statuses.iter_mut().find(|s| s.id == id).map(|status| {
            status.message = message.to_string();
            status.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Status>, StoreError> {
        let mut statuses = self.write()?;
        Ok(statuses
            .iter()
            .position(|s| s.id == id)
            .map(|index| statuses.remove(index)))
    }
}
