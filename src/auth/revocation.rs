/// Refresh Token Liveness
///
/// The active set of refresh tokens. A refresh token is usable only while it
/// is in this set, whatever its signature says. Issuance adds, logout and
/// rotation remove. The store is injected so deployments can swap the
/// in-memory set for a shared backend.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Mark `token` as active
    async fn add(&self, token: &str) -> Result<(), StoreError>;

    /// Drop `token` from the active set, reporting whether it was there.
    /// Removal and the membership answer happen atomically.
    async fn remove(&self, token: &str) -> Result<bool, StoreError>;

    async fn contains(&self, token: &str) -> Result<bool, StoreError>;
}

/// Process-local active set; emptied by a restart
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    active: Mutex<HashSet<String>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> Result<MutexGuard<'_, HashSet<String>>, StoreError> {
        self.active
            .lock()
            .map_err(|_| StoreError::Backend("revocation store lock poisoned".to_string()))
    }

    /// Number of active refresh tokens
    pub fn len(&self) -> usize {
        self.active().map(|set| set.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn add(&self, token: &str) -> Result<(), StoreError> {
        self.active()?.insert(token.to_string());
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.active()?.remove(token))
    }

    async fn contains(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.active()?.contains(token))
    }
}
