/// JWT Claims structure
///
/// Both token kinds carry the same payload: the user identity plus the
/// standard registered claims (RFC 7519). `jti` is random per issuance so
/// two tokens minted for the same user in the same second never collide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Identity embedded in every token and attached to authenticated requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    /// Unique token ID
    pub jti: String,
}

impl Claims {
    /// Create claims for `identity`, valid for `expiry_seconds` from `issued_at`
    pub fn new(
        identity: &UserIdentity,
        issued_at: DateTime<Utc>,
        expiry_seconds: i64,
        issuer: &str,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            exp: iat + expiry_seconds,
            iat,
            iss: issuer.to_string(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Recover the identity from verified claims
    ///
    /// # Errors
    /// Returns `InvalidToken` if the subject is not a UUID
    pub fn identity(&self) -> Result<UserIdentity, AuthError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(UserIdentity {
            id,
            username: self.username.clone(),
        })
    }
}
