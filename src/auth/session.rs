/// Session lifecycle: register, login, refresh, logout
///
/// Anonymous clients become authenticated by registering or logging in and
/// receive an access/refresh pair; the refresh token is recorded as active.
/// Refreshing mints a new access token from an active refresh token. Logging
/// out drops the refresh token from the active set.

use std::sync::Arc;

use crate::auth::claims::UserIdentity;
use crate::auth::jwt::{TokenIssuer, TokenKind, TokenPair};
use crate::auth::password::{spawn_hash_password, spawn_verify_password};
use crate::auth::revocation::RevocationStore;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, DuplicateField};
use crate::store::{NewUser, UserStore};
use crate::validators::{validate_login, validate_registration, LoginRequest, RegisterRequest};

/// Result of a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access_token: String,
    /// Only set when refresh tokens are rotated
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct SessionController {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    issuer: TokenIssuer,
    rotate_refresh_tokens: bool,
}

impl SessionController {
    pub fn new(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            users,
            revocations,
            issuer,
            rotate_refresh_tokens: false,
        }
    }

    /// Build a controller from JWT settings, honouring the rotation flag
    pub fn from_settings(
        settings: &JwtSettings,
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Result<Self, AppError> {
        let issuer = TokenIssuer::new(settings)?;
        Ok(Self::new(users, revocations, issuer).with_rotation(settings.rotate_refresh_tokens))
    }

    /// Replace the refresh token on every refresh instead of reusing it
    pub fn with_rotation(mut self, rotate: bool) -> Self {
        self.rotate_refresh_tokens = rotate;
        self
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenPair, AppError> {
        let registration = validate_registration(request)?;

        // Duplicates are rejected before paying for a hash
        if self.users.find_by_username(&registration.username).await?.is_some() {
            return Err(AppError::Duplicate(DuplicateField::Username));
        }
        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(AppError::Duplicate(DuplicateField::Email));
        }

        let password_hash = spawn_hash_password(registration.password).await?;
        let user = self
            .users
            .insert(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        self.start_session(&user.identity()).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<TokenPair, AppError> {
        let credentials = validate_login(request)?;

        let user = match self.users.find_by_email(&credentials.email).await? {
            Some(user) => user,
            None => {
                tracing::info!("Login attempt for unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !spawn_verify_password(credentials.password, user.password_hash.clone()).await? {
            tracing::info!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        self.start_session(&user.identity()).await
    }

    async fn start_session(&self, identity: &UserIdentity) -> Result<TokenPair, AppError> {
        let pair = self.issuer.issue_pair(identity)?;
        self.revocations.add(&pair.refresh_token).await?;
        Ok(pair)
    }

    /// Mint a new access token from an active refresh token
    ///
    /// # Errors
    /// - `Unauthenticated` when no token is presented
    /// - `Forbidden` when the token is not in the active set
    /// - `InvalidToken` when the token fails verification
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<RefreshedTokens, AppError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        if !self.revocations.contains(token).await? {
            tracing::warn!("Refresh attempted with inactive token");
            return Err(AuthError::Forbidden.into());
        }

        // A token failing verification stays in the active set; only
        // issuance, rotation and logout change it
        let identity = self.issuer.verify(TokenKind::Refresh, token)?;

        // With rotation the token is taken out atomically so only one
        // concurrent use can succeed
        if self.rotate_refresh_tokens && !self.revocations.remove(token).await? {
            tracing::warn!("Refresh token already rotated by a concurrent request");
            return Err(AuthError::Forbidden.into());
        }

        let access_token = self.issuer.issue_access_token(&identity)?;
        let refresh_token = if self.rotate_refresh_tokens {
            let rotated = self.issuer.issue_refresh_token(&identity)?;
            self.revocations.add(&rotated).await?;
            Some(rotated)
        } else {
            None
        };

        tracing::info!(user_id = %identity.id, rotated = refresh_token.is_some(), "Access token refreshed");
        Ok(RefreshedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Drop a refresh token from the active set. Absent or unknown tokens are
    /// not an error.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), AppError> {
        if let Some(token) = refresh_token.filter(|t| !t.is_empty()) {
            let removed = self.revocations.remove(token).await?;
            tracing::info!(removed = removed, "Session logged out");
        }
        Ok(())
    }
}
