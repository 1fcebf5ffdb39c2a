/// JWT Token Generation and Validation
///
/// Access and refresh tokens are HS256 JWTs signed with two different
/// secrets and carrying two different lifetimes. Verification depends only on
/// the token, the secret of its kind and the current time.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, UserIdentity};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: i64,
}

impl SigningKeys {
    fn new(secret: &str, expiry_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }
}

/// Mints and verifies both token kinds
#[derive(Clone)]
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
    validation: Validation,
}

impl TokenIssuer {
    /// Build an issuer from configuration
    ///
    /// # Errors
    /// Returns a configuration error if a secret is empty, both secrets are
    /// equal, or a lifetime is not positive
    pub fn new(settings: &JwtSettings) -> Result<Self, AppError> {
        if settings.access_secret.is_empty() || settings.refresh_secret.is_empty() {
            return Err(AppError::Config("JWT secrets must not be empty".to_string()));
        }
        if settings.access_secret == settings.refresh_secret {
            return Err(AppError::Config(
                "access and refresh tokens must use different secrets".to_string(),
            ));
        }
        if settings.access_token_expiry <= 0 || settings.refresh_token_expiry <= 0 {
            return Err(AppError::Config("token lifetimes must be positive".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&settings.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Ok(Self {
            access: SigningKeys::new(&settings.access_secret, settings.access_token_expiry),
            refresh: SigningKeys::new(&settings.refresh_secret, settings.refresh_token_expiry),
            issuer: settings.issuer.clone(),
            validation,
        })
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of `kind`, in seconds
    pub fn expiry_seconds(&self, kind: TokenKind) -> i64 {
        self.keys(kind).expiry_seconds
    }

    /// Mint a token of `kind` as if issued at `now`
    ///
    /// # Errors
    /// Returns error if signing fails
    pub fn issue_at(
        &self,
        kind: TokenKind,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let keys = self.keys(kind);
        let claims = Claims::new(identity, now, keys.expiry_seconds, &self.issuer);

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            AppError::Internal(format!("{} token generation failed: {}", kind.as_str(), e))
        })
    }

    pub fn issue_access_token(&self, identity: &UserIdentity) -> Result<String, AppError> {
        self.issue_at(TokenKind::Access, identity, Utc::now())
    }

    pub fn issue_refresh_token(&self, identity: &UserIdentity) -> Result<String, AppError> {
        self.issue_at(TokenKind::Refresh, identity, Utc::now())
    }

    pub fn issue_pair(&self, identity: &UserIdentity) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(identity)?,
            refresh_token: self.issue_refresh_token(identity)?,
        })
    }

    /// Validate a token of `kind` and extract the identity it carries
    ///
    /// # Errors
    /// Returns `InvalidToken` if the token is malformed, tampered with,
    /// signed with another secret, issued by someone else, or expired
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<UserIdentity, AuthError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!(kind = kind.as_str(), "Token expired")
                    }
                    _ => tracing::warn!(kind = kind.as_str(), error = %e, "JWT validation error"),
                }
                AuthError::InvalidToken
            })?;

        data.claims.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            access_secret: "test-access-secret-at-least-32-characters".to_string(),
            refresh_secret: "test-refresh-secret-at-least-32-characters".to_string(),
            access_token_expiry: 600,
            refresh_token_expiry: 3600,
            issuer: "test".to_string(),
            rotate_refresh_tokens: false,
        }
    }

    fn identity() -> UserIdentity {
        UserIdentity {
            id: Uuid::new_v4(),
            username: "bob".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_both_kinds() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        let identity = identity();

        let pair = issuer.issue_pair(&identity).expect("Failed to generate tokens");

        assert_eq!(issuer.verify(TokenKind::Access, &pair.access_token).unwrap(), identity);
        assert_eq!(issuer.verify(TokenKind::Refresh, &pair.refresh_token).unwrap(), identity);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        let pair = issuer.issue_pair(&identity()).unwrap();

        assert_eq!(
            issuer.verify(TokenKind::Refresh, &pair.access_token),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            issuer.verify(TokenKind::Access, &pair.refresh_token),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        let identity = identity();

        let long_ago = Utc::now() - Duration::seconds(600 + 5);
        let access = issuer.issue_at(TokenKind::Access, &identity, long_ago).unwrap();
        assert_eq!(issuer.verify(TokenKind::Access, &access), Err(AuthError::InvalidToken));

        let refresh = issuer.issue_at(TokenKind::Refresh, &identity, long_ago).unwrap();
        assert!(issuer.verify(TokenKind::Refresh, &refresh).is_ok());

        let longer_ago = Utc::now() - Duration::seconds(3600 + 5);
        let refresh = issuer.issue_at(TokenKind::Refresh, &identity, longer_ago).unwrap();
        assert_eq!(issuer.verify(TokenKind::Refresh, &refresh), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_tokens_are_distinct_per_issuance() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        let identity = identity();
        let now = Utc::now();

        let first = issuer.issue_at(TokenKind::Refresh, &identity, now).unwrap();
        let second = issuer.issue_at(TokenKind::Refresh, &identity, now).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_token() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        assert_eq!(
            issuer.verify(TokenKind::Access, "invalid.token.here"),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_tampered_token() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        let token = issuer.issue_access_token(&identity()).unwrap();

        let tampered = format!("{}X", token);
        assert!(issuer.verify(TokenKind::Access, &tampered).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer = TokenIssuer::new(&get_test_config()).unwrap();
        let token = issuer.issue_access_token(&identity()).unwrap();

        let mut other = get_test_config();
        other.issuer = "wrong-issuer".to_string();
        let other = TokenIssuer::new(&other).unwrap();

        assert!(other.verify(TokenKind::Access, &token).is_err());
    }

    #[test]
    fn test_rejects_shared_or_empty_secrets() {
        let mut config = get_test_config();
        config.refresh_secret = config.access_secret.clone();
        assert!(matches!(TokenIssuer::new(&config), Err(AppError::Config(_))));

        let mut config = get_test_config();
        config.access_secret.clear();
        assert!(matches!(TokenIssuer::new(&config), Err(AppError::Config(_))));
    }
}
