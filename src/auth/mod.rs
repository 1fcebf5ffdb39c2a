/// Authentication module
///
/// Token issuance and verification, password hashing, the refresh-token
/// active set and the session lifecycle built on top of them.

mod claims;
mod jwt;
mod password;
mod revocation;
mod session;

pub use claims::{Claims, UserIdentity};
pub use jwt::{TokenIssuer, TokenKind, TokenPair};
pub use password::{hash_password, verify_password, HASH_COST};
pub use revocation::{InMemoryRevocationStore, RevocationStore};
pub use session::{RefreshedTokens, SessionController};

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
