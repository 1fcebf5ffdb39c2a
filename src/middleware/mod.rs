/// Middleware module
///
/// Access-token verification for the protected routes.

mod jwt_middleware;

pub use jwt_middleware::JwtMiddleware;
