/// Session Routes
///
/// Registration, login, access-token refresh and logout. Tokens travel as
/// http-only cookies; `/token` also returns the new access token in its body.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, HttpResponseBuilder};
use serde::{Deserialize, Serialize};

use crate::auth::{
    SessionController, TokenIssuer, TokenKind, TokenPair, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
use crate::error::{AppError, ErrorContext};
use crate::validators::{LoginRequest, RegisterRequest};

/// Body of `/token` and `/logout`
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
struct SuccessResponse {
    success: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

fn token_cookie(name: &'static str, value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build(name, "").path("/").http_only(true).finish();
    cookie.make_removal();
    cookie
}

fn set_session_cookies(response: &mut HttpResponseBuilder, pair: &TokenPair, issuer: &TokenIssuer) {
    response
        .cookie(token_cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token.clone(),
            issuer.expiry_seconds(TokenKind::Access),
        ))
        .cookie(token_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
            issuer.expiry_seconds(TokenKind::Refresh),
        ));
}

/// Refresh token from the JSON body, falling back to the cookie
fn presented_refresh_token(
    req: &HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
) -> Option<String> {
    body.and_then(|b| b.into_inner().refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| req.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
}

/// POST /register
///
/// # Errors
/// - 400: validation failure, `{ "message": ... }`
/// - 409: username or email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionController>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let pair = sessions
        .register(&form)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, "Register successful");

    let mut response = HttpResponse::Ok();
    set_session_cookies(&mut response, &pair, sessions.issuer());
    Ok(response.json(SuccessResponse {
        success: "Register successful",
    }))
}

/// POST /login
///
/// Unknown email and wrong password produce the same 400 body.
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionController>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let pair = sessions
        .login(&form)
        .await
        .map_err(|e| context.record(e))?;

    tracing::info!(request_id = %context.request_id, "Login successful");

    let mut response = HttpResponse::Ok();
    set_session_cookies(&mut response, &pair, sessions.issuer());
    Ok(response.json(SuccessResponse {
        success: "Login successful",
    }))
}

/// POST /token
///
/// # Errors
/// - 401: no refresh token presented
/// - 403: refresh token not active
/// - 400: refresh token fails verification
pub async fn token(
    req: HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
    sessions: web::Data<SessionController>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");
    let presented = presented_refresh_token(&req, body);

    let refreshed = sessions
        .refresh(presented.as_deref())
        .await
        .map_err(|e| context.record(e))?;

    let issuer = sessions.issuer();
    let mut response = HttpResponse::Ok();
    response.cookie(token_cookie(
        ACCESS_TOKEN_COOKIE,
        refreshed.access_token.clone(),
        issuer.expiry_seconds(TokenKind::Access),
    ));
    if let Some(rotated) = &refreshed.refresh_token {
        response.cookie(token_cookie(
            REFRESH_TOKEN_COOKIE,
            rotated.clone(),
            issuer.expiry_seconds(TokenKind::Refresh),
        ));
    }

    Ok(response.json(TokenResponse {
        access_token: refreshed.access_token,
        refresh_token: refreshed.refresh_token,
    }))
}

/// DELETE /logout
///
/// Always succeeds, whether or not the token was active.
pub async fn logout(
    req: HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
    sessions: web::Data<SessionController>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout");
    let presented = presented_refresh_token(&req, body);

    sessions
        .logout(presented.as_deref())
        .await
        .map_err(|e| context.record(e))?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(removal_cookie(REFRESH_TOKEN_COOKIE))
        .content_type("text/plain; charset=utf-8")
        .body("Logout successful"))
}
