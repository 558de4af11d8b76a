//! Cookie-carried sessions.
//!
//! Customers hold `auth_token` plus the script-readable `is_logged_in` hint;
//! administrators hold `admin_auth_token`. Both tokens are JWTs issued by
//! [`TokenIssuer`](trattoria_service::token::TokenIssuer).

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};
use tracing::warn;
use trattoria_service::token::{Principal, Role};

use crate::error::ApiError;
use crate::handlers::AppState;

pub const AUTH_COOKIE: &str = "auth_token";
pub const ADMIN_COOKIE: &str = "admin_auth_token";
pub const LOGGED_IN_COOKIE: &str = "is_logged_in";

/// Finds a cookie by name across every `Cookie` header of the request.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn set_cookie(name: &str, value: &str, max_age: i64, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; SameSite=Lax");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn customer_login_cookies(token: &str, max_age: i64, secure: bool) -> [String; 2] {
    [
        set_cookie(AUTH_COOKIE, token, max_age, true, secure),
        set_cookie(LOGGED_IN_COOKIE, "true", max_age, false, secure),
    ]
}

pub fn admin_login_cookies(token: &str, max_age: i64, secure: bool) -> [String; 1] {
    [set_cookie(ADMIN_COOKIE, token, max_age, true, secure)]
}

pub fn logout_cookies(secure: bool) -> [String; 3] {
    [
        set_cookie(AUTH_COOKIE, "", 0, true, secure),
        set_cookie(ADMIN_COOKIE, "", 0, true, secure),
        set_cookie(LOGGED_IN_COOKIE, "", 0, false, secure),
    ]
}

fn verify_cookie(
    parts: &Parts,
    state: &AppState,
    cookie: &str,
    role: Role,
) -> Result<Principal, ApiError> {
    let token = cookie_value(&parts.headers, cookie).ok_or(ApiError::AuthenticationFailed)?;
    state.tokens.verify(token, role).map_err(|err| {
        warn!(%role, error = %err, uri = %parts.uri, "session rejected");
        ApiError::from(err)
    })
}

/// A signed-in customer, taken from the `auth_token` cookie.
#[derive(Debug, Clone)]
pub struct CustomerSession(pub Principal);

impl FromRequestParts<AppState> for CustomerSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        verify_cookie(parts, state, AUTH_COOKIE, Role::Customer).map(CustomerSession)
    }
}

/// A signed-in administrator, taken from the `admin_auth_token` cookie.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Principal);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        verify_cookie(parts, state, ADMIN_COOKIE, Role::Admin).map(AdminSession)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn finds_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; auth_token=abc.def"));
        headers.append(COOKIE, HeaderValue::from_static("admin_auth_token=xyz"));

        assert_eq!(cookie_value(&headers, AUTH_COOKIE), Some("abc.def"));
        assert_eq!(cookie_value(&headers, ADMIN_COOKIE), Some("xyz"));
        assert_eq!(cookie_value(&headers, LOGGED_IN_COOKIE), None);
    }

    #[test]
    fn login_cookies_hide_token_from_scripts() {
        let [auth, hint] = customer_login_cookies("tok", 604800, false);

        assert_eq!(
            auth,
            "auth_token=tok; Path=/; Max-Age=604800; SameSite=Lax; HttpOnly"
        );
        assert_eq!(hint, "is_logged_in=true; Path=/; Max-Age=604800; SameSite=Lax");
    }

    #[test]
    fn secure_flag_is_optional() {
        let [admin] = admin_login_cookies("tok", 60, true);
        assert!(admin.ends_with("; HttpOnly; Secure"));
    }

    #[test]
    fn logout_expires_every_cookie() {
        let cookies = logout_cookies(false);
        assert_eq!(cookies.len(), 3);
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }
}
