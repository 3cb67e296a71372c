//! httpOnly auth cookies for the browser page.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use super::auth::REFRESH_TOKEN_EXPIRY_DAYS;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "gemchat_access";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "gemchat_refresh";

fn auth_cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Access token cookie, living as long as the token.
pub fn access_cookie(token: &str, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    auth_cookie(ACCESS_COOKIE, token, Duration::seconds(max_age_secs), secure)
}

/// Refresh token cookie.
pub fn refresh_cookie(token: &str, secure: bool) -> Cookie<'static> {
    auth_cookie(
        REFRESH_COOKIE,
        token,
        Duration::days(REFRESH_TOKEN_EXPIRY_DAYS),
        secure,
    )
}

/// Expired access cookie.
pub fn clear_access_cookie(secure: bool) -> Cookie<'static> {
    auth_cookie(ACCESS_COOKIE, "", Duration::ZERO, secure)
}

/// Expired refresh cookie.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    auth_cookie(REFRESH_COOKIE, "", Duration::ZERO, secure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_is_http_only_lax() {
        let c = access_cookie("tok", 900, false);
        assert_eq!(c.name(), ACCESS_COOKIE);
        assert_eq!(c.value(), "tok");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.max_age(), Some(Duration::seconds(900)));
        assert_eq!(c.path(), Some("/"));
    }

    #[test]
    fn secure_flag_follows_config() {
        assert_eq!(refresh_cookie("tok", true).secure(), Some(true));
        assert_eq!(refresh_cookie("tok", false).secure(), Some(false));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        assert_eq!(clear_access_cookie(false).max_age(), Some(Duration::ZERO));
        assert_eq!(clear_refresh_cookie(false).value(), "");
    }
}
