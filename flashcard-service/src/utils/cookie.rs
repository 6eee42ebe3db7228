use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const TOKEN_COOKIE: &str = "token";

/// HttpOnly session cookie carrying the JWT.
pub fn token_cookie(token: String, max_age_days: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::days(max_age_days))
        .build()
}

/// Expired cookie that makes the browser drop the session.
pub fn expired_token_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_cookie_is_http_only_and_strict() {
        let cookie = token_cookie("abc".to_string(), 7, true);
        let rendered = cookie.to_string();
        assert!(rendered.contains("token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("Max-Age=604800"));
    }

    #[test]
    fn expired_cookie_has_zero_max_age() {
        let rendered = expired_token_cookie(false).to_string();
        assert!(rendered.contains("Max-Age=0"));
        assert!(!rendered.contains("Secure"));
    }
}
