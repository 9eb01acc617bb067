// Session cookies carrying the access and refresh tokens

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;

use crate::auth::token::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Builds the `accessToken` / `refreshToken` cookies for one domain
///
/// Both are `HttpOnly`, `SameSite=Strict` and scoped to `/`.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    domain: String,
}

impl SessionCookies {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into() }
    }

    fn build(&self, name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .domain(self.domain.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(max_age)
            .build()
    }

    /// Access token cookie, 1 hour
    pub fn access_cookie(&self, token: String) -> Cookie<'static> {
        self.build(ACCESS_TOKEN_COOKIE, token, Duration::seconds(ACCESS_TOKEN_TTL_SECS))
    }

    /// Refresh token cookie, 1 year
    pub fn refresh_cookie(&self, token: String) -> Cookie<'static> {
        self.build(REFRESH_TOKEN_COOKIE, token, Duration::seconds(REFRESH_TOKEN_TTL_SECS))
    }

    /// Set both session cookies
    pub fn issue(&self, jar: CookieJar, access_token: String, refresh_token: String) -> CookieJar {
        jar.add(self.access_cookie(access_token))
            .add(self.refresh_cookie(refresh_token))
    }

    /// Clear both session cookies: empty value, already expired
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal(ACCESS_TOKEN_COOKIE))
            .add(self.removal(REFRESH_TOKEN_COOKIE))
    }

    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), Duration::ZERO);
        cookie.make_removal();
        cookie
    }
}
