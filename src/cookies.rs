use tower_cookies::{Cookie, Cookies, cookie::SameSite, cookie::time::Duration};

/// The name of the session cookie.
pub const ADMIN_TOKEN_COOKIE: &str = "admin-token";

/// Read access to request cookies.
pub trait CookieSource {
    /// Returns the value of the named cookie, if present.
    fn get_cookie(&self, name: &str) -> Option<String>;
}

impl CookieSource for Cookies {
    fn get_cookie(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value().to_string())
    }
}

/// Attributes of the `admin-token` cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    secure: bool,
    max_age_secs: i64,
}

impl SessionCookie {
    /// Creates cookie settings.
    ///
    /// # Arguments
    ///
    /// * `secure` - Whether to mark the cookie `Secure` (production transport).
    /// * `max_age_secs` - The cookie lifetime; matches the token TTL.
    pub fn new(secure: bool, max_age_secs: i64) -> Self {
        Self { secure, max_age_secs }
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(ADMIN_TOKEN_COOKIE, value);
        cookie.set_http_only(true);
        cookie.set_secure(self.secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_path("/");
        cookie
    }

    /// Builds the cookie carrying a freshly issued token.
    pub fn issue(&self, token: String) -> Cookie<'static> {
        let mut cookie = self.base(token);
        cookie.set_max_age(Duration::seconds(self.max_age_secs));
        cookie
    }

    /// Builds a cookie that makes the browser drop the session.
    pub fn expired(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.set_max_age(Duration::seconds(0));
        cookie
    }

    /// Sets the session cookie on the response.
    pub fn set(&self, cookies: &Cookies, token: String) {
        cookies.add(self.issue(token));
    }

    /// Clears the session cookie on the response.
    pub fn clear(&self, cookies: &Cookies) {
        cookies.add(self.expired());
    }
}
