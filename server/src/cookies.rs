use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse as _, Response},
};
use tracing::error;

pub use tower_cookies::Cookie;

use crate::state::AppState;

/// Private (encrypted and authenticated) cookie access bound to the
/// configured session key. Values are unreadable and unforgeable
/// without the secret.
pub struct CookieJar {
    cookies: tower_cookies::Cookies,
    state: AppState,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for CookieJar {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = match tower_cookies::Cookies::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(_) => {
                error!("Failed to extract cookies from request");
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
        };

        Ok(CookieJar {
            cookies,
            state: state.clone(),
        })
    }
}

impl CookieJar {
    /// Add or replace a private cookie.
    pub fn add(&self, cookie: Cookie<'static>) {
        self.cookies.private(&self.state.cookie_key).add(cookie);
    }

    /// Get a private cookie by name. Tampered or foreign cookies fail
    /// decryption and read as absent.
    pub fn get(&self, name: &str) -> Option<Cookie<'static>> {
        self.cookies.private(&self.state.cookie_key).get(name)
    }

    /// Remove the cookie from the jar.
    pub fn remove(&self, cookie: Cookie<'static>) {
        self.cookies.private(&self.state.cookie_key).remove(cookie);
    }

    /// Whether cookies should carry the Secure attribute, derived from
    /// the configured public base URL.
    pub fn secure(&self) -> bool {
        self.state.config.base_url.starts_with("https://")
    }
}
