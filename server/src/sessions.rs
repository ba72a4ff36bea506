use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cookies::{Cookie, CookieJar};
use crate::state::AppState;

/// Cookie holding the serialized [`SessionData`] for one browser.
pub const SESSION_COOKIE_NAME: &str = "oidc_lab_session";

/// How long the session cookie lives.
const SESSION_DURATION_DAYS: i64 = 7;

/// Transient artifacts of an in-flight authorization request. Exactly
/// one may be live per session; a new login overwrites the prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    /// Opaque CSRF binding echoed by the provider on the callback.
    pub state: String,
    /// PKCE verifier matching the challenge sent to the provider.
    pub code_verifier: String,
    /// Unix timestamp of the login that opened this flow.
    pub issued_at: i64,
}

impl PendingAuthorization {
    pub fn new(state: String, code_verifier: String) -> Self {
        Self {
            state,
            code_verifier,
            issued_at: Utc::now().timestamp(),
        }
    }
}

/// The authenticated user record derived from a verified identity plus
/// the admin allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub hosted_domain: Option<String>,
    pub is_admin: bool,
}

/// Everything one browser session holds. Cleared as a whole on logout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub user: Option<SessionUser>,
    pub pending: Option<PendingAuthorization>,
}

/// Per-request session context backed by the private cookie jar.
/// Mutations write the cookie back immediately; an unreadable or absent
/// cookie reads as an empty session.
pub struct Session {
    jar: CookieJar,
    data: SessionData,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await?;
        let data = jar
            .get(SESSION_COOKIE_NAME)
            .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
            .unwrap_or_default();

        Ok(Session { jar, data })
    }
}

impl Session {
    pub fn user(&self) -> Option<&SessionUser> {
        self.data.user.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingAuthorization> {
        self.data.pending.as_ref()
    }

    /// Store a new pending authorization, replacing any prior one.
    pub fn set_pending(&mut self, pending: PendingAuthorization) {
        self.data.pending = Some(pending);
        self.persist();
    }

    /// Promote a verified identity to the authenticated user and drop
    /// the pending entry in the same write.
    pub fn establish(&mut self, user: SessionUser) {
        self.data.pending = None;
        self.data.user = Some(user);
        self.persist();
    }

    /// Forget everything this browser session held.
    pub fn clear(&mut self) {
        self.data = SessionData::default();
        self.jar
            .remove(session_cookie(String::new(), self.jar.secure()));
    }

    fn persist(&self) {
        let payload =
            serde_json::to_string(&self.data).expect("session data serializes to JSON");
        self.jar.add(session_cookie(payload, self.jar.secure()));
    }
}

fn session_cookie(payload: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, payload);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(time::Duration::days(SESSION_DURATION_DAYS));
    cookie
}

/// Extract the session user, or fall back to `None` without rejecting.
pub struct OptionalUser {
    pub user: Option<SessionUser>,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(OptionalUser {
            user: session.data.user,
        })
    }
}

/// Extract an authenticated user, redirecting anonymous requests to the
/// home page.
pub struct AuthUser {
    pub user: SessionUser,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        match session.data.user {
            Some(user) => Ok(AuthUser { user }),
            None => {
                info!("no authenticated session, redirecting to home");
                Err(Redirect::to("/").into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(email: &str) -> SessionUser {
        SessionUser {
            subject: "subject-1".to_string(),
            email: email.to_string(),
            email_verified: true,
            name: Some("Test User".to_string()),
            picture: None,
            hosted_domain: None,
            is_admin: false,
        }
    }

    #[test]
    fn session_data_round_trips_through_json() {
        let data = SessionData {
            user: Some(test_user("user@example.com")),
            pending: Some(PendingAuthorization::new(
                "state-token".to_string(),
                "verifier".to_string(),
            )),
        };

        let json = serde_json::to_string(&data).unwrap();
        let parsed: SessionData = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.user.unwrap().email, "user@example.com");
        let pending = parsed.pending.unwrap();
        assert_eq!(pending.state, "state-token");
        assert_eq!(pending.code_verifier, "verifier");
        assert!(pending.issued_at > 0);
    }

    #[test]
    fn empty_payload_reads_as_empty_session() {
        let parsed: SessionData = serde_json::from_str("{}").unwrap();
        assert!(parsed.user.is_none());
        assert!(parsed.pending.is_none());
    }

    #[test]
    fn session_cookie_attributes_are_locked_down() {
        let cookie = session_cookie("payload".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }
}
