use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use maud::{html, Render};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    components::{
        layout::{Card, ContentSection, Page},
        ui::{button::Button, heading::Heading},
    },
    errors::ServerResult,
    oauth::{
        pkce::{generate_state, PkcePair},
        policy,
        request::build_authorization_url,
        token::{self, ExchangeError},
        verify::VerifyError,
    },
    sessions::{PendingAuthorization, Session, SessionUser},
    state::AppState,
};

/// Query parameters the provider sends to the callback.
#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Start the login flow: mint the CSRF state and PKCE pair, remember
/// them in the session, and send the browser to the provider.
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
) -> ServerResult<Response, StatusCode> {
    if state.config.needs_setup().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let csrf_state = generate_state();
    let pkce = PkcePair::generate();
    let pending = PendingAuthorization::new(csrf_state, pkce.verifier.clone());
    let url = build_authorization_url(
        &state.config,
        &state.provider,
        &pending.state,
        &pkce.challenge,
    )?;
    session.set_pending(pending);

    info!("redirecting to the provider's authorization endpoint");
    Ok(Redirect::to(&url).into_response())
}

/// One failure per gate of the callback state machine. Every variant is
/// terminal: the response is a 4xx and the session keeps whatever it
/// held (the pending entry is consumed only on success).
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("provider reported: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },
    #[error("callback is missing the code or state parameter")]
    MissingParams,
    #[error("state does not match this session's login")]
    StateMismatch,
    #[error("login session expired before the callback arrived")]
    SessionExpired,
    #[error("token exchange failed")]
    Exchange(#[from] ExchangeError),
    #[error("token endpoint response carried no ID token")]
    MissingIdToken,
    #[error("ID token verification failed: {0}")]
    Verification(#[from] VerifyError),
    #[error("account is outside the allowed domain")]
    DomainDenied { domain: String },
}

impl CallbackError {
    /// 403 distinguishes "authenticated but not permitted" from every
    /// malformed/failed-handshake 400.
    fn status(&self) -> StatusCode {
        match self {
            CallbackError::DomainDenied { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            CallbackError::Provider { description, .. } => description.clone(),
            CallbackError::Exchange(ExchangeError::Endpoint { body, .. }) => Some(body.clone()),
            CallbackError::DomainDenied { domain } => {
                Some(format!("Only {domain} accounts are allowed."))
            }
            _ => None,
        }
    }
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        warn!(error = %self, "login callback rejected");

        let status = self.status();
        let detail = self.detail();
        let content = html! {
            (Heading::h1("Sign-in failed").render())
            p class="text-red-600 font-medium mb-4" { (self.to_string()) }

            @if let Some(detail) = detail {
                pre class="bg-gray-50 border border-gray-200 rounded-lg p-3 text-sm text-gray-700 overflow-x-auto mb-6" { (detail) }
            }

            div class="flex justify-center gap-4 mt-4" {
                (Button::primary("Try again", "/login").render())
                (Button::secondary("Home", "/").render())
            }
        };
        let page = Page::new(
            "Sign-in failed — OIDC Lab".to_string(),
            Box::new(Card::new(ContentSection::new(content)).with_max_width("max-w-lg")),
        );

        (status, page.render()).into_response()
    }
}

/// The provider's redirect back to us. Gates run strictly in order:
/// provider error, parameter presence, state binding, verifier
/// presence, code exchange, ID-token presence, verification, domain
/// policy. Reordering them weakens the CSRF guarantee.
pub async fn callback(
    State(state): State<AppState>,
    mut session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, CallbackError> {
    if state.config.needs_setup().is_some() {
        return Ok(Redirect::to("/"));
    }

    if let Some(error) = params.error {
        return Err(CallbackError::Provider {
            error,
            description: params.error_description,
        });
    }

    let (Some(code), Some(callback_state)) = (params.code, params.state) else {
        return Err(CallbackError::MissingParams);
    };

    // Anti-CSRF binding: the opaque state must equal the one stored at
    // /login. A session without a pending entry fails the same way.
    let Some(pending) = session.pending() else {
        return Err(CallbackError::StateMismatch);
    };
    if pending.state != callback_state {
        return Err(CallbackError::StateMismatch);
    }

    let code_verifier = pending.code_verifier.clone();
    if code_verifier.is_empty() {
        return Err(CallbackError::SessionExpired);
    }
    debug!(
        age_secs = Utc::now().timestamp() - pending.issued_at,
        "matched pending authorization"
    );

    let tokens = token::exchange_code(
        &state.http,
        &state.provider.token_url,
        &state.config,
        &code,
        &code_verifier,
    )
    .await?;
    let id_token = tokens.id_token.ok_or(CallbackError::MissingIdToken)?;

    let identity = state
        .verifier
        .verify(&id_token, &state.config.client_id)
        .await?;

    if let Some(required) = state.config.enforce_domain.as_deref() {
        if !policy::domain_allowed(
            identity.hosted_domain.as_deref(),
            identity.email.as_deref(),
            required,
        ) {
            return Err(CallbackError::DomainDenied {
                domain: required.to_string(),
            });
        }
    }

    let email = identity.email.unwrap_or_default();
    let user = SessionUser {
        subject: identity.subject,
        is_admin: policy::is_admin(&email, &state.config.admin_emails),
        email,
        email_verified: identity.email_verified,
        name: identity.name,
        picture: identity.picture,
        hosted_domain: identity.hosted_domain,
    };

    info!(email = %user.email, "login complete");
    session.establish(user);
    Ok(Redirect::to("/success"))
}
