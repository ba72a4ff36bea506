use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, error};

use crate::state::OAuthConfig;

/// Response from the provider's token endpoint. Only `id_token` gates
/// the login flow; the rest is carried for completeness and logging.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("token endpoint returned {status}")]
    Endpoint { status: StatusCode, body: String },
    #[error("failed to parse token response: {0}")]
    Malformed(String),
}

/// Exchange an authorization code, together with the PKCE verifier that
/// opened the flow, for tokens at the provider's token endpoint.
///
/// The `redirect_uri` sent here must equal the one on the authorization
/// request. Timeouts ride the shared client and surface as
/// [`ExchangeError::Transport`], never as a hang.
pub async fn exchange_code(
    http: &reqwest::Client,
    token_url: &str,
    config: &OAuthConfig,
    code: &str,
    code_verifier: &str,
) -> Result<TokenResponse, ExchangeError> {
    let redirect_uri = config.redirect_uri();
    let request_body = form_body(&[
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", &redirect_uri),
        ("client_id", &config.client_id),
        ("client_secret", &config.client_secret),
        ("code_verifier", code_verifier),
    ]);

    debug!(%token_url, "exchanging authorization code");

    let response = http
        .post(token_url)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json")
        .body(request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error response".to_string());
        error!(%status, "token exchange rejected by provider");
        return Err(ExchangeError::Endpoint { status, body });
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| ExchangeError::Malformed(e.to_string()))
}

/// Build an `application/x-www-form-urlencoded` body.
fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_body_percent_encodes_values() {
        let body = form_body(&[
            ("grant_type", "authorization_code"),
            ("redirect_uri", "http://localhost:8000/callback"),
        ]);
        assert_eq!(
            body,
            "grant_type=authorization_code&redirect_uri=http%3A%2F%2Flocalhost%3A8000%2Fcallback"
        );
    }

    #[test]
    fn token_response_tolerates_missing_optional_fields() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"id_token":"abc"}"#).unwrap();
        assert_eq!(parsed.id_token.as_deref(), Some("abc"));
        assert!(parsed.access_token.is_none());
        assert!(parsed.expires_in.is_none());
    }

    #[test]
    fn token_response_reads_the_full_shape() {
        let parsed: TokenResponse = serde_json::from_str(
            r#"{"access_token":"at","token_type":"Bearer","expires_in":3600,"id_token":"idt","scope":"openid"}"#,
        )
        .unwrap();
        assert_eq!(parsed.access_token.as_deref(), Some("at"));
        assert_eq!(parsed.token_type.as_deref(), Some("Bearer"));
        assert_eq!(parsed.expires_in, Some(3600));
        assert_eq!(parsed.id_token.as_deref(), Some("idt"));
    }
}
