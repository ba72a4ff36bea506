use color_eyre::eyre::Context as _;
use serde::Serialize;

use crate::state::{OAuthConfig, ProviderConfig};

/// Scopes requested from the provider. `openid` is what makes the token
/// endpoint return an ID token; the rest fill the profile claims.
pub const SCOPES: &str = "openid email profile";

/// Query parameters of the authorization request, serialized in one go
/// so nothing escapes by hand.
#[derive(Serialize)]
struct AuthorizationRequestParams<'a> {
    client_id: &'a str,
    redirect_uri: &'a str,
    response_type: &'static str,
    scope: &'static str,
    state: &'a str,
    code_challenge: &'a str,
    code_challenge_method: &'static str,
    access_type: &'static str,
    prompt: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hd: Option<&'a str>,
}

/// Build the redirect target for the provider's authorization endpoint.
///
/// `redirect_uri` must be byte-identical to the value later sent to the
/// token endpoint, so both derive it from [`OAuthConfig::redirect_uri`].
/// The `hd` hint narrows the provider's account chooser when a domain
/// is enforced; the server re-checks the domain after verification.
pub fn build_authorization_url(
    config: &OAuthConfig,
    provider: &ProviderConfig,
    state: &str,
    code_challenge: &str,
) -> color_eyre::Result<String> {
    let redirect_uri = config.redirect_uri();
    let params = AuthorizationRequestParams {
        client_id: &config.client_id,
        redirect_uri: &redirect_uri,
        response_type: "code",
        scope: SCOPES,
        state,
        code_challenge,
        code_challenge_method: "S256",
        access_type: "offline",
        prompt: "consent",
        hd: config.enforce_domain.as_deref(),
    };

    let query = serde_urlencoded::to_string(&params)
        .wrap_err("failed to serialize authorization request parameters")?;
    Ok(format!("{}?{}", provider.auth_url, query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(enforce_domain: Option<&str>) -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            base_url: "https://rp.example".to_string(),
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            enforce_domain: enforce_domain.map(str::to_string),
            admin_emails: vec![],
        }
    }

    #[test]
    fn url_carries_the_full_parameter_set() {
        let url = build_authorization_url(
            &test_config(None),
            &ProviderConfig::google(),
            "state-token",
            "challenge-token",
        )
        .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Frp.example%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid+email+profile"));
        assert!(url.contains("state=state-token"));
        assert!(url.contains("code_challenge=challenge-token"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(!url.contains("hd="));
    }

    #[test]
    fn domain_hint_is_appended_when_enforced() {
        let url = build_authorization_url(
            &test_config(Some("example.com")),
            &ProviderConfig::google(),
            "s",
            "c",
        )
        .unwrap();

        assert!(url.contains("hd=example.com"));
    }
}
