use std::env;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Context as _;
use rand::RngCore as _;
use tower_cookies::Key;

use crate::oauth::verify::IdTokenVerifier;

/// Placeholder values shipped with the sample environment; any of them
/// still present means the operator has not finished setup.
const PLACEHOLDER_CLIENT_ID: &str = "ENTER_YOUR_GOOGLE_CLIENT_ID_HERE";
const PLACEHOLDER_CLIENT_SECRET: &str = "ENTER_YOUR_GOOGLE_CLIENT_SECRET_HERE";
const PLACEHOLDER_SESSION_SECRET: &str = "ENTER_A_LONG_RANDOM_STRING_HERE";

/// Relying-party configuration, read from the environment once at
/// startup and injected everywhere from here.
#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Public base URL of this server, used to build the redirect URI.
    pub base_url: String,
    pub session_secret: String,
    /// When set, only identities from this domain may log in.
    pub enforce_domain: Option<String>,
    /// Lowercased email addresses allowed into the admin view.
    pub admin_emails: Vec<String>,
}

impl OAuthConfig {
    pub fn from_env() -> Self {
        let enforce_domain = env::var("ENFORCE_DOMAIN")
            .ok()
            .map(|domain| domain.trim().to_ascii_lowercase())
            .filter(|domain| !domain.is_empty());

        let admin_emails = env::var("ADMIN_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|email| email.trim().to_ascii_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        Self {
            client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            base_url: env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string()),
            session_secret: env::var("SESSION_SECRET").unwrap_or_default(),
            enforce_domain,
            admin_emails,
        }
    }

    /// The redirect URI registered with the provider. The same value is
    /// sent on the authorization request and the token exchange.
    pub fn redirect_uri(&self) -> String {
        format!("{}/callback", self.base_url.trim_end_matches('/'))
    }

    /// A human-readable reason the app is not ready to run the OAuth
    /// flow, if any.
    pub fn needs_setup(&self) -> Option<String> {
        if self.client_id.is_empty() || self.client_id.contains(PLACEHOLDER_CLIENT_ID) {
            return Some(
                "Missing GOOGLE_CLIENT_ID — replace the placeholder and restart.".to_string(),
            );
        }
        if self.client_secret.is_empty() || self.client_secret == PLACEHOLDER_CLIENT_SECRET {
            return Some(
                "Missing GOOGLE_CLIENT_SECRET — replace the placeholder and restart.".to_string(),
            );
        }
        if self.session_secret.is_empty() || self.session_secret == PLACEHOLDER_SESSION_SECRET {
            return Some(
                "Missing SESSION_SECRET — set it to a long random string and restart.".to_string(),
            );
        }
        None
    }
}

/// Identity-provider endpoints. Defaults target Google; every field can
/// be overridden from the environment so the `idp` fixture can stand in
/// during local development.
#[derive(Clone)]
pub struct ProviderConfig {
    pub auth_url: String,
    pub token_url: String,
    pub jwks_url: String,
    /// Issuer strings accepted during ID-token verification.
    pub issuers: Vec<String>,
}

impl ProviderConfig {
    pub fn google() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            jwks_url: "https://www.googleapis.com/oauth2/v3/certs".to_string(),
            // Google mints both spellings depending on the flow.
            issuers: vec![
                "https://accounts.google.com".to_string(),
                "accounts.google.com".to_string(),
            ],
        }
    }

    pub fn from_env() -> Self {
        let mut provider = Self::google();
        if let Ok(url) = env::var("OIDC_AUTH_URL") {
            provider.auth_url = url;
        }
        if let Ok(url) = env::var("OIDC_TOKEN_URL") {
            provider.token_url = url;
        }
        if let Ok(url) = env::var("OIDC_JWKS_URL") {
            provider.jwks_url = url;
        }
        if let Ok(issuer) = env::var("OIDC_ISSUER") {
            provider.issuers = vec![issuer];
        }
        provider
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: OAuthConfig,
    pub provider: ProviderConfig,
    pub cookie_key: Key,
    pub http: reqwest::Client,
    pub verifier: Arc<IdTokenVerifier>,
}

impl AppState {
    pub fn from_env() -> color_eyre::Result<Self> {
        Self::new(OAuthConfig::from_env(), ProviderConfig::from_env())
    }

    pub fn new(config: OAuthConfig, provider: ProviderConfig) -> color_eyre::Result<Self> {
        let http = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(15))
            .use_rustls_tls()
            .build()
            .wrap_err("failed to build HTTP client")?;

        let cookie_key = cookie_key_from_secret(&config.session_secret);
        let verifier = Arc::new(IdTokenVerifier::new(
            provider.issuers.clone(),
            provider.jwks_url.clone(),
            http.clone(),
        ));

        Ok(Self {
            config,
            provider,
            cookie_key,
            http,
            verifier,
        })
    }
}

/// Derive the private-cookie key from the configured secret. Before
/// setup completes there may be no usable secret; sessions then ride a
/// process-local random key that does not survive a restart.
fn cookie_key_from_secret(secret: &str) -> Key {
    if secret.len() >= 32 && secret != PLACEHOLDER_SESSION_SECRET {
        Key::derive_from(secret.as_bytes())
    } else {
        let mut bytes = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut bytes);
        Key::derive_from(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "secret-456".to_string(),
            base_url: "http://localhost:8000".to_string(),
            session_secret: "0123456789abcdef0123456789abcdef".to_string(),
            enforce_domain: None,
            admin_emails: vec![],
        }
    }

    #[test]
    fn complete_config_needs_no_setup() {
        assert!(complete_config().needs_setup().is_none());
    }

    #[test]
    fn placeholder_client_id_is_flagged() {
        let config = OAuthConfig {
            client_id: format!("{PLACEHOLDER_CLIENT_ID}.apps.googleusercontent.com"),
            ..complete_config()
        };
        assert!(config.needs_setup().unwrap().contains("GOOGLE_CLIENT_ID"));
    }

    #[test]
    fn empty_secret_is_flagged() {
        let config = OAuthConfig {
            client_secret: String::new(),
            ..complete_config()
        };
        assert!(config
            .needs_setup()
            .unwrap()
            .contains("GOOGLE_CLIENT_SECRET"));
    }

    #[test]
    fn placeholder_session_secret_is_flagged() {
        let config = OAuthConfig {
            session_secret: PLACEHOLDER_SESSION_SECRET.to_string(),
            ..complete_config()
        };
        assert!(config.needs_setup().unwrap().contains("SESSION_SECRET"));
    }

    #[test]
    fn redirect_uri_tolerates_trailing_slash() {
        let config = OAuthConfig {
            base_url: "https://rp.example/".to_string(),
            ..complete_config()
        };
        assert_eq!(config.redirect_uri(), "https://rp.example/callback");
    }

    #[test]
    fn short_session_secret_still_yields_a_key() {
        // Must not panic; the fallback key keeps the setup notice
        // servable.
        let _ = cookie_key_from_secret("short");
    }
}
