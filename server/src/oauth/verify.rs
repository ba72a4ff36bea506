use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// How long fetched signing keys stay fresh before the next
/// verification triggers a refetch.
const KEY_TTL: Duration = Duration::from_secs(3600);

/// Tolerated clock skew on `iat`; the provider's clock may run ahead.
const MAX_IAT_SKEW_SECS: i64 = 300;

/// Every way ID-token verification can fail. Messages carry the claim
/// check reason but never key material.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("failed to fetch provider signing keys: {0}")]
    KeyFetch(String),
    #[error("ID token header is malformed: {0}")]
    MalformedHeader(String),
    #[error("ID token signed with unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(Algorithm),
    #[error("ID token key id {0:?} is not in the provider's key set")]
    UnknownKeyId(String),
    #[error("ID token signature is invalid")]
    BadSignature,
    #[error("ID token has expired")]
    Expired,
    #[error("ID token issuer is not trusted")]
    WrongIssuer,
    #[error("ID token audience does not match this client")]
    WrongAudience,
    #[error("ID token issued-at lies in the future")]
    IssuedInFuture,
    #[error("ID token is invalid: {0}")]
    Invalid(String),
}

/// Claims carried by the provider's ID token. Known claims get named
/// fields; provider-specific extensions land in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub hd: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An identity that has passed signature and claim validation. Not
/// constructed on any other path.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub hosted_domain: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

/// One entry of the provider's JWKS document.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

struct CachedKeys {
    keys: HashMap<String, Jwk>,
    fetched_at: Option<Instant>,
}

/// The provider's published signing keys, fetched lazily and shared
/// across requests. Reads run concurrently; a miss or TTL expiry
/// refreshes under the write lock with a re-check, so racing requests
/// fetch at most once.
struct SigningKeyCache {
    jwks_url: String,
    http: reqwest::Client,
    inner: RwLock<CachedKeys>,
}

impl SigningKeyCache {
    fn new(jwks_url: String, http: reqwest::Client) -> Self {
        Self {
            jwks_url,
            http,
            inner: RwLock::new(CachedKeys {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        }
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        {
            let cached = self.inner.read().await;
            if let Some(fetched_at) = cached.fetched_at {
                if fetched_at.elapsed() < KEY_TTL {
                    if let Some(jwk) = cached.keys.get(kid) {
                        return decoding_key_from_jwk(jwk);
                    }
                }
            }
        }

        let mut cached = self.inner.write().await;
        let fresh = cached
            .fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < KEY_TTL);
        if !fresh || !cached.keys.contains_key(kid) {
            cached.keys = self.fetch().await?;
            cached.fetched_at = Some(Instant::now());
        }

        match cached.keys.get(kid) {
            Some(jwk) => decoding_key_from_jwk(jwk),
            None => Err(VerifyError::UnknownKeyId(kid.to_string())),
        }
    }

    async fn fetch(&self) -> Result<HashMap<String, Jwk>, VerifyError> {
        let document = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?
            .json::<JwksDocument>()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?;

        debug!(keys = document.keys.len(), "fetched provider JWKS");

        Ok(document
            .keys
            .into_iter()
            .filter(|key| key.kty == "RSA")
            .filter_map(|key| key.kid.clone().map(|kid| (kid, key)))
            .collect())
    }
}

fn decoding_key_from_jwk(jwk: &Jwk) -> Result<DecodingKey, VerifyError> {
    let (Some(n), Some(e)) = (&jwk.n, &jwk.e) else {
        return Err(VerifyError::KeyFetch(
            "JWKS entry is missing its RSA components".to_string(),
        ));
    };

    DecodingKey::from_rsa_components(n, e)
        .map_err(|_| VerifyError::KeyFetch("JWKS entry could not be parsed as an RSA key".to_string()))
}

/// Verifies ID tokens issued by the configured provider: RS256
/// signature against the published JWKS, issuer, audience, expiry, and
/// an issued-at sanity bound.
pub struct IdTokenVerifier {
    issuers: Vec<String>,
    keys: SigningKeyCache,
}

impl IdTokenVerifier {
    pub fn new(issuers: Vec<String>, jwks_url: String, http: reqwest::Client) -> Self {
        Self {
            issuers,
            keys: SigningKeyCache::new(jwks_url, http),
        }
    }

    pub async fn verify(
        &self,
        id_token: &str,
        audience: &str,
    ) -> Result<VerifiedIdentity, VerifyError> {
        let header =
            decode_header(id_token).map_err(|e| VerifyError::MalformedHeader(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::UnsupportedAlgorithm(header.alg));
        }
        let kid = header
            .kid
            .ok_or_else(|| VerifyError::MalformedHeader("missing key id".to_string()))?;

        let key = self.keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&self.issuers);

        let claims = decode::<IdTokenClaims>(id_token, &key, &validation)
            .map_err(classify_jwt_error)?
            .claims;

        // jsonwebtoken does not bound iat from above.
        if claims.iat > Utc::now().timestamp() + MAX_IAT_SKEW_SECS {
            return Err(VerifyError::IssuedInFuture);
        }

        Ok(VerifiedIdentity {
            subject: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            name: claims.name,
            picture: claims.picture,
            issuer: claims.iss,
            audience: claims.aud,
            hosted_domain: claims.hd.filter(|hd| !hd.is_empty()),
            extra: claims.extra,
        })
    }
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> VerifyError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::InvalidIssuer => VerifyError::WrongIssuer,
        ErrorKind::InvalidAudience => VerifyError::WrongAudience,
        ErrorKind::InvalidSignature => VerifyError::BadSignature,
        other => VerifyError::Invalid(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_capture_extension_claims_in_extra() {
        let claims: IdTokenClaims = serde_json::from_str(
            r#"{
                "iss": "https://accounts.google.com",
                "aud": "client-123",
                "sub": "subject-1",
                "exp": 2000000000,
                "iat": 1700000000,
                "email": "user@example.com",
                "email_verified": true,
                "locale": "en",
                "given_name": "User"
            }"#,
        )
        .unwrap();

        assert_eq!(claims.sub, "subject-1");
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
        assert_eq!(claims.extra.get("locale"), Some(&Value::from("en")));
        assert_eq!(claims.extra.get("given_name"), Some(&Value::from("User")));
    }

    #[test]
    fn missing_email_verified_defaults_to_false() {
        let claims: IdTokenClaims = serde_json::from_str(
            r#"{"iss":"i","aud":"a","sub":"s","exp":2000000000,"iat":1700000000}"#,
        )
        .unwrap();
        assert!(!claims.email_verified);
    }

    #[test]
    fn jwt_errors_map_to_tagged_reasons() {
        use jsonwebtoken::errors::ErrorKind;

        assert!(matches!(
            classify_jwt_error(ErrorKind::ExpiredSignature.into()),
            VerifyError::Expired
        ));
        assert!(matches!(
            classify_jwt_error(ErrorKind::InvalidAudience.into()),
            VerifyError::WrongAudience
        ));
        assert!(matches!(
            classify_jwt_error(ErrorKind::InvalidIssuer.into()),
            VerifyError::WrongIssuer
        ));
        assert!(matches!(
            classify_jwt_error(ErrorKind::InvalidSignature.into()),
            VerifyError::BadSignature
        ));
        // Anything unclassified still collapses into a verification
        // failure instead of escaping.
        assert!(matches!(
            classify_jwt_error(ErrorKind::InvalidToken.into()),
            VerifyError::Invalid(_)
        ));
    }

    #[test]
    fn jwks_entries_without_kid_or_wrong_kty_are_skipped() {
        let document: JwksDocument = serde_json::from_str(
            r#"{"keys":[
                {"kty":"RSA","kid":"good","n":"AQAB","e":"AQAB"},
                {"kty":"RSA","n":"AQAB","e":"AQAB"},
                {"kty":"EC","kid":"ec-key"}
            ]}"#,
        )
        .unwrap();

        let usable: HashMap<String, Jwk> = document
            .keys
            .into_iter()
            .filter(|key| key.kty == "RSA")
            .filter_map(|key| key.kid.clone().map(|kid| (kid, key)))
            .collect();

        assert_eq!(usable.len(), 1);
        assert!(usable.contains_key("good"));
    }

    #[test]
    fn jwk_without_rsa_components_is_rejected() {
        let jwk = Jwk {
            kid: Some("k".to_string()),
            kty: "RSA".to_string(),
            n: None,
            e: None,
        };
        assert!(matches!(
            decoding_key_from_jwk(&jwk),
            Err(VerifyError::KeyFetch(_))
        ));
    }
}
