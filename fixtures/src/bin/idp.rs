use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use clap::Parser;
use fixtures::{run_server, FixtureArgs};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::{distributions::Alphanumeric, Rng};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::info;

/// Mock identity provider fixture: enough of an OIDC authorization
/// server (authorize, token, JWKS) to drive the relying party locally
/// without Google credentials.
#[derive(Parser, Debug)]
#[clap(name = "idp-fixture")]
struct Cli {
    #[clap(flatten)]
    common: FixtureArgs,

    /// Issuer string minted into ID tokens. The relying party must set
    /// OIDC_ISSUER to the same value.
    #[arg(long)]
    issuer: Option<String>,
}

/// An authorization code waiting to be redeemed at the token endpoint.
#[derive(Clone)]
struct IssuedCode {
    client_id: String,
    code_challenge: Option<String>,
    email: String,
    hd: Option<String>,
}

#[derive(Clone)]
struct AppState {
    issuer: String,
    encoding_key: EncodingKey,
    jwks: serde_json::Value,
    codes: Arc<Mutex<HashMap<String, IssuedCode>>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let issuer = args
        .issuer
        .unwrap_or_else(|| format!("http://{}:{}", args.common.host, args.common.port));

    info!("generating fixture signing key");
    let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048)?;
    let pem = key.to_pkcs1_pem(LineEnding::LF)?;
    let encoding_key = EncodingKey::from_rsa_pem(pem.as_bytes())?;

    let public = key.to_public_key();
    let jwks = json!({
        "keys": [{
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": "fixture-key",
            "n": URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        }]
    });

    let state = AppState {
        issuer,
        encoding_key,
        jwks,
        codes: Arc::new(Mutex::new(HashMap::new())),
    };

    let app = Router::new()
        .route("/authorize", get(authorize))
        .route("/token", post(token))
        .route("/jwks.json", get(jwks_document))
        .with_state(state);

    run_server(args.common, app).await
}

#[derive(Deserialize)]
struct AuthorizeParams {
    client_id: String,
    redirect_uri: String,
    state: Option<String>,
    code_challenge: Option<String>,
    /// Lets the caller pick the identity the fixture will assert.
    email: Option<String>,
    hd: Option<String>,
}

#[derive(Serialize)]
struct OAuthRedirectParams<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'a str>,
}

/// There is no consent screen: every authorization request is granted
/// immediately and redirected back with a fresh code.
async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    state.codes.lock().expect("codes lock").insert(
        code.clone(),
        IssuedCode {
            client_id: params.client_id,
            code_challenge: params.code_challenge,
            email: params
                .email
                .unwrap_or_else(|| "dev@example.com".to_string()),
            hd: params.hd,
        },
    );

    let query = match serde_urlencoded::to_string(&OAuthRedirectParams {
        code: &code,
        state: params.state.as_deref(),
    }) {
        Ok(query) => query,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to build redirect: {err}"),
            )
                .into_response()
        }
    };

    info!("granting authorization code");
    Redirect::to(&format!("{}?{}", params.redirect_uri, query)).into_response()
}

#[derive(Deserialize)]
struct TokenRequest {
    grant_type: String,
    code: String,
    code_verifier: Option<String>,
}

fn token_error(error: &str, description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error, "error_description": description })),
    )
        .into_response()
}

async fn token(State(state): State<AppState>, Form(request): Form<TokenRequest>) -> Response {
    if request.grant_type != "authorization_code" {
        return token_error("unsupported_grant_type", "expected authorization_code");
    }

    let issued = match state.codes.lock().expect("codes lock").remove(&request.code) {
        Some(issued) => issued,
        None => return token_error("invalid_grant", "unknown or already redeemed code"),
    };

    if let Some(challenge) = &issued.code_challenge {
        let verified = request.code_verifier.as_deref().is_some_and(|verifier| {
            URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())) == *challenge
        });
        if !verified {
            return token_error("invalid_grant", "PKCE verification failed");
        }
    }

    let now = chrono::Utc::now().timestamp();
    let mut claims = json!({
        "iss": state.issuer,
        "aud": issued.client_id,
        "sub": format!("fixture-{}", issued.email),
        "exp": now + 3600,
        "iat": now,
        "email": issued.email,
        "email_verified": true,
        "name": "Fixture User",
    });
    if let Some(hd) = &issued.hd {
        claims["hd"] = json!(hd);
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("fixture-key".to_string());
    let id_token = match encode(&header, &claims, &state.encoding_key) {
        Ok(token) => token,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to sign ID token: {err}"),
            )
                .into_response()
        }
    };

    Json(json!({
        "access_token": "fixture-access-token",
        "token_type": "Bearer",
        "expires_in": 3600,
        "id_token": id_token,
    }))
    .into_response()
}

async fn jwks_document(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.jwks.clone())
}
