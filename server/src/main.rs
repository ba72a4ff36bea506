use color_eyre::eyre::Context as _;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use oidc_lab::routes;
use oidc_lab::state::AppState;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?
        .block_on(run_application())
}

async fn run_application() -> color_eyre::Result<()> {
    setup_tracing();

    let app_state = AppState::from_env()?;
    if let Some(notice) = app_state.config.needs_setup() {
        warn!(%notice, "configuration incomplete, only the setup notice will be served");
    }

    let addr = listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;

    info!("listening on {addr}");
    axum::serve(listener, routes::routes(app_state)).await?;

    Ok(())
}

fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Bind address, `HOST`/`PORT` overridable.
fn listen_addr() -> String {
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    format!("{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn listen_addr_defaults_and_honors_overrides() {
        env::remove_var("HOST");
        env::remove_var("PORT");
        assert_eq!(listen_addr(), "0.0.0.0:8000");

        env::set_var("HOST", "127.0.0.1");
        env::set_var("PORT", "9999");
        assert_eq!(listen_addr(), "127.0.0.1:9999");

        env::remove_var("HOST");
        env::remove_var("PORT");
    }
}
