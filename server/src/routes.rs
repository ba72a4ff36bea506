use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use maud::{html, Render};
use tracing::info;

use crate::{
    components::{
        layout::{Card, ContentSection, CurvedHeader, Page},
        ui::{
            avatar::Avatar,
            badge::{Badge, BadgeColor},
            button::Button,
            heading::Heading,
        },
    },
    sessions::{AuthUser, OptionalUser, Session},
    state::AppState,
};

pub mod google;

/// Build the application router with all routes.
pub fn routes(app_state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", get(home_page))
        .route("/login", get(google::login))
        .route("/callback", get(google::callback))
        .route("/success", get(success_page))
        .route("/admin", get(admin_page))
        .route("/logout", get(logout))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Home page: login entry point, or the setup notice while the
/// configuration still carries placeholders.
async fn home_page(
    OptionalUser { user }: OptionalUser,
    State(state): State<AppState>,
) -> Response {
    if let Some(notice) = state.config.needs_setup() {
        return setup_page(&notice).into_response();
    }

    let enforce_domain = state.config.enforce_domain.as_deref();

    let content = html! {
        (CurvedHeader::new("h-28").render())

        (ContentSection::new(html! {
            (Heading::h1("OIDC Lab").with_color("text-indigo-700").render())
            p class="text-gray-600 mb-6" { "Sign in with Google — Authorization Code flow with PKCE." }

            @if let Some(domain) = enforce_domain {
                div class="mb-6" {
                    (Badge::new(&format!("Restricted to {domain} accounts"), BadgeColor::Indigo).render())
                }
            }

            @if let Some(user) = &user {
                p class="text-gray-700 mb-4" { "Signed in as " strong { (user.email) } }
                div class="space-y-3" {
                    (Button::primary("Your profile", "/success").full_width(true).render())
                    (Button::secondary("Admin area", "/admin").full_width(true).render())
                    (Button::secondary("Sign out", "/logout").full_width(true).render())
                }
            } @else {
                div class="space-y-3" {
                    (Button::primary("Sign in with Google", "/login").full_width(true).render())
                }
            }
        }).render())
    };

    Page::new(
        "OIDC Lab".to_string(),
        Box::new(Card::new(content).with_max_width("max-w-md")),
    )
    .into_response()
}

/// Rendered instead of the home page while secrets are missing or still
/// placeholders. The OAuth routes redirect here.
fn setup_page(notice: &str) -> Page {
    let content = html! {
        (ContentSection::new(html! {
            (Heading::h1("🔧 Setup required").render())
            p class="text-gray-700 mb-4" { (notice) }
            p class="text-gray-600 mb-2" { "Set the environment and restart the app:" }
            pre class="bg-gray-50 border border-gray-200 rounded-lg p-3 text-sm text-gray-700 overflow-x-auto" {
                "GOOGLE_CLIENT_ID=...      # OAuth client id\n"
                "GOOGLE_CLIENT_SECRET=...  # OAuth client secret\n"
                "SESSION_SECRET=...        # long random string"
            }
        }).render())
    };

    Page::new(
        "Setup — OIDC Lab".to_string(),
        Box::new(Card::new(content).with_max_width("max-w-2xl")),
    )
}

/// Post-login landing page. Anonymous requests bounce to the home page
/// via the `AuthUser` extractor.
async fn success_page(AuthUser { user }: AuthUser) -> Page {
    let display_name = user.name.clone().unwrap_or_else(|| user.email.clone());

    let content = html! {
        (CurvedHeader::new("h-28").render())

        (ContentSection::new(html! {
            div class="flex flex-col items-center -mt-16 relative z-10 mb-6" {
                (Avatar::new(user.picture.clone(), &display_name).render())
                h2 class="text-2xl font-semibold text-gray-900 mt-3" { (display_name) }
                p class="text-gray-600" { (user.email) }
            }

            div class="flex flex-wrap justify-center gap-2 mb-6" {
                @if user.email_verified {
                    (Badge::new("Email verified", BadgeColor::Green).render())
                } @else {
                    (Badge::new("Email unverified", BadgeColor::Gray).render())
                }
                @if let Some(domain) = &user.hosted_domain {
                    (Badge::new(&format!("Workspace: {domain}"), BadgeColor::Indigo).render())
                }
                @if user.is_admin {
                    (Badge::new("Admin", BadgeColor::Green).render())
                }
            }

            div class="space-y-3" {
                (Button::secondary("Admin area", "/admin").full_width(true).render())
                (Button::secondary("Sign out", "/logout").full_width(true).render())
                (Button::secondary("Home", "/").full_width(true).render())
            }
        }).render())
    };

    Page::new(
        "Signed in — OIDC Lab".to_string(),
        Box::new(Card::new(content).with_max_width("max-w-md")),
    )
}

/// Admin view. Non-admins see a denial state on a 200, not a redirect;
/// only anonymous requests bounce to the home page.
async fn admin_page(AuthUser { user }: AuthUser) -> Page {
    let content = html! {
        (ContentSection::new(html! {
            (Heading::h1("Admin").render())

            @if user.is_admin {
                div class="mb-4" { (Badge::new("Access granted", BadgeColor::Green).render()) }
                p class="text-gray-700 mb-6" {
                    "Hello, " strong { (user.email) } ". Your account is on the admin allow-list."
                }
            } @else {
                div class="mb-4" { (Badge::new("Access denied", BadgeColor::Red).render()) }
                p class="text-gray-700 mb-6" {
                    "Your account (" (user.email) ") is not on the admin allow-list."
                }
            }

            div class="space-y-3" {
                (Button::secondary("Back to profile", "/success").full_width(true).render())
                (Button::secondary("Home", "/").full_width(true).render())
            }
        }).render())
    };

    Page::new(
        "Admin — OIDC Lab".to_string(),
        Box::new(Card::new(content).with_max_width("max-w-md")),
    )
}

/// Clear the whole session and return home.
async fn logout(mut session: Session) -> Redirect {
    session.clear();
    info!("user logged out");
    Redirect::to("/")
}
