use maud::{html, Markup, Render};

/// Full HTML document wrapping one piece of content.
pub struct Page {
    pub title: String,
    pub content: Box<dyn Render>,
}

impl Page {
    pub fn new(title: String, content: Box<dyn Render>) -> Self {
        Self { title, content }
    }
}

impl Render for Page {
    fn render(&self) -> Markup {
        html! {
            head {
                title { (self.title) }
                script src="https://unpkg.com/@tailwindcss/browser@4" {}
                meta name="viewport" content="width=device-width, initial-scale=1.0";
            }

            div class="min-h-screen bg-white md:bg-gradient-to-br md:from-slate-100 md:via-indigo-50 md:to-slate-100 py-4 md:py-8 px-0 sm:px-4 md:px-6 lg:px-8" {
                (self.content.render())

                div class="mt-6 md:mt-8 text-center text-sm" {
                    p class="text-gray-500" { "OIDC Lab — OAuth2 Authorization Code + PKCE playground" }
                }
            }
        }
    }
}

impl axum::response::IntoResponse for Page {
    fn into_response(self) -> axum::response::Response {
        self.render().into_response()
    }
}

/// White rounded card centered on the page.
pub struct Card {
    pub content: Box<dyn Render>,
    pub max_width: Option<String>,
}

impl Card {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            content: Box::new(content),
            max_width: None,
        }
    }

    pub fn with_max_width(mut self, max_width: &str) -> Self {
        self.max_width = Some(max_width.to_string());
        self
    }
}

impl Render for Card {
    fn render(&self) -> Markup {
        let width_class = self.max_width.as_deref().unwrap_or("max-w-md");

        html! {
            div class={(width_class) " mx-auto bg-white rounded-lg sm:rounded-xl border border-gray-100 shadow-md sm:shadow-lg overflow-hidden w-full"} {
                (self.content.render())
            }
        }
    }
}

/// Gradient banner with a curved bottom edge, used at the top of cards.
pub struct CurvedHeader {
    pub height: String,
}

impl CurvedHeader {
    pub fn new(height: &str) -> Self {
        Self {
            height: height.to_string(),
        }
    }
}

impl Render for CurvedHeader {
    fn render(&self) -> Markup {
        html! {
            div class={"relative " (self.height) " bg-gradient-to-r from-indigo-500 to-violet-600"} {
                div class="absolute left-0 right-0 bottom-0" {
                    (maud::PreEscaped(r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1440 100" class="w-full h-16 fill-white"><path d="M0,64L80,69.3C160,75,320,85,480,80C640,75,800,53,960,42.7C1120,32,1280,32,1360,32L1440,32L1440,100L1360,100C1280,100,1120,100,960,100C800,100,640,100,480,100C320,100,160,100,80,100L0,100Z"></path></svg>"#))
                }
            }
        }
    }
}

/// Padded body section of a card.
pub struct ContentSection {
    pub content: Box<dyn Render>,
}

impl ContentSection {
    pub fn new(content: impl Render + 'static) -> Self {
        Self {
            content: Box::new(content),
        }
    }
}

impl Render for ContentSection {
    fn render(&self) -> Markup {
        html! {
            div class="px-8 py-6" {
                (self.content.render())
            }
        }
    }
}
