use maud::{html, Markup, Render};

/// Round profile image with an initial as the fallback.
pub struct Avatar {
    pub src: Option<String>,
    pub alt: String,
    pub placeholder: String,
}

impl Avatar {
    pub fn new(src: Option<String>, alt: &str) -> Self {
        let placeholder = alt.chars().next().map(|c| c.to_string()).unwrap_or_else(|| "?".to_string());
        Self {
            src,
            alt: alt.to_string(),
            placeholder,
        }
    }
}

impl Render for Avatar {
    fn render(&self) -> Markup {
        html! {
            div class="rounded-full overflow-hidden w-20 h-20 border-4 border-white shadow-lg" {
                @if let Some(src) = &self.src {
                    img src=(src) alt=(self.alt) class="w-full h-full object-cover" {}
                } @else {
                    div class="bg-gradient-to-br from-indigo-300 to-violet-300 w-full h-full flex items-center justify-center text-white text-2xl font-bold" {
                        (self.placeholder)
                    }
                }
            }
        }
    }
}
