use maud::{html, Markup, Render};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonVariant {
    Primary,
    Secondary,
}

/// Anchor styled as a button. Every action in this app is a GET link,
/// so no form/submit mode is needed.
pub struct Button {
    pub text: String,
    pub href: String,
    pub variant: ButtonVariant,
    pub full_width: bool,
}

impl Button {
    pub fn primary(text: &str, href: &str) -> Self {
        Self {
            text: text.to_string(),
            href: href.to_string(),
            variant: ButtonVariant::Primary,
            full_width: false,
        }
    }

    pub fn secondary(text: &str, href: &str) -> Self {
        Self {
            text: text.to_string(),
            href: href.to_string(),
            variant: ButtonVariant::Secondary,
            full_width: false,
        }
    }

    pub fn full_width(mut self, full_width: bool) -> Self {
        self.full_width = full_width;
        self
    }

    fn variant_classes(&self) -> &'static str {
        match self.variant {
            ButtonVariant::Primary => {
                "bg-indigo-600 hover:bg-indigo-700 active:bg-indigo-800 text-white"
            }
            ButtonVariant::Secondary => {
                "bg-white hover:bg-gray-50 active:bg-gray-100 text-indigo-600 border border-indigo-300 hover:border-indigo-400"
            }
        }
    }
}

impl Render for Button {
    fn render(&self) -> Markup {
        let width_class = if self.full_width { "w-full" } else { "" };

        html! {
            a href=(self.href)
              class={"inline-flex items-center justify-center py-2 px-4 text-sm sm:text-base font-medium rounded-md transition-colors " (self.variant_classes()) " " (width_class)} {
                (self.text)
            }
        }
    }
}
