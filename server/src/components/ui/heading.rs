use maud::{html, Markup, Render};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingLevel {
    H1,
    H2,
}

pub struct Heading {
    pub text: String,
    pub level: HeadingLevel,
    pub color: Option<String>,
}

impl Heading {
    pub fn h1(text: &str) -> Self {
        Self {
            text: text.to_string(),
            level: HeadingLevel::H1,
            color: None,
        }
    }

    pub fn h2(text: &str) -> Self {
        Self {
            text: text.to_string(),
            level: HeadingLevel::H2,
            color: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

impl Render for Heading {
    fn render(&self) -> Markup {
        let size_classes = match self.level {
            HeadingLevel::H1 => "text-3xl font-bold mb-3",
            HeadingLevel::H2 => "text-xl font-semibold mb-2",
        };
        let color = self.color.as_deref().unwrap_or("text-gray-900");

        match self.level {
            HeadingLevel::H1 => html! {
                h1 class={(size_classes) " " (color)} { (self.text) }
            },
            HeadingLevel::H2 => html! {
                h2 class={(size_classes) " " (color)} { (self.text) }
            },
        }
    }
}
