use maud::{html, Markup, Render};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BadgeColor {
    Green,
    Red,
    Indigo,
    Gray,
}

pub struct Badge {
    pub text: String,
    pub color: BadgeColor,
}

impl Badge {
    pub fn new(text: &str, color: BadgeColor) -> Self {
        Self {
            text: text.to_string(),
            color,
        }
    }

    fn color_classes(&self) -> &'static str {
        match self.color {
            BadgeColor::Green => "bg-green-100 text-green-800",
            BadgeColor::Red => "bg-red-100 text-red-800",
            BadgeColor::Indigo => "bg-indigo-100 text-indigo-800",
            BadgeColor::Gray => "bg-gray-100 text-gray-800",
        }
    }
}

impl Render for Badge {
    fn render(&self) -> Markup {
        html! {
            span class={"inline-block px-2.5 py-0.5 text-xs font-medium rounded-full " (self.color_classes())} {
                (self.text)
            }
        }
    }
}
