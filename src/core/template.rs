//! Placeholder interpolation for persona text assets.
//!
//! Only the fixed placeholder set below is recognized. Anything else inside
//! braces is copied through unchanged.

use chrono::{DateTime, Local};

use crate::utils::color::{bold_sequence, fg_sequence, palette_color, reset_sequence};

#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub persona: String,
    pub model: String,
    pub user: String,
    pub now: DateTime<Local>,
}

impl TemplateContext {
    pub fn new(persona: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            model: model.into(),
            user: login_name(),
            now: Local::now(),
        }
    }

    fn resolve(&self, key: &str) -> Option<String> {
        match key {
            "persona" => Some(self.persona.clone()),
            "Persona" => Some(title_case(&self.persona)),
            "model" => Some(self.model.clone()),
            "user" => Some(self.user.clone()),
            "date" => Some(self.now.format("%A, %B %-d, %Y").to_string()),
            "time" => Some(self.now.format("%-I:%M %p").to_string()),
            "reset" => Some(reset_sequence()),
            "bold" => Some(bold_sequence()),
            _ => key
                .strip_prefix("color.")
                .and_then(palette_color)
                .map(fg_sequence),
        }
    }
}

pub fn render(template: &str, context: &TemplateContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find(['{', '}']) {
            Some(close) if after_open.as_bytes()[close] == b'}' => {
                let key = &after_open[..close];
                match context.resolve(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Uppercase the first letter of every word, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

fn login_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "user".to_string())
}
