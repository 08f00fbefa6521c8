use ratatui::crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
use ratatui::crossterm::Command;

/// Named console colors available to persona templates as `{color.<name>}`.
const PALETTE: &[(&str, Color)] = &[
    ("gray", Color::DarkGrey),
    ("dark_gray", Color::DarkGrey),
    ("light_gray", Color::Grey),
    ("black", Color::Black),
    ("white", Color::White),
    ("red", Color::Red),
    ("green", Color::Green),
    ("dark_green", Color::DarkGreen),
    ("yellow", Color::Yellow),
    ("orange", Color::DarkYellow),
    ("brown", Color::DarkYellow),
    ("blue", Color::Blue),
    ("dark_blue", Color::DarkBlue),
    ("magenta", Color::Magenta),
    ("pink", Color::Magenta),
    ("light_purple", Color::Magenta),
    ("purple", Color::DarkMagenta),
    ("cyan", Color::Cyan),
    ("light_cyan", Color::Cyan),
];

pub fn palette_color(name: &str) -> Option<Color> {
    PALETTE
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, color)| *color)
}

pub fn palette_names() -> impl Iterator<Item = &'static str> {
    PALETTE.iter().map(|(name, _)| *name)
}

fn ansi<C: Command>(command: C) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = command.write_ansi(&mut out);
    out
}

pub fn fg_sequence(color: Color) -> String {
    ansi(SetForegroundColor(color))
}

pub fn reset_sequence() -> String {
    let mut out = ansi(ResetColor);
    out.push_str(&ansi(SetAttribute(Attribute::Reset)));
    out
}

pub fn bold_sequence() -> String {
    ansi(SetAttribute(Attribute::Bold))
}
