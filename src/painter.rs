//! ANSI styling of rendered output.
//!
//! Formatters never hardcode colors; they paint *roles* and the painter
//! maps each role to a style. The `colored` crate handles emission, so the
//! usual environment switches (NO_COLOR, piped output) behave as expected.

use crate::cli::ColorMode;
use colored::Colorize;
use std::io::IsTerminal;

/// What a piece of output *is*, rather than how it should look.
#[derive(Debug, Clone, Copy)]
pub enum Role<'a> {
    /// A log level name; the style depends on its severity.
    Level(&'a str),
    Message,
    ExtraField,
    JsonObjectKey,
    JsonString,
    JsonNumber,
    JsonBool,
    JsonNull,
    Ellipsis,
}

#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

/// Applies the process-wide color switch for `--color always|never`. In
/// auto mode emission is left to the crate's own TTY detection.
pub fn configure_colors(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        let enabled = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        };
        Painter { enabled }
    }

    pub fn disabled() -> Self {
        Painter { enabled: false }
    }

    pub fn paint(&self, role: Role<'_>, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let styled = match role {
            Role::Level(level) => match level.to_ascii_lowercase().as_str() {
                "trace" => text.bright_black(),
                "debug" => text.blue(),
                "info" => text.green(),
                "warn" | "warning" => text.yellow(),
                "error" => text.red(),
                "dpanic" | "panic" | "fatal" => text.red().bold(),
                _ => text.normal(),
            },
            Role::Message => text.cyan(),
            Role::ExtraField => text.magenta(),
            Role::JsonObjectKey => text.blue(),
            Role::JsonString => text.green(),
            Role::JsonNumber => text.yellow(),
            Role::JsonBool => text.yellow(),
            Role::JsonNull => text.bright_black(),
            Role::Ellipsis => text.bright_black(),
        };
        styled.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_painter_passes_text_through() {
        let painter = Painter::disabled();
        assert_eq!(painter.paint(Role::Level("error"), "ERROR"), "ERROR");
        assert_eq!(painter.paint(Role::Message, "hello"), "hello");
    }

    #[test]
    fn enabled_painter_wraps_text_in_escape_codes() {
        colored::control::set_override(true);
        let painter = Painter::new(ColorMode::Always);
        let painted = painter.paint(Role::Level("error"), "ERROR");
        assert!(painted.starts_with('\u{1b}'));
        assert!(painted.contains("ERROR"));
        colored::control::unset_override();
    }
}
