//! Terminal capability detection and utilities

use kindred::{Individual, Sex};
use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Extension trait for colorizing output
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as male (blue)
    fn male(&self) -> String;
    /// Color as female (pink)
    fn female(&self) -> String;
    /// Bold, for the root of a tree
    fn highlight(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn male(&self) -> String {
        if supports_color() {
            self.fg::<css::LightBlue>().to_string()
        } else {
            self.to_string()
        }
    }

    fn female(&self) -> String {
        if supports_color() {
            self.fg::<css::HotPink>().to_string()
        } else {
            self.to_string()
        }
    }

    fn highlight(&self) -> String {
        if supports_color() {
            self.bold().to_string()
        } else {
            format!("*{self}*")
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn male(&self) -> String {
        self.as_str().male()
    }

    fn female(&self) -> String {
        self.as_str().female()
    }

    fn highlight(&self) -> String {
        self.as_str().highlight()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

/// An individual's display name followed by their id, colored by sex.
pub fn label(individual: &Individual) -> String {
    let name = individual.display_name();
    let name = match individual.sex {
        Some(Sex::Male) => name.male(),
        Some(Sex::Female) => name.female(),
        _ => name.to_string(),
    };
    format!("{name} {}", individual.id.as_str().dim())
}
