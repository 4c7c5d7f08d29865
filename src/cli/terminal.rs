//! Terminal capability detection and utilities

use std::borrow::Cow;

use owo_colors::{colors::css, OwoColorize};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Shorten `text` to at most `max` characters, marking a cut with `...`.
pub fn truncate(text: &str, max: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// Extension trait for colorizing output
///
/// Every method falls back to the plain text when stdout does not support
/// color.
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as info (blue)
    fn info(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::Orange>().to_string())
    }

    fn info(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::LightBlue>().to_string())
    }

    fn dim(&self) -> String {
        paint(self.as_ref(), |text| text.dimmed().to_string())
    }
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colorize_keeps_text() {
        assert!("done".success().contains("done"));
        assert!(String::from("careful").warning().contains("careful"));
        assert!("note".info().contains("note"));
        assert!("quiet".dim().contains("quiet"));
    }

    #[test]
    fn short_text_is_untouched() {
        assert!(matches!(truncate("short", 80), Cow::Borrowed("short")));
        assert_eq!(truncate("exactly", 7), "exactly");
    }

    #[test]
    fn long_text_is_cut() {
        assert_eq!(truncate("abcdefgh", 3), "abc...");
    }

    #[test]
    fn cut_respects_characters() {
        assert_eq!(truncate("ÜberÜber", 5), "ÜberÜ...");
    }
}
