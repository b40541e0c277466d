//! Message helpers for stderr output.
//!
//! Colour is applied only when the caller says the target supports it;
//! callers decide with `is_terminal`.

use std::io::{self, Write};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Applies the theme colour of `entry` to `text` when `enable_colors` is set.
pub fn styled(text: &str, entry: ThemeEntry, theme_map: &ThemeMap, enable_colors: bool) -> String {
    if !enable_colors {
        return text.to_string();
    }
    match theme_map.get(&entry).and_then(|s| s.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}

fn print_prefixed<W: Write>(
    writer: &mut W,
    prefix: &str,
    message: &str,
    entry: ThemeEntry,
    theme_map: &ThemeMap,
    enable_colors: bool,
) -> io::Result<()> {
    writeln!(writer, "{}", styled(&format!("{}{}", prefix, message), entry, theme_map, enable_colors))
}

pub fn print_info_message<W: Write>(writer: &mut W, message: &str, theme_map: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_prefixed(writer, "", message, ThemeEntry::Info, theme_map, enable_colors)
}

pub fn print_success_message<W: Write>(writer: &mut W, message: &str, theme_map: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_prefixed(writer, "", message, ThemeEntry::Success, theme_map, enable_colors)
}

pub fn print_warn_message<W: Write>(writer: &mut W, message: &str, theme_map: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_prefixed(writer, "Warning: ", message, ThemeEntry::Warn, theme_map, enable_colors)
}

pub fn print_error_message<W: Write>(writer: &mut W, message: &str, theme_map: &ThemeMap, enable_colors: bool) -> io::Result<()> {
    print_prefixed(writer, "Error: ", message, ThemeEntry::Error, theme_map, enable_colors)
}

/// Informational message on stderr.
pub fn info_msg(msg: impl AsRef<str>, theme_map: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = print_info_message(&mut io::stderr(), msg.as_ref(), theme_map, colors);
}

pub fn success_msg(msg: impl AsRef<str>, theme_map: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = print_success_message(&mut io::stderr(), msg.as_ref(), theme_map, colors);
}

pub fn warn_msg(msg: impl AsRef<str>, theme_map: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = print_warn_message(&mut io::stderr(), msg.as_ref(), theme_map, colors);
}

pub fn error_msg(msg: impl AsRef<str>, theme_map: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = print_error_message(&mut io::stderr(), msg.as_ref(), theme_map, colors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn plain_output_without_colors() {
        let theme = ThemeStyle::default_theme_map();
        let mut out = Vec::new();
        print_warn_message(&mut out, "device skipped", &theme, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Warning: device skipped\n");
    }

    #[test]
    fn colored_output_carries_escape_codes() {
        let theme = ThemeStyle::default_theme_map();
        let text = styled("1 / 1", ThemeEntry::Universal, &theme, true);
        assert!(text.contains('\x1b'));
        let stripped = strip_ansi_escapes::strip(text.as_bytes());
        assert_eq!(String::from_utf8_lossy(&stripped), "1 / 1");
    }
}
