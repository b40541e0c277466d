//! Colour theme for terminal output.
//!
//! Each logical output element (headers, present and absent cells,
//! universally satisfied patterns, messages) maps to one of the 16 named
//! ANSI colours. A YAML theme file may override any subset of them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use anyhow::{Context, Result};
use owo_colors::AnsiColors;

/// Type alias for the theme map.
pub type ThemeMap = HashMap<ThemeEntry, ThemeStyle>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeEntry {
    Header,
    Success,
    Info,
    Warn,
    Error,
    /// Catalog pattern text.
    Pattern,
    /// Learned occurrence counts.
    Count,
    Present,
    Absent,
    /// Totals of patterns every device satisfies.
    Universal,
}

impl ThemeEntry {
    pub const ALL: [ThemeEntry; 10] = [
        ThemeEntry::Header,
        ThemeEntry::Success,
        ThemeEntry::Info,
        ThemeEntry::Warn,
        ThemeEntry::Error,
        ThemeEntry::Pattern,
        ThemeEntry::Count,
        ThemeEntry::Present,
        ThemeEntry::Absent,
        ThemeEntry::Universal,
    ];
}

/// A named ANSI colour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ThemeColor {
    Named(String),
}

#[derive(Debug, Clone)]
pub struct ParseThemeColorError;

impl fmt::Display for ParseThemeColorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Invalid theme color; expected one of: black, red, green, yellow, blue, \
            magenta, cyan, white, brightblack, brightred, brightgreen, brightyellow, \
            brightblue, brightmagenta, brightcyan, brightwhite."
        )
    }
}

impl std::error::Error for ParseThemeColorError {}

static COLOR_NAMES: [(&str, AnsiColors, comfy_table::Color); 16] = [
    ("black", AnsiColors::Black, comfy_table::Color::Black),
    ("red", AnsiColors::Red, comfy_table::Color::DarkRed),
    ("green", AnsiColors::Green, comfy_table::Color::DarkGreen),
    ("yellow", AnsiColors::Yellow, comfy_table::Color::DarkYellow),
    ("blue", AnsiColors::Blue, comfy_table::Color::DarkBlue),
    ("magenta", AnsiColors::Magenta, comfy_table::Color::DarkMagenta),
    ("cyan", AnsiColors::Cyan, comfy_table::Color::DarkCyan),
    ("white", AnsiColors::White, comfy_table::Color::Grey),
    ("brightblack", AnsiColors::BrightBlack, comfy_table::Color::DarkGrey),
    ("brightred", AnsiColors::BrightRed, comfy_table::Color::Red),
    ("brightgreen", AnsiColors::BrightGreen, comfy_table::Color::Green),
    ("brightyellow", AnsiColors::BrightYellow, comfy_table::Color::Yellow),
    ("brightblue", AnsiColors::BrightBlue, comfy_table::Color::Blue),
    ("brightmagenta", AnsiColors::BrightMagenta, comfy_table::Color::Magenta),
    ("brightcyan", AnsiColors::BrightCyan, comfy_table::Color::Cyan),
    ("brightwhite", AnsiColors::BrightWhite, comfy_table::Color::White),
];

impl FromStr for ThemeColor {
    type Err = ParseThemeColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if COLOR_NAMES.iter().any(|(name, _, _)| *name == lower) {
            Ok(ThemeColor::Named(lower))
        } else {
            Err(ParseThemeColorError)
        }
    }
}

impl ThemeColor {
    fn lookup(&self) -> Option<&'static (&'static str, AnsiColors, comfy_table::Color)> {
        let ThemeColor::Named(name) = self;
        COLOR_NAMES.iter().find(|(n, _, _)| *n == name.as_str())
    }

    pub fn to_ansi_color(&self) -> AnsiColors {
        self.lookup().map_or(AnsiColors::White, |(_, ansi, _)| *ansi)
    }

    pub fn to_table_color(&self) -> comfy_table::Color {
        self.lookup().map_or(comfy_table::Color::Reset, |(_, _, table)| *table)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ThemeStyle {
    pub fg: Option<ThemeColor>,
}

fn named(color: &str) -> ThemeStyle {
    ThemeStyle { fg: Some(ThemeColor::Named(color.into())) }
}

/// Loads a theme file, or the default theme when no path is given.
pub fn build_theme_map(theme_path: Option<&Path>) -> Result<ThemeMap> {
    match theme_path {
        Some(path) => ThemeStyle::load_from_file(path),
        None => Ok(ThemeStyle::default_theme_map()),
    }
}

impl ThemeStyle {
    /// Loads a YAML theme; entries it leaves out keep their default colour.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<ThemeMap> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme file {}", path.display()))?;
        let custom: ThemeMap = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse theme file {}", path.display()))?;

        for style in custom.values() {
            if let Some(ThemeColor::Named(name)) = &style.fg {
                name.parse::<ThemeColor>()
                    .with_context(|| format!("Theme file {}: unknown color '{}'", path.display(), name))?;
            }
        }

        let mut theme = Self::default_theme_map();
        theme.extend(custom);
        Ok(theme)
    }

    pub fn default_theme_map() -> ThemeMap {
        let mut theme = HashMap::new();
        theme.insert(ThemeEntry::Header, named("cyan"));
        theme.insert(ThemeEntry::Success, named("green"));
        theme.insert(ThemeEntry::Warn, named("yellow"));
        theme.insert(ThemeEntry::Error, named("red"));
        theme.insert(ThemeEntry::Present, named("green"));
        theme.insert(ThemeEntry::Absent, named("red"));
        theme.insert(ThemeEntry::Universal, named("brightgreen"));
        theme.insert(ThemeEntry::Count, named("brightblue"));
        for entry in ThemeEntry::ALL {
            theme.entry(entry).or_insert_with(|| named("white"));
        }
        theme
    }
}
