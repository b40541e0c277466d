//! Hierarchy-qualified line signatures.
//!
//! A signature joins the parent chain and the line content with a reserved
//! separator that never occurs in device configuration text. Catalog-side
//! signatures end with a `$` anchor unless the line carries a variable tail
//! (secrets, keys, passwords), in which case they match as a prefix.

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::normalizer::Normalizer;

/// Joins hierarchy levels inside a signature.
pub const SEPARATOR: &str = "@@@";

/// Appended to signatures that must match up to the end of the line.
pub const END_ANCHOR: char = '$';

/// Whether a signature gets an end anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    End,
    Prefix,
}

/// One statement in its context, e.g. `interface Gi0/1@@@ip address 10.0.0.1 255.255.255.0$`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub text: String,
    /// Number of enclosing contexts (separator count).
    pub depth: usize,
}

impl Signature {
    /// Joins `chain` (top level first) and `content`.
    pub fn build(chain: &[String], content: &str, anchor: Anchor) -> Self {
        let mut text = String::with_capacity(
            chain.iter().map(|c| c.len() + SEPARATOR.len()).sum::<usize>() + content.len() + 1,
        );
        for context in chain {
            text.push_str(context);
            text.push_str(SEPARATOR);
        }
        text.push_str(content);
        if anchor == Anchor::End {
            text.push(END_ANCHOR);
        }
        Self { text, depth: chain.len() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The statement itself, without its contexts or anchor.
    pub fn statement(&self) -> &str {
        let last = self.text.rsplit(SEPARATOR).next().unwrap_or(&self.text);
        last.strip_suffix(END_ANCHOR).unwrap_or(last)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Number of hierarchy separators in a signature or pattern.
pub fn separator_count(text: &str) -> usize {
    text.matches(SEPARATOR).count()
}

/// Decides the anchor of a catalog-side signature.
///
/// Rewritten lines lost their variable tail already and always match as a
/// prefix; other lines do when they belong to a variable-tail class.
pub fn anchor_for(content: &str, rewritten: bool, normalizer: &Normalizer) -> Anchor {
    if rewritten || normalizer.has_variable_tail(content) {
        Anchor::Prefix
    } else {
        Anchor::End
    }
}

/// Renders a signature for display, one hierarchy level per line.
pub fn to_display_block(text: &str) -> String {
    text.replace(SEPARATOR, "\n")
}
