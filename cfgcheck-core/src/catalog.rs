//! Command catalogs.
//!
//! Learning side: a `CatalogBuilder` counts how often each signature shows up
//! across a profile's sample devices, then lays those counts over the
//! profile's reference template so engineers can review the template top to
//! bottom and pick the lines that become checked patterns.
//!
//! Checking side: a `CompiledCatalog` holds the ordered patterns of a
//! profile, each compiled once into either a literal or a regular
//! expression, together with the nesting depth it applies to.
//!
//! License: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};
use log::{debug, info};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::SignatureSink;
use crate::errors::AuditIssue;
use crate::parser::ConfigParser;
use crate::signature::{separator_count, Signature, END_ANCHOR};

/// Hand-authored stand-in for a space inside a pattern.
pub const WILDCARD_PLACEHOLDER: &str = "***";

/// A learned signature and the number of times it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub pattern: String,
    pub occurrence_count: usize,
}

/// Accumulates signature counts for one profile.
#[derive(Debug, Default, Clone)]
pub struct CatalogBuilder {
    profile: String,
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
    devices: usize,
}

impl CatalogBuilder {
    pub fn new(profile: impl Into<String>) -> Self {
        Self { profile: profile.into(), ..Default::default() }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Number of device files fed through `learn_device`.
    pub fn devices_observed(&self) -> usize {
        self.devices
    }

    /// Counts one occurrence of `signature`, creating the entry if new.
    pub fn observe(&mut self, signature: &str) {
        match self.index.get(signature) {
            Some(&i) => self.entries[i].occurrence_count += 1,
            None => {
                self.index.insert(signature.to_string(), self.entries.len());
                self.entries.push(CatalogEntry {
                    pattern: signature.to_string(),
                    occurrence_count: 1,
                });
            }
        }
    }

    /// Streams one sample device into the catalog.
    pub fn learn_device<I, S>(&mut self, parser: &ConfigParser<'_>, source_id: &str, lines: I) -> Vec<AuditIssue>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        debug!("Profile '{}': learning from {}", self.profile, source_id);
        self.devices += 1;
        parser.parse_into(source_id, lines, self)
    }

    pub fn count(&self, signature: &str) -> usize {
        self.index.get(signature).map_or(0, |&i| self.entries[i].occurrence_count)
    }

    /// Every observed signature, in first-seen order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// The template's signatures, in template order and without repeats, each
    /// annotated with its learned count (0 when never observed).
    pub fn finalize_against_template(&self, template_signatures: &[Signature]) -> Vec<CatalogEntry> {
        let mut seen = HashSet::new();
        let finalized: Vec<CatalogEntry> = template_signatures
            .iter()
            .filter(|sig| seen.insert(sig.as_str()))
            .map(|sig| CatalogEntry {
                pattern: sig.text.clone(),
                occurrence_count: self.count(sig.as_str()),
            })
            .collect();
        info!(
            "Profile '{}': {} template signatures, {} learned from {} devices",
            self.profile,
            finalized.len(),
            self.entries.len(),
            self.devices
        );
        finalized
    }

    /// Learned signatures the template does not contain, in first-seen order.
    pub fn unmatched(&self, template_signatures: &[Signature]) -> Vec<CatalogEntry> {
        let template: HashSet<&str> = template_signatures.iter().map(|s| s.as_str()).collect();
        self.entries
            .iter()
            .filter(|e| !template.contains(e.pattern.as_str()))
            .cloned()
            .collect()
    }
}

impl SignatureSink for CatalogBuilder {
    fn accept(&mut self, signature: Signature) {
        self.observe(&signature.text);
    }
}

/// How the text of a catalog entry is read.
///
/// Learned entries are literal: they are copies of real lines and may
/// contain `+`, `(` or `?`. Hand-authored entries usually leave the syntax
/// unset, in which case it is inferred from the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSyntax {
    Literal,
    Regex,
}

/// How a pattern is tested against a candidate signature.
#[derive(Debug, Clone)]
pub enum PatternKind {
    /// No regex syntax: substring test, or suffix test when anchored.
    Literal { text: String, anchored: bool },
    Regex(Regex),
}

/// One checked pattern, compiled at catalog-load time.
#[derive(Debug, Clone)]
pub struct CatalogPattern {
    /// The pattern exactly as written in the catalog.
    pub source: String,
    /// Required nesting depth of a matching signature.
    pub depth: usize,
    pub kind: PatternKind,
}

const REGEX_META: &[char] = &['\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$'];

fn split_anchor(text: &str) -> (&str, bool) {
    match text.strip_suffix(END_ANCHOR) {
        Some(body) => (body, true),
        None => (text, false),
    }
}

impl CatalogPattern {
    /// Compiles a catalog pattern, inferring its syntax from the text.
    ///
    /// Returns the compiled pattern and, when the text is not a valid regular
    /// expression, the reason it fell back to a literal match.
    pub fn compile(source: &str) -> (Self, Option<String>) {
        Self::compile_as(source, None)
    }

    /// Compiles a catalog pattern with an explicit syntax. `None` infers it:
    /// text without regex metacharacters is literal.
    pub fn compile_as(source: &str, syntax: Option<PatternSyntax>) -> (Self, Option<String>) {
        let translated = source.replace(WILDCARD_PLACEHOLDER, " ");
        let depth = separator_count(&translated);
        let (body, anchored) = split_anchor(&translated);
        let literal = || PatternKind::Literal { text: body.to_string(), anchored };

        let syntax = syntax.unwrap_or(if body.contains(REGEX_META) {
            PatternSyntax::Regex
        } else {
            PatternSyntax::Literal
        });
        if syntax == PatternSyntax::Literal {
            return (Self { source: source.to_string(), depth, kind: literal() }, None);
        }

        match RegexBuilder::new(&translated).size_limit(10 * (1 << 20)).build() {
            Ok(regex) => (Self { source: source.to_string(), depth, kind: PatternKind::Regex(regex) }, None),
            Err(e) => (Self { source: source.to_string(), depth, kind: literal() }, Some(e.to_string())),
        }
    }

    /// Depth check first, then the content test.
    pub fn matches(&self, signature: &Signature) -> bool {
        if signature.depth != self.depth {
            return false;
        }
        self.matches_text(signature.as_str())
    }

    /// Content test only; callers must have checked the depth.
    pub fn matches_text(&self, candidate: &str) -> bool {
        match &self.kind {
            PatternKind::Literal { text, anchored: true } => candidate.ends_with(text.as_str()),
            PatternKind::Literal { text, anchored: false } => candidate.contains(text.as_str()),
            PatternKind::Regex(regex) => regex.is_match(candidate),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, PatternKind::Literal { .. })
    }
}

/// The ordered, compiled patterns checked for one profile.
#[derive(Debug, Clone, Default)]
pub struct CompiledCatalog {
    pub profile: String,
    pub patterns: Vec<CatalogPattern>,
    /// Patterns that failed to compile as regular expressions.
    pub issues: Vec<AuditIssue>,
}

impl CompiledCatalog {
    /// Compiles patterns in order, inferring each one's syntax; blank
    /// entries are ignored.
    pub fn compile<I, S>(profile: &str, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::compile_entries(profile, patterns.into_iter().map(|p| (p, None)))
    }

    /// Compiles `(pattern, syntax)` pairs in order; blank entries are ignored.
    pub fn compile_entries<I, S>(profile: &str, patterns: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<PatternSyntax>)>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        let mut issues = Vec::new();
        for (pattern, syntax) in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let (compiled_pattern, failure) = CatalogPattern::compile_as(pattern, syntax);
            if let Some(reason) = failure {
                issues.push(
                    AuditIssue::InvalidPattern {
                        profile: profile.to_string(),
                        pattern: pattern.to_string(),
                        reason,
                    }
                    .reported(),
                );
            }
            compiled.push(compiled_pattern);
        }
        debug!(
            "Profile '{}': compiled {} patterns ({} literal)",
            profile,
            compiled.len(),
            compiled.iter().filter(|p| p.is_literal()).count()
        );
        Self { profile: profile.to_string(), patterns: compiled, issues }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Original pattern strings, in catalog order.
    pub fn sources(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.source.as_str()).collect()
    }

    /// SHA-256 over the ordered pattern sources, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for pattern in &self.patterns {
            hasher.update(pattern.source.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }
}
