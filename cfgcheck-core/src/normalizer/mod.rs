//! Line normalizer for cfgcheck.
//!
//! Classifies a single raw configuration line as dropped (noise, per-device
//! identity), rewritten to a stable prefix (secrets, key material, serial
//! numbers, autogenerated certificate names) or unchanged. The rewrite keeps
//! the line's indentation so the hierarchy tracker still sees it, and so
//! normalizing an already-normalized line is a no-op.

pub mod compiler;

use std::sync::Arc;
use anyhow::Result;
use log::trace;

use crate::config::NormalizerConfig;
use compiler::{get_or_compile_rules, CompiledRules, Rewrite};

/// The normalizer's decision for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineVerdict {
    /// The line takes no part in any check.
    Dropped { rule: String },
    /// The line was truncated to a stable prefix (indentation preserved).
    Rewritten { line: String, rule: String },
    /// No rule applied; trailing whitespace removed.
    Unchanged(String),
}

impl LineVerdict {
    /// The full line text, indentation included, or `None` when dropped.
    pub fn text(&self) -> Option<&str> {
        match self {
            LineVerdict::Dropped { .. } => None,
            LineVerdict::Rewritten { line, .. } => Some(line),
            LineVerdict::Unchanged(line) => Some(line),
        }
    }

    /// The line content with surrounding whitespace stripped.
    pub fn content(&self) -> Option<&str> {
        self.text().map(str::trim)
    }

    pub fn is_dropped(&self) -> bool {
        matches!(self, LineVerdict::Dropped { .. })
    }

    pub fn is_rewritten(&self) -> bool {
        matches!(self, LineVerdict::Rewritten { .. })
    }
}

/// Returns the leading whitespace of a line.
pub fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Applies compiled line rules to raw lines.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Arc<CompiledRules>,
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Result<Self> {
        Ok(Self { rules: get_or_compile_rules(config)? })
    }

    /// Builds a normalizer from the embedded default rules.
    pub fn with_default_rules() -> Result<Self> {
        Self::new(&NormalizerConfig::load_default_rules()?)
    }

    /// Classifies one raw line. Drop rules are tried first, then redact rules;
    /// the first match wins.
    pub fn normalize(&self, raw: &str) -> LineVerdict {
        let line = raw.trim_end_matches(['\r', '\n']);

        if let Some(rule) = self.rules.drop.iter().find(|r| r.regex.is_match(line)) {
            trace!("Line dropped by rule '{}'", rule.name);
            return LineVerdict::Dropped { rule: rule.name.clone() };
        }

        for rule in &self.rules.redact {
            if !rule.regex.is_match(line) {
                continue;
            }
            let prefix = match &rule.rewrite {
                Some(Rewrite::Keep(keep)) => {
                    match keep.captures(line).and_then(|caps| caps.get(1)) {
                        Some(group) => group.as_str(),
                        None => continue,
                    }
                }
                Some(Rewrite::Replace(text)) => text.as_str(),
                None => continue,
            };
            let rewritten = format!("{}{}", leading_whitespace(line), prefix.trim());
            trace!("Line rewritten by rule '{}'", rule.name);
            return LineVerdict::Rewritten { line: rewritten, rule: rule.name.clone() };
        }

        LineVerdict::Unchanged(line.trim_end().to_string())
    }

    /// True when the content belongs to a variable-tail class (keys, secrets,
    /// passwords) and must be matched as a prefix.
    pub fn has_variable_tail(&self, content: &str) -> bool {
        self.rules.variable_tail.iter().any(|re| re.is_match(content))
    }

    /// True when a signature falls in a block excluded from learning.
    pub fn is_excluded_block(&self, signature: &str) -> bool {
        self.rules
            .excluded_blocks
            .iter()
            .any(|prefix| signature.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::with_default_rules().unwrap()
    }

    #[test]
    fn test_drops_noise_and_identity() {
        let n = normalizer();
        for line in ["!\n", " !\n", "hostname pe-1\n", "version 15.2\n", "boot system flash:x\n",
                     "vrf definition CUST\n", "  set uuid 1234\n", "Building configuration...\n"] {
            assert!(n.normalize(line).is_dropped(), "expected drop: {:?}", line);
        }
    }

    #[test]
    fn test_rewrites_secrets_to_prefix() {
        let n = normalizer();
        assert_eq!(
            n.normalize("enable secret 5 $1$abcd$efgh\n").text(),
            Some("enable secret 5")
        );
        assert_eq!(
            n.normalize(" password 7 0822455D0A16\n").text(),
            Some(" password 7")
        );
        assert_eq!(
            n.normalize("ntp authentication-key 10 md5abc\n").text(),
            Some("ntp authentication-key 10 md5")
        );
        assert_eq!(
            n.normalize("license udi pid CISCO2901/K9 sn FTX1234\n").text(),
            Some("license udi pid")
        );
        assert_eq!(
            n.normalize("crypto pki trustpoint TP-self-signed-12345\n").text(),
            Some("crypto pki trustpoint TP-self-signed-")
        );
        assert_eq!(
            n.normalize(" subject-name cn=IOS-Self-Signed-Certificate-12345\n").text(),
            Some(" subject-name cn=IOS-Self-Signed-Certificate-")
        );
    }

    #[test]
    fn test_unchanged_line_loses_trailing_whitespace_only() {
        let n = normalizer();
        assert_eq!(
            n.normalize("  ip address 10.0.0.1 255.255.255.0  \r\n"),
            LineVerdict::Unchanged("  ip address 10.0.0.1 255.255.255.0".to_string())
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        let lines = [
            "enable secret 9 $9$xyz",
            "  password 7 045802150C2E",
            " key-string 7 1234ABCD",
            "username admin privilege 15 secret 9 $9$abc",
            "ntp authentication-key 10 md5 0123 7",
            " subject-name cn=IOS-Self-Signed-Certificate-987",
            "  hostname inside-block",
            "interface Gi0/1",
            " tacacs server-private 10.1.1.1 key 7 0011 ",
        ];
        for line in lines {
            let first = n.normalize(line);
            let Some(text) = first.text() else { continue };
            let second = n.normalize(text);
            assert_eq!(second.text(), Some(text), "not idempotent for {:?}", line);
        }
    }

    #[test]
    fn test_variable_tail_and_excluded_blocks() {
        let n = normalizer();
        assert!(n.has_variable_tail("neighbor 1.1.1.1 password 7"));
        assert!(n.has_variable_tail("tacacs-server host 1.1.1.1 key 7 ABC"));
        assert!(!n.has_variable_tail("ntp server 10.0.0.1"));
        assert!(n.is_excluded_block("interface Gi0/1@@@ip address 10.0.0.1 255.255.255.0$"));
        assert!(n.is_excluded_block("router bgp 65000$"));
        assert!(!n.is_excluded_block("ntp server 10.0.0.1$"));
    }
}
