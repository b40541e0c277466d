//! Streams a device configuration through normalizer, hierarchy tracker and
//! signature builder.
//!
//! The parser owns nothing across files: every call creates a fresh
//! `HierarchyTracker`, so nesting state never leaks from one device into the
//! next.

use std::borrow::Cow;
use log::debug;
use strip_ansi_escapes::strip;

use crate::engine::SignatureSink;
use crate::errors::AuditIssue;
use crate::hierarchy::HierarchyTracker;
use crate::normalizer::Normalizer;
use crate::signature::{anchor_for, Anchor, Signature};

/// How lines turn into signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Normalized, anchored signatures; excluded blocks are skipped.
    Learning,
    /// Like `Learning`, but every block is kept.
    Template,
    /// Raw trimmed lines without anchors, as matched against a catalog.
    Checking,
}

/// The signatures of one file plus any structural warnings.
#[derive(Debug, Default, Clone)]
pub struct ParsedFile {
    pub source_id: String,
    pub signatures: Vec<Signature>,
    pub issues: Vec<AuditIssue>,
}

/// Removes terminal escape sequences left over from captured sessions.
pub fn clean_raw_line(line: &str) -> Cow<'_, str> {
    if !line.contains('\x1b') {
        return Cow::Borrowed(line);
    }
    let stripped = strip(line.as_bytes());
    Cow::Owned(String::from_utf8_lossy(&stripped).into_owned())
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigParser<'a> {
    mode: ParseMode,
    normalizer: Option<&'a Normalizer>,
}

impl<'a> ConfigParser<'a> {
    /// Parser for sample devices while learning a catalog.
    pub fn learning(normalizer: &'a Normalizer) -> Self {
        Self { mode: ParseMode::Learning, normalizer: Some(normalizer) }
    }

    /// Parser for a profile's reference template.
    pub fn template(normalizer: &'a Normalizer) -> Self {
        Self { mode: ParseMode::Template, normalizer: Some(normalizer) }
    }

    /// Parser for devices checked against a catalog.
    pub fn checking() -> Self {
        Self { mode: ParseMode::Checking, normalizer: None }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Streams `lines` into `sink` and returns the structural warnings.
    pub fn parse_into<I, S>(&self, source_id: &str, lines: I, sink: &mut dyn SignatureSink) -> Vec<AuditIssue>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tracker = HierarchyTracker::new(source_id);
        let mut issues = Vec::new();
        let mut produced = 0usize;

        for (index, raw) in lines.into_iter().enumerate() {
            let line = clean_raw_line(raw.as_ref());
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }

            if let Some(issue) = tracker.advance(line, index + 1) {
                issues.push(issue);
            }

            let normalizer = match (self.mode, self.normalizer) {
                (ParseMode::Checking, _) | (_, None) => {
                    let content = line.trim();
                    sink.accept(Signature::build(&tracker.parent_chain(), content, Anchor::Prefix));
                    tracker.set_previous(content);
                    produced += 1;
                    continue;
                }
                (_, Some(normalizer)) => normalizer,
            };

            let verdict = normalizer.normalize(line);
            let (Some(text), Some(content)) = (verdict.text(), verdict.content()) else {
                tracker.set_previous(line);
                continue;
            };
            tracker.set_previous(content);

            let anchor = anchor_for(text, verdict.is_rewritten(), normalizer);
            let signature = Signature::build(&tracker.parent_chain(), content, anchor);
            if self.mode == ParseMode::Learning && normalizer.is_excluded_block(signature.as_str()) {
                continue;
            }
            sink.accept(signature);
            produced += 1;
        }

        debug!("{}: produced {} signatures ({:?} mode)", source_id, produced, self.mode);
        issues
    }

    /// Parses a whole file into memory.
    pub fn parse<I, S>(&self, source_id: &str, lines: I) -> ParsedFile
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut signatures = Vec::new();
        let issues = self.parse_into(source_id, lines, &mut signatures);
        ParsedFile { source_id: source_id.to_string(), signatures, issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Building configuration...
!
hostname pe-1
enable secret 5 $1$abcd
!
interface Gi0/1
 description uplink
 ip address 10.0.0.1 255.255.255.0
!
router bgp 65000
 neighbor 1.1.1.1 password 7 0822455D
ntp server 10.0.0.9
";

    fn texts(file: &ParsedFile) -> Vec<&str> {
        file.signatures.iter().map(|s| s.as_str()).collect()
    }

    #[test]
    fn test_template_mode_keeps_every_block() {
        let n = Normalizer::with_default_rules().unwrap();
        let file = ConfigParser::template(&n).parse("pe-1", SAMPLE.lines());
        assert_eq!(
            texts(&file),
            vec![
                "enable secret 5",
                "interface Gi0/1$",
                "interface Gi0/1@@@description uplink$",
                "interface Gi0/1@@@ip address 10.0.0.1 255.255.255.0$",
                "router bgp 65000$",
                "router bgp 65000@@@neighbor 1.1.1.1 password 7",
                "ntp server 10.0.0.9$",
            ]
        );
    }

    #[test]
    fn test_learning_mode_skips_excluded_blocks() {
        let n = Normalizer::with_default_rules().unwrap();
        let file = ConfigParser::learning(&n).parse("pe-1", SAMPLE.lines());
        assert_eq!(texts(&file), vec!["enable secret 5", "ntp server 10.0.0.9$"]);
    }

    #[test]
    fn test_checking_mode_uses_raw_lines() {
        let file = ConfigParser::checking().parse("pe-1", SAMPLE.lines());
        assert!(texts(&file).contains(&"enable secret 5 $1$abcd"));
        assert!(texts(&file).contains(&"router bgp 65000@@@neighbor 1.1.1.1 password 7 0822455D"));
        assert!(texts(&file).contains(&"!"));
    }

    #[test]
    fn test_dropped_line_still_opens_context() {
        let n = Normalizer::with_default_rules().unwrap();
        let lines = ["vrf definition CUST", " rd 65000:1", "ntp server 1.1.1.1"];
        let file = ConfigParser::template(&n).parse("pe-1", lines);
        assert_eq!(texts(&file), vec!["vrf definition CUST@@@rd 65000:1$", "ntp server 1.1.1.1$"]);
    }

    #[test]
    fn test_ansi_sequences_are_removed() {
        let file = ConfigParser::checking().parse("pe-1", ["\x1b[1mntp server 1.1.1.1\x1b[0m"]);
        assert_eq!(texts(&file), vec!["ntp server 1.1.1.1"]);
    }

    #[test]
    fn test_structural_warning_is_collected() {
        let file = ConfigParser::checking().parse("pe-1", ["a", "   b", "  c"]);
        assert_eq!(file.issues.len(), 1);
        assert_eq!(texts(&file), vec!["a", "a@@@b", "c"]);
    }
}
