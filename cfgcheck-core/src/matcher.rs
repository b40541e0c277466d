//! Presence checking of devices against a compiled catalog.
//!
//! Every device is parsed in checking mode into its full signature sequence,
//! then every catalog pattern is tested against the signatures sharing its
//! nesting depth. The first hit marks the (device, pattern) cell present;
//! presence is boolean, never a count.

use std::collections::HashMap;
use std::fmt;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::CompiledCatalog;
use crate::errors::AuditIssue;
use crate::parser::ConfigParser;
use crate::signature::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Present,
    Absent,
}

impl Presence {
    pub fn is_present(self) -> bool {
        self == Presence::Present
    }
}

/// Device rows by pattern columns, both in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceMatrix {
    /// Column keys: the original catalog pattern strings.
    pub patterns: Vec<String>,
    /// Row keys.
    pub devices: Vec<String>,
    /// `cells[row][column]`.
    pub cells: Vec<Vec<Presence>>,
}

impl PresenceMatrix {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns, ..Default::default() }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn push_row(&mut self, device: &str, row: Vec<Presence>) {
        self.devices.push(device.to_string());
        self.cells.push(row);
    }

    pub fn row(&self, device: &str) -> Option<&[Presence]> {
        let index = self.devices.iter().position(|d| d == device)?;
        self.cells.get(index).map(Vec::as_slice)
    }

    pub fn get(&self, device: &str, pattern: &str) -> Option<Presence> {
        let column = self.patterns.iter().position(|p| p == pattern)?;
        self.row(device)?.get(column).copied()
    }

    /// Per-column totals, in column order.
    pub fn totals(&self) -> Vec<PatternTotal> {
        let total = self.devices.len();
        self.patterns
            .iter()
            .enumerate()
            .map(|(column, pattern)| {
                let matched = self
                    .cells
                    .iter()
                    .filter(|row| row.get(column).is_some_and(|p| p.is_present()))
                    .count();
                PatternTotal::new(pattern, matched, total)
            })
            .collect()
    }
}

/// How many devices satisfy one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternTotal {
    pub pattern: String,
    pub matched: usize,
    pub total: usize,
    /// Set exactly when every device matched.
    pub universal: bool,
}

impl PatternTotal {
    pub fn new(pattern: &str, matched: usize, total: usize) -> Self {
        Self { pattern: pattern.to_string(), matched, total, universal: matched == total }
    }
}

impl fmt::Display for PatternTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.matched, self.total)
    }
}

/// Result of checking one profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub profile: String,
    pub generated_at: DateTime<Utc>,
    /// SHA-256 of the ordered catalog patterns the matrix was computed with.
    pub catalog_fingerprint: String,
    pub device_count: usize,
    pub matrix: PresenceMatrix,
    pub totals: Vec<PatternTotal>,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
}

/// Tests every pattern against one device's signatures.
pub fn check_signatures(catalog: &CompiledCatalog, signatures: &[Signature]) -> Vec<Presence> {
    let mut by_depth: HashMap<usize, Vec<&str>> = HashMap::new();
    for signature in signatures {
        by_depth.entry(signature.depth).or_default().push(signature.as_str());
    }

    catalog
        .patterns
        .iter()
        .map(|pattern| {
            let hit = by_depth
                .get(&pattern.depth)
                .is_some_and(|candidates| candidates.iter().any(|c| pattern.matches_text(c)));
            if hit { Presence::Present } else { Presence::Absent }
        })
        .collect()
}

/// Accumulates the presence matrix of one profile, device by device.
pub struct PresenceMatcher<'a> {
    catalog: &'a CompiledCatalog,
    matrix: PresenceMatrix,
    issues: Vec<AuditIssue>,
}

impl<'a> PresenceMatcher<'a> {
    pub fn new(catalog: &'a CompiledCatalog) -> Self {
        let patterns = catalog.sources().into_iter().map(String::from).collect();
        Self { catalog, matrix: PresenceMatrix::new(patterns), issues: catalog.issues.clone() }
    }

    /// Parses one device in checking mode and records its row.
    pub fn check_device<I, S>(&mut self, device: &str, lines: I) -> &[Presence]
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = ConfigParser::checking().parse(device, lines);
        self.issues.extend(parsed.issues);
        self.check_parsed(device, &parsed.signatures)
    }

    /// Records the row of a device whose signatures are already known.
    pub fn check_parsed(&mut self, device: &str, signatures: &[Signature]) -> &[Presence] {
        let row = check_signatures(self.catalog, signatures);
        debug!(
            "{}: {} of {} patterns present",
            device,
            row.iter().filter(|p| p.is_present()).count(),
            row.len()
        );
        self.matrix.push_row(device, row);
        self.matrix.cells.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn matrix(&self) -> &PresenceMatrix {
        &self.matrix
    }

    pub fn finish(self) -> CheckReport {
        let totals = self.matrix.totals();
        info!(
            "Profile '{}': checked {} devices against {} patterns ({} universal)",
            self.catalog.profile,
            self.matrix.device_count(),
            self.catalog.len(),
            totals.iter().filter(|t| t.universal).count()
        );
        CheckReport {
            profile: self.catalog.profile.clone(),
            generated_at: Utc::now(),
            catalog_fingerprint: self.catalog.fingerprint(),
            device_count: self.matrix.device_count(),
            matrix: self.matrix,
            totals,
            issues: self.issues,
        }
    }
}
