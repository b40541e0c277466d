//! Remediation planning.
//!
//! Rules are keyed by the original catalog pattern string. An `add` block is
//! emitted for devices where the pattern is absent, a `change` block for
//! devices where it is present. `composer` walks a presence matrix and turns
//! the selected blocks into per-device command lists.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::AuditIssue;

pub mod composer;
pub mod variables;

pub use composer::compose;
pub use variables::VariableTable;

/// Which cell state a rule responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Applied where the pattern is absent.
    Add,
    /// Applied where the pattern is present.
    Change,
}

/// The add and change tables of one profile.
#[derive(Debug, Clone, Default)]
pub struct RemediationRules {
    pub profile: String,
    add: HashMap<String, String>,
    change: HashMap<String, String>,
    pub issues: Vec<AuditIssue>,
}

impl RemediationRules {
    /// Builds the tables. A pattern with both an add and a change block is
    /// reported and dropped from both.
    pub fn build(profile: &str, mut add: HashMap<String, String>, mut change: HashMap<String, String>) -> Self {
        let mut conflicts: Vec<String> = add.keys().filter(|p| change.contains_key(*p)).cloned().collect();
        conflicts.sort();

        let mut issues = Vec::new();
        for pattern in conflicts {
            add.remove(&pattern);
            change.remove(&pattern);
            issues.push(AuditIssue::ConflictingRule { profile: profile.to_string(), pattern }.reported());
        }
        debug!("Profile '{}': {} add rules, {} change rules", profile, add.len(), change.len());
        Self { profile: profile.to_string(), add, change, issues }
    }

    /// Builds the tables from `(pattern, add, change)` rows. Patterns are
    /// trimmed the same way the compiled catalog trims them, so keys line up
    /// with the matrix columns.
    pub fn from_rows<I>(profile: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>, Option<String>)>,
    {
        let mut add = HashMap::new();
        let mut change = HashMap::new();
        for (pattern, add_block, change_block) in rows {
            let pattern = pattern.trim().to_string();
            if pattern.is_empty() {
                continue;
            }
            if let Some(block) = add_block.filter(|b| !b.trim().is_empty()) {
                add.insert(pattern.clone(), block);
            }
            if let Some(block) = change_block.filter(|b| !b.trim().is_empty()) {
                change.insert(pattern, block);
            }
        }
        Self::build(profile, add, change)
    }

    pub fn get(&self, kind: RuleKind, pattern: &str) -> Option<&str> {
        let table = match kind {
            RuleKind::Add => &self.add,
            RuleKind::Change => &self.change,
        };
        table.get(pattern).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.change.is_empty()
    }
}

/// The commands of one device, in matrix column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCommands {
    pub device: String,
    pub commands: Vec<String>,
}

/// The outcome of composing remediation for one profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub profile: String,
    /// One entry per matrix row, in row order.
    pub devices: Vec<DeviceCommands>,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
}

impl RemediationPlan {
    pub fn commands_for(&self, device: &str) -> Option<&[String]> {
        self.devices
            .iter()
            .find(|d| d.device == device)
            .map(|d| d.commands.as_slice())
    }

    pub fn total_commands(&self) -> usize {
        self.devices.iter().map(|d| d.commands.len()).sum()
    }
}
