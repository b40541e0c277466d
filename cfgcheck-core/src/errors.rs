//! errors.rs - Error types for the cfgcheck-core library.
//!
//! Two families live here. `CfgCheckError` covers the fatal, operator-facing
//! failures (unreadable files, malformed YAML, rules that do not compile).
//! `AuditIssue` covers the non-fatal findings produced while parsing,
//! matching and composing remediation: each one names the device, pattern
//! or profile it belongs to, and none of them stops a batch.
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// This enum represents all fatal error types in the `cfgcheck-core` library.
///
/// By using `#[non_exhaustive]`, we signal to consumers of this library that
/// new variants may be added in future versions.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CfgCheckError {
    #[error("Failed to compile line rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Invalid catalog '{0}': {1}")]
    InvalidCatalog(String, String),

    #[error("Failed to serialize report: {0}")]
    SerializationError(String),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A critical system error occurred: {0}")]
    AnyhowWrapper(#[from] anyhow::Error),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}

/// A non-fatal finding, attributable to one device, pattern or profile.
///
/// Issues are logged when raised and travel back to the caller inside the
/// result structures so an operator can fix the source data.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditIssue {
    #[error("{source_id}: indentation error at line {line_number} ('{line}'), width {width} below every open context")]
    StructuralWarning {
        source_id: String,
        line_number: usize,
        line: String,
        width: usize,
    },

    #[error("device '{device}': no value for variable '{variable}' (pattern '{pattern}'), block skipped")]
    MissingVariable {
        device: String,
        pattern: String,
        variable: String,
    },

    #[error("device '{device}': '{operand}' looks like an IPv4 address but is not (pattern '{pattern}')")]
    InvalidAddressOperand {
        device: String,
        pattern: String,
        operand: String,
    },

    #[error("device '{device}': '{expression}' leaves the IPv4 address space (pattern '{pattern}')")]
    AddressOverflow {
        device: String,
        pattern: String,
        expression: String,
    },

    #[error("profile '{profile}': pattern '{pattern}' has both an add and a change block, rule ignored")]
    ConflictingRule { profile: String, pattern: String },

    #[error("profile '{profile}': no template registered, profile skipped")]
    UnknownProfileTemplate { profile: String },

    #[error("profile '{profile}': pattern '{pattern}' is not a valid regular expression ({reason}), matched literally")]
    InvalidPattern {
        profile: String,
        pattern: String,
        reason: String,
    },

    #[error("profile '{profile}': duplicated device name '{device}', later entry skipped")]
    DuplicateDevice { profile: String, device: String },
}

/// Log target of every `AuditIssue` record. Front ends that present the
/// collected issues themselves can filter this target out.
pub const ISSUE_LOG_TARGET: &str = "cfgcheck_core::issue";

impl AuditIssue {
    /// Logs the issue at warning level and hands it back, so call sites can
    /// write `issues.push(issue.reported())`.
    pub fn reported(self) -> Self {
        log::warn!(target: ISSUE_LOG_TARGET, "{}", self);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display_names_identity() {
        let issue = AuditIssue::MissingVariable {
            device: "pe_2".to_string(),
            pattern: "ntp server .*$".to_string(),
            variable: "ntp_ip".to_string(),
        };
        let text = issue.to_string();
        assert!(text.contains("pe_2"));
        assert!(text.contains("ntp_ip"));
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = AuditIssue::UnknownProfileTemplate { profile: "P1".to_string() };
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"kind\":\"unknown_profile_template\""));
    }
}
