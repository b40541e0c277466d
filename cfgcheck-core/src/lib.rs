// cfgcheck-core/src/lib.rs
//! # cfgcheck Core Library
//!
//! `cfgcheck-core` holds the platform-independent logic for auditing network
//! device configurations against per-profile command catalogs. It turns raw
//! configuration lines into hierarchy-qualified signatures, learns which
//! signatures recur across a profile, checks devices for the presence of
//! catalog patterns, and composes remediation commands from the result.
//!
//! The library does no file discovery of its own beyond the inventory and
//! catalog helpers in `profiles`; every workflow takes already-loaded lines.
//!
//! ## Modules
//!
//! * `config`: `LineRule`s and `NormalizerConfig`: loading, merging and validating line rules.
//! * `normalizer`: drops and rewrites individual lines; `normalizer::compiler` caches compiled rules.
//! * `hierarchy`: the indentation-based `HierarchyTracker`.
//! * `signature`: builds `Signature`s from a parent chain and a line.
//! * `parser`: streams a file through normalizer, tracker and signature builder.
//! * `engine`: the `SignatureSink` trait between parsing and its consumers.
//! * `catalog`: `CatalogBuilder` (learning) and `CompiledCatalog` (checking).
//! * `matcher`: the presence matrix and per-pattern totals.
//! * `remediation`: rule tables, variable substitution and command composition.
//! * `profiles`: inventory, device files and catalog files.
//! * `headless`: one-shot learn, check and remediate wrappers.
//! * `errors`: `CfgCheckError` (fatal) and `AuditIssue` (non-fatal).
//!
//! ## Usage Example
//!
//! ```rust
//! use cfgcheck_core::{check_profile, CompiledCatalog, DeviceConfig};
//!
//! let device = DeviceConfig::from_text(
//!     "pe_1",
//!     "interface Gi0/1\n  ip address 10.0.0.1 255.255.255.0\n",
//! );
//! let catalog = CompiledCatalog::compile("P1", ["interface Gi0/1@@@ip address .*$"]);
//! let report = check_profile(&catalog, &[device]);
//! assert_eq!(report.totals[0].to_string(), "1 / 1");
//! ```
//!
//! ## Error Handling
//!
//! Fatal problems (unreadable files, malformed YAML, rules that do not
//! compile) surface as `anyhow::Error` wrapping `CfgCheckError`. Everything
//! tied to one device, pattern or profile is an `AuditIssue`: logged,
//! collected into the result, and never aborting the batch.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod hierarchy;
pub mod matcher;
pub mod normalizer;
pub mod parser;
pub mod profiles;
pub mod remediation;
pub mod signature;

/// Re-exports the line-rule configuration types and helpers.
pub use config::{merge_rules, validate_rules, LineRule, NormalizerConfig, RuleAction, MAX_PATTERN_LENGTH};

/// Re-exports the error types.
pub use errors::{AuditIssue, CfgCheckError, ISSUE_LOG_TARGET};

pub use engine::SignatureSink;
pub use hierarchy::{HierarchyTracker, IndentationFrame};
pub use normalizer::{LineVerdict, Normalizer};
pub use parser::{ConfigParser, ParseMode, ParsedFile};
pub use signature::{Signature, END_ANCHOR, SEPARATOR};

/// Re-exports learning and checking types.
pub use catalog::{CatalogBuilder, CatalogEntry, CatalogPattern, CompiledCatalog, PatternKind, PatternSyntax};
pub use matcher::{CheckReport, PatternTotal, Presence, PresenceMatcher, PresenceMatrix};

/// Re-exports remediation types.
pub use remediation::{DeviceCommands, RemediationPlan, RemediationRules, RuleKind, VariableTable};

/// Re-exports inventory and catalog file handling.
pub use profiles::{
    catalog_candidate_paths, load_catalog_by_name, CatalogFile, CatalogFileEntry, DeviceConfig, DeviceSpec,
    Inventory, ProfileSpec,
};

/// Re-exports one-shot workflows.
pub use headless::{check_profile, file_signatures, learn_profile, remediate_profile, LearnOutcome};

pub use normalizer::compiler::{compile_rules, CompiledRule, CompiledRules};
