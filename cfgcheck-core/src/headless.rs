// File: cfgcheck-core/src/headless.rs

//! `headless.rs`
//! One-shot wrappers for the three workflows: learning a profile's catalog,
//! checking devices against it, and planning remediation from the resulting
//! presence matrix. Inputs are already-loaded device files; file discovery
//! belongs to the caller.

use log::info;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogBuilder, CatalogEntry, CompiledCatalog};
use crate::errors::AuditIssue;
use crate::matcher::{CheckReport, PresenceMatcher, PresenceMatrix};
use crate::normalizer::Normalizer;
use crate::parser::{ConfigParser, ParsedFile};
use crate::profiles::DeviceConfig;
use crate::remediation::{compose, RemediationPlan, RemediationRules, VariableTable};

/// Result of learning one profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnOutcome {
    pub profile: String,
    pub devices_observed: usize,
    /// Template signatures in template order, with learned counts.
    pub entries: Vec<CatalogEntry>,
    /// Learned signatures the template lacks, in first-seen order.
    pub unmatched: Vec<CatalogEntry>,
    #[serde(default)]
    pub issues: Vec<AuditIssue>,
}

/// Learns signature counts from `devices` and orders them by `template`.
///
/// Without a template the profile is skipped and the returned issue says so.
pub fn learn_profile(
    normalizer: &Normalizer,
    profile: &str,
    template: Option<&DeviceConfig>,
    devices: &[DeviceConfig],
) -> Result<LearnOutcome, AuditIssue> {
    let Some(template) = template else {
        return Err(AuditIssue::UnknownProfileTemplate { profile: profile.to_string() }.reported());
    };

    let parser = ConfigParser::learning(normalizer);
    let mut builder = CatalogBuilder::new(profile);
    let mut issues = Vec::new();
    for device in devices {
        issues.extend(builder.learn_device(&parser, &device.name, &device.lines));
    }

    let reference = ConfigParser::template(normalizer).parse(&template.name, &template.lines);
    issues.extend(reference.issues);

    let entries = builder.finalize_against_template(&reference.signatures);
    let unmatched = builder.unmatched(&reference.signatures);
    info!(
        "Profile '{}': learned {} template entries, {} unmatched signatures",
        profile,
        entries.len(),
        unmatched.len()
    );
    Ok(LearnOutcome {
        profile: profile.to_string(),
        devices_observed: builder.devices_observed(),
        entries,
        unmatched,
        issues,
    })
}

/// Checks every device against `catalog`.
pub fn check_profile(catalog: &CompiledCatalog, devices: &[DeviceConfig]) -> CheckReport {
    let mut matcher = PresenceMatcher::new(catalog);
    for device in devices {
        matcher.check_device(&device.name, &device.lines);
    }
    matcher.finish()
}

/// Plans remediation commands for every device of a presence matrix.
pub fn remediate_profile(matrix: &PresenceMatrix, rules: &RemediationRules, vars: &VariableTable) -> RemediationPlan {
    compose(matrix, rules, vars)
}

/// Signatures of a single file, as learning (`normalizer` given) or checking
/// would see them. Learning-style output keeps excluded blocks.
pub fn file_signatures(normalizer: Option<&Normalizer>, device: &DeviceConfig) -> ParsedFile {
    let parser = match normalizer {
        Some(n) => ConfigParser::template(n),
        None => ConfigParser::checking(),
    };
    parser.parse(&device.name, &device.lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Presence;
    use crate::profiles::CatalogFile;

    #[test]
    fn test_learn_requires_template() {
        let n = Normalizer::with_default_rules().unwrap();
        let err = learn_profile(&n, "P9", None, &[]).unwrap_err();
        assert_eq!(err, AuditIssue::UnknownProfileTemplate { profile: "P9".to_string() });
    }

    #[test]
    fn test_learn_check_remediate_flow() {
        let n = Normalizer::with_default_rules().unwrap();
        let template = DeviceConfig::from_text("tpl", "service timestamps log datetime\nntp server 10.0.0.1\n");
        let devices = vec![
            DeviceConfig::from_text("pe_1", "service timestamps log datetime\nntp server 10.0.0.1\n"),
            DeviceConfig::from_text("pe_2", "service timestamps log datetime\n"),
        ];

        let learned = learn_profile(&n, "P1", Some(&template), &devices).unwrap();
        let counts: Vec<usize> = learned.entries.iter().map(|e| e.occurrence_count).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(learned.devices_observed, 2);

        let mut file = CatalogFile::from_learned("P1", &learned.entries);
        file.entries[1].add = Some("ntp server $(ntp)".to_string());
        let report = check_profile(&file.compile(), &devices);
        assert_eq!(report.matrix.get("pe_2", "ntp server 10.0.0.1$"), Some(Presence::Absent));

        let mut vars = VariableTable::new();
        vars.insert("pe_2", "ntp", "10.0.0.1");
        let plan = remediate_profile(&report.matrix, &file.remediation_rules(), &vars);
        assert_eq!(plan.commands_for("pe_1"), Some(&[][..]));
        assert_eq!(plan.commands_for("pe_2"), Some(&["ntp server 10.0.0.1".to_string()][..]));
    }
}
