// cfgcheck-core/tests/config_integration_tests.rs
use anyhow::Result;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use test_log::test;

use cfgcheck_core::config::{self, NormalizerConfig, RuleAction};
use cfgcheck_core::{CatalogFile, Inventory, LineVerdict, Normalizer, VariableTable};

#[test]
fn test_load_default_rules() {
    let config = NormalizerConfig::load_default_rules().unwrap();
    assert!(config.rules.iter().any(|r| r.name == "enable_secret"));
    assert!(config.rules.iter().any(|r| r.action == RuleAction::Drop));
    assert!(!config.excluded_blocks.is_empty());
    config::validate_rules(&config).unwrap();
}

#[test]
fn test_user_rules_override_and_extend_defaults() -> Result<()> {
    let yaml_content = r#"
rules:
  - name: comment
    action: drop
    pattern: '^!!'
  - name: snmp_community
    action: redact
    pattern: '^snmp-server community'
    keep: '(snmp-server community)'
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let user = NormalizerConfig::load_from_file(file.path())?;
    let merged = config::merge_rules(NormalizerConfig::load_default_rules()?, Some(user));

    let normalizer = Normalizer::new(&merged)?;
    assert_eq!(
        normalizer.normalize("snmp-server community s3cret RO"),
        LineVerdict::Rewritten {
            line: "snmp-server community".to_string(),
            rule: "snmp_community".to_string()
        }
    );
    // single '!' is no longer dropped by the overridden rule
    assert!(!normalizer.normalize("! hello").is_dropped());
    assert!(normalizer.normalize("!! hello").is_dropped());
    Ok(())
}

#[test]
fn test_invalid_rules_file_is_rejected() -> Result<()> {
    let yaml_content = r#"
rules:
  - name: broken
    action: redact
    pattern: '(unclosed'
    replace_with: x
  - name: no_rewrite
    action: redact
    pattern: 'foo'
"#;
    let mut file = NamedTempFile::new()?;
    file.write_all(yaml_content.as_bytes())?;
    let err = NormalizerConfig::load_from_file(file.path()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("broken"));
    assert!(message.contains("no_rewrite"));
    Ok(())
}

#[test]
fn test_disable_rule_by_name() {
    let mut config = NormalizerConfig::load_default_rules().unwrap();
    config.set_active_rules(&[], &["enable_secret".to_string()]);
    let normalizer = Normalizer::new(&config).unwrap();
    assert_eq!(
        normalizer.normalize("enable secret 5 $1$abc"),
        LineVerdict::Unchanged("enable secret 5 $1$abc".to_string())
    );
}

#[test]
fn test_opt_in_default_rule_needs_enable() {
    let line = " description uplink to core-1";

    let mut config = NormalizerConfig::load_default_rules().unwrap();
    config.set_active_rules(&[], &[]);
    let normalizer = Normalizer::new(&config).unwrap();
    assert_eq!(normalizer.normalize(line), LineVerdict::Unchanged(line.to_string()));

    let mut config = NormalizerConfig::load_default_rules().unwrap();
    config.set_active_rules(&["interface_description".to_string()], &[]);
    let normalizer = Normalizer::new(&config).unwrap();
    assert!(normalizer.normalize(line).is_dropped());
}

#[test]
fn test_inventory_and_devices_from_disk() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("configs"))?;
    fs::write(dir.path().join("configs/pe_1.txt"), "hostname pe_1\nntp server 1.1.1.1\n")?;
    fs::write(
        dir.path().join("inventory.yaml"),
        "config_root: configs\nprofiles:\n  P1:\n    template: pe_1.txt\n    devices:\n      - name: pe_1\n      - name: pe_missing\n",
    )?;

    let inventory = Inventory::load_from_file(dir.path().join("inventory.yaml"))?;
    let all = regex::Regex::new(".*")?;
    let (devices, issues) = inventory.load_devices("P1", &all);
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].lines, vec!["hostname pe_1", "ntp server 1.1.1.1"]);
    assert!(issues.is_empty());
    assert_eq!(inventory.catalog_path("P1"), dir.path().join("P1.yaml"));
    Ok(())
}

#[test]
fn test_catalog_file_save_and_load() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("P1.yaml");
    let file: CatalogFile = serde_yml::from_str("profile: P1\nentries:\n  - pattern: 'a$'\n    count: 2\n    add: 'a'\n")?;
    file.save_to_file(&path)?;
    let loaded = CatalogFile::load_from_file(&path)?;
    assert_eq!(loaded, file);
    Ok(())
}

#[test]
fn test_malformed_catalog_names_the_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"profile: [unterminated\n")?;
    let err = CatalogFile::load_from_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid catalog"));
    Ok(())
}

#[test]
fn test_variables_file_accepts_numbers() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(b"pe_1:\n  ntp_ip: 10.0.0.9\n  vlan: 100\n")?;
    let vars = VariableTable::load_from_file(file.path())?;
    assert_eq!(vars.get("pe_1", "ntp_ip"), Some("10.0.0.9"));
    assert_eq!(vars.get("pe_1", "vlan"), Some("100"));
    assert!(!vars.contains_device("pe_2"));
    Ok(())
}
