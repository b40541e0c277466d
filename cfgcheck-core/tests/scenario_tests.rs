// cfgcheck-core/tests/scenario_tests.rs
use cfgcheck_core::{
    check_profile, learn_profile, remediate_profile, AuditIssue, CatalogFile, CompiledCatalog, DeviceConfig,
    Normalizer, Presence, PresenceMatrix, RemediationRules, VariableTable,
};
use std::collections::HashMap;
use test_log::test;

fn device(name: &str, text: &str) -> DeviceConfig {
    DeviceConfig::from_text(name, text)
}

#[test]
fn learning_counts_rewritten_signature_across_files() {
    let normalizer = Normalizer::with_default_rules().unwrap();
    let template = device("tpl", "ntp authentication-key 10 md5xyz\n");
    let devices = vec![
        device("pe_1", "ntp authentication-key 10 md5abc\n"),
        device("pe_2", "ntp authentication-key 10 md5abc\n"),
    ];

    let outcome = learn_profile(&normalizer, "P1", Some(&template), &devices).unwrap();
    assert_eq!(outcome.entries.len(), 1);
    assert_eq!(outcome.entries[0].pattern, "ntp authentication-key 10 md5");
    assert_eq!(outcome.entries[0].occurrence_count, 2);
    assert!(outcome.unmatched.is_empty());
}

#[test]
fn learning_skips_excluded_blocks_but_template_keeps_them() {
    let normalizer = Normalizer::with_default_rules().unwrap();
    let text = "interface Gi0/1\n description core\nlogging buffered 64000\n";
    let template = device("tpl", text);
    let devices = vec![device("pe_1", text)];

    let outcome = learn_profile(&normalizer, "P1", Some(&template), &devices).unwrap();
    let pairs: Vec<(&str, usize)> = outcome
        .entries
        .iter()
        .map(|e| (e.pattern.as_str(), e.occurrence_count))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("interface Gi0/1$", 0),
            ("interface Gi0/1@@@description core$", 0),
            ("logging buffered 64000$", 1),
        ]
    );
}

#[test]
fn learning_reports_signatures_missing_from_template() {
    let normalizer = Normalizer::with_default_rules().unwrap();
    let template = device("tpl", "logging buffered 64000\n");
    let devices = vec![device("pe_1", "snmp-server location lab\nlogging buffered 64000\nip domain name lab\n")];

    let outcome = learn_profile(&normalizer, "P1", Some(&template), &devices).unwrap();
    let unmatched: Vec<&str> = outcome.unmatched.iter().map(|e| e.pattern.as_str()).collect();
    assert_eq!(unmatched, vec!["snmp-server location lab$", "ip domain name lab$"]);
}

#[test]
fn checking_finds_nested_address() {
    let devices = vec![device("pe_1", "interface Gi0/1\n  ip address 10.0.0.1 255.255.255.0\n")];
    let catalog = CompiledCatalog::compile("P1", ["interface Gi0/1@@@ip address .*$"]);
    assert_eq!(catalog.patterns[0].depth, 1);

    let report = check_profile(&catalog, &devices);
    assert_eq!(report.matrix.get("pe_1", "interface Gi0/1@@@ip address .*$"), Some(Presence::Present));
    assert_eq!(report.totals[0].to_string(), "1 / 1");
    assert!(report.totals[0].universal);
}

#[test]
fn universal_pattern_over_many_devices() {
    let devices: Vec<DeviceConfig> = (0..5)
        .map(|i| device(&format!("pe_{i}"), "service password-encryption\nlogging buffered 64000\n"))
        .collect();
    let catalog = CompiledCatalog::compile("P1", ["service password-encryption$", "ip ssh version 2$"]);
    let report = check_profile(&catalog, &devices);

    assert_eq!(report.device_count, 5);
    assert_eq!(report.totals[0].to_string(), "5 / 5");
    assert!(report.totals[0].universal);
    assert_eq!(report.totals[1].to_string(), "0 / 5");
    assert!(!report.totals[1].universal);
}

#[test]
fn global_pattern_never_matches_nested_line() {
    let devices = vec![device("pe_1", "line vty 0 4\n password 7 0822455D0A16\n")];
    let catalog = CompiledCatalog::compile("P1", ["password 7", "line vty 0 4@@@password 7"]);
    let report = check_profile(&catalog, &devices);
    let row = report.matrix.row("pe_1").unwrap();
    assert_eq!(row, &[Presence::Absent, Presence::Present]);
}

#[test]
fn wildcard_placeholder_matches_space() {
    let devices = vec![device("pe_1", "aaa authentication login default group tacacs+ local\n")];
    let catalog = CompiledCatalog::compile("P1", ["aaa authentication login default group tacacs\\+***local$"]);
    let report = check_profile(&catalog, &devices);
    assert_eq!(report.totals[0].matched, 1);
}

#[test]
fn remediation_fills_and_closes_block() {
    let matrix = PresenceMatrix {
        patterns: vec!["ntp server .*$".to_string()],
        devices: vec!["pe_1".to_string()],
        cells: vec![vec![Presence::Absent]],
    };
    let mut add = HashMap::new();
    add.insert("ntp server .*$".to_string(), "ntp server $(ntp_ip)\nupdate-calendar".to_string());
    let rules = RemediationRules::build("P1", add, HashMap::new());
    let mut vars = VariableTable::new();
    vars.insert("pe_1", "ntp_ip", "10.0.0.9");

    let plan = remediate_profile(&matrix, &rules, &vars);
    assert_eq!(
        plan.commands_for("pe_1").unwrap(),
        &["ntp server 10.0.0.9", "update-calendar", "exit"]
    );
    assert!(plan.issues.is_empty());
}

#[test]
fn remediation_change_rule_applies_to_present_cells() {
    let catalog_yaml = r#"
profile: P1
entries:
  - pattern: "ip http server$"
    change: "no ip http server"
  - pattern: "interface Loopback0@@@ip address .*$"
    add: "interface Loopback0@@@ip address $(lo0) + 1 255.255.255.255$"
"#;
    let file: CatalogFile = serde_yml::from_str(catalog_yaml).unwrap();
    let devices = vec![device("pe_1", "ip http server\ninterface Loopback0\n description mgmt\n")];
    let report = check_profile(&file.compile(), &devices);

    let mut vars = VariableTable::new();
    vars.insert("pe_1", "lo0", "192.0.2.1");
    let plan = remediate_profile(&report.matrix, &file.remediation_rules(), &vars);
    assert_eq!(
        plan.commands_for("pe_1").unwrap(),
        &[
            "no ip http server",
            "interface Loopback0",
            "ip address 192.0.2.2 255.255.255.255",
            "exit"
        ]
    );
}

#[test]
fn fill_round_trip_and_arithmetic() {
    let mut vars = VariableTable::new();
    vars.insert("pe_1", "ip", "10.10.0.3");

    for dev in ["pe_1", "absent"] {
        assert_eq!(vars.fill(dev, "p", "logging buffered 64000").unwrap().text, "logging buffered 64000");
    }
    assert_eq!(vars.fill("pe_1", "p", "$(ip) + 1").unwrap().text, "10.10.0.4");

    let overflow = {
        let mut v = VariableTable::new();
        v.insert("pe_1", "top", "255.255.255.255");
        v.fill("pe_1", "p", "$(top) + 1").unwrap()
    };
    assert_eq!(overflow.text, "255.255.255.255 + 1");
    assert!(matches!(overflow.issues.as_slice(), [AuditIssue::AddressOverflow { .. }]));
}

#[test]
fn missing_template_skips_profile() {
    let normalizer = Normalizer::with_default_rules().unwrap();
    let result = learn_profile(&normalizer, "P2", None, &[device("pe_1", "ntp server 1.1.1.1\n")]);
    assert!(matches!(result, Err(AuditIssue::UnknownProfileTemplate { profile }) if profile == "P2"));
}

#[test]
fn learned_catalog_matches_the_devices_it_came_from() {
    let normalizer = Normalizer::with_default_rules().unwrap();
    let text = "\
aaa authentication login default group tacacs+ local
banner exec (authorised use only)
enable secret 5 $1$abc
license udi pid CISCO2901/K9 sn FTX1234
line vty 0 4
 exec-timeout 5 0
 transport input ssh telnet?
";
    let template = device("tpl", text);
    let devices = vec![device("pe_1", text)];

    let outcome = learn_profile(&normalizer, "P1", Some(&template), &devices).unwrap();
    let catalog = CatalogFile::from_learned("P1", &outcome.entries).compile();
    assert_eq!(catalog.len(), 7);
    assert!(catalog.issues.is_empty());

    let report = check_profile(&catalog, &devices);
    for pattern in &report.matrix.patterns {
        assert_eq!(report.matrix.get("pe_1", pattern), Some(Presence::Present), "{pattern}");
    }
    assert!(report.totals.iter().all(|t| t.universal));
}
