//! Turns a presence matrix into per-device command lists.

use log::{debug, info};

use super::variables::VariableTable;
use super::{DeviceCommands, RemediationPlan, RemediationRules, RuleKind};
use crate::matcher::{Presence, PresenceMatrix};
use crate::signature::{END_ANCHOR, SEPARATOR};

/// Command that leaves one level of configuration mode.
pub const CONTEXT_EXIT: &str = "exit";

/// Puts every command of an unfilled block on its own line and drops the
/// end anchor a line may carry over from its pattern.
///
/// Runs before variable substitution so that a `$` supplied by a variable
/// value is never mistaken for an anchor.
pub fn strip_end_anchors(block: &str) -> String {
    block
        .replace(SEPARATOR, "\n")
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_suffix(END_ANCHOR).unwrap_or(line).trim_end()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits a filled block into commands. A block of `n` commands is
/// followed by `n - 1` exits.
pub fn block_commands(filled: &str) -> Vec<String> {
    let mut commands: Vec<String> = filled
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let exits = commands.len().saturating_sub(1);
    commands.extend(std::iter::repeat_n(CONTEXT_EXIT.to_string(), exits));
    commands
}

/// Selects, fills and expands the remediation blocks of every matrix cell.
pub fn compose(matrix: &PresenceMatrix, rules: &RemediationRules, vars: &VariableTable) -> RemediationPlan {
    let mut plan = RemediationPlan {
        profile: rules.profile.clone(),
        devices: Vec::with_capacity(matrix.device_count()),
        issues: rules.issues.clone(),
    };

    for (device, row) in matrix.devices.iter().zip(&matrix.cells) {
        let mut commands = Vec::new();
        for (pattern, presence) in matrix.patterns.iter().zip(row) {
            let kind = match presence {
                Presence::Absent => RuleKind::Add,
                Presence::Present => RuleKind::Change,
            };
            let Some(block) = rules.get(kind, pattern) else {
                continue;
            };
            match vars.fill(device, pattern, &strip_end_anchors(block)) {
                Ok(filled) => {
                    debug!("{}: {:?} block for '{}'", device, kind, pattern);
                    plan.issues.extend(filled.issues);
                    commands.extend(block_commands(&filled.text));
                }
                Err(issue) => plan.issues.push(issue),
            }
        }
        plan.devices.push(DeviceCommands { device: device.clone(), commands });
    }

    info!(
        "Profile '{}': {} commands planned for {} devices, {} issues",
        plan.profile,
        plan.total_commands(),
        plan.devices.len(),
        plan.issues.len()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_block_commands_adds_exits() {
        assert_eq!(block_commands(&strip_end_anchors("ntp server 1.1.1.1$")), vec!["ntp server 1.1.1.1"]);
        assert_eq!(
            block_commands(&strip_end_anchors("line vty 0 4@@@transport input ssh@@@exec-timeout 5 0$")),
            vec!["line vty 0 4", "transport input ssh", "exec-timeout 5 0", "exit", "exit"]
        );
        assert!(block_commands(&strip_end_anchors("  \n")).is_empty());
    }

    #[test]
    fn test_dollar_from_variable_value_survives() {
        let matrix = PresenceMatrix {
            patterns: vec!["username admin secret 0$".to_string()],
            devices: vec!["pe_1".to_string()],
            cells: vec![vec![Presence::Absent]],
        };
        let mut add = HashMap::new();
        add.insert(
            "username admin secret 0$".to_string(),
            "username admin secret 0 $(pw)\nline vty 0 4$".to_string(),
        );
        let rules = RemediationRules::build("P1", add, HashMap::new());
        let mut vars = VariableTable::new();
        vars.insert("pe_1", "pw", "Secr3t$");

        let plan = compose(&matrix, &rules, &vars);
        assert_eq!(
            plan.commands_for("pe_1").unwrap(),
            &["username admin secret 0 Secr3t$", "line vty 0 4", "exit"]
        );
        assert!(plan.issues.is_empty());
    }

    #[test]
    fn test_compose_selects_by_presence() {
        let matrix = PresenceMatrix {
            patterns: vec!["a$".to_string(), "b$".to_string()],
            devices: vec!["pe_1".to_string(), "pe_2".to_string()],
            cells: vec![
                vec![Presence::Absent, Presence::Present],
                vec![Presence::Present, Presence::Absent],
            ],
        };
        let mut add = HashMap::new();
        add.insert("a$".to_string(), "add a".to_string());
        add.insert("b$".to_string(), "add b $(x)".to_string());
        let mut change = HashMap::new();
        change.insert("b$".to_string(), "no b".to_string());
        // b$ conflicts and is ignored
        let rules = RemediationRules::build("P1", add, change);

        let plan = compose(&matrix, &rules, &VariableTable::new());
        assert_eq!(plan.commands_for("pe_1"), Some(&["add a".to_string()][..]));
        assert_eq!(plan.commands_for("pe_2"), Some(&[][..]));
        assert_eq!(plan.issues.len(), 1);
    }

    #[test]
    fn test_missing_variable_skips_only_that_block() {
        let matrix = PresenceMatrix {
            patterns: vec!["a$".to_string(), "b$".to_string()],
            devices: vec!["pe_1".to_string()],
            cells: vec![vec![Presence::Absent, Presence::Absent]],
        };
        let mut add = HashMap::new();
        add.insert("a$".to_string(), "logging host $(syslog)".to_string());
        add.insert("b$".to_string(), "service password-encryption".to_string());
        let rules = RemediationRules::build("P1", add, HashMap::new());

        let plan = compose(&matrix, &rules, &VariableTable::new());
        assert_eq!(plan.commands_for("pe_1"), Some(&["service password-encryption".to_string()][..]));
        assert_eq!(plan.issues.len(), 1);
    }
}
