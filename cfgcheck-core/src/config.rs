//! Configuration management for `cfgcheck-core`.
//!
//! This module defines the data structures for line rules: the drop and
//! redact rules applied by the normalizer, the variable-tail classes used by
//! the signature builder and the block prefixes excluded while learning.
//! It handles YAML (de)serialization and provides utilities for loading,
//! merging and validating these configs.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use log::{debug, info, warn};
use regex::Regex;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// What the normalizer does with a line matched by a rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// The line never takes part in a check.
    Drop,
    /// The line is truncated to a stable prefix.
    #[default]
    Redact,
}

/// A single normalizer rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(default)]
pub struct LineRule {
    /// Unique identifier for the rule (e.g., "enable_secret").
    pub name: String,
    /// Human-readable description of what the rule targets.
    pub description: Option<String>,
    pub action: RuleAction,
    /// Detection regex, searched against the raw line.
    pub pattern: String,
    /// For redact rules: regex whose first capture group is the stable prefix.
    pub keep: Option<String>,
    /// For redact rules: fixed text replacing the whole line.
    pub replace_with: Option<String>,
    /// Explicit override for enabling/disabling the rule.
    pub enabled: Option<bool>,
    /// If true, the rule is skipped unless enabled by name or by
    /// `enabled: true`.
    pub opt_in: bool,
}

impl Default for LineRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            action: RuleAction::Redact,
            pattern: String::new(),
            keep: None,
            replace_with: None,
            enabled: None,
            opt_in: false,
        }
    }
}

/// The top-level line-rule configuration.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Drop and redact rules, in priority order within each action.
    pub rules: Vec<LineRule>,
    /// Regexes of lines whose signature is matched as a prefix (no end anchor).
    pub variable_tail: Vec<String>,
    /// Signature prefixes skipped while learning from sample devices.
    pub excluded_blocks: Vec<String>,
}

impl NormalizerConfig {
    /// Loads line rules from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom line rules from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        let config: NormalizerConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse rules file {}", path.display()))?;

        validate_rules(&config)?;
        info!("Loaded {} rules from file {}.", config.rules.len(), path.display());

        Ok(config)
    }

    /// Loads the built-in line rules from the embedded configuration.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let config: NormalizerConfig = serde_yml::from_str(default_yaml)
            .context("Failed to parse default rules")?;

        debug!("Loaded {} default rules.", config.rules.len());
        Ok(config)
    }

    /// Filters active rules based on enable/disable lists provided via CLI.
    pub fn set_active_rules(&mut self, enable_rules: &[String], disable_rules: &[String]) {
        let enable_set: HashSet<&str> = enable_rules.iter().map(String::as_str).collect();
        let disable_set: HashSet<&str> = disable_rules.iter().map(String::as_str).collect();

        debug!("Initial rules count before filtering: {}", self.rules.len());

        let all_rule_names: HashSet<&str> = self.rules.iter().map(|r| r.name.as_str()).collect();

        for rule_name in enable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `enable_rules` list does not exist.", rule_name);
        }

        for rule_name in disable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `disable_rules` list does not exist.", rule_name);
        }

        self.rules.retain_mut(|rule| {
            let rule_name_str = rule.name.as_str();
            if disable_set.contains(rule_name_str) || rule.enabled == Some(false) {
                return false;
            }
            if enable_set.contains(rule_name_str) {
                rule.enabled = Some(true);
                return true;
            }
            !rule.opt_in
        });

        debug!("Final active rules count after filtering: {}", self.rules.len());
    }
}

/// Merges user-defined rules with the defaults.
///
/// User rules replace default rules of the same name in place; new user
/// rules are appended, keeping the relative order of each file. Non-empty
/// user `variable_tail` and `excluded_blocks` lists replace the defaults.
pub fn merge_rules(
    default_config: NormalizerConfig,
    user_config: Option<NormalizerConfig>,
) -> NormalizerConfig {
    debug!("merge_rules called. Initial default rules count: {}", default_config.rules.len());

    let Some(user_cfg) = user_config else {
        return default_config;
    };
    debug!("User config provided. Merging {} user rules.", user_cfg.rules.len());

    let mut final_rules = default_config.rules;
    let positions: HashMap<String, usize> = final_rules
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.name.clone(), i))
        .collect();

    for user_rule in user_cfg.rules {
        match positions.get(&user_rule.name) {
            Some(&i) => {
                debug!("Overriding default rule '{}'.", user_rule.name);
                final_rules[i] = user_rule;
            }
            None => final_rules.push(user_rule),
        }
    }

    let variable_tail = if user_cfg.variable_tail.is_empty() {
        default_config.variable_tail
    } else {
        user_cfg.variable_tail
    };
    let excluded_blocks = if user_cfg.excluded_blocks.is_empty() {
        default_config.excluded_blocks
    } else {
        user_cfg.excluded_blocks
    };

    debug!("Final total rules after merge: {}", final_rules.len());
    NormalizerConfig {
        rules: final_rules,
        variable_tail,
        excluded_blocks,
    }
}

/// Validates rule integrity (names, regex compilation, capture groups).
pub fn validate_rules(config: &NormalizerConfig) -> Result<()> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in &config.rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        if rule.pattern.is_empty() {
            errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
            continue;
        }
        if let Err(e) = Regex::new(&rule.pattern) {
            errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
            continue;
        }

        if rule.action == RuleAction::Redact {
            match (&rule.keep, &rule.replace_with) {
                (None, None) => errors.push(format!(
                    "Rule '{}' redacts but defines neither `keep` nor `replace_with`.",
                    rule.name
                )),
                (Some(keep), _) => match Regex::new(keep) {
                    Ok(re) if re.captures_len() < 2 => errors.push(format!(
                        "Rule '{}': `keep` pattern has no capture group.",
                        rule.name
                    )),
                    Ok(_) => {}
                    Err(e) => errors.push(format!(
                        "Rule '{}' has an invalid `keep` pattern: {}",
                        rule.name, e
                    )),
                },
                (None, Some(_)) => {}
            }
        }
    }

    for tail in &config.variable_tail {
        if let Err(e) = Regex::new(tail) {
            errors.push(format!("Invalid variable_tail pattern '{}': {}", tail, e));
        }
    }

    if !errors.is_empty() {
        let full_error_message = format!("Rule validation failed:\n{}", errors.join("\n"));
        Err(anyhow!(full_error_message))
    } else {
        Ok(())
    }
}
