//! compiler.rs - Manages the compilation and caching of line rules.
//!
//! This module provides a thread-safe, cached mechanism to convert a
//! `NormalizerConfig` into `CompiledRules`, ready to classify lines. It uses
//! a global, shared cache to avoid redundant compilation when the same rule
//! set is used for several profiles.
//!
//! License: MIT OR APACHE 2.0

use anyhow::Result;
use log::debug;
use regex::{Regex, RegexBuilder};
use lazy_static::lazy_static;
use std::sync::{Arc, RwLock};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

use crate::config::{NormalizerConfig, RuleAction, MAX_PATTERN_LENGTH};
use crate::errors::CfgCheckError;

/// How a compiled redact rule produces its stable prefix.
#[derive(Debug)]
pub enum Rewrite {
    /// Keep the first capture group of this regex.
    Keep(Regex),
    /// Replace the whole line with fixed text.
    Replace(String),
}

/// Represents a single compiled line rule.
#[derive(Debug)]
pub struct CompiledRule {
    /// The unique name of the rule.
    pub name: String,
    /// Detection regex.
    pub regex: Regex,
    /// `None` for drop rules.
    pub rewrite: Option<Rewrite>,
}

/// All compiled rules, split by action and kept in priority order.
#[derive(Debug)]
pub struct CompiledRules {
    pub drop: Vec<CompiledRule>,
    pub redact: Vec<CompiledRule>,
    pub variable_tail: Vec<Regex>,
    pub excluded_blocks: Vec<String>,
}

lazy_static! {
    /// A thread-safe, global cache for compiled rules.
    /// The key is a hash of the `NormalizerConfig`.
    static ref COMPILED_RULES_CACHE: RwLock<HashMap<u64, Arc<CompiledRules>>> = RwLock::new(HashMap::new());
}

/// Hashes the `NormalizerConfig` to create a stable key for the cache.
///
/// Rule order is part of the key: it decides priority.
fn hash_config(config: &NormalizerConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.rules.hash(&mut hasher);
    config.variable_tail.hash(&mut hasher);
    config.excluded_blocks.hash(&mut hasher);
    hasher.finish()
}

fn build_regex(name: &str, pattern: &str) -> Result<Regex, CfgCheckError> {
    if pattern.len() > MAX_PATTERN_LENGTH {
        return Err(CfgCheckError::PatternLengthExceeded(
            name.to_string(),
            pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }
    RegexBuilder::new(pattern)
        .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
        .build()
        .map_err(|e| CfgCheckError::RuleCompilationError(name.to_string(), e))
}

/// Compiles a `NormalizerConfig` into `CompiledRules`.
/// This is the low-level function that performs the actual regex compilation.
pub fn compile_rules(config: &NormalizerConfig) -> Result<CompiledRules, CfgCheckError> {
    debug!("Starting compilation of {} rules.", config.rules.len());

    let mut drop = Vec::new();
    let mut redact = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in &config.rules {
        if rule.enabled == Some(false) {
            debug!("Skipping disabled rule '{}'.", rule.name);
            continue;
        }
        if rule.opt_in && rule.enabled != Some(true) {
            debug!("Skipping opt-in rule '{}'.", rule.name);
            continue;
        }
        let regex = match build_regex(&rule.name, &rule.pattern) {
            Ok(regex) => regex,
            Err(e) => {
                compilation_errors.push(e);
                continue;
            }
        };

        match rule.action {
            RuleAction::Drop => {
                drop.push(CompiledRule { name: rule.name.clone(), regex, rewrite: None });
            }
            RuleAction::Redact => {
                let rewrite = match (&rule.keep, &rule.replace_with) {
                    (Some(keep), _) => match build_regex(&rule.name, keep) {
                        Ok(keep) => Rewrite::Keep(keep),
                        Err(e) => {
                            compilation_errors.push(e);
                            continue;
                        }
                    },
                    (None, Some(text)) => Rewrite::Replace(text.clone()),
                    (None, None) => {
                        compilation_errors.push(CfgCheckError::Fatal(format!(
                            "rule '{}' redacts but defines neither `keep` nor `replace_with`",
                            rule.name
                        )));
                        continue;
                    }
                };
                redact.push(CompiledRule { name: rule.name.clone(), regex, rewrite: Some(rewrite) });
            }
        }
        log::debug!(
            target: "cfgcheck_core::normalizer",
            "Rule '{}' compiled successfully.",
            &rule.name
        );
    }

    let mut variable_tail = Vec::new();
    for tail in &config.variable_tail {
        match build_regex("variable_tail", tail) {
            Ok(regex) => variable_tail.push(regex),
            Err(e) => compilation_errors.push(e),
        }
    }

    if !compilation_errors.is_empty() {
        // Collect errors into a single string for a concise error report
        let error_message = compilation_errors.iter()
            .map(|e| e.to_string())
            .collect::<Vec<String>>()
            .join("\n");
        Err(CfgCheckError::Fatal(format!("Failed to compile {} rule(s):\n{}", compilation_errors.len(), error_message)))
    } else {
        debug!(
            "Finished compiling rules. Drop: {}, redact: {}.",
            drop.len(),
            redact.len()
        );
        Ok(CompiledRules {
            drop,
            redact,
            variable_tail,
            excluded_blocks: config.excluded_blocks.clone(),
        })
    }
}

/// Gets a `CompiledRules` instance from the cache or compiles them if not found.
pub fn get_or_compile_rules(config: &NormalizerConfig) -> Result<Arc<CompiledRules>> {
    let cache_key = hash_config(config);

    {
        let cache = COMPILED_RULES_CACHE
            .read()
            .map_err(|_| CfgCheckError::Fatal("rule cache lock poisoned".to_string()))?;
        if let Some(rules) = cache.get(&cache_key) {
            debug!("Serving compiled rules from cache for key: {}", &cache_key);
            return Ok(Arc::clone(rules));
        }
    }

    debug!("Compiled rules not found in cache. Compiling now.");
    let compiled_arc = Arc::new(compile_rules(config)?);

    COMPILED_RULES_CACHE
        .write()
        .map_err(|_| CfgCheckError::Fatal("rule cache lock poisoned".to_string()))?
        .insert(cache_key, Arc::clone(&compiled_arc));

    debug!("Successfully compiled and cached rules for key: {}", &cache_key);
    Ok(compiled_arc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineRule;

    #[test]
    fn test_compile_splits_by_action() {
        let config = NormalizerConfig::load_default_rules().unwrap();
        let compiled = compile_rules(&config).unwrap();
        assert_eq!(compiled.drop.len(), 5);
        assert_eq!(compiled.redact.len(), 10);
        assert_eq!(compiled.variable_tail.len(), 3);
    }

    #[test]
    fn test_compile_reports_bad_regex() {
        let config = NormalizerConfig {
            rules: vec![LineRule {
                name: "broken".to_string(),
                pattern: "(unclosed".to_string(),
                replace_with: Some("x".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = compile_rules(&config).unwrap_err().to_string();
        assert!(err.contains("broken"));
    }

    #[test]
    fn test_cache_returns_same_instance() {
        let config = NormalizerConfig::load_default_rules().unwrap();
        let a = get_or_compile_rules(&config).unwrap();
        let b = get_or_compile_rules(&config).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
