//! Per-device variables and placeholder substitution for remediation blocks.
//!
//! A block references device variables as `$(name)`. After substitution any
//! `<dotted-quad> +|- <integer>` expression is evaluated as unsigned 32-bit
//! address arithmetic, so a block can say `$(loopback) + 1`.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;
use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::errors::{AuditIssue, CfgCheckError};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\(([^)]*)\)").unwrap_or_else(|e| panic!("invalid placeholder regex: {e}"))
});

static ADDRESS_ARITHMETIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+\.\d+\.\d+\.\d+)\s*([+-])\s*(\d+)\b")
        .unwrap_or_else(|e| panic!("invalid address arithmetic regex: {e}"))
});

/// Whether `block` references any device variable.
pub fn has_placeholders(block: &str) -> bool {
    PLACEHOLDER.is_match(block)
}

/// A filled block plus the non-fatal issues raised while filling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filled {
    pub text: String,
    pub issues: Vec<AuditIssue>,
}

/// device -> variable -> value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableTable {
    devices: BTreeMap<String, BTreeMap<String, String>>,
}

fn scalar_to_string(value: serde_yml::Value) -> Option<String> {
    match value {
        serde_yml::Value::String(s) => Some(s),
        serde_yml::Value::Number(n) => Some(n.to_string()),
        serde_yml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a YAML mapping of device names to variable mappings. Numeric and
    /// boolean values are kept in their textual form.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read variables file: {}", path.display()))?;
        let raw: BTreeMap<String, BTreeMap<String, serde_yml::Value>> = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse variables file: {}", path.display()))?;

        let mut table = Self::new();
        for (device, vars) in raw {
            for (name, value) in vars {
                let value = scalar_to_string(value).ok_or_else(|| {
                    CfgCheckError::Fatal(format!(
                        "variable '{}' of device '{}' in {} is not a scalar",
                        name,
                        device,
                        path.display()
                    ))
                })?;
                table.insert(&device, &name, value);
            }
        }
        debug!("Loaded variables for {} devices from {}", table.devices.len(), path.display());
        Ok(table)
    }

    pub fn insert(&mut self, device: &str, name: &str, value: impl Into<String>) {
        self.devices
            .entry(device.to_string())
            .or_default()
            .insert(name.to_string(), value.into());
    }

    pub fn get(&self, device: &str, name: &str) -> Option<&str> {
        self.devices.get(device)?.get(name).map(String::as_str)
    }

    pub fn contains_device(&self, device: &str) -> bool {
        self.devices.contains_key(device)
    }

    /// Substitutes the device's variables into `block`, then evaluates
    /// address arithmetic.
    ///
    /// A block without placeholders comes back unchanged. An unknown device
    /// or unresolved variable fails the whole block; arithmetic problems are
    /// reported and leave the expression as written.
    pub fn fill(&self, device: &str, pattern: &str, block: &str) -> Result<Filled, AuditIssue> {
        if !has_placeholders(block) {
            return Ok(Filled { text: block.to_string(), issues: Vec::new() });
        }

        let missing = |variable: &str| {
            AuditIssue::MissingVariable {
                device: device.to_string(),
                pattern: pattern.to_string(),
                variable: variable.to_string(),
            }
            .reported()
        };

        let vars = self.devices.get(device);
        if let Some(caps) = PLACEHOLDER
            .captures_iter(block)
            .find(|caps| vars.and_then(|v| v.get(&caps[1])).is_none())
        {
            return Err(missing(&caps[1]));
        }

        let substituted = PLACEHOLDER.replace_all(block, |caps: &Captures<'_>| {
            vars.and_then(|v| v.get(&caps[1])).cloned().unwrap_or_default()
        });

        let mut issues = Vec::new();
        let text = evaluate_address_arithmetic(&substituted, device, pattern, &mut issues);
        Ok(Filled { text, issues })
    }
}

enum ArithmeticFailure {
    InvalidOperand(String),
    Overflow,
}

fn evaluate(caps: &Captures<'_>) -> Result<Ipv4Addr, ArithmeticFailure> {
    let base: Ipv4Addr = caps[1]
        .parse()
        .map_err(|_| ArithmeticFailure::InvalidOperand(caps[1].to_string()))?;
    let offset: u32 = caps[3].parse().map_err(|_| ArithmeticFailure::Overflow)?;
    let base = u32::from(base);
    let result = match &caps[2] {
        "+" => base.checked_add(offset),
        _ => base.checked_sub(offset),
    };
    result.map(Ipv4Addr::from).ok_or(ArithmeticFailure::Overflow)
}

/// Replaces every well-formed, in-range address expression with its value.
pub fn evaluate_address_arithmetic(text: &str, device: &str, pattern: &str, issues: &mut Vec<AuditIssue>) -> String {
    ADDRESS_ARITHMETIC
        .replace_all(text, |caps: &Captures<'_>| match evaluate(caps) {
            Ok(address) => address.to_string(),
            Err(ArithmeticFailure::InvalidOperand(operand)) => {
                issues.push(
                    AuditIssue::InvalidAddressOperand {
                        device: device.to_string(),
                        pattern: pattern.to_string(),
                        operand,
                    }
                    .reported(),
                );
                caps[0].to_string()
            }
            Err(ArithmeticFailure::Overflow) => {
                issues.push(
                    AuditIssue::AddressOverflow {
                        device: device.to_string(),
                        pattern: pattern.to_string(),
                        expression: caps[0].to_string(),
                    }
                    .reported(),
                );
                caps[0].to_string()
            }
        })
        .into_owned()
}
