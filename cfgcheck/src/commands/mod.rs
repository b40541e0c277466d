//! Subcommand implementations plus the plumbing they share: building a
//! normalizer from rule arguments, compiling name filters, locating catalog
//! files and writing JSON.

pub mod check;
pub mod learn;
pub mod remediate;
pub mod signatures;

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cfgcheck_core::config::{merge_rules, validate_rules, NormalizerConfig};
use cfgcheck_core::{load_catalog_by_name, AuditIssue, CatalogFile, Inventory, Normalizer};

use crate::cli::{InventoryArgs, JsonArgs, RuleArgs};
use crate::ui::output_format::warn_msg;
use crate::ui::theme::ThemeMap;

/// Defaults, merged with the user rules file, filtered by enable/disable.
pub fn build_normalizer(args: &RuleArgs) -> Result<Normalizer> {
    let defaults = NormalizerConfig::load_default_rules()?;
    let user = args
        .rules
        .as_ref()
        .map(NormalizerConfig::load_from_file)
        .transpose()?;
    let mut config = merge_rules(defaults, user);
    config.set_active_rules(&args.enable, &args.disable);
    validate_rules(&config)?;
    Normalizer::new(&config)
}

pub fn compile_filter(pattern: &str, what: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid {} filter '{}'", what, pattern))
}

/// Inventory plus compiled filters, as every inventory-driven command needs.
pub struct Selection {
    pub inventory: Inventory,
    pub profile_filter: Regex,
    pub device_filter: Regex,
    pub catalog_dir: Option<PathBuf>,
}

impl Selection {
    pub fn from_args(args: &InventoryArgs) -> Result<Self> {
        Ok(Self {
            inventory: Inventory::load_from_file(&args.inventory)?,
            profile_filter: compile_filter(&args.profile_filter, "profile")?,
            device_filter: compile_filter(&args.device_filter, "device")?,
            catalog_dir: args.catalog_dir.clone(),
        })
    }

    pub fn profiles(&self) -> Vec<String> {
        self.inventory
            .select_profiles(&self.profile_filter)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    pub fn catalog_path(&self, profile: &str) -> PathBuf {
        match &self.catalog_dir {
            Some(dir) => dir.join(format!("{}.yaml", profile)),
            None => self.inventory.catalog_path(profile),
        }
    }

    /// Loads a profile's catalog from its path, falling back to the profile
    /// directories searched by name.
    pub fn load_catalog(&self, profile: &str) -> Result<CatalogFile> {
        let path = self.catalog_path(profile);
        if path.is_file() {
            return CatalogFile::load_from_file(&path);
        }
        debug!("No catalog at {}; searching profile directories", path.display());
        load_catalog_by_name(profile)
    }
}

/// Serializes `value` to the JSON file or stdout requested, if any.
/// Returns true when stdout was used.
pub fn write_json<T: Serialize>(args: &JsonArgs, value: &T) -> Result<bool> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize results to JSON")?;
    if let Some(path) = &args.json_file {
        write_file(path, &json)?;
        return Ok(false);
    }
    if args.json_stdout {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        writeln!(writer, "{}", json)?;
        return Ok(true);
    }
    Ok(false)
}

pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Prints each issue as a warning unless quiet.
pub fn report_issues(issues: &[AuditIssue], quiet: bool, theme_map: &ThemeMap) {
    if quiet {
        return;
    }
    for issue in issues {
        warn_msg(issue.to_string(), theme_map);
    }
}
