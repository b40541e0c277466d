// File: cfgcheck-core/src/profiles.rs

//! profiles.rs - Inventory, device files and catalog files.
//!
//! An inventory (`inventory.yaml`) names the profiles of a network: for each
//! profile, the reference template and the devices that belong to it. A
//! catalog file (`<profile>.yaml`) holds the ordered patterns a profile is
//! checked against, with their learned counts and optional remediation
//! blocks. Learning writes catalog files; checking and remediation read them.
//!
//! license: MIT OR Apache-2.0

use anyhow::{Context, Result};
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::{CatalogEntry, CompiledCatalog, PatternSyntax};
use crate::errors::{AuditIssue, CfgCheckError};
use crate::remediation::RemediationRules;

/// One device of a profile. `path` defaults to `<name>.txt`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DeviceSpec {
    pub fn resolved_path(&self, root: &Path) -> PathBuf {
        match &self.path {
            Some(path) => root.join(path),
            None => root.join(format!("{}.txt", self.name)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProfileSpec {
    /// Reference configuration used to order learned signatures.
    pub template: Option<PathBuf>,
    /// Catalog file; defaults to `<profile>.yaml` next to the inventory.
    pub catalog: Option<PathBuf>,
    pub devices: Vec<DeviceSpec>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Inventory {
    /// Directory device and template paths are relative to.
    pub config_root: PathBuf,
    pub profiles: BTreeMap<String, ProfileSpec>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl Inventory {
    /// Loads an inventory; a relative `config_root` is taken relative to the
    /// inventory file's directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory file: {}", path.display()))?;
        let mut inventory: Inventory = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse inventory file: {}", path.display()))?;
        inventory.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("Loaded inventory {} with {} profiles", path.display(), inventory.profiles.len());
        Ok(inventory)
    }

    pub fn root(&self) -> PathBuf {
        self.base_dir.join(&self.config_root)
    }

    /// Profiles whose name matches `filter`, in name order.
    pub fn select_profiles<'a>(&'a self, filter: &'a Regex) -> impl Iterator<Item = (&'a str, &'a ProfileSpec)> + 'a {
        self.profiles
            .iter()
            .filter(move |(name, _)| filter.is_match(name))
            .map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn template_path(&self, profile: &str) -> Option<PathBuf> {
        let spec = self.profiles.get(profile)?;
        spec.template.as_ref().map(|t| self.root().join(t))
    }

    pub fn catalog_path(&self, profile: &str) -> PathBuf {
        match self.profiles.get(profile).and_then(|s| s.catalog.as_ref()) {
            Some(path) => self.base_dir.join(path),
            None => self.base_dir.join(format!("{}.yaml", profile)),
        }
    }

    /// Devices of `profile` matching `filter`, first occurrence of each name
    /// only, with their resolved paths.
    pub fn select_devices(&self, profile: &str, filter: &Regex) -> (Vec<(String, PathBuf)>, Vec<AuditIssue>) {
        let mut selected = Vec::new();
        let mut issues = Vec::new();
        let Some(spec) = self.profiles.get(profile) else {
            return (selected, issues);
        };
        let root = self.root();
        let mut seen = HashSet::new();
        for device in &spec.devices {
            if !seen.insert(device.name.as_str()) {
                issues.push(
                    AuditIssue::DuplicateDevice {
                        profile: profile.to_string(),
                        device: device.name.clone(),
                    }
                    .reported(),
                );
                continue;
            }
            if filter.is_match(&device.name) {
                selected.push((device.name.clone(), device.resolved_path(&root)));
            }
        }
        (selected, issues)
    }

    /// Loads the selected devices of a profile, skipping unreadable files.
    pub fn load_devices(&self, profile: &str, filter: &Regex) -> (Vec<DeviceConfig>, Vec<AuditIssue>) {
        let (selected, issues) = self.select_devices(profile, filter);
        let devices = selected
            .into_iter()
            .filter_map(|(name, path)| match DeviceConfig::load(&name, &path) {
                Ok(device) => Some(device),
                Err(e) => {
                    warn!("Profile '{}': skipping device '{}': {:#}", profile, name, e);
                    None
                }
            })
            .collect();
        (devices, issues)
    }
}

/// The raw lines of one device configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    pub lines: Vec<String>,
}

impl DeviceConfig {
    pub fn from_text(name: &str, text: &str) -> Self {
        Self { name: name.to_string(), lines: text.lines().map(String::from).collect() }
    }

    /// Reads a configuration file; invalid UTF-8 is replaced, not rejected.
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading device file {}", path.display()))?;
        Ok(Self::from_text(name, &String::from_utf8_lossy(&bytes)))
    }
}

/// One row of a catalog file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CatalogFileEntry {
    pub pattern: String,
    /// Unset means inferred from the pattern text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syntax: Option<PatternSyntax>,
    #[serde(default)]
    pub count: usize,
    /// Block applied where the pattern is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<String>,
    /// Block applied where the pattern is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct CatalogFile {
    pub profile: String,
    #[serde(default)]
    pub entries: Vec<CatalogFileEntry>,
}

impl CatalogFile {
    pub fn from_learned(profile: &str, entries: &[CatalogEntry]) -> Self {
        Self {
            profile: profile.to_string(),
            entries: entries
                .iter()
                .map(|e| CatalogFileEntry {
                    pattern: e.pattern.clone(),
                    syntax: Some(PatternSyntax::Literal),
                    count: e.occurrence_count,
                    ..Default::default()
                })
                .collect(),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
        let catalog: CatalogFile = serde_yml::from_str(&text)
            .map_err(|e| CfgCheckError::InvalidCatalog(path.display().to_string(), e.to_string()))?;
        debug!("Loaded catalog '{}' ({} entries) from {}", catalog.profile, catalog.entries.len(), path.display());
        Ok(catalog)
    }

    /// Writes the catalog as YAML, creating parent directories.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yml::to_string(self)
            .map_err(|e| CfgCheckError::SerializationError(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, yaml).with_context(|| format!("Failed to write catalog file: {}", path.display()))?;
        Ok(())
    }

    /// Carries remediation blocks, and any syntax chosen by hand, of
    /// `previous` over to matching patterns.
    pub fn carry_blocks_from(&mut self, previous: &CatalogFile) {
        for entry in &mut self.entries {
            if let Some(old) = previous.entries.iter().find(|o| o.pattern == entry.pattern) {
                entry.syntax = old.syntax.or(entry.syntax);
                entry.add = old.add.clone();
                entry.change = old.change.clone();
            }
        }
    }

    pub fn compile(&self) -> CompiledCatalog {
        CompiledCatalog::compile_entries(&self.profile, self.entries.iter().map(|e| (e.pattern.as_str(), e.syntax)))
    }

    pub fn remediation_rules(&self) -> RemediationRules {
        RemediationRules::from_rows(
            &self.profile,
            self.entries
                .iter()
                .map(|e| (e.pattern.clone(), e.add.clone(), e.change.clone())),
        )
    }
}

pub fn catalog_candidate_paths(name: &str) -> Vec<PathBuf> {
    let base_dirs = vec![
        dirs::home_dir().map(|p| p.join(".cfgcheck").join("profiles")),
        dirs::config_dir().map(|p| p.join("cfgcheck").join("profiles")),
        Some(PathBuf::from("/etc/cfgcheck/profiles")),
        Some(PathBuf::from("./config")),
        Some(PathBuf::from("../config")),
    ];

    base_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join(format!("{}.yaml", name)))
        .collect()
}

/// Loads a catalog from a path, or by profile name from the usual places.
pub fn load_catalog_by_name(name_or_path: &str) -> Result<CatalogFile> {
    let path = Path::new(name_or_path);
    let path_to_load = if path.is_file() {
        Some(path.to_path_buf())
    } else {
        catalog_candidate_paths(name_or_path).into_iter().find(|p| p.exists())
    }
    .with_context(|| format!("Catalog '{}' not found as a file or in the profile directories", name_or_path))?;
    CatalogFile::load_from_file(path_to_load)
}
