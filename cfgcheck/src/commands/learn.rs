//! `learn`: builds each selected profile's catalog from its devices.

use anyhow::Result;
use is_terminal::IsTerminal;
use log::{info, warn};
use std::io::{self, Write};

use cfgcheck_core::{learn_profile, CatalogFile, DeviceConfig, LearnOutcome};

use crate::cli::LearnCommand;
use crate::commands::{build_normalizer, report_issues, write_json, Selection};
use crate::ui::output_format::{info_msg, styled, success_msg};
use crate::ui::tables::catalog_table;
use crate::ui::theme::{ThemeEntry, ThemeMap};

pub fn run_learn(cmd: &LearnCommand, quiet: bool, theme_map: &ThemeMap) -> Result<()> {
    info!("Starting learn operation.");
    let normalizer = build_normalizer(&cmd.rules)?;
    let selection = Selection::from_args(&cmd.inventory)?;

    let mut outcomes: Vec<LearnOutcome> = Vec::new();
    for profile in selection.profiles() {
        let (devices, mut issues) = selection.inventory.load_devices(&profile, &selection.device_filter);

        let template = match selection.inventory.template_path(&profile) {
            Some(path) => match DeviceConfig::load(&path.display().to_string(), &path) {
                Ok(template) => Some(template),
                Err(e) => {
                    warn!("Profile '{}': template unreadable: {:#}", profile, e);
                    None
                }
            },
            None => None,
        };

        let mut outcome = match learn_profile(&normalizer, &profile, template.as_ref(), &devices) {
            Ok(outcome) => outcome,
            Err(issue) => {
                issues.push(issue);
                report_issues(&issues, quiet, theme_map);
                continue;
            }
        };
        issues.append(&mut outcome.issues);
        outcome.issues = issues;

        if !cmd.no_write {
            let path = selection.catalog_path(&profile);
            let mut file = CatalogFile::from_learned(&profile, &outcome.entries);
            if path.is_file() {
                match CatalogFile::load_from_file(&path) {
                    Ok(previous) => file.carry_blocks_from(&previous),
                    Err(e) => warn!("Existing catalog {} not reused: {:#}", path.display(), e),
                }
            }
            file.save_to_file(&path)?;
            if !quiet {
                success_msg(format!("Profile '{}': catalog written to {}", profile, path.display()), theme_map);
            }
        }

        report_issues(&outcome.issues, quiet, theme_map);
        outcomes.push(outcome);
    }

    if write_json(&cmd.json, &outcomes)? {
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    let stdout = io::stdout();
    let colors = stdout.is_terminal();
    let mut writer = stdout.lock();
    for outcome in &outcomes {
        let title = format!(
            "Profile {} ({} devices, {} template signatures)",
            outcome.profile,
            outcome.devices_observed,
            outcome.entries.len()
        );
        writeln!(writer, "{}", styled(&title, ThemeEntry::Header, theme_map, colors))?;
        writeln!(writer, "{}", catalog_table(&outcome.entries, theme_map, colors))?;
        if cmd.show_unmatched && !outcome.unmatched.is_empty() {
            writeln!(writer, "{}", styled("Not in template:", ThemeEntry::Header, theme_map, colors))?;
            writeln!(writer, "{}", catalog_table(&outcome.unmatched, theme_map, colors))?;
        }
    }
    if outcomes.is_empty() {
        info_msg("No profile was learned.", theme_map);
    }
    Ok(())
}
