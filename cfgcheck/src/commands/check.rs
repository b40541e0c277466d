//! `check`: presence matrix of every selected profile.

use anyhow::Result;
use is_terminal::IsTerminal;
use log::{info, warn};
use std::io::{self, Write};

use cfgcheck_core::{check_profile, CheckReport};

use crate::cli::CheckCommand;
use crate::commands::{report_issues, write_json, Selection};
use crate::ui::output_format::{info_msg, styled};
use crate::ui::tables::presence_table;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Checks every selected profile whose catalog can be loaded.
pub fn collect_reports(selection: &Selection, quiet: bool, theme_map: &ThemeMap) -> Vec<CheckReport> {
    let mut reports = Vec::new();
    for profile in selection.profiles() {
        let catalog = match selection.load_catalog(&profile) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Profile '{}' skipped: {:#}", profile, e);
                continue;
            }
        };
        let (devices, issues) = selection.inventory.load_devices(&profile, &selection.device_filter);
        let mut report = check_profile(&catalog.compile(), &devices);
        report.issues.extend(issues);
        report_issues(&report.issues, quiet, theme_map);
        reports.push(report);
    }
    reports
}

/// Returns whether every cell of every report is present.
pub fn run_check(cmd: &CheckCommand, quiet: bool, theme_map: &ThemeMap) -> Result<bool> {
    info!("Starting check operation.");
    let selection = Selection::from_args(&cmd.inventory)?;
    let reports = collect_reports(&selection, quiet, theme_map);
    let compliant = reports.iter().all(|r| r.totals.iter().all(|t| t.universal));

    if !write_json(&cmd.json, &reports)? && !quiet {
        let stdout = io::stdout();
        let colors = stdout.is_terminal();
        let mut writer = stdout.lock();
        for report in &reports {
            let title = format!(
                "Profile {} ({} devices, {} patterns)",
                report.profile,
                report.device_count,
                report.matrix.patterns.len()
            );
            writeln!(writer, "{}", styled(&title, ThemeEntry::Header, theme_map, colors))?;
            writeln!(writer, "{}", presence_table(report, theme_map, colors))?;
        }
        if reports.is_empty() {
            info_msg("No profile was checked.", theme_map);
        }
    }

    Ok(compliant)
}
