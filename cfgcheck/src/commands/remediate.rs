//! `remediate`: per-device command lists from presence matrices.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::{self, Write};

use cfgcheck_core::{remediate_profile, CheckReport, RemediationPlan, VariableTable};

use crate::cli::RemediateCommand;
use crate::commands::check::collect_reports;
use crate::commands::{report_issues, write_file, write_json, Selection};
use crate::ui::output_format::{info_msg, success_msg};
use crate::ui::theme::ThemeMap;

fn load_reports(path: &std::path::Path) -> Result<Vec<CheckReport>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read matrix file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse matrix file {}", path.display()))
}

/// Renders a plan as a replayable command listing, one block per device.
pub fn render_plan(plan: &RemediationPlan) -> String {
    let mut out = String::new();
    for device in plan.devices.iter().filter(|d| !d.commands.is_empty()) {
        out.push_str(&format!("! {} ({})\n", device.device, plan.profile));
        for command in &device.commands {
            out.push_str(command);
            out.push('\n');
        }
    }
    out
}

pub fn run_remediate(cmd: &RemediateCommand, quiet: bool, theme_map: &ThemeMap) -> Result<()> {
    info!("Starting remediate operation.");
    let selection = Selection::from_args(&cmd.inventory)?;
    let vars = match &cmd.vars {
        Some(path) => VariableTable::load_from_file(path)?,
        None => VariableTable::new(),
    };

    let reports = match &cmd.matrix {
        Some(path) => {
            let profiles = selection.profiles();
            load_reports(path)?
                .into_iter()
                .filter(|r| profiles.contains(&r.profile))
                .collect()
        }
        None => collect_reports(&selection, quiet, theme_map),
    };

    let mut plans = Vec::new();
    for report in &reports {
        let catalog = match selection.load_catalog(&report.profile) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Profile '{}' skipped: {:#}", report.profile, e);
                continue;
            }
        };
        if catalog.compile().fingerprint() != report.catalog_fingerprint {
            warn!(
                "Profile '{}': catalog changed since the matrix was computed; rules are matched by pattern text",
                report.profile
            );
        }
        let plan = remediate_profile(&report.matrix, &catalog.remediation_rules(), &vars);
        report_issues(&plan.issues, quiet, theme_map);
        plans.push(plan);
    }

    if let Some(dir) = &cmd.out_dir {
        for plan in &plans {
            for device in plan.devices.iter().filter(|d| !d.commands.is_empty()) {
                let path = dir.join(format!("{}.cmd", device.device));
                write_file(&path, &(device.commands.join("\n") + "\n"))?;
            }
        }
        if !quiet {
            success_msg(format!("Command files written to {}", dir.display()), theme_map);
        }
    }

    if write_json(&cmd.json, &plans)? || quiet {
        return Ok(());
    }
    if cmd.out_dir.is_none() {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        for plan in &plans {
            write!(writer, "{}", render_plan(plan))?;
        }
    }
    if plans.iter().all(|p| p.total_commands() == 0) {
        info_msg("No remediation needed.", theme_map);
    }
    Ok(())
}
