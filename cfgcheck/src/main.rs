//! cfgcheck entry point.
//!
//! Parses the command line, sets up logging and the colour theme, and hands
//! off to the selected subcommand. Exit codes: 0 success, 1 absent patterns
//! with `check --fail-on-absent`, 2 fatal error.

use std::process::ExitCode;
use anyhow::Result;
use clap::Parser;
use log::info;

use cfgcheck::cli::{Cli, Commands};
use cfgcheck::commands::{check, learn, remediate, signatures};
use cfgcheck::logger;
use cfgcheck::ui::output_format::error_msg;
use cfgcheck::ui::theme::{build_theme_map, ThemeMap, ThemeStyle};

fn run(cli: &Cli, theme_map: &ThemeMap) -> Result<ExitCode> {
    match &cli.command {
        Commands::Learn(cmd) => {
            learn::run_learn(cmd, cli.quiet, theme_map)?;
        }
        Commands::Check(cmd) => {
            let compliant = check::run_check(cmd, cli.quiet, theme_map)?;
            if cmd.fail_on_absent && !compliant {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Remediate(cmd) => {
            remediate::run_remediate(cmd, cli.quiet, theme_map)?;
        }
        Commands::Signatures(cmd) => {
            signatures::run_signatures(cmd, cli.quiet, theme_map)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug, cli.disable_debug));
    info!("cfgcheck started. Version: {}", env!("CARGO_PKG_VERSION"));

    let theme_map = match build_theme_map(cli.theme.as_deref()) {
        Ok(theme_map) => theme_map,
        Err(e) => {
            error_msg(format!("Theme error: {:#}", e), &ThemeStyle::default_theme_map());
            return ExitCode::from(2);
        }
    };

    match run(&cli, &theme_map) {
        Ok(code) => code,
        Err(e) => {
            error_msg(format!("{:#}", e), &theme_map);
            ExitCode::from(2)
        }
    }
}
