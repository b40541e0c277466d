// cfgcheck/src/cli.rs
//! Command-line interface definition: global flags, the `learn`, `check`,
//! `remediate` and `signatures` subcommands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "cfgcheck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Audit device configurations against per-profile command catalogs",
    long_about = "cfgcheck learns which configuration statements recur across a profile's devices, checks every device for the presence of the profile's catalog patterns, and plans the commands that bring non-compliant devices in line.",
    arg_required_else_help = true,
)]
pub struct Cli {
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    #[arg(long = "disable-debug", global = true, help = "Disable debug logging, overriding RUST_LOG.")]
    pub disable_debug: bool,

    #[arg(long = "theme", value_name = "FILE", global = true, help = "Path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Learns catalogs from sample devices, ordered by each profile's template.
    Learn(LearnCommand),

    /// Checks devices against their profile catalogs and prints the presence matrix.
    Check(CheckCommand),

    /// Plans remediation commands from a presence matrix.
    Remediate(RemediateCommand),

    /// Prints the signatures of a single configuration file.
    Signatures(SignaturesCommand),
}

/// Line-rule selection shared by the commands that normalize lines.
#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    #[arg(long = "rules", value_name = "FILE", env = "CFGCHECK_RULES", help = "YAML file with line rules merged over the built-in ones.")]
    pub rules: Option<PathBuf>,

    #[arg(long = "enable", short = 'e', value_delimiter = ',', help = "Enable these opt-in rule names (comma-separated).")]
    pub enable: Vec<String>,

    #[arg(long = "disable", short = 'x', value_delimiter = ',', help = "Disable these rule names (comma-separated).")]
    pub disable: Vec<String>,
}

/// Inventory location and profile/device selection.
#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long = "inventory", short = 'i', value_name = "FILE", env = "CFGCHECK_INVENTORY", help = "Inventory YAML naming profiles, templates and devices.")]
    pub inventory: PathBuf,

    #[arg(long = "profile-filter", short = 'p', value_name = "REGEX", default_value = ".*", help = "Only process profiles whose name matches.")]
    pub profile_filter: String,

    #[arg(long = "device-filter", short = 'D', value_name = "REGEX", default_value = ".*", help = "Only process devices whose name matches.")]
    pub device_filter: String,

    #[arg(long = "catalog-dir", value_name = "DIR", help = "Directory holding <profile>.yaml catalogs (defaults to the inventory's).")]
    pub catalog_dir: Option<PathBuf>,
}

/// JSON export switches.
#[derive(Args, Debug, Clone, Default)]
pub struct JsonArgs {
    #[arg(long = "json-file", value_name = "FILE", help = "Write the results as JSON to a file.")]
    pub json_file: Option<PathBuf>,

    #[arg(long = "json-stdout", conflicts_with = "json_file", help = "Print the results as JSON to stdout instead of tables.")]
    pub json_stdout: bool,
}

#[derive(Parser, Debug)]
pub struct LearnCommand {
    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub rules: RuleArgs,

    #[command(flatten)]
    pub json: JsonArgs,

    #[arg(long = "no-write", help = "Do not write catalog files.")]
    pub no_write: bool,

    #[arg(long = "show-unmatched", help = "Also list learned signatures the template does not contain.")]
    pub show_unmatched: bool,
}

#[derive(Parser, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub json: JsonArgs,

    #[arg(long = "fail-on-absent", help = "Exit with code 1 when any device lacks any catalog pattern.")]
    pub fail_on_absent: bool,
}

#[derive(Parser, Debug)]
pub struct RemediateCommand {
    #[command(flatten)]
    pub inventory: InventoryArgs,

    #[command(flatten)]
    pub json: JsonArgs,

    #[arg(long = "vars", value_name = "FILE", help = "YAML mapping of device -> variable -> value.")]
    pub vars: Option<PathBuf>,

    #[arg(long = "matrix", value_name = "FILE", help = "Reuse check reports written by `check --json-file` instead of re-checking.")]
    pub matrix: Option<PathBuf>,

    #[arg(long = "out-dir", value_name = "DIR", help = "Write one <device>.cmd file per device into this directory.")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SignaturesCommand {
    #[arg(value_name = "FILE", help = "Configuration file to parse.")]
    pub file: PathBuf,

    #[command(flatten)]
    pub rules: RuleArgs,

    #[arg(long = "checking", help = "Show raw checking-mode signatures instead of normalized ones.")]
    pub checking: bool,

    #[arg(long = "depth", help = "Prefix every signature with its nesting depth.")]
    pub depth: bool,
}
