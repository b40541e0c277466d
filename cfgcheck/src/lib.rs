// cfgcheck/src/lib.rs
//! # cfgcheck CLI
//!
//! Command-line front end for `cfgcheck-core`: learns per-profile command
//! catalogs from sample device configurations, checks devices against them,
//! and plans remediation commands. File discovery, YAML/JSON persistence and
//! terminal rendering live here; the engine lives in the core crate.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
