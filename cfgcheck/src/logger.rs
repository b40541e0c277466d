// cfgcheck/src/logger.rs
//! Logging setup for the cfgcheck binary.
//!
//! Log records go to stderr through `env_logger`. `RUST_LOG` decides the
//! level unless the caller passes an explicit override (`--debug`, `--quiet`).
//! Audit issues are printed by the commands themselves, so their log records
//! are kept out of the default output.

use cfgcheck_core::ISSUE_LOG_TARGET;
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Initializes the global logger. Calling it twice is harmless.
pub fn init_logger(level_override: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    if let Some(level) = level_override {
        builder.filter_level(level);
    }
    builder.filter_module(ISSUE_LOG_TARGET, LevelFilter::Error);
    builder.format_timestamp(None).format_target(true);
    let _ = builder.try_init();
}

/// Maps the global CLI flags onto a level override.
pub fn level_from_flags(quiet: bool, debug: bool, disable_debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Error)
    } else if debug && !disable_debug {
        Some(LevelFilter::Debug)
    } else if disable_debug {
        Some(LevelFilter::Info)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_precedence() {
        assert_eq!(level_from_flags(true, true, false), Some(LevelFilter::Error));
        assert_eq!(level_from_flags(false, true, false), Some(LevelFilter::Debug));
        assert_eq!(level_from_flags(false, true, true), Some(LevelFilter::Info));
        assert_eq!(level_from_flags(false, false, false), None);
    }
}
