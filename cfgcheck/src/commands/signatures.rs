//! `signatures`: shows how one file breaks down into signatures, which is
//! the starting point for writing catalog patterns by hand.

use anyhow::Result;
use std::io::{self, Write};

use cfgcheck_core::{file_signatures, DeviceConfig};

use crate::cli::SignaturesCommand;
use crate::commands::{build_normalizer, report_issues};
use crate::ui::theme::ThemeMap;

pub fn run_signatures(cmd: &SignaturesCommand, quiet: bool, theme_map: &ThemeMap) -> Result<()> {
    let device = DeviceConfig::load(&cmd.file.display().to_string(), &cmd.file)?;
    let normalizer = if cmd.checking { None } else { Some(build_normalizer(&cmd.rules)?) };
    let parsed = file_signatures(normalizer.as_ref(), &device);
    report_issues(&parsed.issues, quiet, theme_map);

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    for signature in &parsed.signatures {
        if cmd.depth {
            writeln!(writer, "{}\t{}", signature.depth, signature)?;
        } else {
            writeln!(writer, "{}", signature)?;
        }
    }
    Ok(())
}
