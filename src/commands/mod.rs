//! # CLI Command Implementations
//!
//! One file per subcommand of the `externals-sync` tool. Each command module
//! contains an `Args` struct derived with `clap` and an `execute` function
//! that resolves the arguments into a library config and runs the workflow.
//!
//! Helpers shared by the workflow commands live here.

use anyhow::{Context as _, Result};
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::Path;

use crate::cli::GlobalArgs;
use externals_sync::logging;
use externals_sync::records::UpdateSet;

pub mod completions;
pub mod post_release;
pub mod sync;

/// Start appending to the log file, resolved against `root`.
pub fn init_logging(root: &Path, global: &GlobalArgs) -> Result<()> {
    let path = root.join(&global.log_file);
    logging::init(&path, &global.log_level)
        .with_context(|| format!("Failed to set up logging to {}", path.display()))
}

/// Ask before pushing unless `yes` was given.
pub fn confirm_push(yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Push the new branches and tags to their remotes?")
        .default(false)
        .interact()?;
    Ok(confirmed)
}

/// Print the whole record set as JSON.
pub fn dump_records(set: &UpdateSet) -> Result<()> {
    let json = serde_json::to_string_pretty(set).context("Failed to serialize records")?;
    println!("{}", json);
    Ok(())
}
