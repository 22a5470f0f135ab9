//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use externals_sync::defaults;

/// Externals Sync - Keep model externals in step with reference releases
#[derive(Parser, Debug)]
#[command(name = "externals-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Log filter for the log file (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "debug",
        env = "EXTERNALS_SYNC_LOG"
    )]
    pub log_level: String,

    /// Log file, relative to the root directory unless absolute
    #[arg(long, global = true, value_name = "PATH", default_value = defaults::LOG_FILE)]
    pub log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Merge a reference project tag into every forked external
    Sync(commands::sync::SyncArgs),

    /// Roll a finished release into the development branches
    PostRelease(commands::post_release::PostReleaseArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    #[cfg(test)]
    pub(crate) fn into_command(self) -> Commands {
        self.command
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Sync(args) => commands::sync::execute(args, &self.global),
            Commands::PostRelease(args) => commands::post_release::execute(args, &self.global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
