//! # Post-Release Command Implementation
//!
//! Run in the top-level repository after a release was tagged on the release
//! branch. Merges the release tags of the model and its forked externals into
//! their development branches and starts a new development tag series.

use anyhow::{Context as _, Result};
use clap::Args;
use log::error;
use std::env;
use std::path::{Path, PathBuf};

use super::{confirm_push, dump_records, init_logging};
use crate::cli::GlobalArgs;
use externals_sync::config::{fork_regex, ReleaseConfig};
use externals_sync::defaults;
use externals_sync::git::SystemRunner;
use externals_sync::output::OutputConfig;
use externals_sync::pipeline::{push, release, Context};
use externals_sync::summary;

/// Roll a finished release into the development branches
#[derive(Args, Debug)]
pub struct PostReleaseArgs {
    /// Top-level model repository. Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Manifest file, relative to the root directory.
    #[arg(long, value_name = "FILE", default_value = defaults::MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// Branch holding the release tag.
    #[arg(long, value_name = "BRANCH", default_value = defaults::RELEASE_BRANCH)]
    pub release_branch: String,

    /// Top-level development branch.
    #[arg(long, value_name = "BRANCH", default_value = defaults::DEVELOP_BRANCH)]
    pub develop_branch: String,

    /// Development branch of forked externals.
    #[arg(long, value_name = "BRANCH", default_value = defaults::EXT_BRANCH)]
    pub ext_branch: String,

    /// Regex matched against repo_url to detect forked externals.
    #[arg(long, value_name = "REGEX", default_value = defaults::FORK_PATTERN)]
    pub fork_pattern: String,

    /// Forked externals to leave alone.
    #[arg(
        long,
        value_name = "NAME",
        num_args = 1..,
        default_values_t = defaults::RELEASE_EXCLUDES.iter().map(|s| s.to_string())
    )]
    pub exclude: Vec<String>,

    /// Push the development branches and new tags to origin when done.
    #[arg(long)]
    pub push: bool,

    /// Do not ask before pushing.
    #[arg(long, requires = "push")]
    pub yes: bool,

    /// Print all records as JSON after the summary.
    #[arg(long)]
    pub dump_records: bool,
}

impl PostReleaseArgs {
    pub fn to_config(&self, cwd: &Path) -> Result<ReleaseConfig> {
        let root = self.root_dir.clone().unwrap_or_else(|| cwd.to_path_buf());
        let mut config = ReleaseConfig::new(root)?;
        config.manifest = self.manifest.clone();
        config.release_branch = self.release_branch.clone();
        config.develop_branch = self.develop_branch.clone();
        config.ext_branch = self.ext_branch.clone();
        config.fork_pattern = fork_regex(&self.fork_pattern)?;
        config.exclude = self.exclude.clone();
        Ok(config)
    }
}

/// Execute the `post-release` command.
pub fn execute(args: PostReleaseArgs, global: &GlobalArgs) -> Result<()> {
    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    let config = args.to_config(&cwd)?;
    init_logging(&config.root, global)?;

    let runner = SystemRunner;
    let ctx = Context::new(&runner, OutputConfig::from_env_and_flag(&global.color));

    let mut set = release::run_post_release(&ctx, &config).inspect_err(|e| error!("{}", e))?;

    if args.push {
        if confirm_push(args.yes)? {
            set = push::execute(&ctx, &config.root, "origin", set)?;
        } else {
            ctx.notice("Push skipped");
        }
    }

    summary::print(&set);
    if args.dump_records {
        dump_records(&set)?;
    }
    Ok(())
}
