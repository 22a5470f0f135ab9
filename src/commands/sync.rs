//! # Sync Command Implementation
//!
//! Merges a tagged release of the reference project into every forked
//! external of the model and pins the results in the manifest.
//!
//! ## Functionality
//!
//! - **Fatal steps**: the reference manifest and the top-level working branch
//!   must be available, otherwise the command exits with an error before
//!   touching any external.
//! - **Per-external steps**: fetch, merge and tag failures are reported and
//!   recorded in the summary table; the command still exits successfully.
//! - **Pushing**: only with `--push`, after a confirmation prompt that
//!   `--yes` skips.

use anyhow::{Context as _, Result};
use clap::Args;
use log::error;
use std::env;
use std::path::PathBuf;

use super::{confirm_push, dump_records, init_logging};
use crate::cli::GlobalArgs;
use externals_sync::config::{fork_regex, SyncConfig};
use externals_sync::defaults;
use externals_sync::git::SystemRunner;
use externals_sync::output::OutputConfig;
use externals_sync::pipeline::{self, push, Context};
use externals_sync::summary;

/// Merge a reference project tag into every forked external
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Reference project tag to update to (e.g. cesm2_3_beta17).
    #[arg(short = 't', long, value_name = "TAG")]
    pub upstream_tag: String,

    /// Top-level model repository.
    ///
    /// Defaults to the third ancestor of the current directory.
    #[arg(short, long, value_name = "DIR", env = "EXTERNALS_SYNC_ROOT")]
    pub root_dir: Option<PathBuf>,

    /// Only process these externals.
    #[arg(long, value_name = "NAME", num_args = 1..)]
    pub externals: Option<Vec<String>>,

    /// Manifest file, relative to the root directory.
    #[arg(long, value_name = "FILE", default_value = defaults::MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// Reference manifest URL, `{tag}` is replaced by the upstream tag.
    #[arg(long, value_name = "TEMPLATE", default_value = defaults::REFERENCE_URL)]
    pub reference_url: String,

    /// Reference project label used in commit and tag messages.
    #[arg(long, value_name = "LABEL", default_value = defaults::PROJECT)]
    pub project: String,

    /// Regex matched against repo_url to detect forked externals.
    #[arg(long, value_name = "REGEX", default_value = defaults::FORK_PATTERN)]
    pub fork_pattern: String,

    /// Development branch of forked externals.
    #[arg(long, value_name = "BRANCH", default_value = defaults::EXT_BRANCH)]
    pub ext_branch: String,

    /// Remote name for the organization's top-level repository.
    #[arg(long, value_name = "NAME", default_value = defaults::ORG_REMOTE)]
    pub org_remote: String,

    /// URL of the organization's top-level repository.
    #[arg(long, value_name = "URL", default_value = defaults::ORG_URL)]
    pub org_url: String,

    /// Development branch of the top-level repository.
    #[arg(long, value_name = "BRANCH", default_value = defaults::ORG_BRANCH)]
    pub org_branch: String,

    /// Push new branches and tags when done.
    #[arg(long)]
    pub push: bool,

    /// Do not ask before pushing.
    #[arg(long, requires = "push")]
    pub yes: bool,

    /// Print all records as JSON after the summary.
    #[arg(long)]
    pub dump_records: bool,
}

impl SyncArgs {
    /// Resolve the arguments into a library config. `cwd` anchors the
    /// default root directory.
    pub fn to_config(&self, cwd: &std::path::Path) -> Result<SyncConfig> {
        let root = match &self.root_dir {
            Some(dir) => dir.clone(),
            None => defaults::default_root(cwd),
        };
        let mut config = SyncConfig::new(root, self.upstream_tag.clone())?;
        config.manifest = self.manifest.clone();
        config.reference_url = self.reference_url.clone();
        config.project = self.project.clone();
        config.fork_pattern = fork_regex(&self.fork_pattern)?;
        config.ext_branch = self.ext_branch.clone();
        config.org_remote = self.org_remote.clone();
        config.org_url = self.org_url.clone();
        config.org_branch = self.org_branch.clone();
        config.externals = self.externals.clone();
        Ok(config)
    }
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, global: &GlobalArgs) -> Result<()> {
    let cwd = env::current_dir().context("Failed to determine the current directory")?;
    let config = args.to_config(&cwd)?;
    init_logging(&config.root, global)?;

    let runner = SystemRunner;
    let ctx = Context::new(&runner, OutputConfig::from_env_and_flag(&global.color));
    ctx.progress(&format!(
        "Updating externals in {} to {} tag '{}'",
        config.root.display(),
        config.project,
        config.upstream_tag
    ));

    let mut set = pipeline::run_sync(&ctx, &config).inspect_err(|e| error!("{}", e))?;

    if args.push {
        if confirm_push(args.yes)? {
            set = push::execute(&ctx, &config.root, &config.org_remote, set)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::path::Path;

    fn parse(extra: &[&str]) -> SyncArgs {
        let mut argv = vec!["externals-sync", "sync"];
        argv.extend_from_slice(extra);
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.into_command() {
            crate::cli::Commands::Sync(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["-t", "cesm2_3_beta17", "--root-dir", "/model"]);
        let config = args.to_config(Path::new("/ignored")).unwrap();
        assert_eq!(config.root, PathBuf::from("/model"));
        assert_eq!(config.upstream_tag, "cesm2_3_beta17");
        assert_eq!(config.ext_branch, "ew-develop");
        assert_eq!(config.org_remote, "ew-org");
        assert_eq!(config.externals, None);
        assert!(!args.push);
    }

    #[test]
    fn test_default_root_is_third_ancestor() {
        let mut args = parse(&["-t", "t1"]);
        args.root_dir = None;
        let config = args.to_config(Path::new("/work/model/tools/git/scripts")).unwrap();
        assert_eq!(config.root, PathBuf::from("/work/model"));
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "-t",
            "t1",
            "-r",
            "/m",
            "--externals",
            "cam",
            "mpas",
            "--fork-pattern",
            "MyOrg",
            "--project",
            "ESCOMP/CESM-dev",
        ]);
        let config = args.to_config(Path::new("/")).unwrap();
        assert_eq!(
            config.externals,
            Some(vec!["cam".to_string(), "mpas".to_string()])
        );
        assert!(config.fork_pattern.is_match("https://github.com/MyOrg/CAM"));
        assert_eq!(config.project, "ESCOMP/CESM-dev");
    }

    #[test]
    fn test_invalid_fork_pattern() {
        let args = parse(&["-t", "t1", "-r", "/m", "--fork-pattern", "("]);
        assert!(args.to_config(Path::new("/")).is_err());
    }

    #[test]
    fn test_yes_requires_push() {
        let result = Cli::try_parse_from(["externals-sync", "sync", "-t", "t1", "--yes"]);
        assert!(result.is_err());
    }
}
