//! Stages of an externals update.
//!
//! ## Overview
//!
//! A `sync` run goes through these stages, in order:
//! 1. Reference manifest - download (or reuse) the reference project's manifest
//! 2. Setup - add the organization remote and create the top-level working branch
//! 3. Construction - cross-reference both manifests into an [`UpdateSet`]
//! 4. Fetch - add the upstream remote and fetch tag and development branch per fork
//! 5. Merge - merge the upstream tag into a new working branch per fork
//! 6. Tag - create the next annotated downstream tag per merged fork
//! 7. Rewrite - pin the new tags in the manifest, commit and tag the top level
//! 8. Push - only on request, see [`push`]
//!
//! Every stage takes the record set by value and returns it updated. Only
//! stages 1 and 2 can abort a run; from stage 4 on a failing git command is
//! recorded in the affected record and the remaining records carry on.
//!
//! `post-release` is a separate, shorter workflow in [`release`].

use std::path::Path;

use log::{info, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::git::{format_command, CommandOutput, CommandRunner};
use crate::output::{emoji, OutputConfig};
use crate::records::UpdateSet;

pub mod construct;
pub mod fetch;
pub mod merge;
pub mod push;
pub mod release;
pub mod rewrite;
pub mod setup;
pub mod tag;

/// What every stage needs besides the records: a way to run commands and a
/// way to talk to the user.
pub struct Context<'a> {
    pub runner: &'a dyn CommandRunner,
    pub output: OutputConfig,
}

impl<'a> Context<'a> {
    pub fn new(runner: &'a dyn CommandRunner, output: OutputConfig) -> Self {
        Self { runner, output }
    }

    pub fn git(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        self.runner.git(cwd, args)
    }

    /// Print and log a progress line.
    pub fn progress(&self, message: &str) {
        info!("{}", message);
        println!("{} {}", emoji(&self.output, "🔄", "+"), message);
    }

    /// Print and log a problem that needs no command context.
    pub fn notice(&self, message: &str) {
        warn!("{}", message);
        println!("{} {}", emoji(&self.output, "⚠️ ", "-"), message);
    }

    /// Print and log a failed git command together with its output.
    pub fn failure(&self, message: &str, cwd: &Path, args: &[&str], out: &CommandOutput) {
        let cmd = format_command("git", args);
        warn!(
            "{} (cwd={} cmd={} status={}): {}",
            message,
            cwd.display(),
            cmd,
            out.status,
            out.combined()
        );
        println!("{} {}", emoji(&self.output, "❌", "-"), message);
        println!("cmd={}\ncmdOut={}\n", cmd, out.combined());
    }
}

/// Run the `sync` workflow up to and including the manifest rewrite.
///
/// Pushing is left to the caller so it can ask for confirmation first.
pub fn run_sync(ctx: &Context, config: &SyncConfig) -> Result<UpdateSet> {
    let reference = construct::reference_manifest(ctx, config)?;

    let set = UpdateSet::new(construct::model_record(config));
    let set = setup::execute(ctx, config, set)?;
    let (set, downstream) = construct::execute(ctx, config, set, &reference)?;

    let set = fetch::execute(ctx, config, set)?;
    let set = merge::execute(ctx, config, set)?;
    let set = tag::execute(ctx, config, set)?;
    rewrite::execute(ctx, config, set, downstream)
}
