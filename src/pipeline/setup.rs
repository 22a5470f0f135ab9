//! Top-level repository setup.
//!
//! Adds the organization remote, fetches its development branch and creates
//! the working branch `update/<tag>` from it. Any failure aborts the run.

use std::path::Path;

use super::Context;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::git::{format_command, CommandOutput};
use crate::records::UpdateSet;

fn require(
    ctx: &Context,
    root: &Path,
    args: &[&str],
    out: &CommandOutput,
    message: &str,
) -> Result<()> {
    if out.success() {
        return Ok(());
    }
    ctx.failure(message, root, args, out);
    Err(Error::Setup {
        step: format_command("git", args),
        status: out.status,
        output: out.combined(),
    })
}

pub fn execute(ctx: &Context, config: &SyncConfig, mut set: UpdateSet) -> Result<UpdateSet> {
    let root = config.root.as_path();
    ctx.progress(&format!(
        "Setting up {} in {}",
        config.model_name,
        root.display()
    ));

    let args = ["remote", "add", config.org_remote.as_str(), config.org_url.as_str()];
    let out = ctx.git(root, &args)?;
    set.model.fetch_mut().remote = Some(out.status);
    require(
        ctx,
        root,
        &args,
        &out,
        &format!(
            "Failed to add remote {} {} in {}",
            config.org_remote,
            config.org_url,
            root.display()
        ),
    )?;

    let args = ["fetch", config.org_remote.as_str(), config.org_branch.as_str()];
    let out = ctx.git(root, &args)?;
    set.model.fetch_mut().branch = Some(out.status);
    require(
        ctx,
        root,
        &args,
        &out,
        &format!(
            "Failed to fetch {} from {}",
            config.org_branch, config.org_remote
        ),
    )?;

    let branch = config.model_branch();
    let start = format!("{}/{}", config.org_remote, config.org_branch);
    let args = ["checkout", "-b", branch.as_str(), start.as_str()];
    let out = ctx.git(root, &args)?;
    require(
        ctx,
        root,
        &args,
        &out,
        &format!("Failed to create branch {} in {}", branch, config.model_name),
    )?;
    set.model.merge_mut().branch = Some(branch);

    Ok(set)
}
