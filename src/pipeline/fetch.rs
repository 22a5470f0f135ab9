//! Per-fork remote setup and fetch.
//!
//! For each fork: add the upstream repository as a remote, fetch only the
//! pinned upstream tag, and fetch the fork's development branch from origin.
//! Each status is recorded separately; failures never stop the run.

use super::Context;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::records::UpdateSet;

pub fn execute(ctx: &Context, config: &SyncConfig, mut set: UpdateSet) -> Result<UpdateSet> {
    for record in set.externals_mut() {
        let (Some(repo), Some(upstream)) = (record.repo.clone(), record.upstream.clone()) else {
            continue;
        };
        let dir = record.dir(&config.root);
        ctx.progress(&format!(
            "Fetching {} '{}' and origin/{} for {}",
            upstream.name, upstream.tag, repo.branch, record.name
        ));

        let args = ["remote", "add", upstream.name.as_str(), upstream.repo_url.as_str()];
        let out = ctx.git(&dir, &args)?;
        record.fetch_mut().remote = Some(out.status);
        if !out.success() {
            ctx.failure(
                &format!(
                    "Failed to add remote {} {} to external {} in {}",
                    upstream.name,
                    upstream.repo_url,
                    record.name,
                    dir.display()
                ),
                &dir,
                &args,
                &out,
            );
        }

        let args = [
            "fetch",
            upstream.name.as_str(),
            "tag",
            upstream.tag.as_str(),
            "--no-tags",
        ];
        let out = ctx.git(&dir, &args)?;
        record.fetch_mut().tag = Some(out.status);
        if !out.success() {
            ctx.failure(
                &format!("Failed to fetch '{}/{}'", upstream.name, upstream.tag),
                &dir,
                &args,
                &out,
            );
        }

        let args = ["fetch", "origin", repo.branch.as_str()];
        let out = ctx.git(&dir, &args)?;
        record.fetch_mut().branch = Some(out.status);
        if !out.success() {
            ctx.failure(
                &format!("Failed to fetch 'origin/{}'", repo.branch),
                &dir,
                &args,
                &out,
            );
        }
    }

    Ok(set)
}
