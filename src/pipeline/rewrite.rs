//! Pin new tags in the manifest, then commit and tag the top level.

use std::path::Path;

use log::debug;

use super::tag::derive_tag;
use super::Context;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::records::{UpdateSet, SKIPPED};

/// Write one pin per record into `manifest` and save it.
///
/// Forks get their new tag or [`SKIPPED`]; passthrough records get the
/// reference pin. Entries without a record are left alone.
pub fn write_pins(ctx: &Context, set: &UpdateSet, manifest: &mut Manifest) -> Result<()> {
    for record in set.externals() {
        let pin = if record.is_fork() {
            match record.new_tag() {
                Some(tag) => tag.to_string(),
                None => {
                    ctx.notice(&format!("External {} no tag to update", record.name));
                    SKIPPED.to_string()
                }
            }
        } else {
            match &record.upstream {
                Some(upstream) => upstream.tag.clone(),
                None => continue,
            }
        };
        debug!("Pinning {} to {}", record.name, pin);
        manifest.set_tag(&record.name, &pin)?;
    }
    manifest.save()
}

/// Stage and commit the manifest, then create the next top-level tag.
///
/// Statuses go into the model record. A failed add or commit skips the tag.
pub(crate) fn commit_and_tag(
    ctx: &Context,
    root: &Path,
    manifest: &Path,
    commit_message: &str,
    tag_message: &str,
    next: impl FnOnce(&Context) -> Result<std::result::Result<String, i32>>,
    set: &mut UpdateSet,
) -> Result<()> {
    let manifest_arg = manifest.to_string_lossy();
    let args = ["add", manifest_arg.as_ref()];
    let out = ctx.git(root, &args)?;
    if !out.success() {
        ctx.failure("Failed to stage the manifest", root, &args, &out);
        set.model.merge_mut().stat = Some(out.status);
        return Ok(());
    }

    let args = ["commit", "-m", commit_message];
    let out = ctx.git(root, &args)?;
    set.model.merge_mut().stat = Some(out.status);
    if !out.success() {
        ctx.failure("Failed to commit the manifest", root, &args, &out);
        return Ok(());
    }

    tag_top_level(ctx, root, tag_message, next, set)
}

/// Create the next top-level tag on the committed manifest.
pub(crate) fn tag_top_level(
    ctx: &Context,
    root: &Path,
    tag_message: &str,
    next: impl FnOnce(&Context) -> Result<std::result::Result<String, i32>>,
    set: &mut UpdateSet,
) -> Result<()> {
    let tag = match next(ctx)? {
        Ok(tag) => tag,
        Err(status) => {
            set.model.merge_mut().tag_stat = Some(status);
            return Ok(());
        }
    };
    let args = ["tag", "-a", tag.as_str(), "-m", tag_message];
    let out = ctx.git(root, &args)?;
    set.model.merge_mut().tag_stat = Some(out.status);
    if out.success() {
        ctx.progress(&format!("Tagged top level with {}", tag));
        set.model.merge_mut().tag = Some(tag);
    } else {
        ctx.failure(&format!("Failed to create tag {}", tag), root, &args, &out);
    }
    Ok(())
}

pub fn execute(
    ctx: &Context,
    config: &SyncConfig,
    mut set: UpdateSet,
    mut manifest: Manifest,
) -> Result<UpdateSet> {
    ctx.progress(&format!("Rewriting {}", manifest.path().display()));
    write_pins(ctx, &set, &mut manifest)?;

    let root = config.root.as_path();
    commit_and_tag(
        ctx,
        root,
        &config.manifest,
        &format!(
            "Update externals based on {} tag '{}'",
            config.project, config.upstream_tag
        ),
        &format!("Update Externals with tags from {}", config.upstream_tag),
        |ctx| derive_tag(ctx, root, None),
        &mut set,
    )?;

    Ok(set)
}
