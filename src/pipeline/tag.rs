//! Annotated tags for merged forks.

use std::path::Path;

use super::Context;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::git::most_recent_tag;
use crate::records::{UpdateSet, SKIPPED};
use crate::tags::next_tag;

/// Status recorded when no tag name could be derived.
pub const NO_TAG_NAME: i32 = -1;

/// Work out the next tag in `dir`.
///
/// The base is `previous` when given, otherwise the most recent tag reachable
/// from HEAD. A [`SKIPPED`] pin is not a tag and counts as absent. On failure
/// the status to record is returned instead: the status of `git describe`, or
/// [`NO_TAG_NAME`] when the base has no numeric final component.
pub(crate) fn derive_tag(
    ctx: &Context,
    dir: &Path,
    previous: Option<&str>,
) -> Result<std::result::Result<String, i32>> {
    let base = match previous.filter(|tag| *tag != SKIPPED) {
        Some(tag) => tag.to_string(),
        None => match most_recent_tag(ctx.runner, dir)? {
            Ok(tag) => tag,
            Err(out) => {
                ctx.failure(
                    &format!("Could not determine a base tag in {}", dir.display()),
                    dir,
                    &["describe", "--tags", "--abbrev=0"],
                    &out,
                );
                return Ok(Err(if out.success() { NO_TAG_NAME } else { out.status }));
            }
        },
    };

    match next_tag(&base) {
        Ok(tag) => Ok(Ok(tag)),
        Err(e) => {
            ctx.notice(&format!("Cannot derive a new tag in {}: {}", dir.display(), e));
            Ok(Err(NO_TAG_NAME))
        }
    }
}

pub fn execute(ctx: &Context, config: &SyncConfig, mut set: UpdateSet) -> Result<UpdateSet> {
    for record in set.externals_mut() {
        if !record.merged() {
            continue;
        }
        let (Some(repo), Some(upstream)) = (record.repo.clone(), record.upstream.clone()) else {
            continue;
        };
        let dir = record.dir(&config.root);

        let tag = match derive_tag(ctx, &dir, repo.tag.as_deref())? {
            Ok(tag) => tag,
            Err(status) => {
                record.merge_mut().tag_stat = Some(status);
                continue;
            }
        };

        let message = format!(
            "Update with version from {} tag '{}'",
            config.project, config.upstream_tag
        );
        let detail = format!(
            "Last changes from upstream '{}' tag:'{}'",
            upstream.name, upstream.tag
        );
        let args = [
            "tag",
            "-a",
            tag.as_str(),
            "-m",
            message.as_str(),
            "-m",
            detail.as_str(),
        ];
        let out = ctx.git(&dir, &args)?;
        record.merge_mut().tag_stat = Some(out.status);
        if out.success() {
            ctx.progress(&format!("Tagged {} with {}", record.name, tag));
            record.merge_mut().tag = Some(tag);
        } else {
            ctx.failure(
                &format!("Failed to create tag {} in {}", tag, record.name),
                &dir,
                &args,
                &out,
            );
        }
    }

    Ok(set)
}
