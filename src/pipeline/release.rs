//! Roll a finished release back into the development branches.
//!
//! After a release is tagged on the release branch, the release tag of the
//! top level and of every forked external is merged into the matching
//! development branch, so later development descends from the release. Each
//! external then gets the first development tag of the new series and the
//! manifest on the development branch is updated to pin them.
//!
//! Only the top-level steps are fatal, up to and including the manifest
//! commit. Per-external failures are recorded and that external keeps its
//! previous development pin.

use std::path::Path;

use log::error;

use super::rewrite::tag_top_level;
use super::tag::NO_TAG_NAME;
use super::Context;
use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::git::format_command;
use crate::manifest::{repo_short_name, ExternalEntry, Manifest};
use crate::records::{ExternalRecord, RepoRef, UpdateSet, UpstreamRef};
use crate::tags::development_tag;

const POST_RELEASE_BODY: &str = "Post-release to ensure release tag is ancestor of develop work";

/// Run a top-level git command; a nonzero status aborts the roll-over.
fn require(ctx: &Context, root: &Path, args: &[&str], message: &str) -> Result<()> {
    let out = ctx.git(root, args)?;
    if out.success() {
        return Ok(());
    }
    ctx.failure(message, root, args, &out);
    error!("{}", message);
    Err(Error::Setup {
        step: format_command("git", args),
        status: out.status,
        output: out.combined(),
    })
}

/// Forked externals of `manifest` that take part in the roll-over.
fn release_externals(config: &ReleaseConfig, manifest: &Manifest) -> Result<Vec<ExternalEntry>> {
    Ok(manifest
        .externals(None)?
        .into_iter()
        .filter(|entry| {
            entry
                .repo_url
                .as_deref()
                .is_some_and(|url| config.fork_pattern.is_match(url))
        })
        .filter(|entry| !config.exclude.contains(&entry.name))
        .filter(|entry| entry.tag.is_some())
        .collect())
}

/// Release tag at the head of the release branch.
fn release_tag(ctx: &Context, config: &ReleaseConfig) -> Result<String> {
    let root = config.root.as_path();
    let out = ctx.git(root, &["describe", "--exact-match", "--tags", "HEAD"])?;
    let tag = out.stdout.trim().to_string();
    if !out.success() || !tag.contains(&config.release_marker) {
        let tag = if out.success() { tag } else { String::new() };
        error!(
            "Most recent tag '{}' on {} is not a release tag",
            tag, config.release_branch
        );
        return Err(Error::NotARelease {
            tag,
            branch: config.release_branch.clone(),
            hint: "Ensure there is a release being done".to_string(),
        });
    }
    Ok(tag)
}

fn model_record(config: &ReleaseConfig) -> ExternalRecord {
    ExternalRecord::model(
        &config.model_name,
        RepoRef {
            branch: config.develop_branch.clone(),
            repo_url: String::new(),
            name: "origin".to_string(),
            tag: None,
        },
    )
}

/// Merge `tag` into the current branch with the post-release messages.
fn merge_args<'a>(tag: &'a str, summary: &'a str) -> [&'a str; 7] {
    ["merge", "--no-ff", tag, "-m", summary, "-m", POST_RELEASE_BODY]
}

/// Last line of a tag's annotation as printed by `git tag -l -n99`.
fn last_annotation_line(ctx: &Context, dir: &Path, tag: &str) -> Result<Option<String>> {
    let out = ctx.git(dir, &["tag", "-l", "-n99", tag])?;
    if !out.success() {
        return Ok(None);
    }
    Ok(out
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .map(|line| line.strip_prefix(tag).unwrap_or(line).trim().to_string())
        .filter(|line| !line.is_empty()))
}

fn roll_over_external(
    ctx: &Context,
    config: &ReleaseConfig,
    version: &str,
    record: &mut ExternalRecord,
) -> Result<()> {
    let (Some(repo), Some(release)) = (record.repo.clone(), record.upstream.clone()) else {
        return Ok(());
    };
    let dir = record.dir(&config.root);
    ctx.progress(&format!("{} merge {}", record.name, release.tag));

    let args = ["checkout", repo.branch.as_str()];
    let out = ctx.git(&dir, &args)?;
    if !out.success() {
        ctx.failure(
            &format!("Failed to checkout {} branch in {}", repo.branch, record.name),
            &dir,
            &args,
            &out,
        );
        record.merge_mut().stat = Some(out.status);
        return Ok(());
    }
    record.merge_mut().branch = Some(repo.branch.clone());

    let summary = format!("Merge tag '{}' into '{}'", release.tag, repo.branch);
    let args = merge_args(&release.tag, &summary);
    let out = ctx.git(&dir, &args)?;
    record.merge_mut().stat = Some(out.status);
    if !out.success() {
        ctx.failure(&format!("Merge failed for {}", record.name), &dir, &args, &out);
        return Ok(());
    }

    let tag = match development_tag(&release.tag, &config.ext_release_prefix, "") {
        Ok(tag) => tag,
        Err(e) => {
            ctx.notice(&format!("Failed to create new tag name for {}: {}", record.name, e));
            record.merge_mut().tag_stat = Some(NO_TAG_NAME);
            return Ok(());
        }
    };

    let message = format!(
        "Incorporate release tag after {}-v{} release",
        config.model_label, version
    );
    let previous = match repo.tag.as_deref() {
        Some(dev_tag) => last_annotation_line(ctx, &dir, dev_tag)?,
        None => None,
    };
    let mut args = vec!["tag", "-a", tag.as_str(), "-m", message.as_str()];
    if let Some(line) = previous.as_deref() {
        args.extend(["-m", line]);
    }
    let out = ctx.git(&dir, &args)?;
    record.merge_mut().tag_stat = Some(out.status);
    if out.success() {
        ctx.progress(&format!("Tagged {} with {}", record.name, tag));
        record.merge_mut().tag = Some(tag);
    } else {
        ctx.failure(
            &format!("Failed to create {} in {}", tag, record.name),
            &dir,
            &args,
            &out,
        );
    }
    Ok(())
}

/// Run the post-release roll-over. Pushing is left to the caller.
pub fn run_post_release(ctx: &Context, config: &ReleaseConfig) -> Result<UpdateSet> {
    let root = config.root.as_path();
    let manifest_path = config.manifest_path();

    require(ctx, root, &["fetch", "origin"], "Failed to fetch origin")?;
    require(
        ctx,
        root,
        &["checkout", config.release_branch.as_str()],
        &format!("Failed to checkout {}", config.release_branch),
    )?;
    let rtag = release_tag(ctx, config)?;
    let version = config.release_version(&rtag);
    let released = release_externals(config, &Manifest::load(&manifest_path)?)?;

    require(
        ctx,
        root,
        &["checkout", config.develop_branch.as_str()],
        &format!("Failed to checkout {}", config.develop_branch),
    )?;
    let mut manifest = Manifest::load(&manifest_path)?;

    let mut set = UpdateSet::new(model_record(config));
    for entry in &released {
        let Some(dev) = manifest.get(&entry.name)? else {
            ctx.notice(&format!(
                "External {} is not on {}, skipping",
                entry.name, config.develop_branch
            ));
            continue;
        };
        let repo_url = dev.repo_url.clone().unwrap_or_default();
        let release_url = entry.repo_url.clone().unwrap_or_default();
        set.insert(ExternalRecord::fork(
            &entry.name,
            &dev.local_path,
            RepoRef {
                branch: config.ext_branch.clone(),
                name: repo_short_name(&repo_url),
                repo_url,
                tag: dev.tag.clone(),
            },
            UpstreamRef {
                name: repo_short_name(&release_url),
                repo_url: release_url,
                tag: entry.tag.clone().unwrap_or_default(),
            },
        ))?;
    }

    ctx.progress(&format!(
        "Updating {} branch of repos after {} release {}",
        config.develop_branch, config.model_label, version
    ));
    let names: Vec<&str> = set.externals().iter().map(|r| r.name.as_str()).collect();
    ctx.progress(&format!("Repos {}", names.join(", ")));

    set.model.merge_mut().branch = Some(config.develop_branch.clone());
    let summary = format!("Merge tag '{}' into '{}'", rtag, config.develop_branch);
    require(
        ctx,
        root,
        &merge_args(&rtag, &summary),
        &format!("Failed to merge {} into {}", rtag, config.develop_branch),
    )?;

    for record in set.externals_mut() {
        roll_over_external(ctx, config, &version, record)?;
    }

    ctx.progress("Editing the manifest with new external tags");
    for record in set.externals() {
        if let Some(tag) = record.new_tag() {
            manifest.set_tag(&record.name, tag)?;
        }
    }
    manifest.save()?;

    let manifest_arg = config.manifest.to_string_lossy();
    require(
        ctx,
        root,
        &["add", manifest_arg.as_ref()],
        "Failed to stage the manifest",
    )?;
    let commit_message = format!(
        "Roll over external tags for post-v{} release in {} branch",
        version, config.develop_branch
    );
    require(
        ctx,
        root,
        &["commit", "-m", commit_message.as_str()],
        "Failed to commit the manifest",
    )?;
    set.model.merge_mut().stat = Some(0);

    tag_top_level(
        ctx,
        root,
        &format!(
            "Start of new development after release of {}-v{}",
            config.model_label, version
        ),
        |ctx| {
            Ok(
                match development_tag(&rtag, &config.model_release_prefix, &config.model_dev_prefix)
                {
                    Ok(tag) => Ok(tag),
                    Err(e) => {
                        ctx.notice(&format!("Cannot derive the top-level tag: {}", e));
                        Err(NO_TAG_NAME)
                    }
                },
            )
        },
        &mut set,
    )?;

    Ok(set)
}
