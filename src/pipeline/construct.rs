//! Reference manifest retrieval and record construction.

use std::fs;

use log::debug;

use super::Context;
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::records::{build_records, ExternalRecord, RepoRef, UpdateSet};

/// Load the reference project's manifest for the configured tag.
///
/// A local `Externals.<tag>.cfg` is reused; otherwise it is downloaded with
/// curl. Any failure here is fatal and happens before git is touched.
pub fn reference_manifest(ctx: &Context, config: &SyncConfig) -> Result<Manifest> {
    let path = config.reference_manifest_path();
    if path.exists() {
        debug!("Using existing reference manifest {}", path.display());
        return Manifest::load(&path);
    }

    let url = config.reference_manifest_url();
    ctx.progress(&format!("Downloading reference manifest {}", url));
    let target = path.to_string_lossy().to_string();
    let out = ctx
        .runner
        .run(&config.root, "curl", &["-fsSL", &url, "-o", &target])?;

    if !out.success() {
        if path.exists() {
            fs::remove_file(&path)?;
        }
        return Err(Error::ReferenceManifest {
            url,
            message: format!("curl exited with status {}: {}", out.status, out.combined()),
        });
    }

    Manifest::load(&path)
}

/// The synthetic record for the top-level repository.
pub fn model_record(config: &SyncConfig) -> ExternalRecord {
    ExternalRecord::model(
        &config.model_name,
        RepoRef {
            branch: config.org_branch.clone(),
            repo_url: config.org_url.clone(),
            name: config.org_remote.clone(),
            tag: None,
        },
    )
}

/// Read the downstream manifest and add one record per tracked external.
///
/// Runs after the top-level setup so the manifest comes from the freshly
/// checked out working branch. The loaded manifest is returned for the
/// rewrite stage.
pub fn execute(
    ctx: &Context,
    config: &SyncConfig,
    mut set: UpdateSet,
    reference: &Manifest,
) -> Result<(UpdateSet, Manifest)> {
    let downstream = Manifest::load(&config.manifest_path())?;
    let records = build_records(
        &downstream,
        reference,
        config.externals.as_deref(),
        &config.fork_pattern,
        &config.ext_branch,
    )?;

    let forks = records.iter().filter(|r| r.is_fork()).count();
    ctx.progress(&format!(
        "Tracking {} externals ({} forks, {} passthrough)",
        records.len(),
        forks,
        records.len() - forks
    ));

    set.extend(records)?;
    Ok((set, downstream))
}
