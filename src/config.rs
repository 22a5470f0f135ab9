//! # Run Configuration
//!
//! Typed settings for the two workflows. The CLI resolves every option
//! (flag, then environment variable, then the value from `defaults`) and
//! hands the result to the pipeline as a [`SyncConfig`] or [`ReleaseConfig`].
//! Nothing below the CLI reads the environment.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::defaults;
use crate::error::{Error, Result};

/// Settings for synchronizing externals with a reference-project tag.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Top-level model repository.
    pub root: PathBuf,
    /// Reference-project tag driving the update.
    pub upstream_tag: String,
    /// Manifest file, relative to `root`.
    pub manifest: PathBuf,
    /// Reference manifest URL template with a `{tag}` placeholder.
    pub reference_url: String,
    /// Reference project label used in messages.
    pub project: String,
    pub fork_pattern: Regex,
    pub ext_branch: String,
    pub org_remote: String,
    pub org_url: String,
    pub org_branch: String,
    pub model_name: String,
    /// Allow-list of externals; `None` processes all of them.
    pub externals: Option<Vec<String>>,
}

impl SyncConfig {
    /// Configuration with every optional setting at its default.
    pub fn new(root: impl Into<PathBuf>, upstream_tag: impl Into<String>) -> Result<Self> {
        let upstream_tag = upstream_tag.into();
        if upstream_tag.trim().is_empty() {
            return Err(Error::Config {
                message: "upstream tag must not be empty".to_string(),
            });
        }
        Ok(Self {
            root: root.into(),
            upstream_tag,
            manifest: PathBuf::from(defaults::MANIFEST_FILE),
            reference_url: defaults::REFERENCE_URL.to_string(),
            project: defaults::PROJECT.to_string(),
            fork_pattern: fork_regex(defaults::FORK_PATTERN)?,
            ext_branch: defaults::EXT_BRANCH.to_string(),
            org_remote: defaults::ORG_REMOTE.to_string(),
            org_url: defaults::ORG_URL.to_string(),
            org_branch: defaults::ORG_BRANCH.to_string(),
            model_name: defaults::MODEL_NAME.to_string(),
            externals: None,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }

    /// Local copy of the reference manifest: `Externals.<tag>.cfg`.
    pub fn reference_manifest_path(&self) -> PathBuf {
        self.root.join(tagged_file_name(&self.manifest, &self.upstream_tag))
    }

    pub fn reference_manifest_url(&self) -> String {
        self.reference_url.replace("{tag}", &self.upstream_tag)
    }

    /// Working branch in the top-level repository.
    pub fn model_branch(&self) -> String {
        format!("update/{}", self.upstream_tag)
    }

    /// Working branch in an external.
    pub fn external_branch(&self, name: &str) -> String {
        format!("update/{}/{}", self.upstream_tag, name)
    }
}

/// Settings for rolling a release back into the development branches.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub release_branch: String,
    pub develop_branch: String,
    pub ext_branch: String,
    pub fork_pattern: Regex,
    /// Forked externals left out of the roll-over.
    pub exclude: Vec<String>,
    pub release_marker: String,
    pub model_release_prefix: String,
    pub model_dev_prefix: String,
    pub ext_release_prefix: String,
    pub model_label: String,
    pub model_name: String,
}

impl ReleaseConfig {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            manifest: PathBuf::from(defaults::MANIFEST_FILE),
            release_branch: defaults::RELEASE_BRANCH.to_string(),
            develop_branch: defaults::DEVELOP_BRANCH.to_string(),
            ext_branch: defaults::EXT_BRANCH.to_string(),
            fork_pattern: fork_regex(defaults::FORK_PATTERN)?,
            exclude: defaults::RELEASE_EXCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            release_marker: defaults::RELEASE_MARKER.to_string(),
            model_release_prefix: defaults::MODEL_RELEASE_PREFIX.to_string(),
            model_dev_prefix: defaults::MODEL_DEV_PREFIX.to_string(),
            ext_release_prefix: defaults::EXT_RELEASE_PREFIX.to_string(),
            model_label: defaults::MODEL_LABEL.to_string(),
            model_name: defaults::MODEL_NAME.to_string(),
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }

    /// Version part of a release tag (`release-ew2.1` gives `2.1`).
    pub fn release_version(&self, release_tag: &str) -> String {
        release_tag.replacen(&self.model_release_prefix, "", 1)
    }
}

/// Compile a fork-detection pattern.
pub fn fork_regex(pattern: &str) -> Result<Regex> {
    if pattern.is_empty() {
        return Err(Error::Config {
            message: "fork pattern must not be empty".to_string(),
        });
    }
    Ok(Regex::new(pattern)?)
}

/// `Externals.cfg` + `cesm2_3_beta17` gives `Externals.cesm2_3_beta17.cfg`.
fn tagged_file_name(manifest: &Path, tag: &str) -> PathBuf {
    let stem = manifest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "Externals".to_string());
    let name = match manifest.extension() {
        Some(ext) => format!("{}.{}.{}", stem, tag, ext.to_string_lossy()),
        None => format!("{}.{}", stem, tag),
    };
    match manifest.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
