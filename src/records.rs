//! # Update Record Model
//!
//! One [`ExternalRecord`] per external dependency taking part in a run, plus
//! a synthetic record for the top-level model repository. Stages fill the
//! `fetch` and `merge` bags as they go; an absent field means the step was
//! never attempted, a nonzero one that it failed.
//!
//! Records are built once by cross-referencing the downstream and reference
//! manifests ([`build_records`]) and are only ever added to afterwards.

use std::path::{Path, PathBuf};

use log::warn;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::manifest::{repo_short_name, Manifest};

/// Pin written for a fork whose update did not produce a new tag.
pub const SKIPPED: &str = "SKIPPED";

/// Downstream side of a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoRef {
    /// Development branch the update starts from.
    pub branch: String,
    pub repo_url: String,
    /// Remote short name derived from the URL.
    pub name: String,
    /// Currently pinned downstream tag, if any.
    pub tag: Option<String>,
}

/// Reference-project side of a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamRef {
    pub repo_url: String,
    pub name: String,
    pub tag: String,
}

/// Exit statuses of the fetch stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub remote: Option<i32>,
    pub tag: Option<i32>,
    pub branch: Option<i32>,
}

/// Outcome of the merge, tag and push stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStatus {
    /// Working branch; only set once it was created.
    pub branch: Option<String>,
    pub stat: Option<i32>,
    pub tag_stat: Option<i32>,
    /// New annotated tag; only set once it was created.
    pub tag: Option<String>,
    pub push: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalRecord {
    pub name: String,
    /// Relative to the top-level root.
    pub local_path: PathBuf,
    pub repo: Option<RepoRef>,
    pub upstream: Option<UpstreamRef>,
    pub fetch: Option<FetchStatus>,
    pub merge: Option<MergeStatus>,
}

impl ExternalRecord {
    /// A dependency carried over from the reference project unchanged.
    pub fn passthrough(name: &str, local_path: &str, upstream: UpstreamRef) -> Self {
        Self {
            name: name.to_string(),
            local_path: PathBuf::from(local_path),
            repo: None,
            upstream: Some(upstream),
            fetch: None,
            merge: None,
        }
    }

    /// A downstream-maintained fork of a reference dependency.
    pub fn fork(name: &str, local_path: &str, repo: RepoRef, upstream: UpstreamRef) -> Self {
        Self {
            repo: Some(repo),
            ..Self::passthrough(name, local_path, upstream)
        }
    }

    /// The synthetic record for the top-level repository.
    pub fn model(name: &str, repo: RepoRef) -> Self {
        Self {
            name: name.to_string(),
            local_path: PathBuf::from("."),
            repo: Some(repo),
            upstream: None,
            fetch: None,
            merge: None,
        }
    }

    pub fn is_fork(&self) -> bool {
        self.repo.is_some()
    }

    /// Both the upstream tag and the downstream branch were fetched.
    pub fn fetched(&self) -> bool {
        self.fetch
            .as_ref()
            .is_some_and(|f| f.tag == Some(0) && f.branch == Some(0))
    }

    /// The merge stage succeeded.
    pub fn merged(&self) -> bool {
        self.merge.as_ref().is_some_and(|m| m.stat == Some(0))
    }

    /// The new tag created for this record, if any.
    pub fn new_tag(&self) -> Option<&str> {
        self.merge.as_ref().and_then(|m| m.tag.as_deref())
    }

    /// Absolute working directory of this record.
    pub fn dir(&self, root: &Path) -> PathBuf {
        root.join(&self.local_path)
    }

    pub fn fetch_mut(&mut self) -> &mut FetchStatus {
        self.fetch.get_or_insert_with(FetchStatus::default)
    }

    pub fn merge_mut(&mut self) -> &mut MergeStatus {
        self.merge.get_or_insert_with(MergeStatus::default)
    }
}

/// Insertion-ordered set of records keyed by name.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSet {
    pub model: ExternalRecord,
    externals: Vec<ExternalRecord>,
}

impl UpdateSet {
    pub fn new(model: ExternalRecord) -> Self {
        Self {
            model,
            externals: Vec::new(),
        }
    }

    /// Add a record; names must be unique, including against the model record.
    pub fn insert(&mut self, record: ExternalRecord) -> Result<()> {
        if record.name == self.model.name || self.get(&record.name).is_some() {
            return Err(Error::DuplicateRecord { name: record.name });
        }
        self.externals.push(record);
        Ok(())
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ExternalRecord>) -> Result<()> {
        for record in records {
            self.insert(record)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ExternalRecord> {
        self.externals.iter().find(|r| r.name == name)
    }

    /// Dependency records, excluding the model record.
    pub fn externals(&self) -> &[ExternalRecord] {
        &self.externals
    }

    pub fn externals_mut(&mut self) -> impl Iterator<Item = &mut ExternalRecord> {
        self.externals.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.externals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.externals.is_empty()
    }
}

/// Cross-reference the downstream and reference manifests.
///
/// For each downstream dependency also present in the reference manifest, a
/// fork record is emitted when its `repo_url` matches `fork`, otherwise a
/// passthrough record. Dependencies missing from the reference manifest get
/// no record and are left alone. `allow` restricts both lookups.
pub fn build_records(
    downstream: &Manifest,
    reference: &Manifest,
    allow: Option<&[String]>,
    fork: &Regex,
    ext_branch: &str,
) -> Result<Vec<ExternalRecord>> {
    let mut records = Vec::new();

    for entry in downstream.externals(allow)? {
        let Some(upstream) = reference.get(&entry.name)? else {
            continue;
        };
        let Some(upstream_url) = upstream.repo_url.as_deref() else {
            warn!("External {} has no repo_url in {}", entry.name, reference.path().display());
            continue;
        };
        let Some(upstream_tag) = upstream.tag.as_deref() else {
            warn!("External {} is not pinned to a tag in {}", entry.name, reference.path().display());
            continue;
        };

        let upstream_ref = UpstreamRef {
            repo_url: upstream_url.to_string(),
            name: repo_short_name(upstream_url),
            tag: upstream_tag.to_string(),
        };

        let record = match entry.repo_url.as_deref() {
            Some(url) if fork.is_match(url) => ExternalRecord::fork(
                &entry.name,
                &entry.local_path,
                RepoRef {
                    branch: ext_branch.to_string(),
                    repo_url: url.to_string(),
                    name: repo_short_name(url),
                    tag: entry.tag.clone(),
                },
                upstream_ref,
            ),
            _ => ExternalRecord::passthrough(&entry.name, &entry.local_path, upstream_ref),
        };
        records.push(record);
    }

    Ok(records)
}
