//! Merge the upstream tag into each fetched fork.
//!
//! Only forks whose upstream tag and development branch were both fetched
//! take part. A new branch `update/<tag>/<name>` is created from
//! `origin/<development branch>` and the upstream tag is merged with
//! `--no-ff`. Conflicts are left in place for manual resolution.

use super::Context;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::records::{RepoRef, UpdateSet, UpstreamRef};

/// One-line summary of the merge commit.
pub fn merge_summary(upstream: &UpstreamRef, repo: &RepoRef) -> String {
    format!(
        "Merge tag '{}' from {} into '{}'",
        upstream.tag, upstream.name, repo.branch
    )
}

pub fn execute(ctx: &Context, config: &SyncConfig, mut set: UpdateSet) -> Result<UpdateSet> {
    for record in set.externals_mut() {
        if !record.fetched() {
            continue;
        }
        let (Some(repo), Some(upstream)) = (record.repo.clone(), record.upstream.clone()) else {
            continue;
        };
        let dir = record.dir(&config.root);

        let branch = config.external_branch(&record.name);
        let start = format!("origin/{}", repo.branch);
        let args = ["checkout", "-b", branch.as_str(), start.as_str()];
        let out = ctx.git(&dir, &args)?;
        if !out.success() {
            ctx.failure(
                &format!("Failed to create new branch {} for merge", branch),
                &dir,
                &args,
                &out,
            );
            record.merge_mut().stat = Some(out.status);
            continue;
        }
        record.merge_mut().branch = Some(branch);

        ctx.progress(&format!("Merging '{}' into {}", upstream.tag, record.name));
        let summary = merge_summary(&upstream, &repo);
        let body = format!(
            "Update {} with upstream work from '{}/{}' version.",
            repo.name, config.project, config.upstream_tag
        );
        let args = [
            "merge",
            "--no-ff",
            upstream.tag.as_str(),
            "-m",
            summary.as_str(),
            "-m",
            body.as_str(),
        ];
        let out = ctx.git(&dir, &args)?;
        record.merge_mut().stat = Some(out.status);
        if !out.success() {
            ctx.failure(&format!("Merge failed for {}", record.name), &dir, &args, &out);
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::ScriptedRunner;
    use crate::output::OutputConfig;
    use crate::pipeline::construct::model_record;
    use crate::records::{ExternalRecord, FetchStatus};

    fn fork(name: &str, fetch: Option<FetchStatus>) -> ExternalRecord {
        let mut record = ExternalRecord::fork(
            name,
            &format!("components/{}", name),
            RepoRef {
                branch: "ew-develop".to_string(),
                repo_url: format!("https://github.com/EarthWorksOrg/{}.git", name),
                name: format!("EarthWorksOrg/{}", name),
                tag: None,
            },
            UpstreamRef {
                repo_url: format!("https://github.com/ESCOMP/{}.git", name),
                name: format!("ESCOMP/{}", name),
                tag: format!("{}_2_0", name),
            },
        );
        record.fetch = fetch;
        record
    }

    fn ok() -> Option<FetchStatus> {
        Some(FetchStatus {
            remote: Some(0),
            tag: Some(0),
            branch: Some(0),
        })
    }

    #[test]
    fn test_merge_skips_unfetched_records() {
        let config = SyncConfig::new("/model", "t1").unwrap();
        let mut set = UpdateSet::new(model_record(&config));
        set.insert(fork(
            "bad_tag",
            Some(FetchStatus {
                remote: Some(0),
                tag: Some(1),
                branch: Some(0),
            }),
        ))
        .unwrap();
        set.insert(fork(
            "bad_branch",
            Some(FetchStatus {
                remote: Some(0),
                tag: Some(0),
                branch: Some(128),
            }),
        ))
        .unwrap();
        set.insert(fork("never", None)).unwrap();
        let runner = ScriptedRunner::new();
        let ctx = Context::new(&runner, OutputConfig::without_color());

        let set = execute(&ctx, &config, set).unwrap();
        for record in set.externals() {
            assert!(record.merge.is_none(), "{} must not be merged", record.name);
        }
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_merge_success() {
        let config = SyncConfig::new("/model", "t1").unwrap();
        let mut set = UpdateSet::new(model_record(&config));
        set.insert(fork("cam", ok())).unwrap();
        let runner = ScriptedRunner::new();
        let ctx = Context::new(&runner, OutputConfig::without_color());

        let set = execute(&ctx, &config, set).unwrap();
        let merge = set.get("cam").unwrap().merge.clone().unwrap();
        assert_eq!(merge.branch.as_deref(), Some("update/t1/cam"));
        assert_eq!(merge.stat, Some(0));

        let lines = runner.lines();
        assert_eq!(lines[0], "git checkout -b update/t1/cam origin/ew-develop");
        assert_eq!(
            runner.calls()[1].args,
            [
                "merge",
                "--no-ff",
                "cam_2_0",
                "-m",
                "Merge tag 'cam_2_0' from ESCOMP/cam into 'ew-develop'",
                "-m",
                "Update EarthWorksOrg/cam with upstream work from 'ESCOMP/CESM/t1' version.",
            ]
        );
    }

    #[test]
    fn test_merge_checkout_failure_leaves_no_branch() {
        let config = SyncConfig::new("/model", "t1").unwrap();
        let mut set = UpdateSet::new(model_record(&config));
        set.insert(fork("cam", ok())).unwrap();
        let runner = ScriptedRunner::new().on("checkout -b", 128, "fatal: a branch named 'update/t1/cam' already exists");
        let ctx = Context::new(&runner, OutputConfig::without_color());

        let set = execute(&ctx, &config, set).unwrap();
        let merge = set.get("cam").unwrap().merge.clone().unwrap();
        assert_eq!(merge.branch, None);
        assert_eq!(merge.stat, Some(128));
        assert!(!runner.ran("git merge"));
    }

    #[test]
    fn test_merge_summary() {
        let record = fork("cam", None);
        assert_eq!(
            merge_summary(
                record.upstream.as_ref().unwrap(),
                record.repo.as_ref().unwrap()
            ),
            "Merge tag 'cam_2_0' from ESCOMP/cam into 'ew-develop'"
        );
    }
}
