//! Push working branches and new tags.
//!
//! Never runs unless explicitly requested.

use std::path::Path;

use super::Context;
use crate::error::Result;
use crate::records::UpdateSet;

/// Push every merged fork's branch (and tag, when one was created) to
/// origin, then the top-level branch and tag to `model_remote`.
pub fn execute(
    ctx: &Context,
    root: &Path,
    model_remote: &str,
    mut set: UpdateSet,
) -> Result<UpdateSet> {
    for record in set.externals_mut() {
        if !record.merged() {
            continue;
        }
        let Some(merge) = record.merge.clone() else {
            continue;
        };
        let Some(branch) = merge.branch else {
            continue;
        };
        let dir = record.dir(root);

        let mut args = vec!["push", "origin", branch.as_str()];
        if let Some(tag) = merge.tag.as_deref() {
            args.push(tag);
        }
        ctx.progress(&format!("Pushing {} {}", record.name, branch));
        let out = ctx.git(&dir, &args)?;
        record.merge_mut().push = Some(out.status);
        if !out.success() {
            ctx.failure(&format!("Failed to push {}", record.name), &dir, &args, &out);
        }
    }

    let merge = set.model.merge.clone().unwrap_or_default();
    if let (Some(branch), Some(tag)) = (merge.branch, merge.tag) {
        let args = ["push", model_remote, branch.as_str(), tag.as_str()];
        ctx.progress(&format!("Pushing top level {} {}", branch, tag));
        let out = ctx.git(root, &args)?;
        set.model.merge_mut().push = Some(out.status);
        if !out.success() {
            ctx.failure("Failed to push the top level", root, &args, &out);
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::ScriptedRunner;
    use crate::output::OutputConfig;
    use crate::records::{ExternalRecord, MergeStatus, RepoRef, UpstreamRef};
    use std::path::PathBuf;

    fn record(name: &str, merge: MergeStatus) -> ExternalRecord {
        let mut record = ExternalRecord::fork(
            name,
            &format!("components/{}", name),
            RepoRef {
                branch: "ew-develop".to_string(),
                repo_url: String::new(),
                name: String::new(),
                tag: None,
            },
            UpstreamRef {
                repo_url: String::new(),
                name: String::new(),
                tag: String::new(),
            },
        );
        record.merge = Some(merge);
        record
    }

    fn model(tag: Option<&str>) -> ExternalRecord {
        let mut model = ExternalRecord::model(
            "ew-model",
            RepoRef {
                branch: "develop".to_string(),
                repo_url: String::new(),
                name: "ew-org".to_string(),
                tag: None,
            },
        );
        model.merge = Some(MergeStatus {
            branch: Some("update/t1".to_string()),
            stat: Some(0),
            tag: tag.map(str::to_string),
            ..MergeStatus::default()
        });
        model
    }

    #[test]
    fn test_push_branches_and_tags() {
        let mut set = UpdateSet::new(model(Some("ewm-2.1.005")));
        set.insert(record(
            "cam",
            MergeStatus {
                branch: Some("update/t1/cam".to_string()),
                stat: Some(0),
                tag: Some("cam.002".to_string()),
                ..MergeStatus::default()
            },
        ))
        .unwrap();
        set.insert(record(
            "mpas",
            MergeStatus {
                branch: Some("update/t1/mpas".to_string()),
                stat: Some(0),
                tag_stat: Some(128),
                ..MergeStatus::default()
            },
        ))
        .unwrap();
        set.insert(record(
            "cime",
            MergeStatus {
                branch: Some("update/t1/cime".to_string()),
                stat: Some(1),
                ..MergeStatus::default()
            },
        ))
        .unwrap();
        let runner = ScriptedRunner::new().on_in("components/mpas", "push", 1, "rejected");
        let ctx = Context::new(&runner, OutputConfig::without_color());

        let set = execute(&ctx, Path::new("/model"), "ew-org", set).unwrap();

        assert_eq!(
            runner.lines(),
            vec![
                "git push origin update/t1/cam cam.002",
                "git push origin update/t1/mpas",
                "git push ew-org update/t1 ewm-2.1.005",
            ]
        );
        assert_eq!(runner.calls()[0].cwd, PathBuf::from("/model/components/cam"));
        assert_eq!(set.get("cam").unwrap().merge.as_ref().unwrap().push, Some(0));
        assert_eq!(set.get("mpas").unwrap().merge.as_ref().unwrap().push, Some(1));
        assert_eq!(set.get("cime").unwrap().merge.as_ref().unwrap().push, None);
        assert_eq!(set.model.merge.as_ref().unwrap().push, Some(0));
    }

    #[test]
    fn test_top_level_without_tag_is_not_pushed() {
        let set = UpdateSet::new(model(None));
        let runner = ScriptedRunner::new();
        let ctx = Context::new(&runner, OutputConfig::without_color());

        let set = execute(&ctx, Path::new("/model"), "ew-org", set).unwrap();
        assert!(runner.calls().is_empty());
        assert_eq!(set.model.merge.as_ref().unwrap().push, None);
    }
}
