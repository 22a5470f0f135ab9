//! Default values for externals-sync configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Manifest file name inside the top-level root.
pub const MANIFEST_FILE: &str = "Externals.cfg";

/// Diagnostic log file name, relative to the top-level root.
pub const LOG_FILE: &str = "update_ext.log";

/// Raw manifest URL of the reference project; `{tag}` is replaced.
pub const REFERENCE_URL: &str = "https://raw.githubusercontent.com/ESCOMP/CESM/{tag}/Externals.cfg";

/// Label of the reference project used in commit and tag messages.
pub const PROJECT: &str = "ESCOMP/CESM";

/// Repository URLs matching this pattern are downstream forks.
pub const FORK_PATTERN: &str = "EarthWorksOrg";

/// Development branch of every forked external.
pub const EXT_BRANCH: &str = "ew-develop";

/// Remote of the downstream organization in the top-level repository.
pub const ORG_REMOTE: &str = "ew-org";
pub const ORG_URL: &str = "https://github.com/EarthWorksOrg/EarthWorks";
pub const ORG_BRANCH: &str = "develop";

/// Name of the synthetic top-level record.
pub const MODEL_NAME: &str = "ew-model";

pub const RELEASE_BRANCH: &str = "main";
pub const DEVELOP_BRANCH: &str = "develop";

/// A top-level tag must contain this to count as a release.
pub const RELEASE_MARKER: &str = "release";

/// Prefix stripped from a top-level release tag to get its version.
pub const MODEL_RELEASE_PREFIX: &str = "release-ew";

/// Prefix of top-level development tags.
pub const MODEL_DEV_PREFIX: &str = "ewm-";

/// Prefix stripped from an external's release tag.
pub const EXT_RELEASE_PREFIX: &str = "release-";

/// Label used for the model in post-release messages (`EWM-v2.1`).
pub const MODEL_LABEL: &str = "EWM";

/// Forked externals that do not take part in the post-release roll-over.
pub const RELEASE_EXCLUDES: &[&str] = &["ccs_config", "cam"];

/// Returns the default top-level root for `sync`.
///
/// The tool lives three directories below the model root, so the default is
/// the third ancestor of `cwd`. Falls back to `cwd` itself when it is not
/// that deep.
pub fn default_root(cwd: &Path) -> PathBuf {
    cwd.ancestors()
        .nth(3)
        .unwrap_or(cwd)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_is_third_ancestor() {
        let root = default_root(Path::new("/work/EarthWorks/tools/scripts/git"));
        assert_eq!(root, PathBuf::from("/work/EarthWorks"));
    }

    #[test]
    fn test_default_root_shallow_cwd() {
        assert_eq!(default_root(Path::new("/a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_reference_url_has_placeholder() {
        assert!(REFERENCE_URL.contains("{tag}"));
    }
}
