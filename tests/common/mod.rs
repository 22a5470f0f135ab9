//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[cfg_attr(not(feature = "integration-tests"), ignore)]
//! fn test_example() {
//!     let fixture = GitFixture::new();
//!     let model = fixture.sync_model();
//!     // ... test code
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    #[allow(unused_imports)]
    pub use super::{git, git_output, GitFixture};
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// Downstream manifest with one fork and one passthrough external.
    pub const DOWNSTREAM: &str = "[externals_description]
schema_version = 1.0.0

[foo]
local_path = components/foo
protocol = git
repo_url = https://github.com/EarthWorksOrg/foo.git
tag = v2.0.003
required = True

[cice]
local_path = components/cice
protocol = git
repo_url = https://github.com/ESCOMP/CESM_CICE
tag = cesm_cice6_4_1_10
required = True
";

    /// Reference manifest matching [`DOWNSTREAM`].
    pub const REFERENCE: &str = "[foo]
local_path = components/foo
protocol = git
repo_url = https://github.com/ESCOMP/foo.git
tag = v2.1.000
required = True

[cice]
local_path = components/cice
protocol = git
repo_url = https://github.com/ESCOMP/CESM_CICE
tag = cesm_cice6_4_1_12
required = True
";
}

const IDENTITY: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "Externals Test"),
    ("GIT_AUTHOR_EMAIL", "externals@example.com"),
    ("GIT_COMMITTER_NAME", "Externals Test"),
    ("GIT_COMMITTER_EMAIL", "externals@example.com"),
];

/// Run git in `dir` and panic on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let output = git_output(dir, args);
    assert!(output.is_some(), "git {:?} failed in {}", args, dir.display());
}

/// Run git in `dir`; stdout on success, `None` on failure.
pub fn git_output(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(IDENTITY)
        .output()
        .expect("Failed to run git");
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_string())
}

/// A set of real git repositories under one temporary directory.
///
/// The directory name avoids a leading dot because remote names are derived
/// from repository paths and git rejects ref components starting with one.
pub struct GitFixture {
    temp_dir: tempfile::TempDir,
}

#[allow(dead_code)]
impl GitFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::Builder::new()
                .prefix("externals-sync")
                .tempdir()
                .expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `file://` URL of a repository in the fixture.
    pub fn url(&self, name: &str) -> String {
        format!("file://{}", self.path().join(name).display())
    }

    /// Create a repository at `name` on branch `branch` with one commit.
    pub fn init(&self, name: &str, branch: &str, file: &str, content: &str) -> PathBuf {
        let dir = self.path().join(name);
        fs::create_dir_all(&dir).expect("Failed to create repository directory");
        git(&dir, &["init", "-q"]);
        git(&dir, &["checkout", "-q", "-b", branch]);
        self.commit(&dir, file, content);
        dir
    }

    /// Write `file` and commit it.
    pub fn commit(&self, dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).expect("Failed to write file");
        git(dir, &["add", file]);
        git(dir, &["commit", "-q", "-m", &format!("Update {}", file)]);
    }

    /// Command for the binary with a git identity and plain output.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("externals-sync");
        cmd.current_dir(self.path())
            .envs(IDENTITY)
            .env("NO_COLOR", "1")
            .env_remove("EXTERNALS_SYNC_ROOT");
        cmd
    }

    /// Lay out a model whose fork `foo` can take upstream tag `v2.1.000`.
    ///
    /// - `upstream/foo`: reference repository, tags `v2.0.000` and `v2.1.000`
    /// - `fork_origin/foo`: fork on `ew-develop` tagged `v2.0.003`
    /// - `org`: top-level repository on `develop` tagged `ewm-2.1.004`
    /// - `model`: clone of `org` with `components/foo` cloned from the fork
    ///
    /// Returns the model root. The reference manifest for tag `t1` is already
    /// in place so no download happens.
    pub fn sync_model(&self) -> PathBuf {
        let upstream = self.init("upstream/foo", "main", "a.txt", "base\n");
        git(&upstream, &["tag", "v2.0.000"]);

        let fork = self.path().join("fork_origin/foo");
        git(
            self.path(),
            &["clone", "-q", &self.url("upstream/foo"), "fork_origin/foo"],
        );
        git(&fork, &["checkout", "-q", "-b", "ew-develop"]);
        self.commit(&fork, "b.txt", "downstream change\n");
        git(&fork, &["tag", "-a", "v2.0.003", "-m", "Downstream v2.0.003"]);

        self.commit(&upstream, "c.txt", "upstream change\n");
        git(&upstream, &["tag", "v2.1.000"]);

        let manifest = manifests::DOWNSTREAM.replace(
            "https://github.com/EarthWorksOrg/foo.git",
            &self.url("fork_origin/foo"),
        );
        let org = self.init("org", "develop", "Externals.cfg", &manifest);
        git(&org, &["tag", "-a", "ewm-2.1.004", "-m", "ewm-2.1.004"]);

        git(self.path(), &["clone", "-q", &self.url("org"), "model"]);
        let model = self.path().join("model");
        git(
            &model,
            &[
                "clone",
                "-q",
                "-b",
                "ew-develop",
                &self.url("fork_origin/foo"),
                "components/foo",
            ],
        );
        let reference = manifests::REFERENCE
            .replace("https://github.com/ESCOMP/foo.git", &self.url("upstream/foo"));
        fs::write(model.join("Externals.t1.cfg"), reference)
            .expect("Failed to write reference manifest");
        model
    }

    /// Lay out a model whose `main` branch carries release `release-ew2.1`.
    ///
    /// - `fork_origin/mpas`: fork on `ew-develop` tagged `mpas.ew.012`, with
    ///   `release-mpas.ew2.1` on a side branch
    /// - `org`: `develop` pins `mpas.ew.012`, `main` pins the release tag
    /// - `model`: clone of `org` on `develop` with `components/mpas`
    ///
    /// Returns the model root.
    pub fn release_model(&self, release_tag: &str) -> PathBuf {
        let fork = self.init("fork_origin/mpas", "ew-develop", "a.txt", "base\n");
        git(&fork, &["tag", "-a", "mpas.ew.012", "-m", "Based on MPAS v8.0"]);
        git(&fork, &["checkout", "-q", "-b", "release"]);
        self.commit(&fork, "release.txt", "release notes\n");
        git(&fork, &["tag", "-a", "release-mpas.ew2.1", "-m", "Release"]);
        git(&fork, &["checkout", "-q", "ew-develop"]);

        let develop = format!(
            "[externals_description]\nschema_version = 1.0.0\n\n[mpas]\nlocal_path = components/mpas\nprotocol = git\nrepo_url = {}\ntag = mpas.ew.012\nrequired = True\n",
            self.url("fork_origin/mpas")
        );
        let org = self.init("org", "develop", "Externals.cfg", &develop);
        git(&org, &["checkout", "-q", "-b", "main"]);
        self.commit(
            &org,
            "Externals.cfg",
            &develop.replace("tag = mpas.ew.012", "tag = release-mpas.ew2.1"),
        );
        git(&org, &["tag", "-a", release_tag, "-m", release_tag]);
        git(&org, &["checkout", "-q", "develop"]);

        git(self.path(), &["clone", "-q", &self.url("org"), "model"]);
        let model = self.path().join("model");
        git(
            &model,
            &[
                "clone",
                "-q",
                &self.url("fork_origin/mpas"),
                "components/mpas",
            ],
        );
        model
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}
