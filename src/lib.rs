//! # Externals Sync Library
//!
//! Keeps the externals manifest (`Externals.cfg`) of a downstream model in
//! step with a tagged release of the reference project it derives from. It is
//! used by the `externals-sync` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use externals_sync::tags;
//!
//! assert_eq!(tags::next_tag("cam.ew.007").unwrap(), "cam.ew.008");
//! assert_eq!(
//!     tags::development_tag("release-ew2.1", "release-ew", "ewm-").unwrap(),
//!     "ewm-2.1.000"
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: INI file with one section per external and its
//!   `local_path`, `repo_url` and pinned `tag`.
//! - **Records (`records`)**: one [`records::ExternalRecord`] per external
//!   taking part in a run, classified as a *fork* (downstream keeps its own
//!   branch) or *passthrough* (the reference pin is used unchanged), plus one
//!   record for the top-level repository.
//! - **Pipeline (`pipeline`)**: the stages of a run. Each stage takes the
//!   record set and returns it with more outcome fields filled in.
//! - **Commands (`git`)**: every git or curl invocation goes through the
//!   [`git::CommandRunner`] trait with an explicit working directory.
//!
//! ## Execution Flow
//!
//! 1.  **Reference manifest**: reuse or download the reference manifest.
//! 2.  **Setup**: create the top-level working branch.
//! 3.  **Construction**: build the record set from both manifests.
//! 4.  **Fetch / Merge / Tag**: per fork, merge the new upstream tag and tag
//!     the result.
//! 5.  **Rewrite**: pin the new tags, commit and tag the top level.
//! 6.  **Push** (optional) and **summary**.

pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod summary;
pub mod tags;
