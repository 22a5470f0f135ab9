//! # Error Handling
//!
//! This module defines the centralized error type for the `externals-sync`
//! library. It uses the `thiserror` library to describe the failures that
//! make continuing a run meaningless.
//!
//! Per-dependency git failures are deliberately *not* errors: they are
//! recorded as exit statuses in the record model (see `records`) and the run
//! moves on. Only the following conditions surface as [`Error`]:
//!
//! - The downstream or reference manifest cannot be read, parsed or written.
//! - The reference manifest cannot be downloaded.
//! - A command cannot be spawned at all.
//! - The top-level working branch cannot be established.
//! - A tag does not follow the `<prefix>.<number>` convention.
//! - A post-release run is started on a commit that is not a release tag.
//!
//! The `Result` type alias is used to return `Result<T, Error>` from library
//! functions.

use thiserror::Error;

/// Main error type for externals-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A manifest file could not be read or parsed.
    #[error("Manifest error in {path}: {message}")]
    Manifest { path: String, message: String },

    /// The reference-project manifest could not be retrieved.
    #[error("Failed to get reference manifest from {url}: {message}")]
    ReferenceManifest { url: String, message: String },

    /// A command could not be started (missing binary, bad working directory).
    #[error("Failed to run '{command}' in {cwd}: {message}")]
    Spawn {
        command: String,
        cwd: String,
        message: String,
    },

    /// A top-level setup step returned a nonzero status.
    #[error("Top-level setup failed at '{step}' (status {status}){}", output_suffix(output))]
    Setup {
        step: String,
        status: i32,
        output: String,
    },

    /// A tag could not be incremented.
    #[error("Cannot derive a new tag from '{tag}': {message}")]
    Tag { tag: String, message: String },

    /// The post-release workflow was started without a release tag on HEAD.
    #[error("Most recent tag '{tag}' on {branch} is not a release tag{}", output_suffix(hint))]
    NotARelease {
        tag: String,
        branch: String,
        hint: String,
    },

    /// Two records were inserted under the same name.
    #[error("Duplicate external record: {name}")]
    DuplicateRecord { name: String },

    /// An invalid option value.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

fn output_suffix(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        String::new()
    } else {
        format!("\n  {}", text)
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
